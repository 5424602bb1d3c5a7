use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Dashboard tools whose use is metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    PricingCalculator,
    LaunchSequence,
    ProducthuntOptimizer,
    CustomerAcquisition,
    MarketingAssets,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::PricingCalculator,
        ToolName::LaunchSequence,
        ToolName::ProducthuntOptimizer,
        ToolName::CustomerAcquisition,
        ToolName::MarketingAssets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::PricingCalculator => "pricing_calculator",
            ToolName::LaunchSequence => "launch_sequence",
            ToolName::ProducthuntOptimizer => "producthunt_optimizer",
            ToolName::CustomerAcquisition => "customer_acquisition",
            ToolName::MarketingAssets => "marketing_assets",
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
