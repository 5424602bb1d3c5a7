use common::error::{AppError, Res};

use crate::dtos::tools::{
    OneTimeProjection, PricingInputs, PricingModel, PricingProjection, SubscriptionProjection,
};

/// Months a customer is assumed to stay when churn is zero.
const MAX_LIFESPAN_MONTHS: f64 = 36.0;

// half-way cases round up, so -2.5 becomes -2
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn one_decimal(value: f64) -> f64 {
    round_half_up(value * 10.0) as f64 / 10.0
}

fn margin(revenue: f64, net: f64) -> f64 {
    if revenue > 0.0 {
        one_decimal(net / revenue * 100.0)
    } else {
        0.0
    }
}

fn validate(inputs: &PricingInputs) -> Res<()> {
    let amounts = [
        ("one_time_price", inputs.one_time_price),
        ("monthly_price", inputs.monthly_price),
        ("annual_price", inputs.annual_price),
        ("target_customers", inputs.target_customers),
        ("monthly_costs", inputs.monthly_costs),
        ("customer_acquisition_cost", inputs.customer_acquisition_cost),
    ];
    if let Some((name, _)) = amounts
        .iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
    {
        return Err(AppError::BadRequest(format!("{} must be a non-negative number", name)));
    }
    if !(0.0..=100.0).contains(&inputs.monthly_churn_rate) {
        return Err(AppError::BadRequest(
            "monthly_churn_rate must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

fn one_time(inputs: &PricingInputs) -> OneTimeProjection {
    let price = inputs.one_time_price;
    let cac = inputs.customer_acquisition_cost;
    let yearly_costs = inputs.monthly_costs * 12.0;

    let revenue = price * inputs.target_customers;
    let total_cost = yearly_costs + cac * inputs.target_customers;
    let net = revenue - total_cost;
    let break_even_customers = if price > cac {
        (yearly_costs / (price - cac)).ceil() as i64
    } else {
        0
    };

    OneTimeProjection {
        total_revenue: round_half_up(revenue),
        net_revenue: round_half_up(net),
        profit_margin: margin(revenue, net),
        break_even_customers,
    }
}

fn subscription(inputs: &PricingInputs) -> SubscriptionProjection {
    let churn = inputs.monthly_churn_rate / 100.0;
    let price = if inputs.annual_price > 0.0 {
        inputs.annual_price / 12.0
    } else {
        inputs.monthly_price
    };

    let mut active = inputs.target_customers;
    let mut by_month = [0.0_f64; 12];
    for revenue in by_month.iter_mut() {
        *revenue = active * price;
        active *= 1.0 - churn;
    }
    let total: f64 = by_month.iter().sum();

    let lifespan = if churn > 0.0 { 1.0 / churn } else { MAX_LIFESPAN_MONTHS };
    let total_cost =
        inputs.monthly_costs * 12.0 + inputs.customer_acquisition_cost * inputs.target_customers;
    let net = total - total_cost;
    let break_even_customers = if price > 0.0 {
        ((inputs.monthly_costs + inputs.customer_acquisition_cost) / price).ceil() as i64
    } else {
        0
    };

    SubscriptionProjection {
        month1_revenue: round_half_up(by_month[0]),
        month6_revenue: round_half_up(by_month[5]),
        month12_revenue: round_half_up(by_month[11]),
        avg_monthly_revenue: round_half_up(total / 12.0),
        customer_lifetime_value: round_half_up(price * lifespan),
        total_annual_revenue: round_half_up(total),
        net_annual_revenue: round_half_up(net),
        profit_margin: margin(total, net),
        break_even_customers,
    }
}

/// Projects first-year revenue for the chosen pricing model.
pub fn calculate(inputs: &PricingInputs) -> Res<PricingProjection> {
    validate(inputs)?;

    let (with_one_time, with_subscription) = match inputs.pricing_model {
        PricingModel::OneTime => (true, false),
        PricingModel::Subscription => (false, true),
        PricingModel::Both => (true, true),
    };

    Ok(PricingProjection {
        pricing_model: inputs.pricing_model,
        one_time: with_one_time.then(|| one_time(inputs)),
        subscription: with_subscription.then(|| subscription(inputs)),
    })
}
