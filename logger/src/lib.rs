use std::fs::File;

use colored::{Color, Colorize};
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

/// Truncated on every start; stdout carries the same lines.
const LOG_FILE: &str = "launchkit.log";

/// Dependencies whose own logging drowns out request and webhook lines.
const QUIET_TARGETS: [(&str, log::LevelFilter); 3] = [
    ("hyper", log::LevelFilter::Off),
    ("sqlx", log::LevelFilter::Warn),
    ("actix_server", log::LevelFilter::Info),
];

fn level_color(level: log::Level) -> Color {
    match level {
        log::Level::Error => Color::Red,
        log::Level::Warn => Color::Yellow,
        log::Level::Info => Color::Green,
        log::Level::Debug => Color::Magenta,
        log::Level::Trace => Color::BrightBlack,
    }
}

/// Installs the global logger for the launchkit server.
pub fn setup() -> Result<(), fern::InitError> {
    File::create(LOG_FILE).map_err(fern::InitError::Io)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.target(),
                record.level().to_string().color(level_color(record.level())),
                message
            ))
        })
        .level(log::LevelFilter::Debug);
    for (target, filter) in QUIET_TARGETS {
        dispatch = dispatch.level_for(target, filter);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(fern::log_file(LOG_FILE)?)
        .apply()?;
    Ok(())
}

pub fn middleware() -> LoggerMiddleware {
    LoggerMiddleware::new()
}
