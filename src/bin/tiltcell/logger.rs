use crate::config::sys_config::{DEFAULT_LOG_LEVEL, LOG_LEVEL_ENV};
use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

// Everything goes to stderr so stdout stays a clean table
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(
                std::io::stderr(),
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

pub fn init() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
