//! Log setup on top of log4rs
//!
//! Library code only uses the `log` macros; binaries call [`init_log`] once.

use std::path::Path;
use std::str::FromStr;

use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const CONSOLE_PATTERN: &str = "{h({l:<5})} {t} {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}";

/// Parse a level name ("off", "error", ... "trace"), case-insensitively
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(level).map_err(|_| format!("unknown log level: {}", level))
}

/// Init the log system: stderr always, plus a file when `file_path` is given
pub fn init_log(level: LevelFilter, file_path: Option<&Path>) -> Result<(), String> {
    let console = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(level)))
            .build("console", Box::new(console)),
    );
    let mut root = Root::builder().appender("console");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(path)
            .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        );
        root = root.appender("logfile");
    }

    let config = builder
        .build(root.build(level))
        .map_err(|e| format!("bad log config: {}", e))?;
    log4rs::init_config(config).map_err(|e| format!("logger already set: {}", e))?;
    Ok(())
}
