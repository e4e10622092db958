//! log4rs setup. The logger is process-global; a second initialisation is ignored.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Console logging at `info`.
pub fn init_default() -> Result<(), Box<dyn std::error::Error>> {
    let stdout = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    let _ = log4rs::init_config(config);
    Ok(())
}

/// Logging from a log4rs YAML file. A missing or malformed file is an error.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = log4rs::config::load_config_file(path, log4rs::config::Deserializers::default())?;
    let _ = log4rs::init_config(config);
    Ok(())
}

/// Builds the rolling-file configuration used by [`init_in`]: `{base}/{name}_logs/{name}.log`,
/// rolled at 10 MiB with seven archived files. Returns the log file path alongside.
pub fn file_config(base_dir: &Path, name: &str) -> Result<(Config, PathBuf), Box<dyn std::error::Error>> {
    let mut dir = PathBuf::from(base_dir);
    dir.push(format!("{name}_logs"));
    std::fs::create_dir_all(&dir)?;
    let log_file = dir.join(format!("{name}.log"));
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{name}.{{}}.log")).display()), 7)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(10 * 1024 * 1024)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(&log_file, Box::new(policy))?;
    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(LevelFilter::Info))?;
    Ok((config, log_file))
}

/// Rolling file logging under `base_dir`.
pub fn init_in(base_dir: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let (config, log_file) = file_config(base_dir, name)?;
    let _ = log4rs::init_config(config);
    Ok(log_file)
}
