use crate::config::{FileConfig, LogConfig};
use chrono::{DateTime, Local};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger as SizeBasedTriggerPolicy;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};
use std::path::Path;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}";
const CONSOLE_APPENDER: &str = "console_appender";
const FILE_APPENDER: &str = "file_appender";

pub struct Logger {
    handle: Handle,
}

impl Logger {
    pub fn new_from_config(config: &LogConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let handle = log4rs::init_config(Self::build_config(config)?)?;
        Ok(Self { handle })
    }

    /// Swap the active configuration of an installed logger
    pub fn reconfigure(&self, config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
        self.handle.set_config(Self::build_config(config)?);
        Ok(())
    }

    /// Translate the configuration into a log4rs config without installing it
    pub fn build_config(config: &LogConfig) -> Result<Config, Box<dyn std::error::Error>> {
        let mut log4rs_config = Config::builder();
        let mut root = Root::builder();

        if config.console {
            let appender = ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                .target(Target::Stderr)
                .build();
            log4rs_config = log4rs_config.appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(appender)));
            root = root.appender(CONSOLE_APPENDER);
        }

        if let Some(file_config) = &config.file {
            let appender = Self::create_file_appender(file_config)?;
            log4rs_config = log4rs_config.appender(Appender::builder().build(FILE_APPENDER, Box::new(appender)));
            root = root.appender(FILE_APPENDER);
        }

        if !config.console && config.file.is_none() {
            return Err("no log appender configured, enable console or file".into());
        }

        // Per-target levels share the root appenders
        for logger_config in &config.loggers {
            let logger = log4rs::config::Logger::builder()
                .build(logger_config.target.clone(), Self::parse_level(&logger_config.level));
            log4rs_config = log4rs_config.logger(logger);
        }

        let final_config = log4rs_config.build(root.build(Self::parse_level(&config.level)))?;
        Ok(final_config)
    }

    fn create_file_appender(config: &FileConfig) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y%m%d%H%M%S%3f").to_string();
        let archived_log_pattern = format!("{}-{{}}-{}.gz", config.path, formatted_time);

        let size_trigger = SizeBasedTriggerPolicy::new(config.max_file_size);
        let roller = FixedWindowRoller::builder().build(&archived_log_pattern, config.max_archives)?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(&config.path, Box::new(compound_policy))?;

        Ok(appender)
    }

    pub fn parse_level(level: &str) -> LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}
