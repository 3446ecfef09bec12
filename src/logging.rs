use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::errors::ConfigError;
use crate::initialization::General;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {M} - {m}{n}";

/// Sets up the global logger from the general settings
///
/// # Arguments
///
/// * 'general' - log level, optional log file and whether to also log to stdout
pub fn setup_logger(general: &General) -> Result<(), ConfigError> {
    let config = logger_config(general)?;
    log4rs::init_config(config)?;

    Ok(())
}

fn logger_config(general: &General) -> Result<Config, ConfigError> {
    let level = general
        .log_level
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError(format!("unknown log level '{}'", general.log_level)))?;

    let mut builder = Config::builder();
    let mut root = Root::builder();

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    if let Some(path) = &general.log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    Ok(builder.build(root.build(level))?)
}
