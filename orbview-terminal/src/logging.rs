/// Logger setup for the terminal viewer
///
/// Raw-mode output tears on stray stderr lines, so without a log file only
/// warnings and errors are emitted
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Once;

/// Logger options; `env_filter` uses env_logger syntax, e.g. "orbview_core=debug"
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub log_file: Option<PathBuf>,
}

static INIT: Once = Once::new();

/// Install the global logger; later calls are ignored
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let file = config.log_file.as_ref().map(File::create).transpose()?;

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else if file.is_some() {
            builder.filter_level(log::LevelFilter::Info);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder.write_style(env_logger::WriteStyle::Never);
        }

        builder.init();

        log::debug!("logging initialized");
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_ignored() {
        let config = LoggingConfig {
            env_filter: Some("off".to_string()),
            log_file: None,
        };
        assert!(init_logging(config.clone()).is_ok());
        assert!(init_logging(config).is_ok());
    }
}
