use trowel_config::LoggingSection;

use crate::{LogConfig, LogFormat};

impl From<&LoggingSection> for LogConfig {
    /// Unknown formats fall back to the default; the config crate rejects
    /// them during validation anyway.
    fn from(section: &LoggingSection) -> Self {
        let format = section.format.parse().unwrap_or_else(|_| LogFormat::default());
        let mut config = Self::new(section.level.to_lowercase()).with_format(format);
        config.directives.clone_from(&section.directives);
        config
    }
}
