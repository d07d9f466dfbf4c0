use trowel_config::Config;

use crate::{AccessMode, SandboxedFs, VfsResult};

impl SandboxedFs {
    /// Build a facade from resolved configuration.
    ///
    /// Without a configured root the process working directory is used.
    ///
    /// # Errors
    ///
    /// Fails if the root is relative or the working directory is unavailable.
    pub fn from_config(config: &Config) -> VfsResult<Self> {
        let fs = match &config.fs.root {
            Some(root) => Self::new(root, config.fs.enforce_root)?,
            None => Self::current_dir(config.fs.enforce_root)?,
        };
        let mode = if config.fs.read_only {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        };
        Ok(fs.with_mode(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.fs.root = Some("/srv/project".into());
        config.fs.read_only = true;

        let fs = SandboxedFs::from_config(&config).unwrap();
        assert_eq!(fs.root(), std::path::Path::new("/srv/project"));
        assert!(fs.enforces_root());
        assert_eq!(fs.mode(), AccessMode::ReadOnly);
    }

    #[test]
    fn test_relative_root_from_config_is_rejected() {
        let mut config = Config::default();
        config.fs.root = Some("project".into());
        assert!(SandboxedFs::from_config(&config).is_err());
    }
}
