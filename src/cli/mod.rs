use clap::Parser;
use eyre::{Context, Result};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A terminal chat client that keeps named conversations with an AI assistant

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/parley/config.toml
    * $HOME/.config/parley/config.toml
    * $HOME/.parley.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Print progress while starting up
    #[arg(long)]
    verbose: bool,

    /// Show the version
    #[arg(short, long)]
    version: bool,
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        let mut config = if config_path.is_empty() {
            // No config path is specified just use the default config
            Configuration::default()
        } else {
            load_configuration(config_path.as_str()).wrap_err("loading configuration")?
        };

        if self.verbose {
            config.general.verbose = true;
        }
        Ok(config)
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cmd = Command::parse_from(["parley", "-c", "testdata/config.toml", "--verbose"]);
        assert_eq!(cmd.config.as_deref(), Some("testdata/config.toml"));
        assert!(!cmd.version());

        let config = cmd.get_config().expect("Failed to load config");
        assert!(config.general.verbose);
        assert_eq!(config.storage.max_conversations, 20);

        let cmd = Command::parse_from(["parley", "-v"]);
        assert!(cmd.version());
    }

    #[test]
    fn test_get_config_missing_file() {
        let cmd = Command::parse_from(["parley", "--config", "testdata/nope.toml"]);
        assert!(cmd.get_config().is_err());
    }
}
