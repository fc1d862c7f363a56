//! Configuration commands

use anyhow::Result;
use clap::Subcommand;
use ls346_common::AppConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    #[command(about = "Show the configuration after file and environment overrides")]
    Show {
        /// Print as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration
    #[command(about = "Check the configuration and report the first problem")]
    Validate,
}

pub fn render(config: &AppConfig, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(config)?)
    } else {
        Ok(serde_yaml::to_string(config)?)
    }
}

pub fn handle_command(cmd: ConfigCommands, config: &AppConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => {
            println!("{}", render(config, json)?);
        },
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration OK ({} link)", config.link.kind);
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_render_yaml_round_trips() {
        let config = AppConfig::default();
        let yaml = render(&config, false).unwrap();
        assert!(yaml.contains("batch_size: 10"));

        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_render_json() {
        let json = render(&AppConfig::default(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["transfer"]["progress_name"], "curve:progress");
        assert_eq!(value["link"]["kind"], "serial");
    }
}
