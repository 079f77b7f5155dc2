use crate::camera::ResetPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(version, about = "Headless world map viewport", long_about = None)]
pub struct Cli {
    /// Viewer config JSON (every field optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Texture directory to scan instead of the standard set
    #[arg(long, global = true)]
    pub textures: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Validate and resolve a map payload, then summarise it.
    Inspect {
        /// Map payload JSON as returned by the map service.
        #[arg(long)]
        payload: PathBuf,

        /// Print every resolved tile.
        #[arg(long)]
        tiles: bool,
    },

    /// Run a scripted interaction session against a payload.
    Session {
        /// Map payload JSON as returned by the map service.
        #[arg(long)]
        payload: PathBuf,

        /// Interaction script, one command per line.
        #[arg(long)]
        script: PathBuf,

        /// Override the configured reset-during-flight policy.
        #[arg(long, value_enum)]
        reset_policy: Option<ResetPolicy>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::parse_from(["mapview", "inspect", "--payload", "map.json", "--tiles"]);
        assert_eq!(
            cli.command,
            Commands::Inspect {
                payload: PathBuf::from("map.json"),
                tiles: true,
            }
        );
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_parse_session_with_globals() {
        let cli = Cli::parse_from([
            "mapview",
            "session",
            "--payload",
            "map.json",
            "--script",
            "s.txt",
            "--reset-policy",
            "cancel-flight",
            "--config",
            "viewer.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("viewer.json")));
        assert_eq!(
            cli.command,
            Commands::Session {
                payload: PathBuf::from("map.json"),
                script: PathBuf::from("s.txt"),
                reset_policy: Some(ResetPolicy::CancelFlight),
            }
        );
    }
}
