use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wayline", about = "Wayline — turn-by-turn updates while you drive")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a navigation script through the background service
    Run {
        #[arg(long)]
        script: PathBuf,
        /// Milliseconds between fixes (overrides [replay] interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Parse a navigation script and print a summary
    Validate {
        #[arg(long)]
        script: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_interval() {
        let cli = Cli::try_parse_from([
            "wayline",
            "--config",
            "wayline.toml",
            "run",
            "--script",
            "demo.toml",
            "--interval-ms",
            "50",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("wayline.toml")));
        match cli.command {
            Commands::Run {
                script,
                interval_ms,
            } => {
                assert_eq!(script, PathBuf::from("demo.toml"));
                assert_eq!(interval_ms, Some(50));
            }
            Commands::Validate { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn run_requires_script() {
        assert!(Cli::try_parse_from(["wayline", "run"]).is_err());
    }
}
