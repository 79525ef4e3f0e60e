//! Command-line interface for humlyric
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hum a melody, get lyric drafts
#[derive(Parser, Debug)]
#[command(name = "humlyric", version, about = "Hum a melody, get lyric drafts")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: session events, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Backend base URL (default: from config)
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Audio input device name
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Genre for draft generation (e.g. pop, folk, jazz)
    #[arg(long, value_name = "GENRE")]
    pub genre: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["humlyric"]);
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.genre.is_none());
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::parse_from([
            "humlyric",
            "--backend-url",
            "http://10.0.0.1:9000",
            "--genre",
            "folk",
            "-vv",
        ]);
        assert_eq!(cli.backend_url.as_deref(), Some("http://10.0.0.1:9000"));
        assert_eq!(cli.genre.as_deref(), Some("folk"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_devices_subcommand() {
        let cli = Cli::parse_from(["humlyric", "devices"]);
        assert!(matches!(cli.command, Some(Commands::Devices)));
    }
}
