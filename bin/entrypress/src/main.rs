//! entrypress CLI
//!
//! Builds static pages and JSON artifacts from Contentful entries.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for entrypress.
#[derive(Parser)]
#[command(
    name = "entrypress",
    version,
    about = "Build static pages and JSON from Contentful entries"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "entrypress.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch entries and build the site
    Build {
        /// Output directory (overrides `build.output_dir`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Build from a JSON content dump instead of the API
        #[arg(long, value_name = "FILE")]
        offline: Option<PathBuf>,
        /// Use the preview API
        #[arg(long)]
        preview: bool,
    },
    /// Validate configuration and views without fetching
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    entrypress::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            offline,
            preview,
        } => {
            entrypress::cmd::build::run(&cli.config, output.as_deref(), offline.as_deref(), preview)
                .await?;
        }
        Commands::Check { strict } => {
            entrypress::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["entrypress", "build", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("entrypress.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build {
                output,
                offline,
                preview,
            } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(offline.is_none());
                assert!(!preview);
            }
            Commands::Check { .. } => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_offline() {
        let args = ["entrypress", "build", "--offline", "dump.json", "--preview"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build {
                output,
                offline,
                preview,
            } => {
                assert!(output.is_none());
                assert_eq!(offline, Some(PathBuf::from("dump.json")));
                assert!(preview);
            }
            Commands::Check { .. } => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["entrypress", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => assert!(strict),
            Commands::Build { .. } => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["entrypress", "-vvv", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["entrypress", "--config", "site/entrypress.toml", "check"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, PathBuf::from("site/entrypress.toml"));
    }
}
