//! Command-line interface definitions

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bitable-cli")]
#[command(version, about = "Extract audit and inspection data from bitable Excel attachments")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reference data file (TOML) replacing the built-in factory and product tables
    #[arg(long, global = true, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write QSA / QSA+ audit scores to the source row and create issue records
    Qsa(PipelineArgs),
    /// Write per-factory deviation and wing median summaries to the source row
    Monitor(PipelineArgs),
    /// Create one record per unit-weight group in the target table
    Weight(PipelineArgs),
    /// Show the sheets of a local workbook
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Read this local workbook instead of the row's attachments
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Print the planned writes instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Workbook to inspect (.xlsx or .xls)
    pub file: PathBuf,

    /// Only this sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Report where this text first appears
    #[arg(long)]
    pub marker: Option<String>,

    /// Print every non-empty row
    #[arg(long)]
    pub dump: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pipeline_flags() {
        let cli = Cli::parse_from(["bitable-cli", "-v", "weight", "--file", "单重.xlsx", "--dry-run"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Weight(args) => {
                assert_eq!(args.file, Some(PathBuf::from("单重.xlsx")));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_inspect_with_global_reference() {
        let cli = Cli::parse_from([
            "bitable-cli",
            "inspect",
            "report.xlsx",
            "--marker",
            "符合等级",
            "--reference",
            "ref.toml",
        ]);
        assert_eq!(cli.reference, Some(PathBuf::from("ref.toml")));
        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.marker.as_deref(), Some("符合等级"));
                assert!(!args.dump);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
