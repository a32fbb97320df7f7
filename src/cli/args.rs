use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::{CollectionType, Config, Verbosity};
use crate::organizer::weights::parse_weight_offset;

/// fontherd command line
///
/// Examples:
///   fontherd collection fonts/ --dry-run        # Show the planned TTC/OTC
///   fontherd rename Cool-bold.ttf -o renamed/   # Rewrite names from the filename
///   fontherd weights Cool-VF.ttf -w +10         # Weight ladder shifted by 10
///   fontherd nerdify fonts/ -o patched/         # Run the Nerd Fonts patcher
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "fontherd",
    version,
    about = "Normalize font names, build collections and weight ladders"
)]
pub struct Cli {
    /// Increase logging
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Reduce logging
    #[clap(short, long, global = true)]
    pub quiet: bool,

    /// Weight vocabulary (default: ./fontweights.toml)
    #[clap(long = "weights", global = true, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Combine fonts into a TTC/OTC collection
    Collection(CollectionArgs),
    /// Update internal font names from a humanized filename
    Rename(RenameArgs),
    /// Generate the standard weight ladder from variable fonts
    Weights(WeightsArgs),
    /// Patch fonts with Nerd Fonts glyphs
    Nerdify(NerdifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CollectionArgs {
    /// Font files or directories
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output directory
    #[clap(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Force the collection type
    #[clap(long = "type", value_enum, ignore_case = true)]
    pub kind: Option<CollectionType>,

    /// Override the collection file name (no extension)
    #[clap(long)]
    pub name: Option<String>,

    /// Print the plan without writing files
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Font files or directories to search for .ttf files
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output directory (default: rename in place)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct WeightsArgs {
    /// Font files or directories to search for .ttf files
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,

    /// Offset applied to each standard weight, e.g. +10 or -10
    #[clap(
        short = 'w',
        long = "weight-offset",
        default_value = "0",
        allow_hyphen_values = true,
        value_parser = offset_value
    )]
    pub weight_offset: f64,

    /// Output directory
    #[clap(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Python interpreter with fontTools installed
    #[clap(long, default_value = "python3")]
    pub python: String,
}

#[derive(Args, Debug, Clone)]
pub struct NerdifyArgs {
    /// Font files or directories to process
    #[clap(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output directory
    #[clap(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Existing FontPatcher directory (default: ./FontPatcher)
    #[clap(long = "fontpatcher-dir")]
    pub fontpatcher_dir: Option<PathBuf>,

    /// fontforge executable
    #[clap(long, default_value = "fontforge")]
    pub fontforge: String,
}

fn offset_value(value: &str) -> Result<f64, String> {
    parse_weight_offset(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Run-wide settings from the global flags
    pub fn config(&self) -> Config {
        Config::new(Verbosity::from_flags(self.quiet, self.verbose), self.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_offsets_parse() {
        let cli = Cli::try_parse_from(["fontherd", "weights", "a.ttf", "-w", "-10"]).unwrap();
        match cli.command {
            Command::Weights(args) => assert_eq!(args.weight_offset, -10.0),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn collection_type_and_globals() {
        let cli = Cli::try_parse_from([
            "fontherd",
            "collection",
            "fonts",
            "--type",
            "OTC",
            "--dry-run",
            "-v",
            "--weights",
            "w.toml",
        ])
        .unwrap();
        assert_eq!(cli.config().verbosity, Verbosity::Verbose);
        assert_eq!(cli.config().weights_path, PathBuf::from("w.toml"));
        match cli.command {
            Command::Collection(args) => {
                assert_eq!(args.kind, Some(CollectionType::Otc));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["fontherd", "rename"]).is_err());
        assert!(Cli::try_parse_from(["fontherd", "weights", "a.ttf", "-w", "heavy"]).is_err());
    }
}
