use std::fmt;
use std::path::PathBuf;

use log::LevelFilter;

use crate::font::weight::WeightVocabulary;

/// Run-wide settings shared by every tool
#[derive(Debug, Clone)]
pub struct Config {
    /// How chatty logging should be
    pub verbosity: Verbosity,
    /// Location of the weight vocabulary
    pub weights_path: PathBuf,
}

/// Logging verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Informational output
    Normal,
    /// Debug output
    Verbose,
}

impl Verbosity {
    /// Pick a verbosity from the `-q` / `-v` flags; `-v` wins
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    /// Matching `log` level filter
    pub fn level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Warn,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Quiet => write!(f, "quiet"),
            Verbosity::Normal => write!(f, "normal"),
            Verbosity::Verbose => write!(f, "verbose"),
        }
    }
}

impl Config {
    /// Create a configuration, falling back to `./fontweights.toml`
    pub fn new(verbosity: Verbosity, weights_path: Option<PathBuf>) -> Self {
        Self {
            verbosity,
            weights_path: weights_path.unwrap_or_else(WeightVocabulary::default_path),
        }
    }
}
