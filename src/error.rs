use std::io;
use std::path::PathBuf;

/// Custom error type for fontherd
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO operations errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Weight vocabulary or argument configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Font header did not match any known sfnt signature
    #[error("Unrecognized sfnt header for {}", .0.display())]
    UnrecognizedFormat(PathBuf),

    /// TrueType and CFF inputs mixed without a forced collection type
    #[error("Mixed TTF/OTF inputs; specify --type or filter inputs")]
    MixedInput,

    /// Forced collection type does not match the inputs
    #[error("Forced type {forced} conflicts with input types {found}")]
    TypeConflict {
        /// Requested container type
        forced: String,
        /// Flavors found among the inputs
        found: String,
    },

    /// Font table parsing or rewriting errors
    #[error("Font error: {0}")]
    Font(String),

    /// Per-item processing failure
    #[error("{0}")]
    Processing(String),

    /// External tool exited with a non-zero status
    #[error("{tool} failed (rc={code}): {stderr}")]
    ExternalTool {
        /// Tool name or program path
        tool: String,
        /// Exit status code
        code: i32,
        /// Captured standard error, or standard output when stderr was empty
        stderr: String,
    },

    /// A required external program or resource is missing
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Invalid file or directory path
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type alias for fontherd operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_tool_message_includes_stderr() {
        let err = Error::ExternalTool {
            tool: "fontforge".into(),
            code: 3,
            stderr: "boom".into(),
        };
        assert_eq!(err.to_string(), "fontforge failed (rc=3): boom");
    }
}
