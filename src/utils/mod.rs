pub mod file;
pub mod logging;
pub mod naming;
pub mod process;

pub use file::{discover_fonts, ensure_directory_exists, safe_move_file, snapshot_files};
pub use logging::init_logging;
pub use naming::{humanize_stem, sanitize_filename, tokenize_stem};
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
