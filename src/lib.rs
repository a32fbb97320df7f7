//! fontherd: font metadata normalization driving collection assembly, name
//! adjustment, weight-ladder synthesis and glyph patching.

pub mod cli;
pub mod error;
pub mod font;
pub mod models;
pub mod organizer;
pub mod utils;

pub use error::{Error, Result};
