//! Font reading, name inference and binary rewriting

pub mod metadata;
pub mod sfnt;
pub mod style;
pub mod weight;
pub mod writer;

pub use metadata::{resolve_identity, FontMetadataProvider, TtfMetadata};
pub use style::{weight_and_style_from_names, weight_and_style_from_phrase, StyleMatcher};
pub use weight::WeightVocabulary;
pub use writer::{identity_records, NameTableWriter, SfntNameWriter};
