//! The tools: collection assembly, name adjustment, weight ladders and glyph patching

pub mod batch;
pub mod collection;
pub mod patch;
pub mod rename;
pub mod weights;

pub use batch::BatchReport;
pub use collection::{derive_collection_basename, infer_collection_type, plan_collection, sort_fonts, write_collection};
pub use rename::process_font;
pub use weights::{compose_weight_basename, generate_weight_instances, process_font_all_weights, WeightJob};
