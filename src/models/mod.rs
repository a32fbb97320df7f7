//! Plain data types shared by the tools

pub mod config;
pub mod font;

pub use config::{Config, Verbosity};
pub use font::{
    AxisRange, CollectionPlan, CollectionType, Flavor, FontIdentity, NameEntry, StyleFlags,
    StyleToken, WeightTarget,
};
