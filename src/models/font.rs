use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Classification of a lowercase filename token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleToken {
    /// A weight word known to the vocabulary
    WeightPhrase,
    /// `italic` or `oblique`
    ItalicMarker,
    /// A version number such as `0902` or `v1.2`
    VersionMarker,
    /// A variable-font marker such as `vf`
    ToolMarker,
    /// Anything else
    Plain,
}

/// Resolved description of one font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontIdentity {
    /// Font family name
    pub family: String,
    /// Font subfamily (style variant)
    pub subfamily: String,
    /// Numeric weight class, when known
    pub weight: Option<u16>,
    /// Whether the font is italic
    pub italic: bool,
}

/// Underlying outline technology of an sfnt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flavor {
    /// `glyf` outlines, header `00 01 00 00` or `true`
    TrueType,
    /// CFF outlines, header `OTTO`
    Cff,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::TrueType => write!(f, "ttf"),
            Flavor::Cff => write!(f, "otf"),
        }
    }
}

/// Container kind for a font collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CollectionType {
    /// TrueType collection
    Ttc,
    /// OpenType (CFF) collection
    Otc,
}

impl CollectionType {
    /// Flavor every member of this collection must have
    pub fn required_flavor(self) -> Flavor {
        match self {
            CollectionType::Ttc => Flavor::TrueType,
            CollectionType::Otc => Flavor::Cff,
        }
    }

    /// Collection type holding fonts of the given flavor
    pub fn for_flavor(flavor: Flavor) -> Self {
        match flavor {
            Flavor::TrueType => CollectionType::Ttc,
            Flavor::Cff => CollectionType::Otc,
        }
    }

    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            CollectionType::Ttc => ".ttc",
            CollectionType::Otc => ".otc",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionType::Ttc => write!(f, "ttc"),
            CollectionType::Otc => write!(f, "otc"),
        }
    }
}

impl FromStr for CollectionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ttc" => Ok(CollectionType::Ttc),
            "otc" => Ok(CollectionType::Otc),
            _ => Err(Error::Config("--type must be 'ttc' or 'otc'".to_string())),
        }
    }
}

/// Ordered members of a collection plus its container kind and base name
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPlan {
    /// Member fonts in collection order
    pub fonts: Vec<PathBuf>,
    /// Container kind
    pub kind: CollectionType,
    /// Sanitized output file stem
    pub basename: String,
}

impl CollectionPlan {
    /// Output file name including extension
    pub fn file_name(&self) -> String {
        format!("{}{}", self.basename, self.kind.extension())
    }
}

/// Minimum and maximum of a variable font's weight axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Clamp a value into the range
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Whether a value lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One entry of a weight ladder
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTarget {
    /// Canonical weight name, e.g. `Bold`
    pub name: String,
    /// Standard value from the vocabulary
    pub base_value: u16,
    /// Base plus offset, clamped to the axis range when known
    pub resolved_value: f64,
    /// Offset applied to every standard weight
    pub offset: f64,
}

/// A single name table record to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub name_id: u16,
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub value: String,
}

/// Style bits mirrored into OS/2 and head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleFlags {
    /// OS/2 usWeightClass
    pub weight_class: u16,
    pub italic: bool,
    pub bold: bool,
    pub regular: bool,
}
