use std::fs;
use std::path::Path;

use ttf_parser::{name_id, Face, PlatformId, Tag};

use crate::error::{Error, Result};
use crate::font::sfnt::head_mac_style_italic;
use crate::font::style::{weight_and_style_from_names, StyleMatcher, DEFAULT_SUBFAMILY};
use crate::font::weight::WeightVocabulary;
use crate::models::{AxisRange, FontIdentity};
use crate::utils::naming::humanize_stem;

/// Read access to the metadata embedded in a font file
pub trait FontMetadataProvider {
    /// Family and subfamily labels, typographic records preferred over legacy ones
    fn read_family_and_subfamily(&self, path: &Path) -> Result<(Option<String>, Option<String>)>;

    /// OS/2 weight class and italic flag
    fn read_weight_and_italic(&self, path: &Path) -> Result<(Option<u16>, bool)>;

    /// Range of the `wght` axis, present only for variable fonts declaring one
    fn read_axis_range(&self, path: &Path) -> Result<Option<AxisRange>>;
}

/// Metadata provider reading font files with ttf-parser
#[derive(Debug, Default, Clone, Copy)]
pub struct TtfMetadata;

fn load(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

fn parse_face<'a>(data: &'a [u8], path: &Path) -> Result<Face<'a>> {
    Face::parse(data, 0).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))
}

/// First non-empty record for a name ID, Windows records before Mac ones
fn find_name(face: &Face<'_>, id: u16) -> Option<String> {
    [PlatformId::Windows, PlatformId::Macintosh]
        .into_iter()
        .find_map(|platform| {
            face.names()
                .into_iter()
                .filter(|name| name.name_id == id && name.platform_id == platform)
                .filter_map(|name| name.to_string())
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        })
}

impl FontMetadataProvider for TtfMetadata {
    fn read_family_and_subfamily(&self, path: &Path) -> Result<(Option<String>, Option<String>)> {
        let data = load(path)?;
        let face = parse_face(&data, path)?;

        let family = find_name(&face, name_id::TYPOGRAPHIC_FAMILY)
            .or_else(|| find_name(&face, name_id::FAMILY));
        let subfamily = find_name(&face, name_id::TYPOGRAPHIC_SUBFAMILY)
            .or_else(|| find_name(&face, name_id::SUBFAMILY));
        log::debug!(
            "{}: family={:?} subfamily={:?}",
            path.display(),
            family,
            subfamily
        );
        Ok((family, subfamily))
    }

    fn read_weight_and_italic(&self, path: &Path) -> Result<(Option<u16>, bool)> {
        let data = load(path)?;
        let face = parse_face(&data, path)?;

        let weight = face.tables().os2.map(|_| face.weight().to_number());
        let italic = face.is_italic()
            || face
                .raw_face()
                .table(Tag::from_bytes(b"head"))
                .map_or(false, head_mac_style_italic);
        Ok((weight, italic))
    }

    fn read_axis_range(&self, path: &Path) -> Result<Option<AxisRange>> {
        let data = load(path)?;
        let face = parse_face(&data, path)?;

        let wght = Tag::from_bytes(b"wght");
        Ok(face
            .variation_axes()
            .into_iter()
            .find(|axis| axis.tag == wght)
            .map(|axis| AxisRange {
                min: f64::from(axis.min_value),
                max: f64::from(axis.max_value),
            }))
    }
}

/// Combine embedded names with filename inference into one identity.
///
/// Family and subfamily come from a single source: the embedded names when a
/// family is present (subfamily defaulting to Regular), the filename otherwise.
/// Weight comes from the names first and from the OS/2 weight class otherwise;
/// italic is set when either says so.
pub fn resolve_identity<P>(
    path: &Path,
    provider: &P,
    vocab: &WeightVocabulary,
    matcher: &StyleMatcher,
) -> Result<FontIdentity>
where
    P: FontMetadataProvider + ?Sized,
{
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (embedded_family, embedded_subfamily) = provider.read_family_and_subfamily(path)?;
    let (name_weight, name_italic) = weight_and_style_from_names(
        embedded_family.as_deref(),
        embedded_subfamily.as_deref(),
        &stem,
        vocab,
    );
    let (table_weight, table_italic) = match name_weight {
        Some(_) => (None, false),
        None => provider.read_weight_and_italic(path)?,
    };

    let (family, subfamily) = match embedded_family.filter(|f| !f.is_empty()) {
        Some(family) => {
            let subfamily = embedded_subfamily
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUBFAMILY.to_string());
            (family, subfamily)
        }
        None => matcher.split_family_subfamily(&humanize_stem(&stem)),
    };

    Ok(FontIdentity {
        family,
        subfamily,
        weight: name_weight.or(table_weight),
        italic: name_italic || table_italic,
    })
}
