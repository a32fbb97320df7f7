use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::font::metadata::{resolve_identity, FontMetadataProvider};
use crate::font::sfnt::{build_collection, sniff_path};
use crate::font::style::StyleMatcher;
use crate::font::weight::WeightVocabulary;
use crate::models::{CollectionPlan, CollectionType, Flavor};
use crate::utils::file::ensure_directory_exists;
use crate::utils::naming::{common_token_prefix, sanitize_filename, split_stem, strip_non_family_tokens, tokenize_stem};

/// Sort weight for fonts whose weight is unknown; after every standard weight
const UNKNOWN_WEIGHT: u16 = 1000;

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Derive the base name of a collection.
///
/// A single embedded family shared by every font that has one wins as is.
/// Otherwise the common prefix of the filename tokens is used, in the first
/// file's original casing, then the parent directory or stem of the first font.
pub fn derive_collection_basename<P>(fonts: &[PathBuf], provider: &P) -> String
where
    P: FontMetadataProvider + ?Sized,
{
    let mut families = HashSet::new();
    for font in fonts {
        match provider.read_family_and_subfamily(font) {
            Ok((Some(family), _)) => {
                let family = family.split_whitespace().collect::<Vec<_>>().join(" ");
                if !family.is_empty() {
                    families.insert(family);
                }
            }
            Ok((None, _)) => {}
            Err(e) => log::debug!("No embedded family for {}: {}", font.display(), e),
        }
    }
    if families.len() == 1 {
        if let Some(family) = families.into_iter().next() {
            return family;
        }
    }

    let token_lists: Vec<Vec<String>> = fonts
        .iter()
        .map(|font| strip_non_family_tokens(&tokenize_stem(&file_stem(font))))
        .collect();
    let prefix = common_token_prefix(&token_lists);
    let Some(first) = fonts.first() else {
        return String::new();
    };

    if !prefix.is_empty() {
        let first_stem = file_stem(first);
        let raw_tokens = split_stem(&first_stem);
        let mut cursor = 0;
        let mut words = Vec::with_capacity(prefix.len());
        for token in &prefix {
            while cursor < raw_tokens.len() && raw_tokens[cursor].to_lowercase() != *token {
                cursor += 1;
            }
            match raw_tokens.get(cursor) {
                Some(raw) => {
                    words.push(raw.to_string());
                    cursor += 1;
                }
                None => words.push(token.clone()),
            }
        }
        return sanitize_filename(&words.join(" "));
    }

    let parent = first
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if parent.is_empty() {
        sanitize_filename(&file_stem(first))
    } else {
        sanitize_filename(&parent)
    }
}

fn describe_flavors(flavors: &BTreeSet<Flavor>) -> String {
    flavors
        .iter()
        .map(Flavor::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Pick the container type from the flavors of the inputs.
///
/// A forced type must match the inputs' flavor set exactly; without one, the
/// inputs must all share a single flavor.
pub fn infer_collection_type(fonts: &[PathBuf], forced: Option<CollectionType>) -> Result<CollectionType> {
    if fonts.is_empty() {
        return Err(Error::Processing("no input fonts".to_string()));
    }
    let flavors = fonts
        .iter()
        .map(|font| sniff_path(font))
        .collect::<Result<BTreeSet<Flavor>>>()?;

    if let Some(kind) = forced {
        let required = BTreeSet::from([kind.required_flavor()]);
        if flavors != required {
            return Err(Error::TypeConflict {
                forced: kind.to_string(),
                found: describe_flavors(&flavors),
            });
        }
        return Ok(kind);
    }

    match flavors.into_iter().collect::<Vec<_>>().as_slice() {
        [flavor] => Ok(CollectionType::for_flavor(*flavor)),
        _ => Err(Error::MixedInput),
    }
}

/// Order fonts by weight, Roman before Italic, then lowercase file name.
///
/// Keys are computed in parallel; the order is the same as a sequential pass.
pub fn sort_fonts<F>(fonts: &[PathBuf], weight_and_italic: F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> (Option<u16>, bool) + Sync,
{
    let mut keyed: Vec<((u16, u8, String), PathBuf)> = fonts
        .par_iter()
        .map(|font| {
            let (weight, italic) = weight_and_italic(font);
            let key = (
                weight.unwrap_or(UNKNOWN_WEIGHT),
                u8::from(italic),
                file_name_lower(font),
            );
            (key, font.clone())
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, font)| font).collect()
}

/// Resolve type, base name and member order of a collection
pub fn plan_collection<P>(
    fonts: &[PathBuf],
    forced: Option<CollectionType>,
    name: Option<&str>,
    provider: &P,
    vocab: &WeightVocabulary,
) -> Result<CollectionPlan>
where
    P: FontMetadataProvider + Sync + ?Sized,
{
    let kind = infer_collection_type(fonts, forced)?;
    let base = match name {
        Some(name) => name.to_string(),
        None => derive_collection_basename(fonts, provider),
    };

    let matcher = StyleMatcher::new();
    let ordered = sort_fonts(fonts, |font| match resolve_identity(font, provider, vocab, &matcher) {
        Ok(identity) => (identity.weight, identity.italic),
        Err(e) => {
            log::debug!("Sorting {} without metadata: {}", font.display(), e);
            (None, false)
        }
    });

    Ok(CollectionPlan {
        fonts: ordered,
        kind,
        basename: sanitize_filename(&base),
    })
}

/// Write the planned collection into `out_dir` and return its path.
///
/// The file appears only once it is complete.
pub fn write_collection(plan: &CollectionPlan, out_dir: &Path) -> Result<PathBuf> {
    let required = plan.kind.required_flavor();
    let mut members = Vec::with_capacity(plan.fonts.len());
    for font in &plan.fonts {
        let flavor = sniff_path(font)?;
        if flavor != required {
            return Err(Error::TypeConflict {
                forced: plan.kind.to_string(),
                found: flavor.to_string(),
            });
        }
        members.push(fs::read(font)?);
    }
    let data = build_collection(&members)?;

    ensure_directory_exists(out_dir)?;
    let out_path = out_dir.join(plan.file_name());
    let mut staged = tempfile::NamedTempFile::new_in(out_dir)?;
    staged.write_all(&data)?;
    staged.persist(&out_path).map_err(|e| Error::Io(e.error))?;
    log::debug!("Wrote {} bytes to {}", data.len(), out_path.display());
    Ok(out_path)
}

/// Lines printed for `--dry-run`
pub fn describe_plan(plan: &CollectionPlan) -> Vec<String> {
    let mut lines = vec![format!(
        "Would create collection: name={} type={} count={}",
        plan.file_name(),
        plan.kind,
        plan.fonts.len()
    )];
    lines.extend(plan.fonts.iter().map(|font| {
        format!(
            "  include: {}",
            font.file_name().map(|s| s.to_string_lossy()).unwrap_or_default()
        )
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::sfnt::tests::synthetic_font;
    use crate::font::sfnt::parse_font;
    use crate::models::AxisRange;
    use pretty_assertions::assert_eq;

    struct NoNames;

    impl FontMetadataProvider for NoNames {
        fn read_family_and_subfamily(&self, _path: &Path) -> Result<(Option<String>, Option<String>)> {
            Ok((None, None))
        }

        fn read_weight_and_italic(&self, _path: &Path) -> Result<(Option<u16>, bool)> {
            Ok((None, false))
        }

        fn read_axis_range(&self, _path: &Path) -> Result<Option<AxisRange>> {
            Ok(None)
        }
    }

    fn vocab() -> WeightVocabulary {
        WeightVocabulary::from_toml_str("[weights]\nRegular = 400\nBold = 700\n").unwrap()
    }

    #[test]
    fn prefix_keeps_original_casing() {
        let fonts = vec![
            PathBuf::from("/x/CoolSans-VF-Italic.ttf"),
            PathBuf::from("/x/coolsans-Bold.ttf"),
        ];
        assert_eq!(derive_collection_basename(&fonts, &NoNames), "CoolSans");
    }

    #[test]
    fn falls_back_to_parent_directory() {
        let fonts = vec![
            PathBuf::from("/fonts/My Family/Alpha.ttf"),
            PathBuf::from("/fonts/My Family/Beta.ttf"),
        ];
        assert_eq!(derive_collection_basename(&fonts, &NoNames), "My_Family");
    }

    #[test]
    fn bare_filenames_fall_back_to_first_stem() {
        let fonts = vec![PathBuf::from("Alpha One.ttf"), PathBuf::from("Beta.ttf")];
        assert_eq!(derive_collection_basename(&fonts, &NoNames), "Alpha_One");
    }

    #[test]
    fn unknown_weights_sort_last() {
        let fonts = vec![
            PathBuf::from("c.ttf"),
            PathBuf::from("B.ttf"),
            PathBuf::from("a.ttf"),
        ];
        let sorted = sort_fonts(&fonts, |p| match p.to_str() {
            Some("a.ttf") => (None, false),
            _ => (Some(400), false),
        });
        assert_eq!(
            sorted,
            vec![PathBuf::from("B.ttf"), PathBuf::from("c.ttf"), PathBuf::from("a.ttf")]
        );
    }

    #[test]
    fn forced_type_must_match_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("a.ttf");
        fs::write(&font, synthetic_font([0, 1, 0, 0], None)).unwrap();
        let fonts = vec![font];

        assert_eq!(infer_collection_type(&fonts, Some(CollectionType::Ttc)).unwrap(), CollectionType::Ttc);
        assert!(matches!(
            infer_collection_type(&fonts, Some(CollectionType::Otc)),
            Err(Error::TypeConflict { .. })
        ));
        assert!(matches!(infer_collection_type(&[], None), Err(Error::Processing(_))));
    }

    #[test]
    fn plan_and_write_collection() {
        let dir = tempfile::tempdir().unwrap();
        let regular = dir.path().join("Cool-Regular.ttf");
        let bold = dir.path().join("Cool-Bold.ttf");
        fs::write(&regular, synthetic_font([0, 1, 0, 0], None)).unwrap();
        fs::write(&bold, synthetic_font([0, 1, 0, 0], None)).unwrap();

        let vocab = vocab();
        let plan = plan_collection(&[bold.clone(), regular.clone()], None, None, &NoNames, &vocab).unwrap();
        assert_eq!(plan.basename, "Cool");
        assert_eq!(plan.fonts, vec![regular, bold]);
        assert_eq!(describe_plan(&plan)[0], "Would create collection: name=Cool.ttc type=ttc count=2");

        let out = dir.path().join("out");
        let written = write_collection(&plan, &out).unwrap();
        assert_eq!(written, out.join("Cool.ttc"));
        let data = fs::read(&written).unwrap();
        assert_eq!(&data[0..4], b"ttcf");
        assert!(parse_font(&data).is_err());
    }
}
