use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::font::style::{weight_and_style_from_phrase, StyleMatcher, DEFAULT_SUBFAMILY};
use crate::font::weight::{normalize_phrase, WeightVocabulary};
use crate::font::writer::{
    identity_records, NameTableWriter, FAMILY, FULL_NAME, POSTSCRIPT_NAME, SUBFAMILY, TYPOGRAPHIC_FAMILY,
    TYPOGRAPHIC_SUBFAMILY,
};
use crate::models::{FontIdentity, StyleFlags};
use crate::utils::file::ensure_directory_exists;
use crate::utils::naming::{humanize_stem, make_clean_stem, ps_name};

const DEFAULT_WEIGHT_CLASS: u16 = 400;

/// Identity derived from a filename stem alone
pub fn identity_from_stem(stem: &str, matcher: &StyleMatcher, vocab: &WeightVocabulary) -> FontIdentity {
    let (family, subfamily) = matcher.split_family_subfamily(&humanize_stem(stem));
    let subfamily = if subfamily.is_empty() {
        DEFAULT_SUBFAMILY.to_string()
    } else {
        subfamily
    };
    let (weight, italic) = weight_and_style_from_phrase(&subfamily, vocab);
    FontIdentity {
        family,
        subfamily,
        weight: Some(weight.unwrap_or(DEFAULT_WEIGHT_CLASS)),
        italic,
    }
}

/// OS/2 and head bits for an identity; bold and regular follow the RIBBI names
pub fn style_flags(identity: &FontIdentity) -> StyleFlags {
    let sub = normalize_phrase(&identity.subfamily);
    StyleFlags {
        weight_class: identity.weight.unwrap_or(DEFAULT_WEIGHT_CLASS),
        italic: identity.italic,
        bold: sub == "bold" || sub == "bold italic",
        regular: sub == "regular" && !identity.italic,
    }
}

/// Queue the six identity records for both platforms plus the style bits
pub fn write_identity<W>(writer: &mut W, path: &Path, identity: &FontIdentity) -> Result<()>
where
    W: NameTableWriter + ?Sized,
{
    let full = format!("{} {}", identity.family, identity.subfamily).trim().to_string();
    let postscript = ps_name(&identity.family, &identity.subfamily);
    let values = [
        (TYPOGRAPHIC_FAMILY, identity.family.as_str()),
        (TYPOGRAPHIC_SUBFAMILY, identity.subfamily.as_str()),
        (FAMILY, identity.family.as_str()),
        (SUBFAMILY, identity.subfamily.as_str()),
        (FULL_NAME, full.as_str()),
        (POSTSCRIPT_NAME, postscript.as_str()),
    ];
    for entry in identity_records(&values) {
        writer.set_name(path, entry)?;
    }
    writer.set_style(path, style_flags(identity))
}

/// Whether two paths name the same file, e.g. on a case-insensitive filesystem
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rename one font after its filename and rewrite its name records.
///
/// Without `out_dir` the file is renamed to the clean stem first and edited
/// in place; with one, the edited copy lands there. Returns the written path.
pub fn process_font<W>(
    path: &Path,
    out_dir: Option<&Path>,
    writer: &mut W,
    matcher: &StyleMatcher,
    vocab: &WeightVocabulary,
) -> Result<PathBuf>
where
    W: NameTableWriter + ?Sized,
{
    let stem = path
        .file_stem()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?
        .to_string_lossy()
        .into_owned();
    let identity = identity_from_stem(&stem, matcher, vocab);
    let mut file_name = make_clean_stem(&identity.family, &identity.subfamily);
    if let Some(ext) = path.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }
    log::debug!(
        "{} -> family={:?} subfamily={:?} weight={:?} italic={}",
        path.display(),
        identity.family,
        identity.subfamily,
        identity.weight,
        identity.italic
    );

    let target = match out_dir {
        None => {
            let renamed = path.with_file_name(&file_name);
            if renamed != path {
                if renamed.exists() && !same_file(path, &renamed) {
                    return Err(Error::Processing(format!(
                        "{} already exists; not overwriting it with {}",
                        renamed.display(),
                        path.display()
                    )));
                }
                fs::rename(path, &renamed)?;
            }
            renamed
        }
        Some(dir) => {
            ensure_directory_exists(dir)?;
            let copy = dir.join(&file_name);
            fs::copy(path, &copy)?;
            copy
        }
    };

    write_identity(writer, &target, &identity)?;
    writer.save(&target)?;
    Ok(target)
}
