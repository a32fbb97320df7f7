//! Rewriting of identity name records and style flags.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::font::sfnt::{parse_font, patch_head, patch_os2, replace_tables, NameTable, HEAD, NAME, OS2};
use crate::models::{NameEntry, StyleFlags};

pub const FAMILY: u16 = 1;
pub const SUBFAMILY: u16 = 2;
pub const FULL_NAME: u16 = 4;
pub const POSTSCRIPT_NAME: u16 = 6;
pub const TYPOGRAPHIC_FAMILY: u16 = 16;
pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;

/// `(platform, encoding, language)` of the Windows Unicode BMP English records
pub const WINDOWS_ENGLISH: (u16, u16, u16) = (3, 1, 0x409);
/// `(platform, encoding, language)` of the Mac Roman English records
pub const MAC_ROMAN_ENGLISH: (u16, u16, u16) = (1, 0, 0);

/// Write access to a font's `name` table and style bits
pub trait NameTableWriter {
    /// Queue a name record for the font at `path`
    fn set_name(&mut self, path: &Path, entry: NameEntry) -> Result<()>;

    /// Queue OS/2 and head style bits for the font at `path`
    fn set_style(&mut self, path: &Path, flags: StyleFlags) -> Result<()>;

    /// Apply every queued change to the font at `path`
    fn save(&mut self, path: &Path) -> Result<()>;
}

#[derive(Debug, Default)]
struct PendingEdits {
    names: Vec<NameEntry>,
    style: Option<StyleFlags>,
}

/// Writer that rebuilds the sfnt with an updated `name` table
#[derive(Debug, Default)]
pub struct SfntNameWriter {
    pending: HashMap<PathBuf, PendingEdits>,
}

impl SfntNameWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameTableWriter for SfntNameWriter {
    fn set_name(&mut self, path: &Path, entry: NameEntry) -> Result<()> {
        self.pending.entry(path.to_path_buf()).or_default().names.push(entry);
        Ok(())
    }

    fn set_style(&mut self, path: &Path, flags: StyleFlags) -> Result<()> {
        self.pending.entry(path.to_path_buf()).or_default().style = Some(flags);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let Some(edits) = self.pending.remove(path) else {
            log::debug!("No pending name edits for {}", path.display());
            return Ok(());
        };

        let data = fs::read(path)?;
        let in_file = |e: Error| match e {
            Error::Font(msg) => Error::Font(format!("{}: {}", path.display(), msg)),
            other => other,
        };
        let font = parse_font(&data).map_err(in_file)?;

        let mut names = NameTable::from_font(&font).map_err(in_file)?;
        for entry in &edits.names {
            names.set(entry);
        }

        let mut replacements = BTreeMap::new();
        replacements.insert(NAME, names.to_bytes().map_err(in_file)?);
        if let Some(flags) = edits.style {
            if let Some(raw) = font.table_data(OS2) {
                let mut os2 = raw.as_bytes().to_vec();
                if patch_os2(&mut os2, &flags) {
                    replacements.insert(OS2, os2);
                }
            }
            if let Some(raw) = font.table_data(HEAD) {
                let mut head = raw.as_bytes().to_vec();
                if patch_head(&mut head, &flags) {
                    replacements.insert(HEAD, head);
                }
            }
        }

        let rebuilt = replace_tables(&data, replacements)?;
        fs::write(path, rebuilt)?;
        log::debug!("Wrote {} name records to {}", edits.names.len(), path.display());
        Ok(())
    }
}

/// The same value under the given name IDs, for both Windows and Mac records
pub fn identity_records(values: &[(u16, &str)]) -> Vec<NameEntry> {
    [WINDOWS_ENGLISH, MAC_ROMAN_ENGLISH]
        .into_iter()
        .flat_map(|(platform_id, encoding_id, language_id)| {
            values.iter().map(move |(name_id, value)| NameEntry {
                name_id: *name_id,
                platform_id,
                encoding_id,
                language_id,
                value: value.to_string(),
            })
        })
        .collect()
}
