//! sfnt plumbing on top of write-fonts: header sniffing, `name` table edits,
//! font rebuilding and TTC/OTC assembly.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use write_fonts::from_obj::ToOwnedTable;
use write_fonts::read::tables::name::{Encoding, MacRomanMapping, Name as RawName};
use write_fonts::read::{FontData, FontRead, FontRef};
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::types::{NameId, Tag};
use write_fonts::FontBuilder;

use crate::error::{Error, Result};
use crate::models::{Flavor, NameEntry, StyleFlags};

pub const HEAD: Tag = Tag::new(b"head");
pub const NAME: Tag = Tag::new(b"name");
pub const OS2: Tag = Tag::new(b"OS/2");

const TRUETYPE_VERSION: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
const TTCF: &[u8; 4] = b"ttcf";
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;
const TABLE_RECORD_LEN: usize = 16;

/// Map the first four bytes of a font file to its flavor
pub fn sniff_flavor(header: &[u8]) -> Option<Flavor> {
    match header.get(..4)? {
        b"OTTO" => Some(Flavor::Cff),
        b"true" => Some(Flavor::TrueType),
        h if h == TRUETYPE_VERSION => Some(Flavor::TrueType),
        _ => None,
    }
}

/// Read the header of a font file and sniff its flavor
pub fn sniff_path(path: &Path) -> Result<Flavor> {
    let mut header = [0u8; 4];
    let mut file = File::open(path)?;
    if file.read_exact(&mut header).is_err() {
        return Err(Error::UnrecognizedFormat(path.to_path_buf()));
    }
    sniff_flavor(&header).ok_or_else(|| Error::UnrecognizedFormat(path.to_path_buf()))
}

/// Parse a single font; collections are rejected
pub fn parse_font(data: &[u8]) -> Result<FontRef<'_>> {
    if data.get(..4) == Some(TTCF.as_slice()) {
        return Err(Error::Font("font collections are not supported as input".to_string()));
    }
    FontRef::new(data).map_err(|e| Error::Font(format!("unreadable sfnt: {}", e)))
}

/// Sum of big-endian u32 words, zero padded
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(4);
    for word in &mut chunks {
        sum = sum.wrapping_add(BigEndian::read_u32(word));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut last = [0u8; 4];
        last[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(BigEndian::read_u32(&last));
    }
    sum
}

/// Load tables into a builder, with `head.checkSumAdjustment` cleared
fn builder_for(tables: &mut BTreeMap<Tag, Vec<u8>>) -> FontBuilder<'_> {
    if let Some(head) = tables.get_mut(&HEAD).filter(|h| h.len() >= 12) {
        head[8..12].fill(0);
    }
    let tables: &BTreeMap<Tag, Vec<u8>> = tables;
    let mut builder = FontBuilder::new();
    for (tag, data) in tables {
        builder.add_raw(*tag, data.as_slice());
    }
    builder
}

/// Restore the sfnt version and fill in `head.checkSumAdjustment`
fn finish_font(sfnt_version: u32, mut out: Vec<u8>) -> Vec<u8> {
    out[0..4].copy_from_slice(&sfnt_version.to_be_bytes());
    let head_offset = FontRef::new(&out).ok().and_then(|font| {
        font.table_directory
            .table_records()
            .iter()
            .find(|record| record.tag() == HEAD && record.length() >= 12)
            .map(|record| record.offset() as usize)
    });
    if let Some(offset) = head_offset {
        let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(&out));
        BigEndian::write_u32(&mut out[offset + 8..offset + 12], adjustment);
    }
    out
}

/// Assemble a single-font sfnt from raw tables
pub fn build_font(sfnt_version: u32, mut tables: BTreeMap<Tag, Vec<u8>>) -> Vec<u8> {
    let out = builder_for(&mut tables).build();
    finish_font(sfnt_version, out)
}

/// Rebuild a font with some tables replaced; every other table is copied as is
pub fn replace_tables(data: &[u8], mut replacements: BTreeMap<Tag, Vec<u8>>) -> Result<Vec<u8>> {
    let font = parse_font(data)?;
    let sfnt_version = font.table_directory.sfnt_version();
    if !replacements.contains_key(&HEAD) {
        if let Some(head) = font.table_data(HEAD) {
            replacements.insert(HEAD, head.as_bytes().to_vec());
        }
    }
    let out = builder_for(&mut replacements).copy_missing_tables(font).build();
    Ok(finish_font(sfnt_version, out))
}

/// `(searchRange, entrySelector, rangeShift)` for a binary-searchable directory
fn search_params(num_tables: usize) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    let mut entry_selector = 0u16;
    while (1usize << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1usize << entry_selector) * TABLE_RECORD_LEN;
    let range_shift = num_tables * TABLE_RECORD_LEN - search_range;
    (search_range as u16, entry_selector, range_shift as u16)
}

fn write_offset_table(out: &mut Vec<u8>, sfnt_version: u32, num_tables: usize) {
    let (search_range, entry_selector, range_shift) = search_params(num_tables);
    out.extend_from_slice(&sfnt_version.to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());
}

/// Assemble a version 1.0 collection; byte-identical tables are stored once.
///
/// write-fonts has no TTC header writer, so the header and the per-member
/// directories are laid out here. Table checksums come from the members.
pub fn build_collection(fonts: &[Vec<u8>]) -> Result<Vec<u8>> {
    let parsed = fonts
        .iter()
        .map(|data| parse_font(data))
        .collect::<Result<Vec<_>>>()?;

    let header_len = 12 + 4 * parsed.len();
    let directories_len: usize = parsed
        .iter()
        .map(|f| 12 + f.table_directory.table_records().len() * TABLE_RECORD_LEN)
        .sum();

    let mut out = Vec::new();
    out.extend_from_slice(TTCF);
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(parsed.len() as u32).to_be_bytes());

    let mut directory_offset = header_len;
    for font in &parsed {
        out.extend_from_slice(&(directory_offset as u32).to_be_bytes());
        directory_offset += 12 + font.table_directory.table_records().len() * TABLE_RECORD_LEN;
    }

    let mut blobs: Vec<&[u8]> = Vec::new();
    let mut placed: HashMap<&[u8], u32> = HashMap::new();
    let mut data_position = header_len + directories_len;
    for font in &parsed {
        let mut records: Vec<_> = font.table_directory.table_records().iter().collect();
        records.sort_by_key(|r| r.tag());
        write_offset_table(&mut out, font.table_directory.sfnt_version(), records.len());
        for record in records {
            let data = font
                .table_data(record.tag())
                .map(|d| d.as_bytes())
                .unwrap_or_default();
            let offset = *placed.entry(data).or_insert_with(|| {
                let at = data_position as u32;
                data_position += (data.len() + 3) & !3;
                blobs.push(data);
                at
            });
            out.extend_from_slice(&record.tag().to_be_bytes());
            out.extend_from_slice(&record.checksum().to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        }
    }
    for blob in blobs {
        out.extend_from_slice(blob);
        out.resize((out.len() + 3) & !3, 0);
    }
    Ok(out)
}

fn encoded_len(platform_id: u16, encoding_id: u16, value: &str) -> usize {
    match Encoding::new(platform_id, encoding_id) {
        Encoding::Utf16Be => value.encode_utf16().count() * 2,
        Encoding::MacRoman => value.chars().count(),
        Encoding::Unknown => 0,
    }
}

/// Editable `name` table
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    table: Name,
}

impl NameTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw = RawName::read(FontData::new(data))
            .map_err(|e| Error::Font(format!("malformed name table: {}", e)))?;
        let mut table: Name = raw.to_owned_table();
        let before = table.name_record.len();
        table
            .name_record
            .retain(|r| Encoding::new(r.platform_id, r.encoding_id) != Encoding::Unknown);
        if table.name_record.len() < before {
            log::warn!(
                "Dropped {} name records with an unsupported encoding",
                before - table.name_record.len()
            );
        }
        Ok(Self { table })
    }

    /// The `name` table of a font, or an empty one when it has none
    pub fn from_font(font: &FontRef<'_>) -> Result<Self> {
        match font.table_data(NAME) {
            Some(data) => Self::parse(data.as_bytes()),
            None => Ok(Self::default()),
        }
    }

    /// Insert or replace one record.
    ///
    /// A Mac Roman value with characters outside that charset is not stored,
    /// and any previous record under the same key is removed. Returns whether
    /// the value was stored.
    pub fn set(&mut self, entry: &NameEntry) -> bool {
        let name_id = NameId::new(entry.name_id);
        self.table.name_record.retain(|r| {
            (r.platform_id, r.encoding_id, r.language_id, r.name_id)
                != (entry.platform_id, entry.encoding_id, entry.language_id, name_id)
        });

        let storable = match Encoding::new(entry.platform_id, entry.encoding_id) {
            Encoding::Utf16Be => true,
            Encoding::MacRoman => entry.value.chars().all(|c| MacRomanMapping.encode(c).is_some()),
            Encoding::Unknown => false,
        };
        if !storable {
            log::warn!(
                "Skipping name ID {} on platform {}: '{}' is not representable",
                entry.name_id,
                entry.platform_id,
                entry.value
            );
            return false;
        }

        self.table.name_record.push(NameRecord::new(
            entry.platform_id,
            entry.encoding_id,
            entry.language_id,
            name_id,
            entry.value.clone().into(),
        ));
        self.table.name_record.sort();
        true
    }

    /// Decoded string of one record
    pub fn get(&self, name_id: u16, platform_id: u16, encoding_id: u16, language_id: u16) -> Option<String> {
        let key = (platform_id, encoding_id, language_id, NameId::new(name_id));
        self.table
            .name_record
            .iter()
            .find(|r| (r.platform_id, r.encoding_id, r.language_id, r.name_id) == key)
            .map(|r| r.string.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.table.name_record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.name_record.is_empty()
    }

    /// Compile the table; string storage must stay addressable by 16-bit offsets
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let records: usize = self
            .table
            .name_record
            .iter()
            .map(|r| encoded_len(r.platform_id, r.encoding_id, r.string.as_str()))
            .sum();
        let lang_tags: usize = self
            .table
            .lang_tag_record
            .iter()
            .flatten()
            .map(|t| t.lang_tag.encode_utf16().count() * 2)
            .sum();
        let storage = records + lang_tags;
        if storage > usize::from(u16::MAX) {
            return Err(Error::Font(format!(
                "name strings need {} bytes, more than 16-bit offsets can address",
                storage
            )));
        }
        write_fonts::dump_table(&self.table).map_err(|e| Error::Font(format!("cannot compile name table: {}", e)))
    }
}

fn set_bit(value: u16, bit: u16, on: bool) -> u16 {
    if on {
        value | (1 << bit)
    } else {
        value & !(1 << bit)
    }
}

/// Apply weight class and fsSelection bits (0 italic, 5 bold, 6 regular) to OS/2
pub fn patch_os2(table: &mut [u8], flags: &StyleFlags) -> bool {
    if table.len() < 64 {
        return false;
    }
    BigEndian::write_u16(&mut table[4..6], flags.weight_class);
    let mut fs = BigEndian::read_u16(&table[62..64]);
    fs = set_bit(fs, 0, flags.italic);
    fs = set_bit(fs, 5, flags.bold);
    fs = set_bit(fs, 6, flags.regular);
    BigEndian::write_u16(&mut table[62..64], fs);
    true
}

/// Apply macStyle bits (0 bold, 1 italic) to head
pub fn patch_head(table: &mut [u8], flags: &StyleFlags) -> bool {
    if table.len() < 46 {
        return false;
    }
    let mut mac = BigEndian::read_u16(&table[44..46]);
    mac = set_bit(mac, 0, flags.bold);
    mac = set_bit(mac, 1, flags.italic);
    BigEndian::write_u16(&mut table[44..46], mac);
    true
}

/// Whether head.macStyle marks the font italic
pub fn head_mac_style_italic(head: &[u8]) -> bool {
    head.len() >= 46 && BigEndian::read_u16(&head[44..46]) & 0b10 != 0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A glyphless font with head, hhea, maxp, an OS/2 stub and the given name table
    pub(crate) fn synthetic_font(version: [u8; 4], name: Option<&NameTable>) -> Vec<u8> {
        let mut tables = BTreeMap::new();
        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&[0, 1, 0, 0]);
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        tables.insert(HEAD, head);
        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&[0, 1, 0, 0]);
        tables.insert(Tag::new(b"hhea"), hhea);
        tables.insert(Tag::new(b"maxp"), vec![0, 0, 0x50, 0, 0, 1]);
        tables.insert(OS2, vec![0u8; 96]);
        if let Some(name) = name {
            tables.insert(NAME, name.to_bytes().unwrap());
        }
        build_font(u32::from_be_bytes(version), tables)
    }

    fn entry(name_id: u16, platform_id: u16, value: &str) -> NameEntry {
        let (encoding_id, language_id) = if platform_id == 3 { (1, 0x409) } else { (0, 0) };
        NameEntry {
            name_id,
            platform_id,
            encoding_id,
            language_id,
            value: value.to_string(),
        }
    }

    fn table_count(data: &[u8]) -> usize {
        parse_font(data).unwrap().table_directory.table_records().len()
    }

    #[test]
    fn sniffs_known_signatures() {
        assert_eq!(sniff_flavor(b"OTTO...."), Some(Flavor::Cff));
        assert_eq!(sniff_flavor(&[0, 1, 0, 0, 9]), Some(Flavor::TrueType));
        assert_eq!(sniff_flavor(b"true"), Some(Flavor::TrueType));
        assert_eq!(sniff_flavor(b"wOFF"), None);
        assert_eq!(sniff_flavor(b"OT"), None);
    }

    #[test]
    fn sniff_path_rejects_unknown_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"wOF2rest").unwrap();
        assert!(matches!(sniff_path(&path), Err(Error::UnrecognizedFormat(_))));
        let short = dir.path().join("short.ttf");
        std::fs::write(&short, b"OT").unwrap();
        assert!(matches!(sniff_path(&short), Err(Error::UnrecognizedFormat(_))));
    }

    #[test]
    fn search_params_follow_the_powers_of_two() {
        assert_eq!(search_params(1), (16, 0, 0));
        assert_eq!(search_params(9), (128, 3, 16));
        assert_eq!(search_params(0x16), (256, 4, 96));
    }

    #[test]
    fn built_font_checksums_to_magic() {
        let data = synthetic_font(TRUETYPE_VERSION, None);
        assert_eq!(table_count(&data), 4);
        assert_eq!(checksum(&data), CHECKSUM_MAGIC);
        let font = parse_font(&data).unwrap();
        assert_eq!(font.table_data(OS2).map(|d| d.as_bytes().len()), Some(96));
    }

    #[test]
    fn cff_version_survives_rebuild() {
        let data = synthetic_font(*b"OTTO", None);
        assert_eq!(&data[0..4], b"OTTO");
        let rebuilt = replace_tables(&data, BTreeMap::new()).unwrap();
        assert_eq!(&rebuilt[0..4], b"OTTO");
        assert_eq!(checksum(&rebuilt), CHECKSUM_MAGIC);
    }

    #[test]
    fn name_table_set_replaces_and_sorts() {
        let mut names = NameTable::default();
        names.set(&entry(1, 3, "Old"));
        names.set(&entry(1, 1, "Mac"));
        names.set(&entry(1, 3, "Cool Family"));
        assert_eq!(names.len(), 2);

        let parsed = NameTable::parse(&names.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.get(1, 3, 1, 0x409).as_deref(), Some("Cool Family"));
        assert_eq!(parsed.get(1, 1, 0, 0).as_deref(), Some("Mac"));
        assert_eq!(parsed.table.name_record[0].platform_id, 1);
    }

    #[test]
    fn mac_roman_accents_survive_compilation() {
        let mut names = NameTable::default();
        assert!(names.set(&entry(4, 1, "Café")));
        assert!(names.set(&entry(4, 3, "Café")));
        let parsed = NameTable::parse(&names.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.get(4, 1, 0, 0).as_deref(), Some("Café"));
        assert_eq!(parsed.get(4, 3, 1, 0x409).as_deref(), Some("Café"));
    }

    #[test]
    fn unrepresentable_mac_value_drops_the_stale_record() {
        let mut names = NameTable::default();
        names.set(&entry(1, 1, "Old Family"));
        assert!(!names.set(&entry(1, 1, "明朝")));
        assert!(names.set(&entry(1, 3, "明朝")));
        assert_eq!(names.get(1, 1, 0, 0), None);
        assert_eq!(names.get(1, 3, 1, 0x409).as_deref(), Some("明朝"));
    }

    #[test]
    fn oversized_string_storage_is_an_error() {
        let mut names = NameTable::default();
        let long = "A".repeat(40_000);
        names.set(&entry(3, 3, &long));
        names.set(&entry(5, 3, &long));
        names.set(&NameEntry {
            name_id: 1,
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x411,
            value: "Cool".to_string(),
        });
        assert!(matches!(names.to_bytes(), Err(Error::Font(_))));
    }

    #[test]
    fn replace_tables_keeps_other_tables() {
        let data = synthetic_font(TRUETYPE_VERSION, None);
        let mut names = NameTable::default();
        names.set(&entry(6, 3, "Cool-Bold"));
        let rebuilt = replace_tables(&data, BTreeMap::from([(NAME, names.to_bytes().unwrap())])).unwrap();
        assert_eq!(table_count(&rebuilt), 5);
        let font = parse_font(&rebuilt).unwrap();
        let name = NameTable::from_font(&font).unwrap();
        assert_eq!(name.get(6, 3, 1, 0x409).as_deref(), Some("Cool-Bold"));
        assert_eq!(checksum(&rebuilt), CHECKSUM_MAGIC);
    }

    #[test]
    fn style_patches_touch_only_their_bits() {
        let mut os2 = vec![0u8; 96];
        os2[62..64].copy_from_slice(&0b1000_0000u16.to_be_bytes());
        let flags = StyleFlags {
            weight_class: 700,
            italic: true,
            bold: true,
            regular: false,
        };
        assert!(patch_os2(&mut os2, &flags));
        assert_eq!(BigEndian::read_u16(&os2[4..6]), 700);
        assert_eq!(BigEndian::read_u16(&os2[62..64]), 0b1010_0001);

        let mut head = vec![0u8; 54];
        assert!(patch_head(&mut head, &flags));
        assert!(head_mac_style_italic(&head));
        assert!(!patch_head(&mut [0u8; 10], &flags));
    }

    #[test]
    fn collection_shares_identical_tables() {
        let a = synthetic_font(TRUETYPE_VERSION, None);
        let mut names = NameTable::default();
        names.set(&entry(1, 3, "B"));
        let b = synthetic_font(TRUETYPE_VERSION, Some(&names));
        let ttc = build_collection(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(&ttc[0..4], b"ttcf");
        assert_eq!(BigEndian::read_u32(&ttc[8..12]), 2);
        let first = BigEndian::read_u32(&ttc[12..16]) as usize;
        let second = BigEndian::read_u32(&ttc[16..20]) as usize;
        assert_eq!(first, 20);
        assert_eq!(second, first + 12 + 4 * 16);
        assert_eq!(BigEndian::read_u16(&ttc[second + 4..second + 6]), 5);

        // OS/2 sorts first and is identical in both members.
        let table_offset = |dir: usize, index: usize| {
            let rec = dir + 12 + index * 16;
            BigEndian::read_u32(&ttc[rec + 8..rec + 12])
        };
        assert_eq!(table_offset(first, 0), table_offset(second, 0));
    }

    #[test]
    fn collections_are_rejected_as_input() {
        let ttc = build_collection(&[synthetic_font(TRUETYPE_VERSION, None)]).unwrap();
        assert!(matches!(parse_font(&ttc), Err(Error::Font(_))));
    }
}
