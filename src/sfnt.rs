//! TrueType/OpenType metadata reader
//!
//! Only the bits needed to register an uploaded font are read: the family names from the
//! `name` table and the weight and slant from the `OS/2` table. Glyph data is never touched.
use crate::{
    error::FontPickerError,
    font::{FontDescriptor, FontStyle, FontVariant, DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT},
    utils,
};
use tracing::{debug, trace};
use ttf_parser::{name_id, Face, PlatformId};

const WOFF: &[u8; 4] = b"wOFF";
const WOFF2: &[u8; 4] = b"wOF2";

const LANGUAGE_WINDOWS_EN_US: u16 = 0x0409;

/// Extracts a descriptor skeleton from raw font file content.
pub trait FontParser: Send + Sync {
    /// Parses `content`, returning a descriptor with at least one variant
    ///
    /// The returned variants do not reference any asset yet.
    fn parse(&self, content: &[u8]) -> Result<FontDescriptor, FontPickerError>;
}

/// [`FontParser`] for TrueType, OpenType and TrueType collection files.
///
/// Collections register their first font only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SfntParser;

/// A decoded `name` table record
#[derive(Debug)]
struct NameRecord {
    platform_id: PlatformId,
    language_id: u16,
    name_id: u16,
    value: String,
}

impl NameRecord {
    /// Lower is better
    fn rank(&self) -> u8 {
        match (self.platform_id, self.language_id) {
            (PlatformId::Windows, LANGUAGE_WINDOWS_EN_US) => 0,
            (PlatformId::Windows, _) => 1,
            (PlatformId::Unicode, _) => 2,
            _ => 3,
        }
    }
}

fn name_records(face: &Face) -> Vec<NameRecord> {
    let mut records = Vec::new();
    for name in face.names() {
        let Some(value) = name.to_string() else {
            trace!(
                "skipping name {} in unsupported encoding {:?}/{}",
                name.name_id,
                name.platform_id,
                name.encoding_id
            );
            continue;
        };
        records.push(NameRecord {
            platform_id: name.platform_id,
            language_id: name.language_id,
            name_id: name.name_id,
            value,
        });
    }
    records
}

fn best_name(records: &[NameRecord], name_ids: &[u16]) -> Option<String> {
    name_ids.iter().find_map(|id| {
        records
            .iter()
            .filter(|r| r.name_id == *id && !r.value.trim().is_empty())
            .min_by_key(|r| r.rank())
            .map(|r| r.value.trim().to_string())
    })
}

/// Guesses the weight and slant from a subfamily name like `Semibold Italic`
fn style_from_subfamily(subfamily: &str) -> (u16, FontStyle) {
    let normalized: String = subfamily
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    const WEIGHTS: [(&str, u16); 12] = [
        ("extralight", 200),
        ("ultralight", 200),
        ("extrabold", 800),
        ("ultrabold", 800),
        ("semibold", 600),
        ("demibold", 600),
        ("thin", 100),
        ("light", 300),
        ("medium", 500),
        ("bold", 700),
        ("black", 900),
        ("heavy", 900),
    ];
    let weight = WEIGHTS
        .iter()
        .find(|(name, _)| normalized.contains(name))
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_WEIGHT);
    let style = match normalized.contains("italic") || normalized.contains("oblique") {
        true => FontStyle::Italic,
        false => FontStyle::Normal,
    };
    (weight, style)
}

/// Maps a raw `usWeightClass` onto the 100..=900 CSS scale
fn normalized_weight(weight: u16) -> u16 {
    match weight {
        0 => DEFAULT_WEIGHT,
        // Some old fonts use a 1 to 9 scale
        w @ 1..=9 => w * 100,
        w => w.clamp(MIN_WEIGHT, MAX_WEIGHT),
    }
}

/// Reads the weight and slant from `OS/2`, or from the subfamily name if there is no such table
fn face_style(face: &Face, subfamily: Option<&str>) -> (u16, FontStyle) {
    if face.tables().os2.is_none() {
        trace!("no OS/2 table, guessing the style from {subfamily:?}");
        return style_from_subfamily(subfamily.unwrap_or_default());
    }
    let weight = normalized_weight(face.weight().to_number());
    let style = match face.is_italic() || face.is_oblique() {
        true => FontStyle::Italic,
        false => FontStyle::Normal,
    };
    (weight, style)
}

impl FontParser for SfntParser {
    fn parse(&self, content: &[u8]) -> Result<FontDescriptor, FontPickerError> {
        if content.starts_with(WOFF) || content.starts_with(WOFF2) {
            return Err(FontPickerError::FontParse(
                "compressed web fonts (WOFF/WOFF2) are not supported".into(),
            ));
        }
        let face = Face::parse(content, 0).map_err(|e| {
            FontPickerError::FontParse(format!("not a TrueType/OpenType font: {e}"))
        })?;

        let names = name_records(&face);
        let family = best_name(&names, &[name_id::TYPOGRAPHIC_FAMILY, name_id::FAMILY])
            .ok_or_else(|| FontPickerError::FontParse("font has no family name".into()))?;
        let subfamily = best_name(&names, &[name_id::TYPOGRAPHIC_SUBFAMILY, name_id::SUBFAMILY]);
        let (weight, style) = face_style(&face, subfamily.as_deref());
        debug!("parsed font {family:?} {subfamily:?}: weight {weight}, {style:?}");

        let mut descriptor = FontDescriptor::new(&utils::kebab_identifier(&family), family);
        descriptor.variants.push(FontVariant::new(weight, style));
        Ok(descriptor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SFNT_TRUETYPE: u32 = 0x00010000;
    const SFNT_OPENTYPE: u32 = 0x4f54544f;
    const SFNT_COLLECTION: u32 = 0x74746366;

    const PLATFORM_UNICODE: u16 = 0;
    const PLATFORM_MACINTOSH: u16 = 1;
    const PLATFORM_WINDOWS: u16 = 3;

    const FS_SELECTION_ITALIC: u16 = 1 << 0;

    fn utf16be(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
    }

    /// (platform, encoding, language, name id, value)
    fn name_table(entries: &[(u16, u16, u16, u16, &str)]) -> Vec<u8> {
        let mut storage = Vec::new();
        let mut records = Vec::new();
        for &(platform, encoding, language, name_id, value) in entries {
            let raw = match platform {
                PLATFORM_MACINTOSH => value.as_bytes().to_vec(),
                _ => utf16be(value),
            };
            for v in [platform, encoding, language, name_id] {
                records.extend(v.to_be_bytes());
            }
            records.extend((raw.len() as u16).to_be_bytes());
            records.extend((storage.len() as u16).to_be_bytes());
            storage.extend(raw);
        }
        let mut table = Vec::new();
        table.extend(0u16.to_be_bytes());
        table.extend((entries.len() as u16).to_be_bytes());
        table.extend((6 + records.len() as u16).to_be_bytes());
        table.extend(records);
        table.extend(storage);
        table
    }

    fn os2_table(weight: u16, fs_selection: u16) -> Vec<u8> {
        let mut table = vec![0u8; 78];
        table[4..6].copy_from_slice(&weight.to_be_bytes());
        table[62..64].copy_from_slice(&fs_selection.to_be_bytes());
        table
    }

    /// The tables every face must carry: `head`, `hhea` and `maxp`
    fn required_tables() -> Vec<([u8; 4], Vec<u8>)> {
        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5f0f3cf5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        hhea[34..36].copy_from_slice(&1u16.to_be_bytes());
        let mut maxp = Vec::new();
        maxp.extend(0x00005000u32.to_be_bytes());
        maxp.extend(1u16.to_be_bytes());
        vec![(*b"head", head), (*b"hhea", hhea), (*b"maxp", maxp)]
    }

    /// Builds a font file with the given tables, placed `base` bytes into the final file
    fn sfnt_at(base: usize, magic: u32, extra: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
        let mut tables = required_tables();
        tables.extend(extra);
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = Vec::new();
        out.extend(magic.to_be_bytes());
        out.extend((tables.len() as u16).to_be_bytes());
        out.extend([0u8; 6]);
        let mut offset = base + 12 + 16 * tables.len();
        let mut data = Vec::new();
        for (tag, table) in tables.iter() {
            out.extend(tag);
            out.extend(0u32.to_be_bytes());
            out.extend((offset as u32).to_be_bytes());
            out.extend((table.len() as u32).to_be_bytes());
            let padded = (table.len() + 3) & !3;
            offset += padded;
            data.extend(table);
            data.resize(data.len() + padded - table.len(), 0);
        }
        out.extend(data);
        out
    }

    fn sfnt(magic: u32, extra: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
        sfnt_at(0, magic, extra)
    }

    #[test]
    fn truetype() -> Result<(), FontPickerError> {
        let font = sfnt(
            SFNT_TRUETYPE,
            vec![
                (
                    *b"name",
                    name_table(&[
                        (PLATFORM_MACINTOSH, 0, 0, name_id::FAMILY, "Mac Name"),
                        (PLATFORM_WINDOWS, 1, 0x0410, name_id::FAMILY, "Nome"),
                        (PLATFORM_WINDOWS, 1, 0x0409, name_id::FAMILY, "Inter"),
                        (PLATFORM_WINDOWS, 1, 0x0409, name_id::SUBFAMILY, "Bold Italic"),
                    ]),
                ),
                (*b"OS/2", os2_table(700, FS_SELECTION_ITALIC)),
            ],
        );
        let descriptor = SfntParser.parse(&font)?;
        assert_eq!(descriptor.family, "Inter");
        assert_eq!(descriptor.display_name, "Inter");
        assert_eq!(descriptor.key, "fonts/inter");
        assert_eq!(
            descriptor.variants,
            [FontVariant::new(700, FontStyle::Italic)]
        );
        Ok(())
    }

    #[test]
    fn typographic_family_wins() -> Result<(), FontPickerError> {
        let font = sfnt(
            SFNT_OPENTYPE,
            vec![(
                *b"name",
                name_table(&[
                    (PLATFORM_WINDOWS, 1, 0x0409, name_id::FAMILY, "Source Sans Semibold"),
                    (PLATFORM_WINDOWS, 1, 0x0409, name_id::TYPOGRAPHIC_FAMILY, "Source Sans"),
                    (PLATFORM_WINDOWS, 1, 0x0409, name_id::TYPOGRAPHIC_SUBFAMILY, "Semibold"),
                ]),
            )],
        );
        let descriptor = SfntParser.parse(&font)?;
        assert_eq!(descriptor.family, "Source Sans");
        assert_eq!(
            descriptor.variants,
            [FontVariant::new(600, FontStyle::Normal)]
        );
        Ok(())
    }

    #[test]
    fn mac_only_names() -> Result<(), FontPickerError> {
        let font = sfnt(
            SFNT_TRUETYPE,
            vec![
                (
                    *b"name",
                    name_table(&[(PLATFORM_MACINTOSH, 0, 0, name_id::FAMILY, "Chicago")]),
                ),
                (*b"OS/2", os2_table(0, 0)),
            ],
        );
        let descriptor = SfntParser.parse(&font)?;
        assert_eq!(descriptor.family, "Chicago");
        assert_eq!(
            descriptor.variants,
            [FontVariant::new(DEFAULT_WEIGHT, FontStyle::Normal)]
        );
        Ok(())
    }

    #[test]
    fn collection_uses_first_font() -> Result<(), FontPickerError> {
        const HEADER_LEN: usize = 16;
        // Table offsets are relative to the start of the collection file
        let member = sfnt_at(
            HEADER_LEN,
            SFNT_TRUETYPE,
            vec![
                (
                    *b"name",
                    name_table(&[(PLATFORM_UNICODE, 3, 0, name_id::FAMILY, "Noto Sans CJK")]),
                ),
                (*b"OS/2", os2_table(3, 0)),
            ],
        );
        let mut font = Vec::new();
        font.extend(SFNT_COLLECTION.to_be_bytes());
        font.extend(0x00010000u32.to_be_bytes());
        font.extend(1u32.to_be_bytes());
        font.extend((HEADER_LEN as u32).to_be_bytes());
        font.extend(member);

        let descriptor = SfntParser.parse(&font)?;
        assert_eq!(descriptor.family, "Noto Sans CJK");
        assert_eq!(descriptor.variants[0].weight, 300);
        Ok(())
    }

    #[test]
    fn rejects() {
        assert!(matches!(
            SfntParser.parse(b"wOFF\x00\x01\x00\x00"),
            Err(FontPickerError::FontParse(msg)) if msg.contains("WOFF")
        ));
        assert!(matches!(
            SfntParser.parse(b"GIF89a..."),
            Err(FontPickerError::FontParse(msg)) if msg.contains("not a TrueType")
        ));
        assert!(matches!(
            SfntParser.parse(b"\x00\x01"),
            Err(FontPickerError::FontParse(_))
        ));

        // No head, hhea or maxp
        let mut font = Vec::new();
        font.extend(SFNT_TRUETYPE.to_be_bytes());
        font.extend([0u8; 8]);
        assert!(matches!(
            SfntParser.parse(&font),
            Err(FontPickerError::FontParse(msg)) if msg.contains("not a TrueType")
        ));

        let font = sfnt(SFNT_TRUETYPE, vec![(*b"name", name_table(&[]))]);
        assert!(matches!(
            SfntParser.parse(&font),
            Err(FontPickerError::FontParse(msg)) if msg.contains("no family name")
        ));

        let font = sfnt(SFNT_TRUETYPE, vec![(*b"OS/2", os2_table(400, 0))]);
        assert!(matches!(
            SfntParser.parse(&font),
            Err(FontPickerError::FontParse(msg)) if msg.contains("no family name")
        ));
    }

    #[test]
    fn weights() {
        assert_eq!(normalized_weight(0), 400);
        assert_eq!(normalized_weight(7), 700);
        assert_eq!(normalized_weight(350), 350);
        assert_eq!(normalized_weight(50), 100);
        assert_eq!(normalized_weight(1000), 900);
    }

    #[test]
    fn subfamily_keywords() {
        assert_eq!(style_from_subfamily("Regular"), (400, FontStyle::Normal));
        assert_eq!(style_from_subfamily("Extra Bold"), (800, FontStyle::Normal));
        assert_eq!(style_from_subfamily("SemiBold Italic"), (600, FontStyle::Italic));
        assert_eq!(style_from_subfamily("Light Oblique"), (300, FontStyle::Italic));
        assert_eq!(style_from_subfamily("Bold"), (700, FontStyle::Normal));
    }
}
