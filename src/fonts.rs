use std::collections::{BTreeMap, BTreeSet};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::assets::FontAsset;
use crate::error::Error;

const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weight {
    Regular,
    Bold,
}

/// Advance widths for the typeface the form is printed with.
///
/// Layout only needs horizontal metrics: every cell has a fixed height and
/// baselines come from the cell model, not from font ascent.
pub enum FontMetrics<'a> {
    TrueType { regular: Face<'a>, bold: Face<'a> },
    Helvetica,
}

impl<'a> FontMetrics<'a> {
    pub fn new(asset: &'a FontAsset) -> Self {
        let FontAsset::Resolved { regular, bold } = asset else {
            return FontMetrics::Helvetica;
        };
        let Ok(regular_face) = Face::parse(&regular.data, 0) else {
            log::warn!(
                "{} stopped parsing after resolution, measuring with Helvetica",
                regular.path.display()
            );
            return FontMetrics::Helvetica;
        };
        let bold_face = bold
            .as_ref()
            .and_then(|b| Face::parse(&b.data, 0).ok())
            .unwrap_or_else(|| regular_face.clone());
        FontMetrics::TrueType {
            regular: regular_face,
            bold: bold_face,
        }
    }

    /// Width of a single character in 1000-units.
    pub fn char_width_1000(&self, ch: char, weight: Weight) -> f32 {
        match self {
            FontMetrics::TrueType { regular, bold } => {
                let face = match weight {
                    Weight::Regular => regular,
                    Weight::Bold => bold,
                };
                let units = face.units_per_em() as f32;
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0)
            }
            FontMetrics::Helvetica => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    helvetica_width(byte)
                } else {
                    0.0
                }
            }
        }
    }

    /// Rendered width of `text` in millimetres at `size_pt`.
    pub fn text_width(&self, text: &str, size_pt: f32, weight: Weight) -> f32 {
        let w_1000: f32 = text.chars().map(|ch| self.char_width_1000(ch, weight)).sum();
        w_1000 * size_pt / 1000.0 / PT_PER_MM
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert text to WinAnsi bytes for the Helvetica fallback.
/// Thai and other unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b >= 32)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica width at 1000 units/em for a WinAnsi byte.
fn helvetica_width(b: u8) -> f32 {
    match b {
        32 => 278.0,                          // space
        33..=47 => 333.0,                     // punctuation
        48..=57 => 556.0,                     // digits
        58..=64 => 333.0,                     // more punctuation
        73 | 74 => 278.0,                     // I J (narrow uppercase)
        77 => 833.0,                          // M (wide)
        65..=90 => 667.0,                     // uppercase A-Z (average)
        91..=94 => 333.0,                     // brackets etc.
        95 => 556.0,                          // underscore
        96 => 333.0,
        102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
        109 | 119 => 833.0,                   // m w (wide)
        97..=122 => 556.0,                    // lowercase a-z (average)
        _ => 556.0,
    }
}

pub(crate) enum Encoding {
    Identity(BTreeMap<char, u16>),
    WinAnsi,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    encoding: Encoding,
}

impl FontEntry {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.encoding {
            Encoding::Identity(char_to_gid) => encode_as_gids(text, char_to_gid),
            Encoding::WinAnsi => to_winansi_bytes(text),
        }
    }
}

/// The two font resources every page references.
///
/// When the typeface has no separate bold file both weights point at the
/// same embedded font.
pub(crate) struct RegisteredFonts {
    regular: FontEntry,
    bold: Option<FontEntry>,
}

impl RegisteredFonts {
    pub(crate) fn get(&self, weight: Weight) -> &FontEntry {
        match (weight, &self.bold) {
            (Weight::Bold, Some(bold)) => bold,
            _ => &self.regular,
        }
    }

    pub(crate) fn resources(&self) -> Vec<(&str, Ref)> {
        std::iter::once(&self.regular)
            .chain(self.bold.as_ref())
            .map(|e| (e.pdf_name.as_str(), e.font_ref))
            .collect()
    }
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<BTreeMap<char, u16>, Error> {
    let face = Face::parse(font_data, 0).map_err(|e| Error::Font(format!("{font_name}: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let ascent = to_1000(face.ascender() as f32);
    let descent = to_1000(face.descender() as f32);
    let cap_height = face
        .capital_height()
        .map(|h| to_1000(h as f32))
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    // Sorted iteration keeps glyph numbering (and thus the output bytes) stable.
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = BTreeMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            if char_to_gid.insert(ch, new_gid).is_none() {
                let w = face
                    .glyph_hor_advance(gid)
                    .map(|adv| to_1000(adv as f32))
                    .unwrap_or(0.0);
                gid_widths.push((new_gid, w));
            }
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}; embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{font_name}: font program too large")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

fn register_helvetica(pdf: &mut Pdf, base: &[u8], pdf_name: &str, alloc: &mut impl FnMut() -> Ref) -> FontEntry {
    let font_ref = alloc();
    pdf.type1_font(font_ref)
        .base_font(Name(base))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    FontEntry {
        pdf_name: pdf_name.to_string(),
        font_ref,
        encoding: Encoding::WinAnsi,
    }
}

/// Write the font objects for both weights.
///
/// `used` holds the characters drawn in each weight so the embedded
/// programs only carry the glyphs the page needs.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    asset: &FontAsset,
    used: &BTreeMap<Weight, BTreeSet<char>>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<RegisteredFonts, Error> {
    let t0 = std::time::Instant::now();
    let chars_for = |weights: &[Weight]| -> BTreeSet<char> {
        let mut set: BTreeSet<char> = weights
            .iter()
            .filter_map(|w| used.get(w))
            .flat_map(|s| s.iter().copied())
            .collect();
        set.insert(' ');
        set
    };

    let fonts = match asset {
        FontAsset::Default => RegisteredFonts {
            regular: register_helvetica(pdf, b"Helvetica", "F1", alloc),
            bold: Some(register_helvetica(pdf, b"Helvetica-Bold", "F2", alloc)),
        },
        FontAsset::Resolved { regular, bold: Some(bold) } => {
            let regular_ref = alloc();
            let regular_map = embed_truetype(
                pdf,
                regular_ref,
                &regular.base_name(),
                &regular.data,
                &chars_for(&[Weight::Regular]),
                alloc,
            )?;
            let bold_ref = alloc();
            let bold_map = embed_truetype(
                pdf,
                bold_ref,
                &bold.base_name(),
                &bold.data,
                &chars_for(&[Weight::Bold]),
                alloc,
            )?;
            RegisteredFonts {
                regular: FontEntry {
                    pdf_name: "F1".into(),
                    font_ref: regular_ref,
                    encoding: Encoding::Identity(regular_map),
                },
                bold: Some(FontEntry {
                    pdf_name: "F2".into(),
                    font_ref: bold_ref,
                    encoding: Encoding::Identity(bold_map),
                }),
            }
        }
        FontAsset::Resolved { regular, bold: None } => {
            let font_ref = alloc();
            let map = embed_truetype(
                pdf,
                font_ref,
                &regular.base_name(),
                &regular.data,
                &chars_for(&[Weight::Regular, Weight::Bold]),
                alloc,
            )?;
            RegisteredFonts {
                regular: FontEntry {
                    pdf_name: "F1".into(),
                    font_ref,
                    encoding: Encoding::Identity(map),
                },
                bold: None,
            }
        }
    };

    log::debug!(
        "register_fonts: default={} → {:.1}ms",
        asset.is_default(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_drops_thai() {
        assert_eq!(to_winansi_bytes("ชั้น: 3/2"), b": 3/2".to_vec());
        assert_eq!(to_winansi_bytes("\u{201C}ok\u{201D}"), vec![0x93, b'o', b'k', 0x94]);
    }

    #[test]
    fn gids_are_big_endian_pairs() {
        let map = BTreeMap::from([('ก', 0x0102), ('a', 3)]);
        assert_eq!(encode_as_gids("กa?", &map), vec![1, 2, 0, 3, 0, 0]);
    }

    #[test]
    fn helvetica_measures_in_millimetres() {
        let m = FontMetrics::Helvetica;
        // "MM" = 2 × 833 units at 10pt = 16.66pt
        let w = m.text_width("MM", 10.0, Weight::Regular);
        assert!((w - 16.66 / PT_PER_MM).abs() < 1e-3, "{w}");
        assert_eq!(m.text_width("ข้าพเจ้า", 14.0, Weight::Bold), 0.0);
    }

    #[test]
    fn default_asset_measures_with_helvetica() {
        assert!(matches!(
            FontMetrics::new(&FontAsset::Default),
            FontMetrics::Helvetica
        ));
    }
}
