//! Only included in test

use qaengine::{
    run_checks, CheckResult, Font, GroupBy, Registry, Report, RunConfig, RunContext,
};
use write_fonts::{
    tables::{
        fvar::{AxisInstanceArrays, Fvar, VariationAxisRecord},
        head::Head,
        hhea::Hhea,
        hmtx::Hmtx,
        maxp::Maxp,
        name::{Name, NameRecord},
        os2::Os2,
        post::Post,
        vmtx::LongMetric,
    },
    types::{FWord, Fixed, NameId, Tag},
    FontBuilder,
};

/// A font assembled in memory, with just the tables metric checks read.
pub(crate) struct TestFont {
    pub head: Head,
    pub hhea: Option<Hhea>,
    pub os2: Option<Os2>,
    /// Tables added with placeholder contents, e.g. to look like a TrueType font.
    pub extra_tables: Vec<Tag>,
    /// Tables added as is, for those built by hand.
    pub raw_tables: Vec<(Tag, Vec<u8>)>,
    pub underline_thickness: i16,
    /// Windows English name records. No name table when empty.
    pub names: Vec<(u16, String)>,
    /// Tag, min, default and max. No fvar table when empty.
    pub axes: Vec<(&'static str, f64, f64, f64)>,
    glyphs: Vec<(String, u16, Vec<u32>)>,
}

impl TestFont {
    /// A 1000 upem font with .notdef, ascent 800 and descent -200 everywhere.
    pub fn new() -> TestFont {
        TestFont {
            head: Head {
                units_per_em: 1000,
                y_min: -200,
                y_max: 800,
                ..Default::default()
            },
            hhea: Some(Hhea {
                ascender: FWord::new(800),
                descender: FWord::new(-200),
                line_gap: FWord::new(0),
                ..Default::default()
            }),
            os2: Some(Os2 {
                s_typo_ascender: 800,
                s_typo_descender: -200,
                s_typo_line_gap: 0,
                us_win_ascent: 800,
                us_win_descent: 200,
                us_weight_class: 400,
                fs_type: 4,
                y_strikeout_size: 50,
                sx_height: Some(500),
                s_cap_height: Some(700),
                // Avoid "field must be present for version 2"
                ul_code_page_range_1: Some(0),
                ul_code_page_range_2: Some(0),
                us_default_char: Some(0),
                us_break_char: Some(0),
                us_max_context: Some(0),
                ..Default::default()
            }),
            extra_tables: Vec::new(),
            raw_tables: Vec::new(),
            underline_thickness: 50,
            names: Vec::new(),
            axes: Vec::new(),
            glyphs: vec![(".notdef".to_string(), 500, Vec::new())],
        }
    }

    pub fn glyph(&mut self, name: &str, advance: u16, codepoints: &[u32]) -> &mut TestFont {
        self.glyphs
            .push((name.to_string(), advance, codepoints.to_vec()));
        self
    }

    pub fn os2_mut(&mut self) -> &mut Os2 {
        self.os2.as_mut().unwrap()
    }

    pub fn hhea_mut(&mut self) -> &mut Hhea {
        self.hhea.as_mut().unwrap()
    }

    pub fn name(&mut self, name_id: u16, value: &str) -> &mut TestFont {
        self.names.push((name_id, value.to_string()));
        self
    }

    pub fn axis(&mut self, tag: &'static str, min: f64, default: f64, max: f64) -> &mut TestFont {
        self.axes.push((tag, min, default, max));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let num_glyphs = self.glyphs.len() as u16;
        let mut builder = FontBuilder::new();
        builder.add_table(&self.head).unwrap();
        builder
            .add_table(&Maxp {
                num_glyphs,
                ..Default::default()
            })
            .unwrap();
        if let Some(hhea) = &self.hhea {
            let hhea = Hhea {
                number_of_h_metrics: num_glyphs,
                ..hhea.clone()
            };
            builder.add_table(&hhea).unwrap();
            let metrics = self
                .glyphs
                .iter()
                .map(|(_, advance, _)| LongMetric {
                    advance: *advance,
                    side_bearing: 0,
                })
                .collect();
            builder.add_table(&Hmtx::new(metrics, Vec::new())).unwrap();
        }
        let mut post = Post::new_v2(self.glyphs.iter().map(|(n, ..)| n.as_str()));
        post.underline_thickness = FWord::new(self.underline_thickness);
        builder.add_table(&post).unwrap();
        if !self.names.is_empty() {
            let mut records: Vec<_> = self
                .names
                .iter()
                .map(|(id, value)| {
                    NameRecord::new(3, 1, 0x409, NameId::new(*id), value.clone().into())
                })
                .collect();
            records.sort();
            builder.add_table(&Name::new(records)).unwrap();
        }
        if !self.axes.is_empty() {
            let axes = self
                .axes
                .iter()
                .map(|(tag, min, default, max)| VariationAxisRecord {
                    axis_tag: Tag::new_checked(tag.as_bytes()).unwrap(),
                    min_value: Fixed::from_f64(*min),
                    default_value: Fixed::from_f64(*default),
                    max_value: Fixed::from_f64(*max),
                    ..Default::default()
                })
                .collect();
            builder
                .add_table(&Fvar::new(AxisInstanceArrays::new(axes, Vec::new())))
                .unwrap();
        }
        if let Some(os2) = &self.os2 {
            builder.add_table(os2).unwrap();
        }
        let mappings: Vec<_> = self
            .glyphs
            .iter()
            .enumerate()
            .flat_map(|(gid, (_, _, cps))| cps.iter().map(move |cp| (*cp, gid as u32)))
            .collect();
        builder.add_raw(Tag::new(b"cmap"), cmap_format_12(mappings));
        for tag in self.extra_tables.iter() {
            builder.add_raw(*tag, vec![0u8; 4]);
        }
        for (tag, data) in self.raw_tables.iter() {
            builder.add_raw(*tag, data.clone());
        }
        builder.build()
    }

    pub fn font(&self, path: &str) -> Font {
        Font::new(path, None, self.build().into())
    }
}

/// A cmap with a single Windows full repertoire subtable.
fn cmap_format_12(mut mappings: Vec<(u32, u32)>) -> Vec<u8> {
    mappings.sort_unstable();
    let num_groups = mappings.len() as u32;
    let mut data = Vec::new();
    data.extend(0u16.to_be_bytes());
    data.extend(1u16.to_be_bytes());
    // platform 3, encoding 10, subtable right after this record
    data.extend(3u16.to_be_bytes());
    data.extend(10u16.to_be_bytes());
    data.extend(12u32.to_be_bytes());

    data.extend(12u16.to_be_bytes());
    data.extend(0u16.to_be_bytes());
    data.extend((16 + 12 * num_groups).to_be_bytes());
    data.extend(0u32.to_be_bytes());
    data.extend(num_groups.to_be_bytes());
    for (cp, gid) in mappings {
        data.extend(cp.to_be_bytes());
        data.extend(cp.to_be_bytes());
        data.extend(gid.to_be_bytes());
    }
    data
}

/// An INDEX as found in a CFF table, with 1 byte offsets.
fn cff_index(items: &[&[u8]]) -> Vec<u8> {
    let mut data = (items.len() as u16).to_be_bytes().to_vec();
    data.push(1);
    let mut offset = 1u8;
    data.push(offset);
    for item in items {
        offset += item.len() as u8;
        data.push(offset);
    }
    for item in items {
        data.extend(*item);
    }
    data
}

/// A CFF table with one top dict naming its Notice and FullName strings.
///
/// There are no charstrings, only what is needed to read the top dict.
pub(crate) fn cff_with_strings(notice: &[u8], full_name: &[u8]) -> Vec<u8> {
    // SIDs 391 and 392, the first two custom strings, then operators 1 and 2
    let top_dict: &[u8] = &[248, 27, 1, 248, 28, 2];
    let mut data = vec![1, 0, 4, 1];
    data.extend(cff_index(&[b"Test"]));
    data.extend(cff_index(&[top_dict]));
    data.extend(cff_index(&[notice, full_name]));
    // no global subroutines
    data.extend(cff_index(&[]));
    data
}

/// glyf and loca (short offsets) for empty, simple or composite glyphs.
///
/// A composite glyph refers to glyph 1, so that has to exist.
pub(crate) fn glyf_and_loca(kinds: &[GlyphKind]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = vec![0u16];
    for kind in kinds {
        match kind {
            GlyphKind::Empty => (),
            GlyphKind::Simple => {
                // one contour of one on-curve point at (0, 0)
                glyf.extend(1i16.to_be_bytes());
                glyf.extend([0u8; 8]);
                glyf.extend(0u16.to_be_bytes());
                glyf.extend(0u16.to_be_bytes());
                glyf.push(0x01);
                glyf.extend([0u8; 4]);
                glyf.push(0);
            }
            GlyphKind::Composite => {
                glyf.extend((-1i16).to_be_bytes());
                glyf.extend([0u8; 8]);
                // ARGS_ARE_XY_VALUES, byte offsets of zero
                glyf.extend(0x0002u16.to_be_bytes());
                glyf.extend(1u16.to_be_bytes());
                glyf.extend([0u8; 2]);
            }
        }
        loca.push((glyf.len() / 2) as u16);
    }
    let loca = loca.iter().flat_map(|o| o.to_be_bytes()).collect();
    (glyf, loca)
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum GlyphKind {
    Empty,
    Simple,
    Composite,
}

/// Run one check, with everything it depends on registered, over some fonts.
pub(crate) fn run_check(check_id: &str, fonts: Vec<Font>) -> Report {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut registry = Registry::new();
    crate::register_all(&mut registry).unwrap();
    let run = RunContext::from_fonts(fonts, GroupBy::Directory);
    let config = RunConfig {
        selected: Some(vec![check_id.into()]),
        ..Default::default()
    };
    run_checks(&registry, &run, config).unwrap()
}

/// The message codes of a result, "" for statuses without one.
pub(crate) fn codes(result: &CheckResult) -> Vec<&str> {
    result
        .statuses
        .iter()
        .map(|s| s.code.as_deref().unwrap_or_default())
        .collect()
}
