//! The conditions checks are gated on and share.

use std::{collections::BTreeSet, sync::Arc};

use qaengine::{
    Condition, ConditionError, ConditionInput, ConfigError, Font, Registry, Scope, Testable,
    Truthy, Value,
};
use skrifa::{string::StringId, MetadataProvider};
use write_fonts::{
    read::{
        tables::{head::MacStyle, os2::SelectionFlags},
        TableProvider,
    },
    types::Tag,
};

use crate::{
    glyphs::{self, GlyphOutline, GlyphSet},
    util::{
        canonical_stylename, style_from_filename, weight_class, weight_name, RIBBI_STYLE_NAMES,
    },
};

/// The vertical extent of a font, from its head table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FontBounds {
    pub y_min: i16,
    pub y_max: i16,
}

/// The combined vertical extent of every font in a run.
///
/// Starts from zero, so ymin is never above the baseline nor ymax below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VMetrics {
    pub y_min: i16,
    pub y_max: i16,
}

/// The weight a font's style name implies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedWeight {
    /// The style name without any slope, e.g. "Bold" for "Bold Italic".
    pub weight_name: String,
    /// None for weight names that have no conventional usWeightClass.
    pub weight_class: Option<u16>,
}

impl Truthy for ExpectedWeight {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for FontBounds {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for VMetrics {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for GlyphSet {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

/// OS/2 code page bits for Japanese, Chinese and Korean.
const CJK_CODEPAGE_BITS: [u32; 5] = [17, 18, 19, 20, 21];

/// A font with at least this many CJK codepoints counts as CJK.
const CJK_CODEPOINT_THRESHOLD: usize = 150;

const CJK_RANGES: &[(u32, u32)] = &[
    (0x2E80, 0x2FDF),   // radicals
    (0x3000, 0x30FF),   // punctuation, kana
    (0x3100, 0x31FF),   // bopomofo, hangul compatibility jamo, kanbun
    (0x3200, 0x33FF),   // enclosed, compatibility
    (0x3400, 0x4DBF),   // extension A
    (0x4E00, 0x9FFF),   // unified ideographs
    (0xAC00, 0xD7AF),   // hangul syllables
    (0xF900, 0xFAFF),   // compatibility ideographs
    (0x20000, 0x2FA1F), // supplementary ideographic plane
];

fn is_cjk_codepoint(cp: u32) -> bool {
    CJK_RANGES.iter().any(|(lo, hi)| (*lo..=*hi).contains(&cp))
}

fn has_table(tag: &'static [u8; 4]) -> impl Fn(&ConditionInput<'_>) -> Result<Value, ConditionError> {
    move |input: &ConditionInput<'_>| Ok(input.font()?.has_table(Tag::new(tag)).into())
}

fn is_italic(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font = input.font()?;
    let font_ref = font.font_ref()?;
    let by_selection = font_ref
        .os2()
        .map(|os2| os2.fs_selection().contains(SelectionFlags::ITALIC))
        .unwrap_or_default();
    let by_mac_style = font_ref
        .head()
        .map(|head| head.mac_style().contains(MacStyle::ITALIC))
        .unwrap_or_default();
    let by_name = font.file_name().contains("Italic");
    Ok((by_selection || by_mac_style || by_name).into())
}

fn font_codepoints(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font_ref = input.font()?.font_ref()?;
    let codepoints: BTreeSet<u32> = font_ref.charmap().mappings().map(|(cp, _)| cp).collect();
    Ok(Value::new(codepoints))
}

fn is_cjk_font(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font_ref = input.font()?.font_ref()?;
    let code_pages = font_ref
        .os2()
        .ok()
        .and_then(|os2| os2.ul_code_page_range_1())
        .unwrap_or_default();
    if CJK_CODEPAGE_BITS
        .iter()
        .any(|bit| code_pages & (1 << bit) != 0)
    {
        return Ok(true.into());
    }
    let codepoints = input.get::<BTreeSet<u32>>("font_codepoints")?;
    let cjk = codepoints.iter().filter(|cp| is_cjk_codepoint(**cp)).count();
    Ok((cjk >= CJK_CODEPOINT_THRESHOLD).into())
}

fn font_bounds(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let head = input.font()?.font_ref()?.head()?;
    Ok(Value::new(FontBounds {
        y_min: head.y_min(),
        y_max: head.y_max(),
    }))
}

fn vmetrics(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let mut result = VMetrics::default();
    for font in input.fonts() {
        // one unreadable font leaves the whole run without metrics
        let bounds = input.get_for::<FontBounds>("font_bounds", &Testable::Font(font.clone()))?;
        result.y_min = result.y_min.min(bounds.y_min);
        result.y_max = result.y_max.max(bounds.y_max);
    }
    Ok(Value::new(result))
}

fn glyph_set(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font_ref = input.font()?.font_ref()?;
    Ok(Value::new(GlyphSet::from_font(&font_ref)?))
}

fn outlines(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font_ref = input.font()?.font_ref()?;
    let glyph_set = input.get::<GlyphSet>("glyph_set")?;
    let outlines: Vec<GlyphOutline> = glyphs::outlines(&font_ref, &glyph_set)
        .map_err(|e| ConditionError::failed("outlines", e))?;
    Ok(Value::new(outlines))
}

fn is_ribbi(font: &Font) -> bool {
    style_from_filename(font.path())
        .is_some_and(|style| RIBBI_STYLE_NAMES.contains(&style.as_str()))
}

fn ribbi_fonts(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let fonts: Vec<Arc<Font>> = input
        .fonts()
        .iter()
        .filter(|f| is_ribbi(f))
        .cloned()
        .collect();
    Ok(Value::new(fonts))
}

/// The members of a family for which `is_italic` is `italic`.
fn fonts_by_slant(
    input: &ConditionInput<'_>,
    italic: bool,
) -> Result<Value, ConditionError> {
    let mut fonts = Vec::new();
    for font in input.fonts() {
        let is_italic = input.get_for::<bool>("is_italic", &Testable::Font(font.clone()))?;
        if *is_italic == italic {
            fonts.push(font.clone());
        }
    }
    Ok(Value::new(fonts))
}

/// The canonical style of a font file name, None if it has none.
fn style(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    Ok(Value::new(canonical_stylename(input.font()?.path())))
}

/// Typographic subfamily name, else subfamily name. None if both are missing.
fn expected_os2_weight(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let font_ref = input.font()?.font_ref()?;
    let style: Option<String> = [StringId::TYPOGRAPHIC_SUBFAMILY_NAME, StringId::SUBFAMILY_NAME]
        .into_iter()
        .find_map(|id| {
            font_ref
                .localized_strings(id)
                .english_or_first()
                .map(|name| name.chars().collect())
        });
    let expected = style.map(|style| {
        let weight_name = weight_name(&style);
        ExpectedWeight {
            weight_class: weight_class(&weight_name),
            weight_name,
        }
    });
    Ok(Value::new(expected))
}

fn are_ttf(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let fonts = input.fonts();
    for font in fonts {
        if !*input.get_for::<bool>("is_ttf", &Testable::Font(font.clone()))? {
            return Ok(false.into());
        }
    }
    Ok((!fonts.is_empty()).into())
}

fn stylenames_are_canonical(input: &ConditionInput<'_>) -> Result<Value, ConditionError> {
    let fonts = input.fonts();
    let canonical = !fonts.is_empty()
        && fonts
            .iter()
            .all(|f| canonical_stylename(f.path()).is_some());
    Ok(canonical.into())
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let conditions = [
        Condition::new("is_ttf", Scope::Font, has_table(b"glyf")),
        Condition::new("is_cff", Scope::Font, has_table(b"CFF ")),
        Condition::new("is_cff2", Scope::Font, has_table(b"CFF2")),
        Condition::new("is_variable_font", Scope::Font, has_table(b"fvar")),
        Condition::new("is_italic", Scope::Font, is_italic),
        Condition::new("style", Scope::Font, style),
        Condition::new("expected_os2_weight", Scope::Font, expected_os2_weight),
        Condition::new("font_codepoints", Scope::Font, font_codepoints),
        Condition::new("is_cjk_font", Scope::Font, is_cjk_font).depends_on(&["font_codepoints"]),
        Condition::new("font_bounds", Scope::Font, font_bounds),
        Condition::new("vmetrics", Scope::Run, vmetrics).depends_on(&["font_bounds"]),
        Condition::new("glyph_set", Scope::Font, glyph_set),
        Condition::new("outlines", Scope::Font, outlines).depends_on(&["glyph_set"]),
        Condition::new("ribbi_fonts", Scope::Family, ribbi_fonts),
        Condition::new("roman_fonts", Scope::Family, |input| {
            fonts_by_slant(input, false)
        })
        .depends_on(&["is_italic"]),
        Condition::new("italic_fonts", Scope::Family, |input| {
            fonts_by_slant(input, true)
        })
        .depends_on(&["is_italic"]),
        Condition::new("are_ttf", Scope::Family, are_ttf).depends_on(&["is_ttf"]),
        Condition::new(
            "stylenames_are_canonical",
            Scope::Family,
            stylenames_are_canonical,
        ),
    ];
    for condition in conditions {
        registry.register_condition(condition)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestFont;
    use qaengine::{ConditionCache, GroupBy, RunContext};
    use pretty_assertions::assert_eq;

    /// Evaluate a condition for the first testable of its scope.
    fn evaluate(name: &str, fonts: Vec<Font>) -> Result<Value, ConditionError> {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        registry.validate().unwrap();
        let run = RunContext::from_fonts(fonts, GroupBy::Directory);
        let cache = ConditionCache::new();
        let scope = registry.condition(name).unwrap().scope();
        let testable = run.testables(scope).remove(0);
        qaengine::condition::RunEnv {
            registry: &registry,
            run: &run,
            cache: &cache,
        }
        .condition(name, &testable)
    }

    fn truthy(name: &str, fonts: Vec<Font>) -> bool {
        evaluate(name, fonts).unwrap().is_truthy()
    }

    #[test]
    fn table_presence() {
        let mut ttf = TestFont::new();
        ttf.extra_tables.push(Tag::new(b"glyf"));
        assert!(truthy("is_ttf", vec![ttf.font("a/A-Regular.ttf")]));
        assert!(!truthy("is_cff", vec![ttf.font("a/A-Regular.ttf")]));
        assert!(!truthy("is_variable_font", vec![ttf.font("a/A-Regular.ttf")]));
    }

    #[test]
    fn italic_by_selection_or_name() {
        let plain = TestFont::new();
        assert!(!truthy("is_italic", vec![plain.font("a/A-Regular.ttf")]));
        assert!(truthy("is_italic", vec![plain.font("a/A-Italic.ttf")]));

        let mut flagged = TestFont::new();
        flagged.os2_mut().fs_selection = SelectionFlags::ITALIC;
        assert!(truthy("is_italic", vec![flagged.font("a/A-Oblique.ttf")]));
    }

    #[test]
    fn cjk_by_code_page_or_coverage() {
        let latin = TestFont::new();
        assert!(!truthy("is_cjk_font", vec![latin.font("a/A-Regular.ttf")]));

        let mut code_page = TestFont::new();
        code_page.os2_mut().ul_code_page_range_1 = Some(1 << 18);
        assert!(truthy("is_cjk_font", vec![code_page.font("a/A-Regular.ttf")]));

        let mut coverage = TestFont::new();
        coverage.os2 = None;
        for cp in 0x4E00..0x4E00 + CJK_CODEPOINT_THRESHOLD as u32 {
            coverage.glyph(&format!("uni{cp:04X}"), 1000, &[cp]);
        }
        assert!(truthy("is_cjk_font", vec![coverage.font("a/A-Regular.ttf")]));
    }

    #[test]
    fn vmetrics_spans_the_run() {
        let mut tall = TestFont::new();
        tall.head.y_max = 1100;
        let mut deep = TestFont::new();
        deep.head.y_min = -300;
        let value = evaluate(
            "vmetrics",
            vec![tall.font("a/A-Regular.ttf"), deep.font("b/B-Regular.ttf")],
        )
        .unwrap();
        assert_eq!(
            Some(Arc::new(VMetrics {
                y_min: -300,
                y_max: 1100
            })),
            value.downcast::<VMetrics>()
        );
    }

    #[test]
    fn vmetrics_needs_every_font() {
        let broken = Font::new("b/B-Regular.ttf", None, b"not a font".to_vec().into());
        assert!(evaluate("vmetrics", vec![TestFont::new().font("a/A-Regular.ttf"), broken]).is_err());
    }

    #[test]
    fn family_groupings() {
        let fonts = || {
            vec![
                TestFont::new().font("fam/Fam-Regular.ttf"),
                TestFont::new().font("fam/Fam-Italic.ttf"),
                TestFont::new().font("fam/Fam-Light.ttf"),
            ]
        };
        let ribbi = evaluate("ribbi_fonts", fonts()).unwrap();
        assert_eq!(2, ribbi.downcast::<Vec<Arc<Font>>>().unwrap().len());
        let romans = evaluate("roman_fonts", fonts()).unwrap();
        assert_eq!(2, romans.downcast::<Vec<Arc<Font>>>().unwrap().len());
        let italics = evaluate("italic_fonts", fonts()).unwrap();
        assert_eq!(1, italics.downcast::<Vec<Arc<Font>>>().unwrap().len());
        assert!(truthy("stylenames_are_canonical", fonts()));
        assert!(!truthy("are_ttf", fonts()));
    }

    #[test]
    fn nonstandard_stylename() {
        let fonts = vec![
            TestFont::new().font("fam/Fam-Regular.ttf"),
            TestFont::new().font("fam/Fam-Fancy.ttf"),
        ];
        assert!(!truthy("stylenames_are_canonical", fonts));
    }

    #[test]
    fn weight_from_typographic_subfamily() {
        let mut font = TestFont::new();
        font.name(2, "Italic").name(17, "Bold Italic");
        let value = evaluate("expected_os2_weight", vec![font.font("a/A-BoldItalic.ttf")]).unwrap();
        assert_eq!(
            Some(Arc::new(Some(ExpectedWeight {
                weight_name: "Bold".to_string(),
                weight_class: Some(700),
            }))),
            value.downcast::<Option<ExpectedWeight>>()
        );
        // no name table at all
        assert!(!truthy("expected_os2_weight", vec![TestFont::new().font("a/A-Regular.ttf")]));
    }

    #[test]
    fn style_needs_a_canonical_name() {
        assert!(truthy("style", vec![TestFont::new().font("a/A-BoldItalic.ttf")]));
        assert!(!truthy("style", vec![TestFont::new().font("a/A-Fancy.ttf")]));
    }

    #[test]
    fn glyph_set_is_shared_with_outlines() {
        let mut font = TestFont::new();
        font.glyph("space", 250, &[0x20]);
        let glyphs = evaluate("glyph_set", vec![font.font("a/A-Regular.ttf")]).unwrap();
        assert_eq!(2, glyphs.downcast::<GlyphSet>().unwrap().len());
        // no glyf table, nothing to draw
        assert!(!truthy("outlines", vec![font.font("a/A-Regular.ttf")]));
    }
}
