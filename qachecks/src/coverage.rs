//! Checks over the encoded glyphs of a font and how they are built.

use icu_properties::{props::GeneralCategory, CodePointMapData};
use qaengine::{
    return_result, Check, CheckFnResult, CheckInput, ConfigError, Registry, Scope, Status,
};
use write_fonts::{
    read::{tables::glyf::Glyph, TableProvider},
    types::GlyphId,
};

use crate::{
    glyphs::{GlyphInfo, GlyphSet},
    util::bullet_list,
};

/// Every (codepoint, glyph) mapping, by codepoint.
fn encoded(glyphs: &GlyphSet) -> Vec<(u32, &GlyphInfo)> {
    let mut encoded: Vec<_> = glyphs
        .iter()
        .flat_map(|g| g.codepoints.iter().map(move |cp| (*cp, g)))
        .collect();
    encoded.sort_unstable_by_key(|(cp, _)| *cp);
    encoded
}

/// The three private use areas, less the Apple logo at U+F8FF.
fn is_pua(cp: u32) -> bool {
    let in_area = (0xE000..=0xF8FF).contains(&cp)
        || (0xF0000..=0xFFFFD).contains(&cp)
        || (0x100000..=0x10FFFD).contains(&cp);
    in_area && cp != 0xF8FF
}

fn pua_encoded_glyphs(input: &CheckInput<'_>) -> CheckFnResult {
    let glyphs = input.condition::<GlyphSet>("glyph_set")?;
    let pua: Vec<_> = encoded(&glyphs)
        .into_iter()
        .filter(|(cp, _)| is_pua(*cp))
        .map(|(cp, glyph)| format!("{} U+{cp:02X}", glyph.name))
        .collect();
    let status = if pua.is_empty() {
        Status::pass("No PUA encoded glyphs.")
    } else {
        Status::warn(
            "pua-encoded",
            format!(
                "Glyphs with PUA codepoints:\n\n{}",
                bullet_list(input.full_lists(), &pua, "*")
            ),
        )
    };
    return_result(vec![status])
}

fn marks_width(input: &CheckInput<'_>) -> CheckFnResult {
    let glyphs = input.condition::<GlyphSet>("glyph_set")?;
    let categories = CodePointMapData::<GeneralCategory>::new();
    let mut spacing_combining = Vec::new();
    let mut zero_width_spacing = Vec::new();
    for (cp, glyph) in encoded(&glyphs) {
        let advance = glyph.advance.unwrap_or_default();
        match categories.get32(cp) {
            GeneralCategory::NonspacingMark | GeneralCategory::EnclosingMark if advance != 0 => {
                spacing_combining.push(glyph.name.as_str())
            }
            GeneralCategory::ModifierSymbol | GeneralCategory::ModifierLetter if advance == 0 => {
                zero_width_spacing.push(glyph.name.as_str())
            }
            _ => (),
        }
    }

    let mut statuses = Vec::new();
    if !spacing_combining.is_empty() {
        statuses.push(Status::fail(
            "non-spacing-not-zero",
            format!(
                "Combining accents with width advance width:\n\n{}",
                bullet_list(input.full_lists(), &spacing_combining, "*")
            ),
        ));
    }
    if !zero_width_spacing.is_empty() {
        statuses.push(Status::fail(
            "non-spacing-not-zero",
            format!(
                "Spacing marks without advance width:\n\n{}",
                bullet_list(input.full_lists(), &zero_width_spacing, "*")
            ),
        ));
    }
    if statuses.is_empty() {
        statuses.push(Status::pass("Marks have correct widths."));
    }
    return_result(statuses)
}

/// Single character names of printable ascii, the letters and figures
/// a font is usually drawn from.
fn is_base_glyph(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_graphic() || c.is_ascii_whitespace() || c == '\x0b',
        _ => false,
    }
}

fn composite_glyphs(input: &CheckInput<'_>) -> CheckFnResult {
    let font_ref = input.font()?.font_ref()?;
    let glyphs = input.condition::<GlyphSet>("glyph_set")?;
    let glyf = font_ref.glyf()?;
    let loca = font_ref.loca(None)?;
    let mut not_composite = 0usize;
    for glyph in glyphs.iter().filter(|g| !is_base_glyph(&g.name)) {
        if !matches!(
            loca.get_glyf(GlyphId::new(glyph.gid), &glyf)?,
            Some(Glyph::Composite(_))
        ) {
            not_composite += 1;
        }
    }
    let pct = (not_composite as f64 * 100.0 / glyphs.len() as f64).round_ties_even() as u32;
    let status = if pct > 50 {
        Status::warn(
            "low-composites",
            format!("{pct}% of the glyphs are not composites."),
        )
    } else {
        Status::pass(format!("{}% of the glyphs are composites.", 100 - pct))
    };
    return_result(vec![status])
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new("PUA_encoded_glyphs", Scope::Font, pua_encoded_glyphs)
            .with_title("Check if font has PUA encoded glyphs.")
            .with_rationale(
                "Private use codepoints are rarely needed. Using them for glyphs such as \
                 small caps is a bad practice, so their presence deserves a warning.",
            )
            .with_conditions(&["glyph_set"]),
        Check::new("marks_width", Scope::Font, marks_width)
            .with_title("Check if marks glyphs have the correct width.")
            .with_rationale(
                "To avoid incorrect overlaps when typing, glyphs that are spacing marks must \
                 have width. Combining marks, on the other hand, should have zero width.",
            )
            .with_conditions(&["glyph_set"]),
        Check::new("composite_glyphs", Scope::Font, composite_glyphs)
            .with_title("Check if ttf font uses composite glyphs.")
            .with_rationale(
                "For performance reasons, it is desirable that TrueType fonts use composite \
                 glyphs.",
            )
            .with_conditions(&["is_ttf", "glyph_set"]),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}
