//! Vertical metrics checks.

use indexmap::IndexMap;
use kurbo::Rect;
use qaengine::{
    return_result, Check, CheckError, CheckFnResult, CheckInput, ConfigError, Font, Registry,
    Scope, Status,
};
use skrifa::{string::StringId, MetadataProvider};
use write_fonts::read::{FontRef, ReadError, TableProvider};

use crate::{
    conditions::VMetrics,
    glyphs::{self, GlyphSet},
};

/// A table that may legitimately be absent.
fn optional<T>(table: Result<T, ReadError>) -> Result<Option<T>, CheckError> {
    match table {
        Ok(table) => Ok(Some(table)),
        Err(ReadError::TableIsMissing(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn win_ascent_and_descent(input: &CheckInput<'_>) -> CheckFnResult {
    let font_ref = input.font()?.font_ref()?;
    let Some(os2) = optional(font_ref.os2())? else {
        return return_result(vec![Status::fail("lacks-OS/2", "Font file lacks OS/2 table")]);
    };
    let vmetrics = input.condition::<VMetrics>("vmetrics")?;
    let win_ascent = os2.us_win_ascent() as i32;
    let win_descent = os2.us_win_descent() as i32;
    let y_max = vmetrics.y_max as i32;
    let y_min = (vmetrics.y_min as i32).abs();

    let mut problems = Vec::new();
    if win_ascent < y_max {
        problems.push(Status::fail(
            "ascent",
            format!(
                "OS/2.usWinAscent value should be equal or greater than {y_max}, but got {win_ascent} instead"
            ),
        ));
    }
    if win_ascent > y_max * 2 {
        problems.push(Status::fail(
            "ascent",
            format!(
                "OS/2.usWinAscent value {win_ascent} is too large. It should be less than double the yMax. Current yMax value is {y_max}"
            ),
        ));
    }
    if win_descent < y_min {
        problems.push(Status::fail(
            "descent",
            format!(
                "OS/2.usWinDescent value should be equal or greater than {y_min}, but got {win_descent} instead"
            ),
        ));
    }
    if win_descent > y_min * 2 {
        problems.push(Status::fail(
            "descent",
            format!(
                "OS/2.usWinDescent value {win_descent} is too large. It should be less than double the yMin. Current absolute yMin value is {y_min}"
            ),
        ));
    }
    if problems.is_empty() {
        problems.push(Status::pass(
            "OS/2 usWinAscent & usWinDescent values look good!",
        ));
    }
    return_result(problems)
}

fn os2_metrics_match_hhea(input: &CheckInput<'_>) -> CheckFnResult {
    let font = input.font()?;
    let font_ref = font.font_ref()?;
    let filename = font.file_name();
    let os2 = optional(font_ref.os2())?;
    let hhea = optional(font_ref.hhea())?;

    let mut missing = Vec::new();
    if os2.is_none() {
        missing.push(Status::fail(
            "lacks-OS/2",
            format!("{filename} lacks a 'OS/2' table."),
        ));
    }
    if hhea.is_none() {
        missing.push(Status::fail(
            "lacks-hhea",
            format!("{filename} lacks a 'hhea' table."),
        ));
    }
    let (Some(os2), Some(hhea)) = (os2, hhea) else {
        return return_result(missing);
    };

    let (typo_ascender, ascent) = (os2.s_typo_ascender(), hhea.ascender().to_i16());
    let (typo_descender, descent) = (os2.s_typo_descender(), hhea.descender().to_i16());
    let (typo_line_gap, line_gap) = (os2.s_typo_line_gap(), hhea.line_gap().to_i16());
    let status = if typo_ascender != ascent {
        Status::fail(
            "ascender",
            format!(
                "OS/2 sTypoAscender ({typo_ascender}) and hhea ascent ({ascent}) must be equal."
            ),
        )
    } else if typo_descender != descent {
        Status::fail(
            "descender",
            format!(
                "OS/2 sTypoDescender ({typo_descender}) and hhea descent ({descent}) must be equal."
            ),
        )
    } else if typo_line_gap != line_gap {
        Status::fail(
            "lineGap",
            format!(
                "OS/2 sTypoLineGap ({typo_line_gap}) and hhea lineGap ({line_gap}) must be equal."
            ),
        )
    } else {
        Status::pass("OS/2.sTypoAscender/Descender values match hhea.ascent/descent.")
    };
    return_result(vec![status])
}

/// The name a font is reported by in family-wide comparisons.
fn full_name(font: &Font, font_ref: &FontRef) -> String {
    font_ref
        .localized_strings(StringId::FULL_NAME)
        .english_or_first()
        .map(|name| name.chars().collect())
        .unwrap_or_else(|| font.file_name())
}

const VERTICAL_METRICS: [&str; 8] = [
    "sTypoAscender",
    "sTypoDescender",
    "sTypoLineGap",
    "usWinAscent",
    "usWinDescent",
    "ascent",
    "descent",
    "lineGap",
];

fn family_vertical_metrics(input: &CheckInput<'_>) -> CheckFnResult {
    let mut statuses = Vec::new();
    let mut values: IndexMap<&str, IndexMap<String, i32>> = VERTICAL_METRICS
        .iter()
        .map(|m| (*m, IndexMap::new()))
        .collect();

    for font in input.fonts() {
        let font_ref = font.font_ref()?;
        let filename = font.file_name();
        let Some(os2) = optional(font_ref.os2())? else {
            statuses.push(Status::fail(
                "lacks-OS/2",
                format!("{filename} lacks an 'OS/2' table."),
            ));
            continue;
        };
        let Some(hhea) = optional(font_ref.hhea())? else {
            statuses.push(Status::fail(
                "lacks-hhea",
                format!("{filename} lacks a 'hhea' table."),
            ));
            continue;
        };
        let name = full_name(font, &font_ref);
        let metrics = [
            os2.s_typo_ascender() as i32,
            os2.s_typo_descender() as i32,
            os2.s_typo_line_gap() as i32,
            os2.us_win_ascent() as i32,
            os2.us_win_descent() as i32,
            hhea.ascender().to_i16() as i32,
            hhea.descender().to_i16() as i32,
            hhea.line_gap().to_i16() as i32,
        ];
        for (by_font, value) in values.values_mut().zip(metrics) {
            by_font.insert(name.clone(), value);
        }
    }
    if !statuses.is_empty() {
        // comparisons need every font to have both tables
        return return_result(statuses);
    }

    for (metric, by_font) in values.iter() {
        let mut distinct: Vec<_> = by_font.values().collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() > 1 {
            let detail = by_font
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join("\n");
            statuses.push(Status::fail(
                &format!("{metric}-mismatch"),
                format!("{metric} is not the same across the family:\n{detail}"),
            ));
        }
    }
    if statuses.is_empty() {
        statuses.push(Status::pass(
            "Vertical metrics are the same across the family.",
        ));
    }
    return_result(statuses)
}

fn linegaps(input: &CheckInput<'_>) -> CheckFnResult {
    let font_ref = input.font()?.font_ref()?;
    let os2 = optional(font_ref.os2())?;
    let hhea = optional(font_ref.hhea())?;
    let (Some(os2), Some(hhea)) = (&os2, &hhea) else {
        let mut missing = Vec::new();
        // sorted by tag
        if os2.is_none() {
            missing.push(Status::fail("lacks-table", "Font lacks 'OS/2' table."));
        }
        if hhea.is_none() {
            missing.push(Status::fail("lacks-table", "Font lacks 'hhea' table."));
        }
        return return_result(missing);
    };
    let status = if hhea.line_gap().to_i16() != 0 {
        Status::warn("hhea", "hhea lineGap is not equal to 0.")
    } else if os2.s_typo_line_gap() != 0 {
        Status::warn("OS/2", "OS/2 sTypoLineGap is not equal to 0.")
    } else {
        Status::pass("OS/2 sTypoLineGap and hhea lineGap are both 0.")
    };
    return_result(vec![status])
}

/// The bounds of a glyph's outline, erroring if it has none to measure.
fn glyph_bounds(font_ref: &FontRef, gid: u32, name: &str) -> Result<Rect, CheckError> {
    glyphs::draw_glyph(font_ref, gid)
        .map_err(CheckError::failed)?
        .and_then(|contours| glyphs::bounds(&contours))
        .ok_or_else(|| CheckError::failed(format!("/{name} has no outline to measure")))
}

fn typoascender_exceeds_agrave(input: &CheckInput<'_>) -> CheckFnResult {
    // drawing may build caches on the font, keep them off the shared bytes
    let copy = input.font()?.working_copy()?;
    let font_ref = copy.font_ref()?;
    let Some(os2) = optional(font_ref.os2())? else {
        return return_result(vec![Status::fail("lacks-OS/2", "Font file lacks OS/2 table")]);
    };
    let glyphs = GlyphSet::from_font(&font_ref)?;
    let Some(agrave) = glyphs.lookup(&["Agrave", "uni00C0"], 0xC0) else {
        return return_result(vec![Status::skip(
            "lacks-Agrave",
            "Font file lacks the /Agrave, so it can’t be compared with typoAscender",
        )]);
    };
    let y_max = glyph_bounds(&font_ref, agrave.gid, &agrave.name)?.max_y();
    let typo_ascender = os2.s_typo_ascender();
    let status = if (typo_ascender as f64) < y_max {
        Status::warn(
            "typoAscender",
            format!(
                "OS/2.sTypoAscender value should be greater than {y_max}, but got {typo_ascender} instead"
            ),
        )
    } else {
        Status::pass("OS/2.sTypoAscender value is greater than the yMax of /Agrave.")
    };
    return_result(vec![status])
}

const SOME_UPPERCASE_GLYPHS: [&str; 12] =
    ["A", "B", "C", "D", "E", "H", "I", "M", "O", "S", "T", "X"];

/// Whether caps sit in the middle of the space between hhea ascent and descent.
///
/// `caps` holds the (lowest, highest) point of each sample glyph.
fn caps_are_centered(upm: u16, ascent: i16, descent: i16, caps: &[(f64, f64)]) -> bool {
    let line_spacing_factor = 1.20;
    let error_margin = line_spacing_factor * upm as f64 * 0.18;
    let count = caps.len().max(1) as f64;
    let average_descender = caps.iter().map(|(low, _)| low).sum::<f64>() / count;
    let average_cap_height = caps.iter().map(|(_, high)| high).sum::<f64>() / count;
    let top_margin = ascent as f64 - average_cap_height;
    let bottom_margin = (descent as f64).abs() + average_descender;
    (top_margin - bottom_margin).abs() <= error_margin
}

fn caps_vertically_centered(input: &CheckInput<'_>) -> CheckFnResult {
    let copy = input.font()?.working_copy()?;
    let font_ref = copy.font_ref()?;
    let glyphs = GlyphSet::from_font(&font_ref)?;
    let Some(samples) = SOME_UPPERCASE_GLYPHS
        .iter()
        .map(|name| glyphs.by_name(name))
        .collect::<Option<Vec<_>>>()
    else {
        return return_result(vec![Status::skip(
            "lacks-ascii",
            "The implementation of this check relies on a few samples of uppercase latin characters that are not available in this font.",
        )]);
    };

    let mut caps = Vec::new();
    for glyph in samples {
        let bounds = glyph_bounds(&font_ref, glyph.gid, &glyph.name)?;
        caps.push((bounds.min_y(), bounds.max_y()));
    }
    let upm = font_ref.head()?.units_per_em();
    let hhea = font_ref.hhea()?;
    let status = if caps_are_centered(
        upm,
        hhea.ascender().to_i16(),
        hhea.descender().to_i16(),
        &caps,
    ) {
        Status::pass("Uppercase glyphs are vertically centered in the em box.")
    } else {
        Status::warn(
            "vertical-metrics-not-centered",
            "Uppercase glyphs are not vertically centered in the em box.",
        )
    };
    return_result(vec![status])
}

const LEGACY_METRICS_PROPOSAL: &str = "https://github.com/fonttools/fontbakery/issues/4829";

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new(
            "family/win_ascent_and_descent",
            Scope::Font,
            win_ascent_and_descent,
        )
        .with_title("Checking OS/2 usWinAscent & usWinDescent.")
        .with_rationale(
            "A font's winAscent and winDescent values should be greater than or equal to \
             the head table's yMax, abs(yMin) values. If they are less than these values, \
             clipping can occur on Windows platforms. When the 'win' metrics are \
             significantly greater than the UPM the linespacing can appear too loose; \
             enabling the OS/2 fsSelection bit 7 (Use_Typo_Metrics) makes Windows use the \
             'typo' values instead. The values are compared against the extent of every \
             font in the run, not just the one being checked.",
        )
        .with_proposal(LEGACY_METRICS_PROPOSAL)
        .with_conditions(&["vmetrics", "not is_cjk_font"]),
        Check::new("os2_metrics_match_hhea", Scope::Font, os2_metrics_match_hhea)
            .with_title("Checking OS/2 Metrics match hhea Metrics.")
            .with_rationale(
                "OS/2 and hhea vertical metric values should match. This will produce the \
                 same linespacing on Mac, GNU+Linux and Windows. Mac OS X uses the hhea \
                 values, Windows uses OS/2 or Win depending on the OS or fsSelection bit \
                 value.",
            )
            .with_proposal(LEGACY_METRICS_PROPOSAL)
            .with_conditions(&["not is_cjk_font"]),
        Check::new(
            "family/vertical_metrics",
            Scope::Family,
            family_vertical_metrics,
        )
        .with_title("Each font in a family must have the same set of vertical metrics values.")
        .with_rationale(
            "We want all fonts within a family to have the same vertical metrics so their \
             line spacing is consistent across the family.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/1487"),
        Check::new("linegaps", Scope::Font, linegaps)
            .with_title("Checking Vertical Metric Linegaps.")
            .with_rationale(
                "The LineGap value is a space added to the line height created by the union \
                 of the (typo/hhea)Ascender and (typo/hhea)Descender. It is handled \
                 differently according to the environment. For better linespacing \
                 consistency across platforms, (typo/hhea)LineGap values must be 0.",
            )
            .with_proposal("https://github.com/fonttools/fontbakery/issues/4133")
            .with_proposal("https://googlefonts.github.io/gf-guide/metrics.html"),
        Check::new(
            "typoascender_exceeds_Agrave",
            Scope::Font,
            typoascender_exceeds_agrave,
        )
        .with_title("Checking that the typoAscender exceeds the yMax of the /Agrave.")
        .with_rationale(
            "MacOS uses OS/2.sTypoAscender/Descender values to determine the line height \
             of a font. If the sTypoAscender value is smaller than the maximum height of \
             the uppercase /Agrave, the sTypoAscender value is ignored and a very tall \
             line height is used instead.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/3170"),
        Check::new(
            "caps_vertically_centered",
            Scope::Font,
            caps_vertically_centered,
        )
        .with_title("Check if uppercase glyphs are vertically centered.")
        .with_rationale(
            "In order to center text in buttons, lists, and grid systems with minimal \
             additional CSS work, the uppercase glyphs should be vertically centered in \
             the em box. This mainly applies to Latin, Greek, Cyrillic and similar \
             scripts, and is one possible approach to vertical metrics among others.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/4139"),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}
