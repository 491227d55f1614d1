//! Checks comparing the members of a family.

use std::{
    collections::{BTreeSet, HashSet},
    path::Path,
    sync::Arc,
};

use indexmap::IndexMap;
use qaengine::{
    return_result, Check, CheckFnResult, CheckInput, ConfigError, Font, Registry, Scope, Status,
};
use skrifa::MetadataProvider;
use write_fonts::read::TableProvider;

use crate::{
    glyphs::GlyphSet,
    util::{bullet_list, canonical_stylename, pretty_print_list},
};

fn tnum_horizontal_metrics(input: &CheckInput<'_>) -> CheckFnResult {
    let fonts = input.condition::<Vec<Arc<Font>>>("ribbi_fonts")?;
    // glyph names by advance, in the order widths are first seen
    let mut tnum_widths: IndexMap<u16, Vec<String>> = IndexMap::new();
    for font in fonts.iter() {
        let glyphs = GlyphSet::from_font(&font.font_ref()?)?;
        for glyph in glyphs.iter().filter(|g| g.name.ends_with(".tnum")) {
            let Some(advance) = glyph.advance else {
                continue;
            };
            tnum_widths
                .entry(advance)
                .or_default()
                .push(glyph.name.clone());
        }
    }
    if tnum_widths.len() <= 1 {
        return return_result(vec![Status::pass("OK")]);
    }

    let mut most_common_width = 0;
    let mut max_count = 0;
    for (width, names) in tnum_widths.iter() {
        if names.len() > max_count {
            max_count = names.len();
            most_common_width = *width;
        }
    }
    tnum_widths.shift_remove(&most_common_width);
    let outliers = tnum_widths
        .iter()
        .map(|(width, names)| format!("{width}: {}", names.join(", ")))
        .collect::<Vec<_>>()
        .join("\n\t");
    return_result(vec![Status::fail(
        "inconsistent-widths",
        format!(
            "The most common tabular glyph width is {most_common_width}. But there are other tabular glyphs with different widths such as the following ones:\n\t{outliers}."
        ),
    )])
}

fn equal_codepoint_coverage(input: &CheckInput<'_>) -> CheckFnResult {
    let mut cmaps: IndexMap<String, BTreeSet<u32>> = IndexMap::new();
    for font in input.fonts() {
        // the stylenames_are_canonical condition guarantees a style
        let style = canonical_stylename(font.path()).unwrap_or_else(|| font.file_name());
        let codepoints = font
            .font_ref()?
            .charmap()
            .mappings()
            .map(|(cp, _)| cp)
            .collect();
        cmaps.insert(style, codepoints);
    }
    let mut all = cmaps.values();
    let common = match all.next() {
        Some(first) => all.fold(first.clone(), |acc, cps| {
            acc.intersection(cps).copied().collect()
        }),
        None => BTreeSet::new(),
    };

    let mut problems = Vec::new();
    for (style, codepoints) in cmaps.iter() {
        let residue: Vec<_> = codepoints
            .difference(&common)
            .map(|cp| format!("U+{cp:04x}"))
            .collect();
        if !residue.is_empty() {
            problems.push(format!(
                "* {style} contains encoded codepoints not found in other related fonts:\n{}",
                bullet_list(input.full_lists(), &residue, "-")
            ));
        }
    }
    let status = if problems.is_empty() {
        Status::pass("All font files in this family have an equivalent encoded glyphset.")
    } else {
        Status::fail("glyphset-diverges", problems.join("\n"))
    };
    return_result(vec![status])
}

/// The file a roman sibling of `italic` would be found at.
fn roman_counterpart(italic: &str, style: &str, is_variable: bool) -> String {
    match (style, is_variable) {
        // "Family-Italic[wght].ttf" => "Family[wght].ttf"
        ("Italic", true) => italic.replace("-Italic", ""),
        // "Family-Italic.ttf" => "Family-Regular.ttf"
        ("Italic", false) => italic.replace("Italic", "Regular"),
        // "Family-BoldItalic.ttf" => "Family-Bold.ttf"
        _ => italic.replace("Italic", ""),
    }
}

fn italics_have_roman_counterparts(input: &CheckInput<'_>) -> CheckFnResult {
    let paths: Vec<String> = input
        .fonts()
        .iter()
        .map(|f| f.path().display().to_string())
        .collect();
    let known: HashSet<&str> = paths.iter().map(String::as_str).collect();

    let mut statuses = Vec::new();
    let mut missing_roman = Vec::new();
    for italic in paths.iter().filter(|p| p.contains("Italic")) {
        let basename = Path::new(italic)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = basename.rsplit('-').next().unwrap_or_default();
        if !basename.contains('-') || suffix.split('.').count() != 2 {
            statuses.push(Status::warn(
                "bad-filename",
                format!("Filename seems to be incorrect: '{italic}'"),
            ));
        }
        let style = suffix.split('.').next().unwrap_or_default();
        let is_variable = style.contains('[');
        let style = style.split('[').next().unwrap_or_default();
        if !known.contains(roman_counterpart(italic, style, is_variable).as_str()) {
            missing_roman.push(italic.clone());
        }
    }
    if missing_roman.is_empty() {
        statuses.push(Status::pass("OK"));
    } else {
        statuses.push(Status::fail(
            "missing-roman",
            format!(
                "Italics missing a Roman counterpart: {}",
                pretty_print_list(input.full_lists(), &missing_roman)
            ),
        ));
    }
    return_result(statuses)
}

/// Fonts whose glyph count differs from the largest in the group.
///
/// Returns the name and count of the largest, plus every outlier.
fn glyph_count_outliers(
    fonts: &[Arc<Font>],
) -> Result<(String, u16, Vec<(String, u16)>), qaengine::CheckError> {
    let mut counts = Vec::new();
    for font in fonts {
        let num_glyphs = font.font_ref()?.maxp()?.num_glyphs();
        counts.push((font.path().display().to_string(), num_glyphs));
    }
    let (max_font, max_count) = counts
        .iter()
        .fold((String::new(), 0), |(name, max), (font, count)| {
            if *count > max {
                (font.clone(), *count)
            } else {
                (name, max)
            }
        });
    let outliers = counts
        .into_iter()
        .filter(|(_, count)| *count != max_count)
        .collect();
    Ok((max_font, max_count, outliers))
}

fn equal_numbers_of_glyphs(input: &CheckInput<'_>) -> CheckFnResult {
    let romans = input.condition::<Vec<Arc<Font>>>("roman_fonts")?;
    let italics = input.condition::<Vec<Arc<Font>>>("italic_fonts")?;

    let mut statuses = Vec::new();
    for (fonts, kind, label) in [(romans, "roman", "roman"), (italics, "italic", "italics")] {
        let (max_font, max_count, outliers) = glyph_count_outliers(&fonts)?;
        if outliers.is_empty() {
            statuses.push(Status::pass(format!(
                "All {label} files in this family have an equal total amount of glyphs."
            )));
            continue;
        }
        let outliers = outliers
            .iter()
            .map(|(font, count)| format!("{font}: {count}"))
            .collect::<Vec<_>>()
            .join("\n\t");
        statuses.push(Status::warn(
            &format!("{kind}-different-number-of-glyphs"),
            format!(
                "The {label} files don't have the same number of glyphs. {max_font} has {max_count} and\n\t{outliers}"
            ),
        ));
    }
    return_result(statuses)
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new(
            "family/tnum_horizontal_metrics",
            Scope::Family,
            tnum_horizontal_metrics,
        )
        .with_title("All tabular figures must have the same width across the RIBBI-family.")
        .with_rationale(
            "Tabular figures need to have the same metrics in all styles in order to allow \
             tables to be set with proper typographic control, but to maintain the \
             placement of decimals and numeric columns between rows.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/2278")
        .with_conditions(&["ribbi_fonts"]),
        Check::new(
            "family/equal_codepoint_coverage",
            Scope::Family,
            equal_codepoint_coverage,
        )
        .with_title("Fonts have equal codepoint coverage.")
        .with_rationale(
            "For a given family, all fonts must have the same codepoint coverage so that \
             switching style never falls back to another font.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/4180")
        .with_conditions(&["are_ttf", "stylenames_are_canonical"]),
        Check::new(
            "family/italics_have_roman_counterparts",
            Scope::Run,
            italics_have_roman_counterparts,
        )
        .with_title("Ensure Italic styles have Roman counterparts.")
        .with_rationale(
            "For each font family every Italic style must have a Roman sibling. This kind \
             of problem was first observed where the Bold style was missing but \
             BoldItalic was included.",
        )
        .with_proposal("https://github.com/fonttools/fontbakery/issues/1733")
        .raw_bytes_only(),
        Check::new(
            "family/equal_numbers_of_glyphs",
            Scope::Family,
            equal_numbers_of_glyphs,
        )
        .with_title("Equal number of glyphs.")
        .with_rationale(
            "The romans of a family should all have the same number of glyphs, and so \
             should the italics.",
        )
        .with_conditions(&["roman_fonts", "italic_fonts"]),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}
