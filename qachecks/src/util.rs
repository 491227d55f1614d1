//! Message formatting and file name conventions shared by checks.

use std::{fmt::Display, path::Path};

/// How many items a list shows before it is shortened.
const SHORTEN_AFTER: usize = 10;

const FULL_LISTS_HINT: &str = "Use --full-lists to disable shortening of long lists.";

/// Render items as a markdown bullet list, shortened unless `full_lists`.
pub fn bullet_list<T: Display>(full_lists: bool, items: &[T], bullet: &str) -> String {
    let shown = if full_lists || items.len() <= SHORTEN_AFTER + 2 {
        items.len()
    } else {
        SHORTEN_AFTER
    };
    let mut lines: Vec<_> = items[..shown]
        .iter()
        .map(|item| format!("\t{bullet} {item}"))
        .collect();
    if shown < items.len() {
        lines.push(format!("\t{bullet} And {} more.", items.len() - shown));
        lines.push(String::new());
        lines.push(FULL_LISTS_HINT.to_string());
    }
    lines.join("\n")
}

/// Render items inline, as in "a, b and c", shortened unless `full_lists`.
pub fn pretty_print_list<T: Display>(full_lists: bool, items: &[T]) -> String {
    let items: Vec<_> = items.iter().map(|i| i.to_string()).collect();
    match items.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        _ if !full_lists && items.len() > SHORTEN_AFTER + 2 => format!(
            "{}, and {} more.\n\n{FULL_LISTS_HINT}",
            items[..SHORTEN_AFTER].join(", "),
            items.len() - SHORTEN_AFTER
        ),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// The styles a static font file name may end in.
const STATIC_STYLE_NAMES: &[&str] = &[
    "Thin",
    "ExtraLight",
    "Light",
    "Regular",
    "Medium",
    "SemiBold",
    "Bold",
    "ExtraBold",
    "Black",
    "ThinItalic",
    "ExtraLightItalic",
    "LightItalic",
    "Italic",
    "MediumItalic",
    "SemiBoldItalic",
    "BoldItalic",
    "ExtraBoldItalic",
    "BlackItalic",
];

pub(crate) const RIBBI_STYLE_NAMES: &[&str] = &["Regular", "Italic", "Bold", "BoldItalic"];

/// The style part of a file name, e.g. "BoldItalic" for "Family-BoldItalic.ttf".
///
/// Variable font axis tags are dropped, "Family-Italic[wght].ttf" gives "Italic".
/// None when the name has no "-" separated style.
pub fn style_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, style) = stem.rsplit_once('-')?;
    let style = style.split('[').next().unwrap_or(style);
    (!style.is_empty()).then(|| style.to_string())
}

/// The canonical style name for a font file, if the name follows convention.
///
/// A variable font without a style suffix, "Family[wght].ttf", is Regular.
pub fn canonical_stylename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let is_variable = stem.contains('[');
    match style_from_filename(path) {
        Some(style) if is_variable => (style == "Italic").then_some(style),
        Some(style) => STATIC_STYLE_NAMES.contains(&style.as_str()).then_some(style),
        None if is_variable => Some("Regular".to_string()),
        None => None,
    }
}

/// usWeightClass by weight name, in the order names are looked for.
const WEIGHT_CLASSES: &[(&str, u16)] = &[
    ("Thin", 250),
    ("ExtraLight", 275),
    ("Light", 300),
    ("Regular", 400),
    ("Medium", 500),
    ("SemiBold", 600),
    ("Bold", 700),
    ("ExtraBold", 800),
    ("Black", 900),
];

/// The weight part of a style name: "Bold" for "Bold Italic", "Regular" for "Italic".
pub fn weight_name(style: &str) -> String {
    if style == "Italic" {
        return "Regular".to_string();
    }
    style
        .strip_suffix("Italic")
        .or_else(|| style.strip_suffix("Oblique"))
        .unwrap_or(style)
        .trim_end()
        .to_string()
}

/// The usWeightClass a weight name calls for, matching whole words.
pub fn weight_class(weight_name: &str) -> Option<u16> {
    let words: Vec<_> = weight_name
        .split(' ')
        .map(str::to_ascii_lowercase)
        .collect();
    WEIGHT_CLASSES
        .iter()
        .find(|(name, _)| words.contains(&name.to_ascii_lowercase()))
        .map(|(_, class)| *class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn short_lists_are_complete() {
        assert_eq!("\t* a\n\t* b", bullet_list(false, &["a", "b"], "*"));
        assert_eq!("a, b and c", pretty_print_list(false, &["a", "b", "c"]));
        assert_eq!("a", pretty_print_list(false, &["a"]));
    }

    #[test]
    fn long_lists_are_shortened() {
        let items: Vec<_> = (0..20).collect();
        let short = bullet_list(false, &items, "-");
        assert!(short.contains("\t- 9\n"), "{short}");
        assert!(!short.contains("\t- 10\n"), "{short}");
        assert!(short.contains("And 10 more."), "{short}");

        let full = bullet_list(true, &items, "-");
        assert!(full.ends_with("\t- 19"), "{full}");

        let inline = pretty_print_list(false, &items);
        assert!(inline.starts_with("0, 1, 2"), "{inline}");
        assert!(inline.contains("and 10 more."), "{inline}");
    }

    #[rstest]
    #[case::italic("Italic", "Regular", Some(400))]
    #[case::bold_italic("Bold Italic", "Bold", Some(700))]
    #[case::oblique("Light Oblique", "Light", Some(300))]
    #[case::compound("ExtraBold", "ExtraBold", Some(800))]
    #[case::case_insensitive("semibold", "semibold", Some(600))]
    #[case::unknown("Fancy", "Fancy", None)]
    fn weights(#[case] style: &str, #[case] name: &str, #[case] class: Option<u16>) {
        assert_eq!(name, weight_name(style));
        assert_eq!(class, weight_class(&weight_name(style)));
    }

    #[rstest]
    #[case::regular("fonts/Family-Regular.ttf", Some("Regular"))]
    #[case::bold_italic("Family-BoldItalic.otf", Some("BoldItalic"))]
    #[case::varfont("Family[wght].ttf", Some("Regular"))]
    #[case::varfont_italic("Family-Italic[wght,wdth].ttf", Some("Italic"))]
    #[case::varfont_bold("Family-Bold[wght].ttf", None)]
    #[case::unknown("Family-Fancy.ttf", None)]
    #[case::no_style("Family.ttf", None)]
    fn canonical_style(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            expected.map(str::to_string),
            canonical_stylename(Path::new(path))
        );
    }
}
