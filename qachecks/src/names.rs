//! Name table checks.

use std::collections::{BTreeSet, HashSet};

use qaengine::{
    return_result, Check, CheckError, CheckFnResult, CheckInput, ConfigError, Registry, Scope,
    Severity, Status,
};
use write_fonts::{
    read::{tables::name::NameRecord, FontRef, ReadError, TableProvider},
    types::NameId,
};

use crate::util::RIBBI_STYLE_NAMES;

/// The strings of the name records `accept` picks, none without a name table.
fn name_strings(
    font_ref: &FontRef,
    accept: impl Fn(&NameRecord) -> bool,
) -> Result<Vec<String>, CheckError> {
    let name = match font_ref.name() {
        Ok(name) => name,
        Err(ReadError::TableIsMissing(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let data = name.string_data();
    let mut strings = Vec::new();
    for record in name.name_record().iter().filter(|r| accept(*r)) {
        strings.push(record.string(data)?.to_string());
    }
    Ok(strings)
}

fn by_id(id: u16) -> impl Fn(&NameRecord) -> bool {
    move |record| record.name_id() == NameId::new(id)
}

/// Windows, Unicode BMP, English (US).
fn windows_english(id: u16) -> impl Fn(&NameRecord) -> bool {
    move |record| {
        record.platform_id() == 3
            && record.encoding_id() == 1
            && record.language_id() == 0x409
            && record.name_id() == NameId::new(id)
    }
}

const REQUIRED: [u16; 4] = [1, 2, 4, 6];

/// Required unless the style is one of regular, italic, bold and bold italic.
const TYPOGRAPHIC: [u16; 2] = [16, 17];

const OPTIONAL: [u16; 11] = [0, 3, 5, 7, 8, 9, 10, 11, 12, 13, 14];

fn name_id_label(id: u16) -> &'static str {
    match id {
        0 => "COPYRIGHT_NOTICE",
        1 => "FONT_FAMILY_NAME",
        2 => "FONT_SUBFAMILY_NAME",
        3 => "UNIQUE_FONT_IDENTIFIER",
        4 => "FULL_FONT_NAME",
        5 => "VERSION_STRING",
        6 => "POSTSCRIPT_NAME",
        7 => "TRADEMARK",
        8 => "MANUFACTURER_NAME",
        9 => "DESIGNER",
        10 => "DESCRIPTION",
        11 => "VENDOR_URL",
        12 => "DESIGNER_URL",
        13 => "LICENSE_DESCRIPTION",
        14 => "LICENSE_INFO_URL",
        16 => "TYPOGRAPHIC_FAMILY_NAME",
        17 => "TYPOGRAPHIC_SUBFAMILY_NAME",
        _ => "UNKNOWN",
    }
}

fn mandatory_entries(input: &CheckInput<'_>) -> CheckFnResult {
    let font_ref = input.font()?.font_ref()?;
    let style = input.condition::<Option<String>>("style")?;
    let is_ribbi = style
        .as_deref()
        .is_some_and(|style| RIBBI_STYLE_NAMES.contains(&style));
    let (required, unnecessary): (Vec<u16>, &[u16]) = if is_ribbi {
        (REQUIRED.to_vec(), &TYPOGRAPHIC[..])
    } else {
        ([&REQUIRED[..], &TYPOGRAPHIC[..]].concat(), &[])
    };

    let mut statuses = Vec::new();
    for id in required {
        let strings = name_strings(&font_ref, by_id(id))?;
        if strings.iter().all(String::is_empty) {
            statuses.push(Status::fail(
                "missing-required-entry",
                format!("Font lacks entry with nameId={id} ({})", name_id_label(id)),
            ));
        }
    }
    for id in OPTIONAL {
        if name_strings(&font_ref, by_id(id))?.is_empty() {
            statuses.push(Status::info(
                "missing-optional-entry",
                format!("Font lacks entry with nameId={id} ({})", name_id_label(id)),
            ));
        }
    }
    for id in unnecessary {
        if !name_strings(&font_ref, by_id(*id))?.is_empty() {
            statuses.push(Status::info(
                "unnecessary-entry",
                format!(
                    "Font have unnecessary name entry with nameId={id} ({})",
                    name_id_label(*id)
                ),
            ));
        }
    }
    if !statuses.iter().any(|s| s.severity == Severity::Fail) {
        statuses.push(Status::pass(
            "Font contains values for all mandatory name table entries.",
        ));
    }
    return_result(statuses)
}

/// Names seen more than once, sorted.
fn duplicates(names: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !seen.insert(name.clone()))
        .collect()
}

fn duplicated_names(input: &CheckInput<'_>) -> CheckFnResult {
    let mut full_names = Vec::new();
    let mut postscript_names = Vec::new();
    for font in input.fonts() {
        let font_ref = font.font_ref()?;
        full_names.extend(name_strings(&font_ref, windows_english(4))?.into_iter().take(1));
        postscript_names.extend(name_strings(&font_ref, windows_english(6))?.into_iter().take(1));
    }

    let mut statuses = Vec::new();
    for (names, code, kind) in [
        (full_names, "duplicate-full-names", "full"),
        (postscript_names, "duplicate-postscript-names", "postscript"),
    ] {
        let duplicates = duplicates(names);
        if !duplicates.is_empty() {
            let list: String = duplicates.iter().map(|n| format!("* {n}\n")).collect();
            statuses.push(Status::fail(
                code,
                format!("Following {kind} names are duplicate:\n\n{list}"),
            ));
        }
    }
    if statuses.is_empty() {
        statuses.push(Status::pass("All names are unique"));
    }
    return_result(statuses)
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new("name/mandatory_entries", Scope::Font, mandatory_entries)
            .with_title("Font has all mandatory 'name' table entries?")
            .with_rationale(
                "For proper functioning, fonts must have some specific records. Other name \
                 records are optional but desirable to be present.",
            )
            .with_conditions(&["style"]),
        Check::new("family/duplicated_names", Scope::Family, duplicated_names)
            .with_title("Check if font doesn't have duplicated names within a family.")
            .with_rationale(
                "Duplicated name records can keep fonts from being listed in design apps, \
                 or break the automatic creation of CSS classes and @font-face rules.",
            )
            .with_proposal("https://github.com/TypeNetwork/fontQA/issues/25"),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{codes, run_check, TestFont};
    use pretty_assertions::assert_eq;
    use qaengine::{CheckResult, Report};

    fn only(report: &Report) -> &CheckResult {
        assert_eq!(1, report.results().len(), "{report:#?}");
        &report.results()[0]
    }

    fn with_names(ids: &[u16]) -> TestFont {
        let mut font = TestFont::new();
        for id in ids {
            font.name(*id, "Test");
        }
        font
    }

    const EVERYTHING_RIBBI: [u16; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14];

    #[test]
    fn ribbi_with_every_entry() {
        let font = with_names(&EVERYTHING_RIBBI);
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Bold.ttf")]);
        let result = only(&report);
        assert_eq!(Severity::Pass, result.verdict);
        assert_eq!(vec![""], codes(result));
    }

    #[test]
    fn optional_entries_are_informational() {
        let font = with_names(&REQUIRED);
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Regular.ttf")]);
        let result = only(&report);
        assert_eq!(Severity::Pass, result.verdict);
        assert_eq!(
            OPTIONAL.len(),
            codes(result)
                .iter()
                .filter(|c| **c == "missing-optional-entry")
                .count()
        );
        assert_eq!(
            "Font lacks entry with nameId=0 (COPYRIGHT_NOTICE)",
            result.statuses[0].message
        );
    }

    #[test]
    fn other_styles_need_typographic_names() {
        let font = with_names(&EVERYTHING_RIBBI);
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Light.ttf")]);
        let result = only(&report);
        assert_eq!(
            vec!["missing-required-entry", "missing-required-entry"],
            codes(result)
        );
        assert_eq!(
            "Font lacks entry with nameId=16 (TYPOGRAPHIC_FAMILY_NAME)",
            result.statuses[0].message
        );
    }

    #[test]
    fn empty_family_name_is_missing() {
        let mut font = with_names(&[0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        font.name(1, "");
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Italic.ttf")]);
        assert_eq!(vec!["missing-required-entry"], codes(only(&report)));
    }

    #[test]
    fn ribbi_has_no_use_for_typographic_names() {
        let mut font = with_names(&EVERYTHING_RIBBI);
        font.name(16, "Test").name(17, "Regular");
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Regular.ttf")]);
        let result = only(&report);
        assert_eq!(Severity::Pass, result.verdict);
        assert_eq!(
            vec!["unnecessary-entry", "unnecessary-entry", ""],
            codes(result)
        );
    }

    #[test]
    fn mandatory_entries_need_a_known_style() {
        let font = with_names(&EVERYTHING_RIBBI);
        let report = run_check("name/mandatory_entries", vec![font.font("a/A-Fancy.ttf")]);
        assert_eq!(Severity::Skip, only(&report).verdict);
    }

    fn named(full_name: &str, postscript_name: &str) -> TestFont {
        let mut font = TestFont::new();
        font.name(4, full_name).name(6, postscript_name);
        font
    }

    #[test]
    fn unique_names() {
        let report = run_check(
            "family/duplicated_names",
            vec![
                named("Fam Regular", "Fam-Regular").font("fam/Fam-Regular.ttf"),
                named("Fam Bold", "Fam-Bold").font("fam/Fam-Bold.ttf"),
            ],
        );
        assert_eq!(Severity::Pass, only(&report).verdict);
    }

    #[test]
    fn duplicate_names_are_listed() {
        let report = run_check(
            "family/duplicated_names",
            vec![
                named("Fam Regular", "Fam-Regular").font("fam/Fam-Regular.ttf"),
                named("Fam Regular", "Fam-Regular").font("fam/Fam-Bold.ttf"),
                named("Fam Light", "Fam-Light").font("fam/Fam-Light.ttf"),
            ],
        );
        let result = only(&report);
        assert_eq!(
            vec!["duplicate-full-names", "duplicate-postscript-names"],
            codes(result)
        );
        assert_eq!(
            "Following full names are duplicate:\n\n* Fam Regular\n",
            result.statuses[0].message
        );
    }

    #[test]
    fn families_are_compared_separately() {
        let report = run_check(
            "family/duplicated_names",
            vec![
                named("Fam Regular", "Fam-Regular").font("one/Fam-Regular.ttf"),
                named("Fam Regular", "Fam-Regular").font("two/Fam-Regular.ttf"),
            ],
        );
        assert_eq!(2, report.results().len());
        assert!(report.results().iter().all(|r| r.verdict == Severity::Pass));
    }
}
