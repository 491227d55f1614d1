//! Checks of single fields in post, OS/2 and CFF.

use qaengine::{
    return_result, Check, CheckError, CheckFnResult, CheckInput, ConfigError, Registry, Scope,
    Status,
};
use write_fonts::{
    read::{
        tables::postscript::dict::{self, Entry},
        TableProvider,
    },
    types::Tag,
};

use crate::conditions::ExpectedWeight;

fn valid_underline(input: &CheckInput<'_>) -> CheckFnResult {
    let thickness = input.font()?.font_ref()?.post()?.underline_thickness().to_i16();
    let status = if thickness == 0 {
        Status::fail(
            "invalid-underline-thickness",
            format!("Thickness of the underline is {thickness} which is not valid."),
        )
    } else {
        Status::pass("Fonts have a valid underline thickness.")
    };
    return_result(vec![status])
}

fn valid_strikeout(input: &CheckInput<'_>) -> CheckFnResult {
    let size = input.font()?.font_ref()?.os2()?.y_strikeout_size();
    let status = if size == 0 {
        Status::fail(
            "invalid-strikeout-size",
            format!("Size of the strikeout is {size} which is not valid."),
        )
    } else {
        Status::pass("Fonts have a valid strikeout size.")
    };
    return_result(vec![status])
}

const PREVIEW_AND_PRINT: u16 = 0x0004;

const FSTYPE_RESTRICTIONS: [(u16, &str); 5] = [
    (
        0x0002,
        "The font must not be modified, embedded or exchanged in any manner without first \
         obtaining permission of the legal owner.",
    ),
    (
        PREVIEW_AND_PRINT,
        "The font may be embedded, and temporarily loaded on the remote system, but \
         documents that use it must not be editable.",
    ),
    (
        0x0008,
        "The font may be embedded but must only be installed temporarily on other systems.",
    ),
    (0x0100, "The font may not be subsetted prior to embedding."),
    (
        0x0200,
        "Only bitmaps contained in the font may be embedded. No outline data may be embedded.",
    ),
];

const FSTYPE_RESERVED: u16 = 0b1111_1100_1111_0001;

fn fstype(input: &CheckInput<'_>) -> CheckFnResult {
    let value = input.font()?.font_ref()?.os2()?.fs_type();
    if value == PREVIEW_AND_PRINT {
        return return_result(vec![Status::pass(
            "OS/2 fsType is properly set to Preview and Print.",
        )]);
    }
    let mut restrictions: Vec<String> = FSTYPE_RESTRICTIONS
        .iter()
        .filter(|(bit, _)| value & bit != 0)
        .map(|(_, text)| format!("* {text}"))
        .collect();
    if value & FSTYPE_RESERVED != 0 {
        restrictions
            .push("* There are reserved bits set, which indicates an invalid setting.".to_string());
    }
    return_result(vec![Status::warn(
        "no-preview-print",
        format!(
            "In this font fsType is set to {value} meaning that:\n{}\n\n\
             Setting fsType to 4 (Preview & Print), which is slightly more restrictive, \
             is advised.",
            restrictions.join("\n")
        ),
    )])
}

/// usWeightClass values a static font may use for Thin and ExtraLight.
///
/// TrueType also accepts the old values, CFF only the new one.
fn light_weight_classes(weight_name: &str) -> Option<(&'static [u16], u16)> {
    let words: Vec<_> = weight_name.split(' ').collect();
    if words.contains(&"Thin") {
        Some((&[100, 250], 250))
    } else if words.contains(&"ExtraLight") {
        Some((&[200, 275], 275))
    } else {
        None
    }
}

fn usweightclass(input: &CheckInput<'_>) -> CheckFnResult {
    let font = input.font()?;
    let font_ref = font.font_ref()?;
    let expected = input.condition::<Option<ExpectedWeight>>("expected_os2_weight")?;
    // the condition only holds with a style name
    let Some(expected) = expected.as_ref() else {
        return Err(CheckError::MissingCondition("expected_os2_weight".into()));
    };
    let os2_value = font_ref.os2()?.us_weight_class();
    let bad_value = |should_be: &dyn std::fmt::Display| {
        Status::fail(
            "bad-value",
            format!("OS/2 usWeightClass is '{os2_value}' when it should be '{should_be}'."),
        )
    };

    let mut statuses = Vec::new();
    if font.has_table(Tag::new(b"fvar")) {
        let wght = font_ref
            .fvar()?
            .axes()?
            .iter()
            .find(|axis| axis.axis_tag() == Tag::new(b"wght"))
            .map(|axis| axis.default_value().to_f64());
        match wght {
            Some(default) if os2_value as f64 != default.trunc() => {
                statuses.push(bad_value(&default))
            }
            None if os2_value != 400 => statuses.push(bad_value(&400)),
            _ => (),
        }
    } else if let Some((allowed, cff_value)) = light_weight_classes(&expected.weight_name) {
        if font.has_table(Tag::new(b"glyf")) && !allowed.contains(&os2_value) {
            statuses.push(bad_value(&cff_value));
        }
        if font.has_table(Tag::new(b"CFF ")) && os2_value != cff_value {
            statuses.push(bad_value(&cff_value));
        }
    } else if expected.weight_class.is_none() {
        statuses.push(Status::info(
            "no-value",
            format!(
                "OS/2 usWeightClass is '{os2_value}' and weight name is '{}'.",
                expected.weight_name
            ),
        ));
    }
    // an unknown weight name is informational only
    if !statuses.iter().any(|s| s.severity.is_substantive()) {
        statuses.push(Status::pass("OS/2 usWeightClass is good"));
    }
    return_result(statuses)
}

fn cff_unable_to_decode() -> CheckFnResult {
    return_result(vec![Status::fail(
        "cff-unable-to-decode",
        "Unable to decode CFF table, possibly due to out of ASCII range strings. \
         Please check table strings.",
    )])
}

fn cff_ascii_strings(input: &CheckInput<'_>) -> CheckFnResult {
    let font_ref = input.font()?.font_ref()?;
    let Ok(cff) = font_ref.cff() else {
        return cff_unable_to_decode();
    };
    let top_dicts = cff.top_dicts();
    let mut found = Vec::new();
    for i in 0..top_dicts.count() as usize {
        let Ok(top_dict) = top_dicts.get(i) else {
            return cff_unable_to_decode();
        };
        for entry in dict::entries(top_dict, None) {
            let Ok(entry) = entry else {
                return cff_unable_to_decode();
            };
            let (key, sid) = match entry {
                Entry::Notice(sid) => ("Notice", sid),
                Entry::Copyright(sid) => ("Copyright", sid),
                Entry::FontName(sid) => ("FontName", sid),
                Entry::FullName(sid) => ("FullName", sid),
                Entry::FamilyName(sid) => ("FamilyName", sid),
                _ => continue,
            };
            let Some(string) = cff.string(sid) else {
                return cff_unable_to_decode();
            };
            if !string.bytes().is_ascii() {
                found.push(format!("\n\n\t - {key}: {string}"));
            }
        }
    }
    let status = if found.is_empty() {
        Status::pass("No CFF TopDict strings are outside the ASCII range.")
    } else {
        Status::fail(
            "cff-string-not-in-ascii-range",
            format!(
                "The following CFF TopDict strings are not in the ASCII range: {}",
                found.concat()
            ),
        )
    };
    return_result(vec![status])
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new("family/valid_underline", Scope::Font, valid_underline)
            .with_title("Fonts have underline thickness?")
            .with_rationale(
                "If underline thickness is not set nothing gets rendered on Figma.",
            ),
        Check::new("family/valid_strikeout", Scope::Font, valid_strikeout)
            .with_title("Fonts have strikeout size?")
            .with_rationale("If strikeout size is not set, nothing gets rendered on Figma."),
        Check::new("fstype", Scope::Font, fstype)
            .with_title("Checking OS/2 fsType is set to Preview and Print.")
            .with_rationale(
                "The fsType in the OS/2 table is a legacy DRM-related field. Preview & Print \
                 embedding allows a font to be embedded in documents that are viewed or \
                 printed, but not edited. More detailed info is available at \
                 https://docs.microsoft.com/en-us/typography/opentype/spec/os2#fstype",
            ),
        Check::new("usweightclass", Scope::Font, usweightclass)
            .with_title("Checking OS/2 usWeightClass.")
            .with_rationale(
                "For variable fonts it should be equal to the default wght. For static \
                 TrueType fonts Thin to Black can be 100 to 900 or 250 to 900, for static \
                 CFF fonts it must be 250 to 900. Below 250, CFF text may appear blurry in \
                 legacy Windows applications.",
            )
            .with_conditions(&["expected_os2_weight"]),
        Check::new("cff_ascii_strings", Scope::Font, cff_ascii_strings)
            .with_title("Does the font's CFF table top dict strings fit into the ASCII range?")
            .with_rationale(
                "All CFF Table top dict data values must be encoded as ASCII. Some \
                 applications fail to load fonts otherwise.",
            )
            .with_proposal("https://github.com/fonttools/fontbakery/issues/4619")
            .with_conditions(&["is_cff"]),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}
