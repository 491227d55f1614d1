//! Variable font axis checks.

use qaengine::{
    return_result, Check, CheckFnResult, CheckInput, ConfigError, Registry, Scope, Status,
};
use write_fonts::{read::TableProvider, types::Tag};

fn axes_has_variation(input: &CheckInput<'_>) -> CheckFnResult {
    let fvar = input.font()?.font_ref()?.fvar()?;
    let mut statuses: Vec<_> = fvar
        .axes()?
        .iter()
        .filter(|axis| axis.min_value() == axis.max_value())
        .map(|axis| {
            Status::fail(
                "axis-has-no-variation",
                format!(
                    "'{}' axis has no variation its min and max values are ({}, {})",
                    axis.axis_tag(),
                    axis.min_value(),
                    axis.max_value()
                ),
            )
        })
        .collect();
    if statuses.is_empty() {
        statuses.push(Status::pass("All font axes has variation."));
    }
    return_result(statuses)
}

/// Registered axes in the order Adobe apps sort instances best by.
const PREFERRED_ORDER: [&str; 5] = ["opsz", "wdth", "wght", "ital", "slnt"];

/// Tags as a bracketed list of quoted names, "['wdth', 'wght']".
fn quoted(tags: &[String]) -> String {
    let tags: Vec<_> = tags.iter().map(|t| format!("'{t}'")).collect();
    format!("[{}]", tags.join(", "))
}

fn fvar_axes_order(input: &CheckInput<'_>) -> CheckFnResult {
    let font = input.font()?;
    if font.has_table(Tag::new(b"STAT")) {
        return return_result(vec![Status::skip(
            "has-stat",
            "The font has STAT table, this will control instances order.",
        )]);
    }
    let fvar = font.font_ref()?.fvar()?;
    let mut registered = Vec::new();
    let mut custom = Vec::new();
    for (index, axis) in fvar.axes()?.iter().enumerate() {
        let tag = axis.axis_tag().to_string();
        if PREFERRED_ORDER.contains(&tag.as_str()) {
            registered.push(tag);
        } else {
            custom.push(format!("'{tag}' at {index}"));
        }
    }
    let expected: Vec<String> = PREFERRED_ORDER
        .iter()
        .filter(|tag| registered.iter().any(|r| r == *tag))
        .map(|tag| tag.to_string())
        .collect();

    let mut statuses = vec![if registered == expected {
        Status::pass("Font's axes follows the preferred sorting.")
    } else {
        Status::fail(
            "axes-incorrect-order",
            format!(
                "Font's registered axes are not in correct order to get a good instances \
                 sorting on Adobe apps.\n\nCurrent order is {} it should be {}",
                quoted(&registered),
                quoted(&expected)
            ),
        )
    }];
    if !custom.is_empty() {
        statuses.push(Status::info(
            "custom-axes",
            format!(
                "The font has custom axes with the indicated order:\n\n{}\n\n\
                 Their order can depend on the kind of variation and the subfamily groups \
                 it may create.",
                custom.join(", ")
            ),
        ));
    }
    return_result(statuses)
}

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new(
            "varfont/axes_has_variation",
            Scope::Font,
            axes_has_variation,
        )
        .with_title("Check if font axes has variation")
        .with_rationale(
            "Axes on a variable font must have variation. In other words min and max values \
             need to be different. It is common to find fonts with unnecessary axes added, \
             like 'ital'.",
        )
        .with_proposal("https://github.com/TypeNetwork/fontQA/issues/61")
        .with_conditions(&["is_variable_font"]),
        Check::new("varfont/fvar_axes_order", Scope::Font, fvar_axes_order)
            .with_title("Check fvar axes order")
            .with_rationale(
                "If a font doesn't have a STAT table, instances get sorted better on Adobe \
                 apps when fvar axes follow a specific order: 'opsz', 'wdth', 'wght', 'ital', \
                 'slnt'.",
            )
            .with_proposal("https://github.com/TypeNetwork/fontQA/issues/25")
            .with_conditions(&["is_variable_font"]),
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
    use qaengine::{CheckResult, Report, Severity};

    fn only(report: &Report) -> &CheckResult {
        assert_eq!(1, report.results().len(), "{report:#?}");
        &report.results()[0]
    }

    fn varfont(axes: &[(&'static str, f64, f64, f64)]) -> TestFont {
        let mut font = TestFont::new();
        for (tag, min, default, max) in axes {
            font.axis(tag, *min, *default, *max);
        }
        font
    }

    #[test]
    fn axes_vary() {
        let font = varfont(&[("wght", 100.0, 400.0, 900.0)]);
        let report = run_check("varfont/axes_has_variation", vec![font.font("a/A[wght].ttf")]);
        assert_eq!(Severity::Pass, only(&report).verdict);
    }

    #[test]
    fn axis_without_variation() {
        let font = varfont(&[("wght", 100.0, 400.0, 900.0), ("ital", 0.0, 0.0, 0.0)]);
        let report = run_check(
            "varfont/axes_has_variation",
            vec![font.font("a/A[ital,wght].ttf")],
        );
        let result = only(&report);
        assert_eq!(vec!["axis-has-no-variation"], codes(result));
        assert_eq!(
            "'ital' axis has no variation its min and max values are (0, 0)",
            result.statuses[0].message
        );
    }

    #[test]
    fn static_fonts_have_no_axes() {
        let report = run_check(
            "varfont/axes_has_variation",
            vec![TestFont::new().font("a/A-Regular.ttf")],
        );
        assert_eq!(Severity::Skip, only(&report).verdict);
    }

    #[test]
    fn preferred_axis_order() {
        let font = varfont(&[("wdth", 75.0, 100.0, 100.0), ("wght", 100.0, 400.0, 900.0)]);
        let report = run_check("varfont/fvar_axes_order", vec![font.font("a/A[wdth,wght].ttf")]);
        assert_eq!(Severity::Pass, only(&report).verdict);
    }

    #[test]
    fn axes_out_of_order() {
        let font = varfont(&[
            ("wght", 100.0, 400.0, 900.0),
            ("GRAD", 0.0, 0.0, 100.0),
            ("wdth", 75.0, 100.0, 100.0),
        ]);
        let report = run_check(
            "varfont/fvar_axes_order",
            vec![font.font("a/A[GRAD,wdth,wght].ttf")],
        );
        let result = only(&report);
        assert_eq!(vec!["axes-incorrect-order", "custom-axes"], codes(result));
        assert!(
            result.statuses[0]
                .message
                .ends_with("Current order is ['wght', 'wdth'] it should be ['wdth', 'wght']"),
            "{}",
            result.statuses[0].message
        );
        assert!(result.statuses[1].message.contains("'GRAD' at 1"));
    }

    #[test]
    fn stat_decides_the_order() {
        let mut font = varfont(&[("wght", 100.0, 400.0, 900.0), ("wdth", 75.0, 100.0, 100.0)]);
        font.extra_tables.push(Tag::new(b"STAT"));
        let report = run_check("varfont/fvar_axes_order", vec![font.font("a/A[wdth,wght].ttf")]);
        let result = only(&report);
        assert_eq!(Severity::Skip, result.verdict);
        assert_eq!(vec!["has-stat"], codes(result));
    }
}
