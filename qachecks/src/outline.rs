//! Checks that look for drawing mistakes in glyph outlines.
//!
//! Contours come from the `outlines` condition as kurbo paths in font units,
//! y pointing up.

use std::{
    collections::{BTreeSet, HashSet},
    f64::consts::{FRAC_PI_2, PI},
};

use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point, Shape, Vec2};
use qaengine::{
    return_result, Check, CheckFnResult, CheckInput, ConfigError, Registry, Scope, Status,
};
use write_fonts::read::TableProvider;

use crate::{glyphs::GlyphOutline, util::bullet_list};

/// Two unit lee-way on alignment misses.
const ALIGNMENT_MISS_EPSILON: f64 = 2.0;
/// A segment under 0.6% of its contour's length is short.
const SHORT_PATH_EPSILON: f64 = 0.006;
/// A segment under 3 units is short, whatever the contour.
const SHORT_PATH_ABSOLUTE_EPSILON: f64 = 3.0;
/// Radians.
const COLINEAR_EPSILON: f64 = 0.1;
/// Radians.
const JAG_ANGLE: f64 = 0.25;
/// Half a degree, in radians.
const SEMI_VERTICAL_TOLERANCE: f64 = 0.5 * PI / 180.0;
/// Past this many findings the pattern is assumed to be intentional.
const FALSE_POSITIVE_CUTOFF: usize = 100;

const ARCLEN_ACCURACY: f64 = 1e-3;

/// The outcome of scanning every outline for one kind of problem.
#[derive(Debug, PartialEq)]
enum Scan {
    Found(Vec<String>),
    /// So many findings that they are probably deliberate.
    ByDesign,
}

fn close_but_not_on(expected: f64, actual: f64, tolerance: f64) -> bool {
    expected != actual && (expected - actual).abs() <= tolerance
}

fn fmt_point(p: Point) -> String {
    format!("<{},{}>", p.x, p.y)
}

fn describe(seg: &PathSeg) -> String {
    match seg {
        PathSeg::Line(l) => format!("L<{}--{}>", fmt_point(l.p0), fmt_point(l.p1)),
        PathSeg::Quad(q) => format!(
            "Q<{}-{}-{}>",
            fmt_point(q.p0),
            fmt_point(q.p1),
            fmt_point(q.p2)
        ),
        PathSeg::Cubic(c) => format!(
            "B<{}-{}-{}-{}>",
            fmt_point(c.p0),
            fmt_point(c.p1),
            fmt_point(c.p2),
            fmt_point(c.p3)
        ),
    }
}

fn is_line(seg: &PathSeg) -> bool {
    matches!(seg, PathSeg::Line(..))
}

/// Direction of travel leaving the start of a segment.
fn start_tangent(seg: &PathSeg) -> Vec2 {
    match seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => q.p1 - q.p0,
        PathSeg::Cubic(c) => c.p1 - c.p0,
    }
}

/// Direction of travel arriving at the end of a segment.
fn end_tangent(seg: &PathSeg) -> Vec2 {
    match seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => q.p2 - q.p1,
        PathSeg::Cubic(c) => c.p3 - c.p2,
    }
}

/// The on-curve points of a contour.
fn on_curve_points(contour: &BezPath) -> impl Iterator<Item = Point> + '_ {
    contour.elements().iter().filter_map(|el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(*p),
        PathEl::QuadTo(_, p) => Some(*p),
        PathEl::CurveTo(_, _, p) => Some(*p),
        PathEl::ClosePath => None,
    })
}

fn segments(contour: &BezPath) -> Vec<PathSeg> {
    contour.segments().collect()
}

fn alignment_misses(outlines: &[GlyphOutline], alignments: &[(&str, i16)]) -> Scan {
    let mut warnings = Vec::new();
    for glyph in outlines {
        // x-height only applies to lowercase letters
        let mut chars = glyph.name.chars();
        let lowercase_letter = matches!(
            (chars.next(), chars.next()),
            (Some(c), None) if !c.is_uppercase()
        );
        for contour in glyph.contours.iter() {
            for point in on_curve_points(contour) {
                for (line, expected) in alignments {
                    if *line == "x-height" && !lowercase_letter {
                        continue;
                    }
                    if close_but_not_on(*expected as f64, point.y, ALIGNMENT_MISS_EPSILON) {
                        warnings.push(format!(
                            "{}: X={},Y={} (should be at {line} {expected}?)",
                            glyph.display_name, point.x, point.y
                        ));
                    }
                }
            }
        }
        if warnings.len() > FALSE_POSITIVE_CUTOFF {
            return Scan::ByDesign;
        }
    }
    Scan::Found(warnings)
}

fn short_segments(outlines: &[GlyphOutline]) -> Scan {
    let mut warnings = Vec::new();
    for glyph in outlines {
        for contour in glyph.contours.iter() {
            let segments = segments(contour);
            let Some(last) = segments.last() else {
                continue;
            };
            let outline_length: f64 = segments.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).sum();
            let mut prev_was_line = is_line(last);
            for seg in segments.iter() {
                let length = seg.arclen(ARCLEN_ACCURACY);
                let short = length < SHORT_PATH_ABSOLUTE_EPSILON
                    || length < SHORT_PATH_EPSILON * outline_length;
                if length == 0.0 || (short && (prev_was_line || !is_line(seg))) {
                    warnings.push(format!(
                        "{} contains a short segment {}",
                        glyph.display_name,
                        describe(seg)
                    ));
                }
                prev_was_line = is_line(seg);
            }
        }
        if warnings.len() > FALSE_POSITIVE_CUTOFF {
            return Scan::ByDesign;
        }
    }
    Scan::Found(warnings)
}

fn colinear_vectors(outlines: &[GlyphOutline]) -> Scan {
    let mut warnings = Vec::new();
    for glyph in outlines {
        for contour in glyph.contours.iter() {
            let segments = segments(contour);
            for (i, this) in segments.iter().enumerate() {
                // the first segment follows the last
                let prev = &segments[(i + segments.len() - 1) % segments.len()];
                if !(is_line(prev) && is_line(this)) {
                    continue;
                }
                let prev_angle = start_tangent(prev).atan2();
                let this_angle = start_tangent(this).atan2();
                if (prev_angle - this_angle).abs() < COLINEAR_EPSILON {
                    warnings.push(format!(
                        "{}: {} -> {}",
                        glyph.display_name,
                        describe(prev),
                        describe(this)
                    ));
                }
            }
        }
        if warnings.len() > FALSE_POSITIVE_CUTOFF {
            return Scan::ByDesign;
        }
    }
    let unique: BTreeSet<_> = warnings.into_iter().collect();
    Scan::Found(unique.into_iter().collect())
}

fn jaggy_segments(outlines: &[GlyphOutline]) -> Vec<String> {
    let mut warnings = Vec::new();
    for glyph in outlines {
        for contour in glyph.contours.iter() {
            let segments = segments(contour);
            for (i, this) in segments.iter().enumerate() {
                let prev = &segments[(i + segments.len() - 1) % segments.len()];
                let in_vector = -end_tangent(prev);
                let out_vector = start_tangent(this);
                let magnitudes = in_vector.hypot() * out_vector.hypot();
                if magnitudes == 0.0 {
                    continue;
                }
                let cos = in_vector.dot(out_vector) / magnitudes;
                if !(-1.0..=1.0).contains(&cos) {
                    continue;
                }
                let jag_angle = cos.acos();
                if jag_angle.abs() > JAG_ANGLE || jag_angle == 0.0 {
                    continue;
                }
                warnings.push(format!(
                    "{}: {}/{} = {}",
                    glyph.display_name,
                    describe(prev),
                    describe(this),
                    jag_angle.to_degrees()
                ));
            }
        }
    }
    warnings.sort();
    warnings
}

fn semi_vertical_lines(outlines: &[GlyphOutline]) -> Vec<String> {
    let mut warnings = Vec::new();
    for glyph in outlines {
        for contour in glyph.contours.iter() {
            for seg in contour.segments() {
                let PathSeg::Line(line) = seg else {
                    continue;
                };
                let angle = (line.p1 - line.p0).atan2();
                for expected in [-PI, -FRAC_PI_2, 0.0, FRAC_PI_2, PI] {
                    if close_but_not_on(angle, expected, SEMI_VERTICAL_TOLERANCE) {
                        warnings.push(format!("{}: {}", glyph.display_name, describe(&seg)));
                    }
                }
            }
        }
    }
    warnings.sort();
    warnings
}

fn outer_contour_direction(outlines: &[GlyphOutline]) -> Vec<String> {
    let mut warnings = Vec::new();
    for glyph in outlines {
        let bounds: Vec<_> = glyph
            .contours
            .iter()
            .map(|c| c.segments().next().map(|_| c.bounding_box()))
            .collect();
        let mut is_within = vec![false; bounds.len()];
        for (i, mine) in bounds.iter().enumerate() {
            let Some(mine) = mine else {
                warnings.push(format!(
                    "{} has a path with no bounds (probably a single point)",
                    glyph.display_name
                ));
                continue;
            };
            for (j, theirs) in bounds.iter().enumerate() {
                let Some(theirs) = theirs else {
                    continue;
                };
                if i != j
                    && mine.x0 <= theirs.x0
                    && mine.x1 >= theirs.x1
                    && mine.y0 <= theirs.y0
                    && mine.y1 >= theirs.y1
                {
                    is_within[j] = true;
                }
            }
        }
        for (contour, within) in glyph.contours.iter().zip(is_within) {
            // positive area is counter-clockwise with y up
            if !within && contour.area() > 0.0 {
                warnings.push(format!(
                    "{} has a counter-clockwise outer contour",
                    glyph.display_name
                ));
            }
        }
    }
    warnings.sort();
    warnings
}

fn overlapping_segments(outlines: &[GlyphOutline]) -> Vec<String> {
    // -0.0 and 0.0 are the same place
    let key = |p: Point| ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits());
    let mut failed = Vec::new();
    for glyph in outlines {
        let mut seen = HashSet::new();
        for contour in glyph.contours.iter() {
            for seg in contour.segments() {
                let (start, end) = (key(seg.start()), key(seg.end()));
                if seen.contains(&(start, end)) || seen.contains(&(end, start)) {
                    failed.push(format!(
                        "{}: {} has the same coordinates as a previous segment.",
                        glyph.display_name,
                        describe(&seg)
                    ));
                }
                seen.insert((start, end));
            }
        }
    }
    failed
}

/// Turn findings into a single status.
fn summarize(
    input: &CheckInput<'_>,
    scan: Scan,
    code: &str,
    header: &str,
    clean: &str,
    by_design: &str,
) -> Status {
    match scan {
        Scan::ByDesign => Status::pass(by_design),
        Scan::Found(found) if found.is_empty() => Status::pass(clean),
        Scan::Found(found) => Status::warn(
            code,
            format!(
                "{header}\n\n{}",
                bullet_list(input.full_lists(), &found, "*")
            ),
        ),
    }
}

fn outline_alignment_miss(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    let os2 = input.font()?.font_ref()?.os2()?;
    let mut statuses = Vec::new();
    let mut alignments = vec![
        ("baseline", 0),
        ("ascender", os2.s_typo_ascender()),
        ("descender", os2.s_typo_descender()),
    ];
    // x-height and cap-height arrived with version 2
    match (os2.sx_height(), os2.s_cap_height()) {
        (Some(x_height), Some(cap_height)) if os2.version() >= 2 => {
            alignments.push(("x-height", x_height));
            alignments.push(("cap-height", cap_height));
        }
        _ => statuses.push(Status::warn(
            "skip-cap-x-height-alignment",
            format!(
                "x-height and cap-height checks are skipped because OS/2 table version is only {} and version >= 2 is required for those checks.",
                os2.version()
            ),
        )),
    }
    statuses.push(summarize(
        input,
        alignment_misses(&outlines, &alignments),
        "found-misalignments",
        "The following glyphs have on-curve points which have potentially incorrect y coordinates:",
        "Y-coordinates of points fell on appropriate boundaries.",
        "So many Y-coordinates of points were close to boundaries that this was probably by design.",
    ));
    return_result(statuses)
}

fn outline_short_segments(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        short_segments(&outlines),
        "found-short-segments",
        "The following glyphs have segments which seem very short:",
        "No short segments were found.",
        "So many short segments were found that this was probably by design.",
    )])
}

fn outline_colinear_vectors(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        colinear_vectors(&outlines),
        "found-colinear-vectors",
        "The following glyphs have colinear vectors:",
        "No colinear vectors found.",
        "So many colinear vectors were found that this was probably by design.",
    )])
}

fn outline_jaggy_segments(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        Scan::Found(jaggy_segments(&outlines)),
        "found-jaggy-segments",
        "The following glyphs have jaggy segments:",
        "No jaggy segments found.",
        "",
    )])
}

fn outline_semi_vertical(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        Scan::Found(semi_vertical_lines(&outlines)),
        "found-semi-vertical",
        "The following glyphs have semi-vertical/semi-horizontal lines:",
        "No semi-horizontal/semi-vertical lines found.",
        "",
    )])
}

fn outline_direction(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        Scan::Found(outer_contour_direction(&outlines)),
        "ccw-outer-contour",
        "The following glyphs have a counter-clockwise outer contour:",
        "All outer contours are clockwise.",
        "",
    )])
}

fn overlapping_path_segments(input: &CheckInput<'_>) -> CheckFnResult {
    let outlines = input.condition::<Vec<GlyphOutline>>("outlines")?;
    return_result(vec![summarize(
        input,
        Scan::Found(overlapping_segments(&outlines)),
        "overlapping-path-segments",
        "The following glyphs have overlapping path segments:",
        "No overlapping path segments found.",
        "",
    )])
}

const OUTLINE_PROPOSAL: &str = "https://github.com/fonttools/fontbakery/pull/3088";

pub(crate) fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    let checks = [
        Check::new("outline_alignment_miss", Scope::Font, outline_alignment_miss)
            .with_title("Are there any misaligned on-curve points?")
            .with_rationale(
                "This check heuristically looks for on-curve points which are close to, but \
                 do not sit on, significant boundary coordinates: the baseline, x-height \
                 (lowercase letters only), cap-height, ascender and descender. A point with \
                 a Y-coordinate of 1 or -1 might be a misplaced baseline point. The check \
                 passes when there are more than 100 misalignments, as that many are \
                 likely deliberate.",
            )
            .with_proposal(OUTLINE_PROPOSAL)
            .with_conditions(&["outlines"]),
        Check::new("outline_short_segments", Scope::Font, outline_short_segments)
            .with_title("Are any segments inordinately short?")
            .with_rationale(
                "This check looks for outline segments which seem particularly short (less \
                 than 0.6% of the overall path length). It passes when there are more than \
                 100 short segments.",
            )
            .with_proposal(OUTLINE_PROPOSAL)
            .with_conditions(&["outlines", "not is_variable_font"]),
        Check::new(
            "outline_colinear_vectors",
            Scope::Font,
            outline_colinear_vectors,
        )
        .with_title("Do any segments have colinear vectors?")
        .with_rationale(
            "This check looks for consecutive line segments which have the same angle. \
             This normally happens if an outline point has been added by accident. It \
             passes when there are more than 100 colinear vectors.",
        )
        .with_proposal(OUTLINE_PROPOSAL)
        .with_conditions(&["outlines", "not is_variable_font"]),
        Check::new("outline_jaggy_segments", Scope::Font, outline_jaggy_segments)
            .with_title("Do outlines contain any jaggy segments?")
            .with_rationale(
                "This check heuristically detects outline segments which form a particularly \
                 small angle, indicative of an outline error. Extreme ink traps can trip it, \
                 so treat it as advisory.",
            )
            .with_proposal("https://github.com/fonttools/fontbakery/issues/3064")
            .with_conditions(&["outlines", "not is_variable_font"]),
        Check::new("outline_semi_vertical", Scope::Font, outline_semi_vertical)
            .with_title("Do outlines contain any semi-vertical or semi-horizontal lines?")
            .with_rationale(
                "This check detects line segments which are nearly, but not quite, exactly \
                 horizontal or vertical. Sometimes such lines are created by design, but \
                 often they are indicative of a design error.",
            )
            .with_proposal(OUTLINE_PROPOSAL)
            .with_conditions(&["outlines", "not is_variable_font", "not is_italic"]),
        Check::new("outline_direction", Scope::Font, outline_direction)
            .with_title("Check the direction of the outermost contour in each glyph.")
            .with_rationale(
                "In TrueType fonts, the outermost contour of a glyph should be oriented \
                 clockwise, while the inner contours should be oriented counter-clockwise. \
                 Contour direction errors can cause rendering errors in some software.",
            )
            .with_proposal("https://github.com/fonttools/fontbakery/issues/2056")
            .with_conditions(&["outlines", "is_ttf"]),
        Check::new(
            "overlapping_path_segments",
            Scope::Font,
            overlapping_path_segments,
        )
        .with_title("Check there are no overlapping path segments.")
        .with_rationale(
            "Some rasterizers encounter difficulties when rendering glyphs with \
             overlapping path segments. A path segment is a section of a path defined by \
             two points; two segments overlap when they have the same coordinates, in \
             either direction.",
        )
        .with_proposal("https://github.com/google/fonts/issues/7594#issuecomment-2401909084")
        .with_conditions(&["outlines", "is_ttf"]),
    ];
    for check in checks {
        registry.register_check(check)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn polygon(points: &[(f64, f64)]) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
        path.close_path();
        path
    }

    fn glyph(name: &str, contours: Vec<BezPath>) -> GlyphOutline {
        GlyphOutline {
            name: name.to_string(),
            display_name: name.to_string(),
            contours,
        }
    }

    const SQUARE: &[(f64, f64)] = &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];
    const CLOCKWISE_SQUARE: &[(f64, f64)] =
        &[(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)];

    const ALIGNMENTS: &[(&str, i16)] = &[
        ("baseline", 0),
        ("ascender", 800),
        ("descender", -200),
        ("x-height", 500),
        ("cap-height", 700),
    ];

    #[test]
    fn near_misses() {
        let outlines = vec![glyph(
            "A",
            vec![polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 701.0), (0.0, 699.0)])],
        )];
        assert_eq!(
            Scan::Found(vec![
                "A: X=100,Y=701 (should be at cap-height 700?)".to_string(),
                "A: X=0,Y=699 (should be at cap-height 700?)".to_string(),
            ]),
            alignment_misses(&outlines, ALIGNMENTS)
        );
    }

    #[test]
    fn x_height_only_for_lowercase() {
        let contour = polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 499.0), (0.0, 500.0)]);
        let upper = vec![glyph("H", vec![contour.clone()])];
        assert_eq!(Scan::Found(vec![]), alignment_misses(&upper, ALIGNMENTS));
        let lower = vec![glyph("n", vec![contour])];
        assert_eq!(
            Scan::Found(vec![
                "n: X=100,Y=499 (should be at x-height 500?)".to_string()
            ]),
            alignment_misses(&lower, ALIGNMENTS)
        );
    }

    #[test]
    fn many_misses_are_by_design() {
        let outlines: Vec<_> = (0..60)
            .map(|i| {
                glyph(
                    &format!("g{i}"),
                    vec![polygon(&[(0.0, 1.0), (100.0, 1.0), (100.0, 100.0)])],
                )
            })
            .collect();
        assert_eq!(Scan::ByDesign, alignment_misses(&outlines, ALIGNMENTS));
    }

    #[test]
    fn short_closing_segment() {
        let outlines = vec![glyph(
            "sq",
            vec![polygon(&[
                (0.0, 0.0),
                (500.0, 0.0),
                (500.0, 500.0),
                (0.0, 500.0),
                (0.0, 2.0),
            ])],
        )];
        assert_eq!(
            Scan::Found(vec!["sq contains a short segment L<<0,2>--<0,0>>".to_string()]),
            short_segments(&outlines)
        );
    }

    #[test]
    fn zero_length_segment() {
        let outlines = vec![glyph(
            "dup",
            vec![polygon(&[
                (0.0, 0.0),
                (100.0, 0.0),
                (100.0, 0.0),
                (100.0, 100.0),
            ])],
        )];
        assert_eq!(
            Scan::Found(vec![
                "dup contains a short segment L<<100,0>--<100,0>>".to_string()
            ]),
            short_segments(&outlines)
        );
    }

    #[test]
    fn colinear() {
        let outlines = vec![glyph(
            "x",
            vec![polygon(&[
                (0.0, 0.0),
                (100.0, 0.0),
                (200.0, 0.0),
                (200.0, 100.0),
                (0.0, 100.0),
            ])],
        )];
        assert_eq!(
            Scan::Found(vec![
                "x: L<<0,0>--<100,0>> -> L<<100,0>--<200,0>>".to_string()
            ]),
            colinear_vectors(&outlines)
        );
        assert_eq!(
            Scan::Found(vec![]),
            colinear_vectors(&[glyph("sq", vec![polygon(SQUARE)])])
        );
    }

    #[test]
    fn jaggy() {
        let spike = vec![glyph(
            "spike",
            vec![polygon(&[(0.0, 0.0), (100.0, 0.0), (0.0, 10.0)])],
        )];
        let found = jaggy_segments(&spike);
        assert_eq!(1, found.len(), "{found:?}");
        assert!(
            found[0].starts_with("spike: L<<0,0>--<100,0>>/L<<100,0>--<0,10>> = 5.7"),
            "{found:?}"
        );
        assert!(jaggy_segments(&[glyph("sq", vec![polygon(SQUARE)])]).is_empty());
    }

    #[test]
    fn semi_vertical() {
        let outlines = vec![glyph(
            "lean",
            vec![polygon(&[
                (0.0, 0.0),
                (100.0, 0.0),
                (101.0, 100.0),
                (0.0, 100.0),
            ])],
        )];
        assert_eq!(
            vec!["lean: L<<100,0>--<101,100>>".to_string()],
            semi_vertical_lines(&outlines)
        );
    }

    #[test]
    fn direction_of_outer_contours() {
        let ccw = vec![glyph("o", vec![polygon(SQUARE)])];
        assert_eq!(
            vec!["o has a counter-clockwise outer contour".to_string()],
            outer_contour_direction(&ccw)
        );

        let counter = polygon(&[(25.0, 25.0), (75.0, 25.0), (75.0, 75.0), (25.0, 75.0)]);
        let good = vec![glyph("o", vec![polygon(CLOCKWISE_SQUARE), counter])];
        assert!(outer_contour_direction(&good).is_empty());
    }

    #[test]
    fn overlapping() {
        let left = polygon(SQUARE);
        let right = polygon(&[(100.0, 0.0), (200.0, 0.0), (200.0, 100.0), (100.0, 100.0)]);
        assert_eq!(
            vec![
                "m: L<<100,100>--<100,0>> has the same coordinates as a previous segment."
                    .to_string()
            ],
            overlapping_segments(&[glyph("m", vec![left, right])])
        );
        assert!(overlapping_segments(&[glyph("sq", vec![polygon(SQUARE)])]).is_empty());
    }

    #[test]
    fn overlapping_ignores_sign_of_zero() {
        let right = polygon(SQUARE);
        let left = polygon(&[(-0.0, 0.0), (-100.0, 0.0), (-100.0, 100.0), (-0.0, 100.0)]);
        let found = overlapping_segments(&[glyph("m", vec![right, left])]);
        assert_eq!(1, found.len(), "{found:?}");
        assert!(found[0].starts_with("m: L<<"), "{found:?}");
    }

    #[test]
    fn no_outlines_skips() {
        let font = crate::test_util::TestFont::new();
        let report =
            crate::test_util::run_check("outline_short_segments", vec![font.font("a/A-Regular.ttf")]);
        assert_eq!(qaengine::Severity::Skip, report.results()[0].verdict);
    }
}
