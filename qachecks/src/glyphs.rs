//! Glyph names, metrics and outlines, as checks want to see them.

use std::collections::HashMap;

use kurbo::{BezPath, Rect, Shape};
use log::debug;
use skrifa::{
    instance::{LocationRef, Size},
    outline::OutlinePen,
    GlyphId, MetadataProvider,
};
use write_fonts::{
    read::{FontRef, ReadError, TableProvider},
    types::GlyphId16,
};

/// Everything we know about one glyph without drawing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphInfo {
    pub gid: u32,
    pub name: String,
    /// Every codepoint mapped to this glyph, ascending.
    pub codepoints: Vec<u32>,
    pub advance: Option<u16>,
}

impl GlyphInfo {
    /// The name, plus the highest mapped codepoint when there is one.
    ///
    /// "A (U+0041)", or just "A" for an unencoded glyph.
    pub fn display_name(&self) -> String {
        match self.codepoints.last() {
            Some(cp) => format!("{} (U+{cp:04X})", self.name),
            None => self.name.clone(),
        }
    }
}

/// The glyphs of a font, in glyph id order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphSet {
    glyphs: Vec<GlyphInfo>,
}

impl GlyphSet {
    pub fn from_font(font: &FontRef) -> Result<GlyphSet, ReadError> {
        let num_glyphs = font.maxp()?.num_glyphs() as u32;
        let post = font.post().ok();
        let hmtx = font.hmtx().ok();
        let metrics = hmtx.as_ref().map(|h| h.h_metrics()).unwrap_or_default();

        let mut codepoints: HashMap<u32, Vec<u32>> = HashMap::new();
        for (cp, gid) in font.charmap().mappings() {
            codepoints.entry(gid.to_u32()).or_default().push(cp);
        }

        let glyphs = (0..num_glyphs)
            .map(|gid| {
                let name = post
                    .as_ref()
                    .and_then(|p| p.glyph_name(GlyphId16::new(gid as u16)))
                    .map(str::to_string)
                    .unwrap_or_else(|| match gid {
                        0 => ".notdef".to_string(),
                        _ => format!("glyph{gid:05}"),
                    });
                let mut cps = codepoints.remove(&gid).unwrap_or_default();
                cps.sort_unstable();
                // glyphs past the last long metric share its advance
                let advance = metrics
                    .get(gid as usize)
                    .or(metrics.last())
                    .map(|m| m.advance());
                GlyphInfo {
                    gid,
                    name,
                    codepoints: cps,
                    advance,
                }
            })
            .collect();
        Ok(GlyphSet { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlyphInfo> {
        self.glyphs.iter()
    }

    pub fn by_name(&self, name: &str) -> Option<&GlyphInfo> {
        self.glyphs.iter().find(|g| g.name == name)
    }

    pub fn by_codepoint(&self, cp: u32) -> Option<&GlyphInfo> {
        self.glyphs.iter().find(|g| g.codepoints.contains(&cp))
    }

    /// Find a glyph by any of its conventional names, else by codepoint.
    pub fn lookup(&self, names: &[&str], cp: u32) -> Option<&GlyphInfo> {
        names
            .iter()
            .find_map(|n| self.by_name(n))
            .or_else(|| self.by_codepoint(cp))
    }
}

/// Collects skrifa drawing commands as one kurbo path per contour.
#[derive(Default)]
pub struct ContourPen {
    contours: Vec<BezPath>,
    current: BezPath,
}

impl ContourPen {
    pub fn new() -> ContourPen {
        Default::default()
    }

    fn flush(&mut self) {
        if !self.current.elements().is_empty() {
            self.contours.push(std::mem::take(&mut self.current));
        }
    }

    pub fn into_contours(mut self) -> Vec<BezPath> {
        self.flush();
        self.contours
    }
}

impl OutlinePen for ContourPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        self.current.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.current
            .quad_to((cx0 as f64, cy0 as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.current.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.current.close_path();
        self.flush();
    }
}

/// The contours of a glyph at its default location, in font units.
///
/// None if the font has no outline for the glyph.
pub fn draw_glyph(font: &FontRef, gid: u32) -> Result<Option<Vec<BezPath>>, String> {
    let Some(glyph) = font.outline_glyphs().get(GlyphId::new(gid)) else {
        return Ok(None);
    };
    let mut pen = ContourPen::new();
    glyph
        .draw((Size::unscaled(), LocationRef::default()), &mut pen)
        .map_err(|e| format!("glyph {gid}: {e}"))?;
    Ok(Some(pen.into_contours()))
}

/// The union of the bounding boxes of some contours.
pub fn bounds(contours: &[BezPath]) -> Option<Rect> {
    contours
        .iter()
        .map(|c| c.bounding_box())
        .reduce(|acc, r| acc.union(r))
}

/// A glyph drawn into contours.
#[derive(Clone, Debug)]
pub struct GlyphOutline {
    pub name: String,
    pub display_name: String,
    pub contours: Vec<BezPath>,
}

/// Draw every glyph that has an outline.
///
/// Glyphs without contours, like space, are left out.
pub fn outlines(font: &FontRef, glyphs: &GlyphSet) -> Result<Vec<GlyphOutline>, String> {
    let mut result = Vec::new();
    for glyph in glyphs.iter() {
        let Some(contours) = draw_glyph(font, glyph.gid)? else {
            continue;
        };
        if contours.is_empty() {
            continue;
        }
        result.push(GlyphOutline {
            name: glyph.name.clone(),
            display_name: glyph.display_name(),
            contours,
        });
    }
    debug!("Drew {} of {} glyphs", result.len(), glyphs.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestFont;
    use pretty_assertions::assert_eq;

    #[test]
    fn glyph_set_names_and_advances() {
        let mut test_font = TestFont::new();
        test_font.glyph("A", 600, &[0x41]).glyph("Agrave", 600, &[0xC0]);
        let data = test_font.build();
        let font = FontRef::new(&data).unwrap();
        let glyphs = GlyphSet::from_font(&font).unwrap();

        assert_eq!(3, glyphs.len());
        let names: Vec<_> = glyphs.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(vec![".notdef", "A", "Agrave"], names);
        assert_eq!(Some(600), glyphs.by_name("Agrave").unwrap().advance);
        assert_eq!("A (U+0041)", glyphs.by_codepoint(0x41).unwrap().display_name());
        assert_eq!(
            Some(2),
            glyphs.lookup(&["uni00C0"], 0xC0).map(|g| g.gid)
        );
        assert!(glyphs.lookup(&["B"], 0x42).is_none());
    }

    #[test]
    fn pen_splits_contours() {
        let mut pen = ContourPen::new();
        pen.move_to(0.0, 0.0);
        pen.line_to(10.0, 0.0);
        pen.line_to(10.0, 10.0);
        pen.close();
        pen.move_to(20.0, 0.0);
        pen.quad_to(25.0, 10.0, 30.0, 0.0);
        pen.close();
        let contours = pen.into_contours();
        assert_eq!(2, contours.len());
        assert_eq!(Some(Rect::new(0.0, 0.0, 30.0, 10.0)), bounds(&contours));
    }

    #[test]
    fn no_outlines_without_glyf() {
        let data = TestFont::new().build();
        let font = FontRef::new(&data).unwrap();
        let glyphs = GlyphSet::from_font(&font).unwrap();
        assert!(outlines(&font, &glyphs).unwrap().is_empty());
    }
}
