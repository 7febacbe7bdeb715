//! A file output device emitting Level-2 PostScript. The whole drawing
//! capability set operates on printed pages through the paginated session
//! protocol; the output stream can be a file, a pipe to a spooler, or any
//! other writer.

use std::io::Write;

use geom::{Point, Rect};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{
    Color, Device, Font, LineStyle, POSTSCRIPT_FILE, PathKind,
    paged::{PageFormat, PageLayout, PagedDevice},
};

/// Margin between the paper edge and the printable area, in points.
const MARGIN: i32 = 18;

/// A paginated device writing PostScript to `out`. Drives like any other
/// [`PagedDevice`]: `start_job`, per-page `start_page`/`end_page`, then
/// `end_job` to emit the trailer and flush.
pub struct PostScriptFile<W: Write> {
    out: W,
    format: PageFormat,
    layout: PageLayout,
    pages: usize,
    page_count: usize,
    in_job: bool,
    in_page: bool,

    scale_x: f64,
    scale_y: f64,
    angle: f64,
    ox: i32,
    oy: i32,
    translate_depth: usize,

    // Clip rectangles by gsave depth, in current page coordinates. `None`
    // entries do not clip.
    clip: Vec<Option<Rect>>,

    color: Color,
    bg: Color,
    font: Font,
    font_size: i32,

    path: Vec<(f64, f64)>,
    path_kind: PathKind,
}

impl<W: Write> PostScriptFile<W> {
    pub fn new(out: W, format: PageFormat, layout: PageLayout) -> Self {
        Self {
            out,
            format,
            layout,
            pages: 0,
            page_count: 0,
            in_job: false,
            in_page: false,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            ox: 0,
            oy: 0,
            translate_depth: 0,
            clip: Vec::new(),
            color: Color::BLACK,
            bg: Color::WHITE,
            font: Font::Helvetica,
            font_size: 12,
            path: Vec::new(),
            path_kind: PathKind::Line,
        }
    }

    /// Give back the output writer after the job is done.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Paper dimensions in points, swapped for landscape.
    fn oriented(&self) -> (i32, i32) {
        let (w, h) = self.format.size();
        match self.layout {
            PageLayout::Portrait => (w, h),
            PageLayout::Landscape => (h, w),
        }
    }

    /// Drawing failures never surface through primitives, so emission
    /// degrades silently on a broken writer; session boundaries report it.
    fn emit(&mut self, s: &str) {
        let _ = writeln!(self.out, "{s}");
    }

    /// Map the page origin to the top left with y growing down, then apply
    /// margins. Landscape rotates into the paper's long side first.
    fn page_setup(&self) -> String {
        match self.layout {
            PageLayout::Portrait => {
                let (_, ph) = self.format.size();
                format!("0 {ph} translate 1 -1 scale {MARGIN} {MARGIN} translate")
            }
            PageLayout::Landscape => {
                format!("90 rotate 1 -1 scale {MARGIN} {MARGIN} translate")
            }
        }
    }

    /// Re-establish the base transform plus the user scale, origin, and
    /// rotation. Pending translates must have been unwound first.
    fn sync_transform(&mut self) {
        if !self.in_page {
            return;
        }
        if self.translate_depth > 0 {
            warn!("transform changed inside translate pair");
        }
        let setup = self.page_setup();
        let (sx, sy) = (self.scale_x, self.scale_y);
        let (ox, oy) = (self.ox, self.oy);
        let angle = self.angle;
        self.emit("grestore gsave");
        self.emit(&setup);
        self.emit(&format!("{sx} {sy} scale"));
        self.emit(&format!("{ox} {oy} translate"));
        if angle != 0.0 {
            // The y flip reverses rotation direction.
            self.emit(&format!("{} rotate", -angle));
        }
        self.recover();
    }

    /// Re-assert graphics state that a grestore discarded.
    fn recover(&mut self) {
        let c = self.color;
        let (face, size) = (self.font, self.font_size);
        self.set_color(c);
        self.set_font(face, size);
    }

    fn set_color(&mut self, c: Color) {
        self.emit(&format!(
            "{:.3} {:.3} {:.3} setrgbcolor",
            f64::from(c.r) / 255.0,
            f64::from(c.g) / 255.0,
            f64::from(c.b) / 255.0
        ));
    }

    fn set_font(&mut self, face: Font, size: i32) {
        let name = match face {
            Font::Helvetica => "/Helvetica",
            Font::Times => "/Times-Roman",
            Font::Courier => "/Courier",
        };
        self.emit(&format!("{name} {size} selectfont"));
    }

    /// The intersection of all pushed clip rectangles, if any clip at all.
    fn effective_clip(&self) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for r in self.clip.iter().flatten() {
            acc = Some(match acc {
                None => *r,
                Some(a) => a.intersect(r).unwrap_or(Rect::new(0, 0, 0, 0)),
            });
        }
        acc
    }

    fn escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '(' | ')' | '\\' => {
                    out.push('\\');
                    out.push(c);
                }
                c if c.is_ascii() => out.push(c),
                // Non-ASCII degrades to a space in the base encoding.
                _ => out.push(' '),
            }
        }
        out
    }
}

impl<W: Write> Device for PostScriptFile<W> {
    fn type_code(&self) -> u16 {
        POSTSCRIPT_FILE
    }

    fn color(&mut self, c: Color) {
        self.color = c;
        self.set_color(c);
    }

    fn bg_color(&mut self, c: Color) {
        self.bg = c;
    }

    fn line_style(&mut self, style: LineStyle, width: i32) {
        let width = width.max(1);
        self.emit(&format!("{width} setlinewidth"));
        let dash = match style {
            LineStyle::Solid => "[] 0 setdash".to_string(),
            LineStyle::Dash => format!("[{} {}] 0 setdash", width * 3, width * 2),
            LineStyle::Dot => format!("[{} {}] 0 setdash", width, width * 2),
        };
        self.emit(&dash);
    }

    fn point(&mut self, p: Point) {
        self.rect_fill(Rect::new(p.x, p.y, 1, 1));
    }

    fn rect(&mut self, r: Rect) {
        self.emit(&format!("{} {} {} {} rectstroke", r.x, r.y, r.w, r.h));
    }

    fn rect_fill(&mut self, r: Rect) {
        self.emit(&format!("{} {} {} {} rectfill", r.x, r.y, r.w, r.h));
    }

    fn line(&mut self, a: Point, b: Point) {
        self.emit(&format!(
            "newpath {} {} moveto {} {} lineto stroke",
            a.x, a.y, b.x, b.y
        ));
    }

    fn begin_path(&mut self, kind: PathKind) {
        self.path.clear();
        self.path_kind = kind;
    }

    fn vertex(&mut self, x: f64, y: f64) {
        self.path.push((x, y));
    }

    fn end_path(&mut self) {
        let pts = std::mem::take(&mut self.path);
        match self.path_kind {
            PathKind::Points => {
                for (x, y) in pts {
                    self.emit(&format!("{x} {y} 1 1 rectfill"));
                }
            }
            kind => {
                if pts.len() < 2 {
                    return;
                }
                let mut cmd = String::from("newpath");
                for (i, (x, y)) in pts.iter().enumerate() {
                    let op = if i == 0 { "moveto" } else { "lineto" };
                    cmd.push_str(&format!(" {x} {y} {op}"));
                }
                match kind {
                    PathKind::Line => cmd.push_str(" stroke"),
                    PathKind::Loop => cmd.push_str(" closepath stroke"),
                    PathKind::Polygon => cmd.push_str(" closepath fill"),
                    PathKind::Points => unreachable!("handled above"),
                }
                self.emit(&cmd);
            }
        }
    }

    fn circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.emit(&format!(
            "newpath {cx} {cy} {radius} 0 360 arc closepath stroke"
        ));
    }

    fn arc(&mut self, r: Rect, a1: f64, a2: f64) {
        let cx = f64::from(r.x) + f64::from(r.w) / 2.0;
        let cy = f64::from(r.y) + f64::from(r.h) / 2.0;
        let rx = f64::from(r.w) / 2.0;
        let ry = f64::from(r.h) / 2.0;
        // The y flip turns counterclockwise angles into arcn.
        self.emit(&format!(
            "gsave {cx} {cy} translate {rx} {ry} scale newpath 0 0 1 {} {} arcn stroke grestore",
            -a1, -a2
        ));
        self.recover();
    }

    fn pie(&mut self, r: Rect, a1: f64, a2: f64) {
        let cx = f64::from(r.x) + f64::from(r.w) / 2.0;
        let cy = f64::from(r.y) + f64::from(r.h) / 2.0;
        let rx = f64::from(r.w) / 2.0;
        let ry = f64::from(r.h) / 2.0;
        self.emit(&format!(
            "gsave {cx} {cy} translate {rx} {ry} scale newpath 0 0 moveto 0 0 1 {} {} arcn closepath fill grestore",
            -a1, -a2
        ));
        self.recover();
    }

    fn push_clip(&mut self, r: Rect) {
        self.clip.push(Some(r));
        self.emit(&format!("gsave {} {} {} {} rectclip", r.x, r.y, r.w, r.h));
    }

    fn push_no_clip(&mut self) {
        self.clip.push(None);
        self.emit("gsave");
    }

    fn pop_clip(&mut self) {
        if self.clip.pop().is_none() {
            warn!("clip pop without matching push");
            return;
        }
        self.emit("grestore");
        self.recover();
    }

    // Subtractive clipping has no rectangle-only PostScript rendition; the
    // area stays drawable and output may overpaint.

    fn clip_box(&self, r: Rect) -> Option<Rect> {
        match self.effective_clip() {
            None => Some(r),
            Some(c) => c.intersect(&r),
        }
    }

    fn not_clipped(&self, r: Rect) -> bool {
        self.clip_box(r).is_some()
    }

    fn font(&mut self, face: Font, size: i32) {
        self.font = face;
        self.font_size = size;
        self.set_font(face, size);
    }

    fn text(&mut self, s: &str, p: Point) {
        let esc = Self::escape(s);
        self.emit(&format!(
            "gsave {} {} translate 1 -1 scale 0 0 moveto ({esc}) show grestore",
            p.x, p.y
        ));
    }

    fn text_angled(&mut self, angle: f64, s: &str, p: Point) {
        let esc = Self::escape(s);
        self.emit(&format!(
            "gsave {} {} translate {} rotate 1 -1 scale 0 0 moveto ({esc}) show grestore",
            p.x, p.y, -angle
        ));
    }

    fn text_width(&self, s: &str) -> i32 {
        // Metrics are approximated; precise widths need the interpreter.
        (s.chars().count() as i32) * self.font_size * 6 / 10
    }

    fn text_height(&self) -> i32 {
        self.font_size
    }

    fn draw_image(&mut self, img: &image::RgbaImage, p: Point) {
        let (w, h) = (img.width(), img.height());
        if w == 0 || h == 0 {
            return;
        }
        self.emit(&format!("gsave {} {} translate {w} {h} scale", p.x, p.y));
        self.emit(&format!("/picstr {} string def", w * 3));
        self.emit(&format!(
            "{w} {h} 8 [{w} 0 0 {h} 0 0] {{currentfile picstr readhexstring pop}} false 3 colorimage"
        ));
        let bg = self.bg;
        let mut line = String::with_capacity(72);
        for px in img.pixels() {
            let [r, g, b, a] = px.0;
            // Alpha mixes against the device background color.
            let mix = |s: u8, d: u8| -> u8 {
                ((u16::from(s) * u16::from(a) + u16::from(d) * (255 - u16::from(a))) / 255) as u8
            };
            line.push_str(&format!(
                "{:02x}{:02x}{:02x}",
                mix(r, bg.r),
                mix(g, bg.g),
                mix(b, bg.b)
            ));
            if line.len() >= 66 {
                self.emit(&line);
                line.clear();
            }
        }
        if !line.is_empty() {
            self.emit(&line);
        }
        self.emit("grestore");
        self.recover();
    }
}

impl<W: Write> PagedDevice for PostScriptFile<W> {
    fn start_job(&mut self, pages: usize) -> Result<()> {
        if self.in_job {
            return Err(Error::Session("job already started".into()));
        }
        let (pw, ph) = self.format.size();
        let orientation = match self.layout {
            PageLayout::Portrait => "Portrait",
            PageLayout::Landscape => "Landscape",
        };
        writeln!(self.out, "%!PS-Adobe-3.0")?;
        writeln!(self.out, "%%LanguageLevel: 2")?;
        writeln!(self.out, "%%Pages: {pages}")?;
        writeln!(self.out, "%%BoundingBox: 0 0 {pw} {ph}")?;
        writeln!(self.out, "%%Orientation: {orientation}")?;
        writeln!(self.out, "%%EndComments")?;
        self.pages = pages;
        self.page_count = 0;
        self.in_job = true;
        debug!(pages, "postscript job started");
        Ok(())
    }

    fn start_page(&mut self) -> Result<()> {
        if !self.in_job {
            return Err(Error::Session("page outside job".into()));
        }
        if self.in_page {
            return Err(Error::Session("page already open".into()));
        }
        self.page_count += 1;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        self.angle = 0.0;
        self.ox = 0;
        self.oy = 0;
        self.translate_depth = 0;
        self.clip.clear();
        let n = self.page_count;
        writeln!(self.out, "%%Page: {n} {n}")?;
        writeln!(self.out, "gsave")?;
        let setup = self.page_setup();
        writeln!(self.out, "{setup}")?;
        self.in_page = true;
        self.recover();
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        if !self.in_page {
            return Err(Error::Session("no open page".into()));
        }
        while self.translate_depth > 0 {
            warn!("unmatched translate at page end");
            writeln!(self.out, "grestore")?;
            self.translate_depth -= 1;
        }
        writeln!(self.out, "grestore showpage")?;
        self.in_page = false;
        Ok(())
    }

    fn end_job(&mut self) -> Result<()> {
        if !self.in_job {
            return Err(Error::Session("no open job".into()));
        }
        if self.in_page {
            self.end_page()?;
        }
        writeln!(self.out, "%%Trailer")?;
        writeln!(self.out, "%%Pages: {}", self.page_count)?;
        writeln!(self.out, "%%EOF")?;
        self.out.flush()?;
        self.in_job = false;
        debug!(pages = self.page_count, "postscript job finished");
        Ok(())
    }

    fn printable_rect(&self) -> (i32, i32) {
        let (w, h) = self.oriented();
        (
            (f64::from(w - 2 * MARGIN) / self.scale_x) as i32,
            (f64::from(h - 2 * MARGIN) / self.scale_y) as i32,
        )
    }

    fn margins(&self) -> (i32, i32, i32, i32) {
        let m = (f64::from(MARGIN) / self.scale_x) as i32;
        let mv = (f64::from(MARGIN) / self.scale_y) as i32;
        (m, mv, m, mv)
    }

    fn origin(&mut self, x: i32, y: i32) {
        self.ox = x;
        self.oy = y;
        self.sync_transform();
    }

    fn origin_pos(&self) -> (i32, i32) {
        (self.ox, self.oy)
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.scale_x = sx;
        self.scale_y = sy;
        self.ox = 0;
        self.oy = 0;
        self.sync_transform();
    }

    fn rotate(&mut self, degrees: f64) {
        self.angle = degrees;
        self.sync_transform();
    }

    fn translate(&mut self, x: i32, y: i32) {
        self.emit(&format!("gsave {x} {y} translate"));
        self.translate_depth += 1;
    }

    fn untranslate(&mut self) {
        if self.translate_depth == 0 {
            warn!("untranslate without matching translate");
            return;
        }
        self.emit("grestore");
        self.recover();
        self.translate_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> PostScriptFile<Vec<u8>> {
        PostScriptFile::new(Vec::new(), PageFormat::A4, PageLayout::Portrait)
    }

    fn output(dev: PostScriptFile<Vec<u8>>) -> String {
        String::from_utf8(dev.into_inner()).unwrap()
    }

    #[test]
    fn session_protocol_brackets_pages() {
        let mut dev = device();
        dev.start_job(2).unwrap();
        dev.start_page().unwrap();
        dev.rect_fill(Rect::new(10, 10, 50, 20));
        dev.end_page().unwrap();
        dev.start_page().unwrap();
        dev.end_page().unwrap();
        dev.end_job().unwrap();

        let out = output(dev);
        assert!(out.starts_with("%!PS-Adobe-3.0"));
        assert!(out.contains("%%Pages: 2"));
        assert!(out.contains("%%Page: 1 1"));
        assert!(out.contains("%%Page: 2 2"));
        assert!(out.contains("10 10 50 20 rectfill"));
        assert!(out.contains("showpage"));
        assert!(out.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn session_misuse_is_reported() {
        let mut dev = device();
        assert!(matches!(dev.start_page(), Err(Error::Session(_))));
        dev.start_job(1).unwrap();
        assert!(matches!(dev.end_page(), Err(Error::Session(_))));
        dev.start_page().unwrap();
        assert!(matches!(dev.start_page(), Err(Error::Session(_))));
    }

    #[test]
    fn printable_rect_reflects_orientation_and_scale() {
        let dev = device();
        let (w, h) = dev.printable_rect();
        assert_eq!((w, h), (595 - 36, 842 - 36));

        let mut land =
            PostScriptFile::new(Vec::new(), PageFormat::A4, PageLayout::Landscape);
        let (lw, lh) = land.printable_rect();
        assert_eq!((lw, lh), (842 - 36, 595 - 36));

        land.start_job(1).unwrap();
        land.start_page().unwrap();
        land.scale(2.0, 2.0);
        let (sw, sh) = land.printable_rect();
        assert_eq!((sw, sh), ((842 - 36) / 2, (595 - 36) / 2));
    }

    #[test]
    fn scale_resets_origin() {
        let mut dev = device();
        dev.start_job(1).unwrap();
        dev.start_page().unwrap();
        dev.origin(100, 50);
        assert_eq!(dev.origin_pos(), (100, 50));
        dev.scale(2.0, 2.0);
        assert_eq!(dev.origin_pos(), (0, 0));
    }

    #[test]
    fn translate_pairs_nest() {
        let mut dev = device();
        dev.start_job(1).unwrap();
        dev.start_page().unwrap();
        dev.translate(10, 10);
        dev.translate(5, 5);
        dev.untranslate();
        dev.untranslate();
        // Unmatched untranslate is ignored.
        dev.untranslate();
        dev.end_page().unwrap();
        dev.end_job().unwrap();

        let out = output(dev);
        assert_eq!(out.matches("gsave 10 10 translate").count(), 1);
        assert_eq!(out.matches("gsave 5 5 translate").count(), 1);
    }

    #[test]
    fn unbalanced_translate_is_unwound_at_page_end() {
        let mut dev = device();
        dev.start_job(1).unwrap();
        dev.start_page().unwrap();
        dev.translate(10, 10);
        dev.end_page().unwrap();
        dev.end_job().unwrap();
        assert!(output(dev).trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn text_is_escaped() {
        let mut dev = device();
        dev.start_job(1).unwrap();
        dev.start_page().unwrap();
        dev.text("a(b)c\\d", Point::new(5, 5));
        let out = output(dev);
        assert!(out.contains("(a\\(b\\)c\\\\d) show"));
    }

    #[test]
    fn clip_queries_track_the_stack() {
        let mut dev = device();
        dev.start_job(1).unwrap();
        dev.start_page().unwrap();
        dev.push_clip(Rect::new(0, 0, 100, 100));
        dev.push_clip(Rect::new(50, 50, 100, 100));
        assert_eq!(
            dev.clip_box(Rect::new(0, 0, 200, 200)),
            Some(Rect::new(50, 50, 50, 50))
        );
        assert!(!dev.not_clipped(Rect::new(0, 0, 10, 10)));
        dev.pop_clip();
        assert!(dev.not_clipped(Rect::new(0, 0, 10, 10)));
        dev.pop_clip();
        assert_eq!(dev.clip_box(Rect::new(0, 0, 10, 10)), Some(Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn paged_class_type_code() {
        assert!(!device().is_display());
    }
}
