//! Test utilities: recording leaf widgets, a call-capture device, and a
//! scriptable paginated device.

use std::{cell::RefCell, rc::Rc};

use geom::{Point, Rect};
use image::RgbaImage;

use crate::{
    context::Ui,
    device::{
        CAPTURE_DISPLAY, ClipStack, Color, Device, Font, PAGED_TYPE_BOUNDARY,
        paged::PagedDevice,
    },
    draw::Graphics,
    error::{Error, Result},
    event::Event,
    widget::Widget,
};

/// A shared event trace that test leaves append to.
pub type TraceLog = Rc<RefCell<Vec<String>>>;

/// Create an empty shared trace.
pub fn new_log() -> TraceLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Which events a [`Leaf`] consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consume {
    /// Consume nothing; events bubble past the leaf.
    #[default]
    Nothing,
    /// Consume every delivered event.
    All,
    /// Consume pointer events only.
    Pointer,
    /// Consume keystrokes and shortcuts only.
    Keys,
}

/// A scriptable leaf widget. Records every delivered event (with the
/// translated pointer position for pointer events) into a shared trace and
/// consumes according to its policy.
#[derive(Default)]
pub struct Leaf {
    name: &'static str,
    focusable: bool,
    consume: Consume,
    log: Option<TraceLog>,
}

impl Leaf {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Accept focus when offered.
    pub fn focusable(mut self) -> Self {
        self.focusable = true;
        self
    }

    /// Set the consumption policy.
    pub fn consume(mut self, consume: Consume) -> Self {
        self.consume = consume;
        self
    }

    /// Attach a shared trace.
    pub fn with_log(mut self, log: &TraceLog) -> Self {
        self.log = Some(Rc::clone(log));
        self
    }

    fn record(&self, entry: String) {
        if let Some(log) = &self.log {
            log.borrow_mut().push(entry);
        }
    }
}

impl Widget for Leaf {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&mut self, event: &Event, ui: &mut Ui) -> bool {
        let p = ui.pointer();
        let entry = match event {
            Event::Push => format!("{}: push @{},{}", self.name, p.x, p.y),
            Event::Enter => format!("{}: enter @{},{}", self.name, p.x, p.y),
            Event::Move => format!("{}: move @{},{}", self.name, p.x, p.y),
            Event::DndEnter => format!("{}: dnd_enter @{},{}", self.name, p.x, p.y),
            Event::DndDrag => format!("{}: dnd_drag @{},{}", self.name, p.x, p.y),
            Event::Unfocus => format!("{}: unfocus", self.name),
            Event::Key(_) => format!("{}: key", self.name),
            Event::Shortcut(_) => format!("{}: shortcut", self.name),
            other => format!("{}: {other:?}", self.name),
        };
        self.record(entry);
        match self.consume {
            Consume::Nothing => false,
            Consume::All => true,
            Consume::Pointer => matches!(
                event,
                Event::Push
                    | Event::Drag
                    | Event::Release
                    | Event::Enter
                    | Event::Leave
                    | Event::Move
                    | Event::DndEnter
                    | Event::DndDrag
            ),
            Consume::Keys => matches!(event, Event::Key(_) | Event::Shortcut(_)),
        }
    }

    fn draw(&self, area: Rect, g: &mut Graphics<'_>) {
        g.rect_fill(area);
    }

    fn accept_focus(&self) -> bool {
        self.focusable
    }
}

/// A device that records every call as a readable string, with real clip
/// bookkeeping so `not_clipped` behaves like a screen device.
pub struct Capture {
    ops: Vec<String>,
    clip: ClipStack,
}

impl Capture {
    pub fn new(bounds: Rect) -> Self {
        Self {
            ops: Vec::new(),
            clip: ClipStack::new(bounds),
        }
    }

    /// The recorded call sequence.
    pub fn ops(&self) -> &[String] {
        &self.ops
    }
}

impl Device for Capture {
    fn type_code(&self) -> u16 {
        CAPTURE_DISPLAY
    }

    fn color(&mut self, c: Color) {
        self.ops.push(format!("color {},{},{}", c.r, c.g, c.b));
    }

    fn rect(&mut self, r: Rect) {
        self.ops.push(format!("rect {},{} {}x{}", r.x, r.y, r.w, r.h));
    }

    fn rect_fill(&mut self, r: Rect) {
        self.ops.push(format!("fill {},{} {}x{}", r.x, r.y, r.w, r.h));
    }

    fn line(&mut self, a: Point, b: Point) {
        self.ops.push(format!("line {},{}-{},{}", a.x, a.y, b.x, b.y));
    }

    fn text(&mut self, s: &str, p: Point) {
        self.ops.push(format!("text {s} {},{}", p.x, p.y));
    }

    fn font(&mut self, _face: Font, size: i32) {
        self.ops.push(format!("font {size}"));
    }

    fn push_clip(&mut self, r: Rect) {
        self.ops
            .push(format!("push_clip {},{} {}x{}", r.x, r.y, r.w, r.h));
        self.clip.push(r);
    }

    fn push_no_clip(&mut self) {
        self.ops.push("push_no_clip".into());
        self.clip.push_no_clip();
    }

    fn pop_clip(&mut self) {
        self.ops.push("pop_clip".into());
        self.clip.pop();
    }

    fn clip_out(&mut self, r: Rect) {
        self.ops
            .push(format!("clip_out {},{} {}x{}", r.x, r.y, r.w, r.h));
        self.clip.clip_out(r);
    }

    fn clip_box(&self, r: Rect) -> Option<Rect> {
        self.clip.top().clip_box(r)
    }

    fn not_clipped(&self, r: Rect) -> bool {
        self.clip.top().intersects(r)
    }

    fn draw_image(&mut self, img: &RgbaImage, p: Point) {
        self.ops.push(format!(
            "image {}x{} {},{}",
            img.width(),
            img.height(),
            p.x,
            p.y
        ));
    }
}

/// A paginated device that accepts drawing silently and can be scripted to
/// cancel at a given page, the way a user dismisses a system print dialog.
pub struct CancellingPager {
    cancel_at: Option<usize>,
    page: usize,
    draws: usize,
    job_ended: bool,
}

impl CancellingPager {
    /// Cancel when the given 1-based page is opened.
    pub fn cancel_at_page(page: usize) -> Self {
        Self {
            cancel_at: Some(page),
            page: 0,
            draws: 0,
            job_ended: false,
        }
    }

    pub fn never_cancels() -> Self {
        Self {
            cancel_at: None,
            page: 0,
            draws: 0,
            job_ended: false,
        }
    }

    /// Number of fill primitives received.
    pub fn draw_calls(&self) -> usize {
        self.draws
    }

    /// Did the job run to completion?
    pub fn job_ended(&self) -> bool {
        self.job_ended
    }
}

impl Device for CancellingPager {
    fn type_code(&self) -> u16 {
        PAGED_TYPE_BOUNDARY + 1
    }

    fn rect_fill(&mut self, _r: Rect) {
        self.draws += 1;
    }
}

impl PagedDevice for CancellingPager {
    fn start_job(&mut self, _pages: usize) -> Result<()> {
        Ok(())
    }

    fn start_page(&mut self) -> Result<()> {
        self.page += 1;
        if self.cancel_at == Some(self.page) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_job(&mut self) -> Result<()> {
        self.job_ended = true;
        Ok(())
    }

    fn printable_rect(&self) -> (i32, i32) {
        (576, 756)
    }

    fn margins(&self) -> (i32, i32, i32, i32) {
        (18, 18, 18, 18)
    }

    fn origin(&mut self, _x: i32, _y: i32) {}

    fn origin_pos(&self) -> (i32, i32) {
        (0, 0)
    }

    fn scale(&mut self, _sx: f64, _sy: f64) {}

    fn rotate(&mut self, _degrees: f64) {}

    fn translate(&mut self, _x: i32, _y: i32) {}

    fn untranslate(&mut self) {}
}
