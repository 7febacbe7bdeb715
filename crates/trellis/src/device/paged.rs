//! The session protocol for paginated output devices.

use tracing::debug;

use crate::{
    error::Result,
    tree::{Tree, WidgetId},
};

use super::Device;

/// Paper sizes, in PostScript points (1/72 inch), portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    B5,
    Letter,
    Legal,
    Executive,
    Folio,
    Ledger,
    Tabloid,
}

impl PageFormat {
    /// Portrait (width, height) in points.
    pub fn size(self) -> (i32, i32) {
        match self {
            Self::A3 => (842, 1191),
            Self::A4 => (595, 842),
            Self::A5 => (420, 595),
            Self::B5 => (516, 729),
            Self::Letter => (612, 792),
            Self::Legal => (612, 1008),
            Self::Executive => (540, 720),
            Self::Folio => (612, 936),
            Self::Ledger => (1224, 792),
            Self::Tabloid => (792, 1224),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLayout {
    #[default]
    Portrait,
    Landscape,
}

/// A device producing multi-page output. The session protocol is
/// `start_job`, then for each page `start_page`, drawing, `end_page`, and
/// finally `end_job`. A session error from a page boundary means the
/// surrounding job should abort; the widget layer never interprets it.
///
/// The device composes an origin offset, scale factors, and a rotation
/// angle: scaling resets the origin, rotation is centered on the current
/// origin, and `translate`/`untranslate` form a matched pair that must nest
/// correctly inside a page.
pub trait PagedDevice: Device {
    /// Open a job expected to produce `pages` pages.
    fn start_job(&mut self, pages: usize) -> Result<()>;

    /// Open the next page. Coordinates start in points with the origin at
    /// the top left of the printable area.
    fn start_page(&mut self) -> Result<()>;

    /// Close the current page.
    fn end_page(&mut self) -> Result<()>;

    /// Close the job and flush the output.
    fn end_job(&mut self) -> Result<()>;

    /// The usable page area in device-scaled units, accounting for paper
    /// size, orientation, and margins.
    fn printable_rect(&self) -> (i32, i32);

    /// Margins between the printable area and the paper edge, as
    /// (left, top, right, bottom) in device-scaled units.
    fn margins(&self) -> (i32, i32, i32, i32);

    /// Place the graphics origin, in coordinates relative to the printable
    /// area. Successive calls do not combine.
    fn origin(&mut self, x: i32, y: i32);

    /// The current graphics origin in page coordinates.
    fn origin_pos(&self) -> (i32, i32);

    /// Scale subsequent page coordinates. Resets the origin to the top
    /// left of the printable area. Successive calls do not combine.
    fn scale(&mut self, sx: f64, sy: f64);

    /// Rotate subsequent drawing counterclockwise about the current
    /// origin, in degrees. Successive calls do not combine.
    fn rotate(&mut self, degrees: f64);

    /// Shift the origin, accounting for the current rotation. Must be
    /// matched by an [`PagedDevice::untranslate`] call.
    fn translate(&mut self, x: i32, y: i32);

    /// Undo the most recent [`PagedDevice::translate`]. Calling without a
    /// matching translate is a usage error and is ignored.
    fn untranslate(&mut self);
}

/// Print one widget as a single-page job on `dev`. The widget draws with
/// full damage at the device's current origin; a non-success status from
/// any page boundary aborts the job.
pub fn print_widget(tree: &mut Tree, id: WidgetId, dev: &mut dyn PagedDevice) -> Result<()> {
    dev.start_job(1)?;
    dev.start_page()?;
    debug!(?id, "printing widget");
    tree.redraw(id);
    tree.draw_on(id, &mut *dev);
    dev.end_page()?;
    dev.end_job()
}

#[cfg(test)]
mod tests {
    use geom::Rect;

    use super::*;
    use crate::{
        error::Error,
        tutils::{CancellingPager, Leaf},
    };

    #[test]
    fn format_sizes() {
        assert_eq!(PageFormat::A4.size(), (595, 842));
        assert_eq!(PageFormat::Letter.size(), (612, 792));
    }

    #[test]
    fn cancelled_page_aborts_the_job() {
        let mut tree = Tree::new();
        let root = tree.new_window(Leaf::named("root"), Rect::new(0, 0, 100, 100));
        let mut pager = CancellingPager::cancel_at_page(1);

        let res = print_widget(&mut tree, root, &mut pager);
        assert_eq!(res, Err(Error::Cancelled));
        // Nothing was drawn into the aborted session.
        assert_eq!(pager.draw_calls(), 0);
        assert!(!pager.job_ended());
    }

    #[test]
    fn successful_job_runs_the_full_protocol() {
        let mut tree = Tree::new();
        let root = tree.new_window(Leaf::named("root"), Rect::new(0, 0, 100, 100));
        let mut pager = CancellingPager::never_cancels();

        print_widget(&mut tree, root, &mut pager).unwrap();
        assert!(pager.draw_calls() > 0);
        assert!(pager.job_ended());
    }
}
