//! The process-wide interaction context.

use geom::Point;
use tracing::debug;

use crate::{
    device::{Device, NullDevice},
    tree::WidgetId,
};

/// Mutable state shared by the whole widget tree: the current drawing
/// device, the ambient pointer position, and the global focus, belowmouse,
/// and pushed trackers. Everything here follows a save/restore discipline
/// rather than locking; there is exactly one event-processing thread.
///
/// Trackers hold generational ids, so a tracked widget that has been
/// destroyed simply resolves to nothing rather than dangling.
pub struct Ui {
    device: Box<dyn Device>,
    pointer: Point,
    focus: Option<WidgetId>,
    belowmouse: Option<WidgetId>,
    pushed: Option<WidgetId>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui {
    /// A context with no real output target: drawing goes to a
    /// [`NullDevice`] until a device is selected.
    pub fn new() -> Self {
        Self {
            device: Box::new(NullDevice),
            pointer: Point::zero(),
            focus: None,
            belowmouse: None,
            pushed: None,
        }
    }

    /// Make `device` the target of subsequent drawing and return the
    /// previous target, so callers can restore it when done. This is the
    /// mechanism that points the same drawing code at screen, paper, or
    /// file output.
    pub fn set_device(&mut self, device: Box<dyn Device>) -> Box<dyn Device> {
        std::mem::replace(&mut self.device, device)
    }

    /// The current drawing target.
    pub fn device(&mut self) -> &mut dyn Device {
        &mut *self.device
    }

    /// Run `f` with `device` current, then restore the previous target.
    /// Returns the temporarily-installed device back to the caller along
    /// with `f`'s result.
    pub fn with_device<R>(
        &mut self,
        device: Box<dyn Device>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> (Box<dyn Device>, R) {
        let prev = self.set_device(device);
        let out = f(self);
        let used = self.set_device(prev);
        (used, out)
    }

    /// The ambient pointer position, in the coordinate space of whichever
    /// container is currently dispatching.
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Set the ambient pointer position.
    pub fn set_pointer(&mut self, p: Point) {
        self.pointer = p;
    }

    /// The widget holding keyboard focus.
    pub fn focus(&self) -> Option<WidgetId> {
        self.focus
    }

    pub(crate) fn set_focus_id(&mut self, id: Option<WidgetId>) {
        if self.focus != id {
            debug!(?id, "focus changed");
            self.focus = id;
        }
    }

    /// The widget currently under the pointer.
    pub fn belowmouse(&self) -> Option<WidgetId> {
        self.belowmouse
    }

    /// Record the widget under the pointer.
    pub fn set_belowmouse(&mut self, id: Option<WidgetId>) {
        self.belowmouse = id;
    }

    /// The widget receiving the current press-drag sequence.
    pub fn pushed(&self) -> Option<WidgetId> {
        self.pushed
    }

    /// Record the widget receiving the current press-drag sequence.
    pub fn set_pushed(&mut self, id: Option<WidgetId>) {
        self.pushed = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RASTER_DISPLAY;

    struct Tagged(u16);
    impl Device for Tagged {
        fn type_code(&self) -> u16 {
            self.0
        }
    }

    #[test]
    fn device_swap_returns_previous() {
        let mut ui = Ui::new();
        let prev = ui.set_device(Box::new(Tagged(7)));
        assert_eq!(prev.type_code(), RASTER_DISPLAY);
        assert_eq!(ui.device().type_code(), 7);
    }

    #[test]
    fn with_device_restores() {
        let mut ui = Ui::new();
        ui.set_device(Box::new(Tagged(1)));
        let (used, code) = ui.with_device(Box::new(Tagged(2)), |ui| ui.device().type_code());
        assert_eq!(code, 2);
        assert_eq!(used.type_code(), 2);
        assert_eq!(ui.device().type_code(), 1);
    }
}
