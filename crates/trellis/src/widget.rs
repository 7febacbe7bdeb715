//! The widget behavior trait and per-widget display state.

use std::any::Any;

use bitflags::bitflags;
use geom::Rect;

use crate::{Graphics, Ui, event::Event};

bitflags! {
    /// What part of a widget must be redrawn. `CHILD` on a container means
    /// only descendants carry damage; any other bit forces the container's
    /// full repaint path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Damage: u8 {
        /// A descendant needs redrawing.
        const CHILD = 0x01;
        /// A previously obscured area was exposed.
        const EXPOSE = 0x02;
        /// Contents shifted and the revealed strip needs painting.
        const SCROLL = 0x04;
        /// Overlay decoration changed.
        const OVERLAY = 0x08;
        /// A child's outside label needs redrawing.
        const CHILD_LABEL = 0x40;
        /// Everything needs redrawing.
        const ALL = 0x80;
    }
}

impl Damage {
    /// True when the damage goes beyond "some child changed", forcing a
    /// container's clipped full repaint.
    pub fn beyond_children(self) -> bool {
        self.intersects(!Self::CHILD)
    }
}

bitflags! {
    /// Where a widget's label is placed relative to its bounds. An edge bit
    /// without `INSIDE` puts the label outside the widget, where the owning
    /// container draws it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Align: u8 {
        const TOP = 0x01;
        const BOTTOM = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
        /// Keep the label within the widget's own bounds.
        const INSIDE = 0x10;
    }
}

impl Align {
    /// Is the label placed outside the widget's bounds?
    pub fn is_outside(self) -> bool {
        self.intersects(Self::TOP | Self::BOTTOM | Self::LEFT | Self::RIGHT)
            && !self.contains(Self::INSIDE)
    }
}

/// A widget's label text and placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub align: Align,
}

impl Label {
    pub fn new(text: impl Into<String>, align: Align) -> Self {
        Self {
            text: text.into(),
            align,
        }
    }
}

/// The behavior attached to a node in the widget tree. Implementations are
/// leaves: container behavior (child dispatch, layout distribution, damage
/// walks) lives on [`crate::Tree`] and is applied to any node with children.
pub trait Widget: Any {
    /// A short name for logs and debugging.
    fn name(&self) -> &'static str {
        let n = std::any::type_name::<Self>();
        n.rsplit("::").next().unwrap_or(n)
    }

    /// Handle an event. Return true to consume it and stop propagation.
    /// Pointer positions are read from `ui`, already translated into this
    /// widget's local space.
    fn handle(&mut self, _event: &Event, _ui: &mut Ui) -> bool {
        false
    }

    /// Paint this widget's own content into `area`, which is always placed
    /// at the origin of the current drawing coordinates.
    fn draw(&self, _area: Rect, _g: &mut Graphics<'_>) {}

    /// Recompute internal layout after a geometry change. Containers have
    /// their children repositioned by the tree before this runs.
    fn layout(&mut self, _area: Rect) {}

    /// Would this widget accept keyboard focus if offered it?
    fn accept_focus(&self) -> bool {
        false
    }
}

/// Convert widgets into boxed trait objects.
impl<W> From<W> for Box<dyn Widget>
where
    W: Widget + 'static,
{
    fn from(widget: W) -> Self {
        Box::new(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_classification() {
        assert!(!Damage::CHILD.beyond_children());
        assert!(Damage::ALL.beyond_children());
        assert!((Damage::CHILD | Damage::EXPOSE).beyond_children());
        assert!(!Damage::empty().beyond_children());
    }

    #[test]
    fn align_placement() {
        assert!(Align::TOP.is_outside());
        assert!(!(Align::TOP | Align::INSIDE).is_outside());
        assert!(!Align::INSIDE.is_outside());
        assert!(!Align::empty().is_outside());
    }
}
