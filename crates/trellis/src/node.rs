//! Per-node data stored in the tree arena.

use geom::{Quad, Rect};

use crate::{
    tree::WidgetId,
    widget::{Damage, Label, Widget},
};

/// A node in the widget arena: the widget's behavior plus the display and
/// container state the tree manages on its behalf. Any node may carry
/// children; group semantics apply to those that do.
pub struct Node {
    /// Widget behavior and state.
    pub(crate) widget: Box<dyn Widget>,

    /// Owning container, if attached.
    pub(crate) parent: Option<WidgetId>,
    /// Children in z-order: later entries draw on top and hit-test first.
    pub(crate) children: Vec<WidgetId>,

    /// Bounds relative to the parent's origin.
    pub(crate) rect: Rect,
    /// Pending redraw state.
    pub(crate) damage: Damage,
    /// Hidden nodes receive no pointer events and do not draw.
    pub(crate) visible: bool,
    /// Inactive nodes draw but take no events.
    pub(crate) active: bool,
    /// Top-level windows manage their own repaint and are skipped by the
    /// parent's draw and layout cascades.
    pub(crate) window: bool,
    /// Label text and placement, if any.
    pub(crate) label: Option<Label>,

    /// Index of the child that last held keyboard focus.
    pub(crate) focus: Option<usize>,
    /// The child (or this node itself) that absorbs size changes.
    pub(crate) resizable: Option<WidgetId>,
    /// Boundary snapshot for delta-based resize distribution: own quad,
    /// resizable quad clipped to own bounds, then one quad per child.
    pub(crate) sizes: Option<Vec<Quad>>,
    /// Own bounds when the snapshot baseline was last taken.
    pub(crate) original: Rect,
}

impl Node {
    pub(crate) fn new(widget: Box<dyn Widget>, rect: Rect) -> Self {
        Self {
            widget,
            parent: None,
            children: Vec::new(),
            rect,
            damage: Damage::ALL,
            visible: true,
            active: true,
            window: false,
            label: None,
            focus: None,
            resizable: None,
            sizes: None,
            original: rect,
        }
    }

    /// The widget's behavior object.
    pub fn widget(&self) -> &dyn Widget {
        &*self.widget
    }

    /// The owning container, if attached.
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Children in z-order.
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Bounds relative to the parent's origin.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Pending redraw state.
    pub fn damage(&self) -> Damage {
        self.damage
    }

    /// Is the node shown?
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Does the node respond to events?
    pub fn active(&self) -> bool {
        self.active
    }

    /// Is this a top-level window?
    pub fn window(&self) -> bool {
        self.window
    }

    /// Visible and active: the node is offered events beyond show/hide and
    /// pointer crossings.
    pub fn takes_events(&self) -> bool {
        self.visible && self.active
    }

    /// The label, if one is set.
    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    /// Index of the child that last held keyboard focus.
    pub fn focus_index(&self) -> Option<usize> {
        self.focus
    }
}
