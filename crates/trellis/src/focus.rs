//! Keyboard focus transfer and bookkeeping.

use geom::Direction;
use tracing::debug;

use crate::{
    context::Ui,
    event::Event,
    tree::{Tree, WidgetId},
};

impl Tree {
    /// Offer keyboard focus to `id`. Containers forward the offer to a
    /// child; leaves accept or decline through their widget. `nav` carries
    /// the navigation direction that produced the offer, which decides the
    /// scan order inside containers. Returns true if the widget (or one of
    /// its descendants) now holds focus.
    pub fn take_focus(&mut self, id: WidgetId, nav: Option<Direction>, ui: &mut Ui) -> bool {
        if ui.focus() == Some(id) {
            return true;
        }
        if !self.takes_events(id) {
            return false;
        }
        if self.children_len(id) > 0 {
            return self.handle(id, &Event::Focus(nav), ui);
        }
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.widget.accept_focus() {
            return false;
        }
        self.set_focus(id, ui);
        true
    }

    /// Move focus to `id` unconditionally: notify the previous holder,
    /// record the path index on every ancestor container, and damage both
    /// ends for repaint. Returns true if focus actually changed.
    pub fn set_focus(&mut self, id: WidgetId, ui: &mut Ui) -> bool {
        if ui.focus() == Some(id) {
            return false;
        }
        if let Some(old) = ui.focus() {
            if let Some(n) = self.nodes.get_mut(old) {
                n.widget.handle(&Event::Unfocus, ui);
            }
            self.redraw(old);
        }
        ui.set_focus_id(Some(id));
        debug!(?id, "set focus");

        // Each ancestor remembers which child leads to the focus holder.
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            let index = self.find(parent, cur);
            if index < self.children_len(parent) {
                self.nodes[parent].focus = Some(index);
            }
            cur = parent;
        }
        self.redraw(id);
        true
    }
}
