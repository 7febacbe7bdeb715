//! Event routing: the container state machine and the per-child send
//! wrapper.

use geom::Direction;
use tracing::trace;

use crate::{
    context::Ui,
    event::{Event, KeyPress, navigation_key},
    tree::{Tree, WidgetId},
};

impl Tree {
    /// Deliver an event to `to`, applying the shared wrapper semantics:
    ///
    /// - Events the outer loop delivers directly (unfocus, drag, release,
    ///   leave, dnd-leave, dnd-release, keystrokes) are never redirected;
    ///   the attempt reports consumed so callers stop trying.
    /// - Focus offers go through [`Tree::take_focus`].
    /// - Pointer crossings are retyped: a target that already contains the
    ///   belowmouse widget gets a move, anyone else gets an enter. The same
    ///   applies to the drag-and-drop pair.
    /// - Crossings, show and hide only require visibility; everything else
    ///   requires the target to take events.
    ///
    /// The ambient pointer is translated into the target's space for the
    /// duration of the dispatch and restored on every exit path. A consumed
    /// enter updates the belowmouse tracker and a consumed push updates the
    /// pushed tracker, unless the target's own handling already did.
    pub fn send(&mut self, event: &Event, to: WidgetId, ui: &mut Ui) -> bool {
        use Event::{DndDrag, DndEnter, DndLeave, DndRelease, Drag, Enter, Focus, Hide, Key,
            Leave, Move, Push, Release, Show, Unfocus};

        let mut ev = *event;
        match ev {
            Unfocus | Drag | Release | Leave | DndLeave | DndRelease | Key(_) => return true,
            Focus(nav) => return self.take_focus(to, nav, ui),
            Enter | Move => {
                ev = if ui.belowmouse().is_some_and(|b| self.contains(to, b)) {
                    Move
                } else {
                    Enter
                };
                if !self.nodes.get(to).is_some_and(|n| n.visible()) {
                    return false;
                }
            }
            Show | Hide => {
                if !self.nodes.get(to).is_some_and(|n| n.visible()) {
                    return false;
                }
            }
            DndEnter | DndDrag => {
                ev = if ui.belowmouse().is_some_and(|b| self.contains(to, b)) {
                    DndDrag
                } else {
                    DndEnter
                };
                if !self.takes_events(to) {
                    return false;
                }
            }
            _ => {
                if !self.takes_events(to) {
                    return false;
                }
            }
        }

        let origin = self.rect(to).pos();
        let saved = ui.pointer();
        ui.set_pointer(saved - origin);
        let consumed = {
            let mut guard = scopeguard::guard(&mut *ui, move |u| u.set_pointer(saved));
            self.deliver(&ev, to, &mut guard)
        };
        if !consumed {
            return false;
        }

        match ev {
            Enter | DndEnter => {
                if !ui.belowmouse().is_some_and(|b| self.contains(to, b)) {
                    ui.set_belowmouse(Some(to));
                }
            }
            Push => {
                if ui.pushed().is_some() && !ui.pushed().is_some_and(|p| self.contains(to, p)) {
                    ui.set_pushed(Some(to));
                }
            }
            _ => {}
        }
        true
    }

    /// Hand the event to container routing or to the leaf widget.
    fn deliver(&mut self, event: &Event, to: WidgetId, ui: &mut Ui) -> bool {
        if self.children_len(to) > 0 {
            self.handle(to, event, ui)
        } else if let Some(n) = self.nodes.get_mut(to) {
            n.widget.handle(event, ui)
        } else {
            false
        }
    }

    /// Container event routing for `group`, a state machine keyed on the
    /// event kind:
    ///
    /// - A focus offer whose holder is already a descendant just records
    ///   the holder's child index. Otherwise the offer is forwarded to the
    ///   last-focused child and then scanned in navigation order until a
    ///   child accepts.
    /// - Pointer-position and press events hit-test children from front to
    ///   back (last added first) and stop at the first consumer.
    /// - Everything else round-robins from the focus index until one child
    ///   consumes or all have been tried once.
    /// - A shortcut nobody consumed triggers keyboard navigation when this
    ///   container holds the focus path but not the focus itself.
    pub fn handle(&mut self, group: WidgetId, event: &Event, ui: &mut Ui) -> bool {
        let len = self.children_len(group);
        match *event {
            Event::Focus(nav) => {
                if let Some(focus) = ui.focus() {
                    if focus != group && self.contains(group, focus) {
                        let index = self.find(group, focus);
                        if index < len {
                            self.nodes[group].focus = Some(index);
                        }
                        return true;
                    }
                }
                match nav {
                    Some(Direction::Left | Direction::Up) => {
                        for i in (0..len).rev() {
                            if self.offer_focus(group, i, nav, ui) {
                                return true;
                            }
                        }
                    }
                    Some(Direction::Right | Direction::Down) => {
                        for i in 0..len {
                            if self.offer_focus(group, i, nav, ui) {
                                return true;
                            }
                        }
                    }
                    None => {
                        // Prefer whichever child held focus last.
                        if let Some(f) = self.nodes.get(group).and_then(|n| n.focus_index()) {
                            if f < len && self.offer_focus(group, f, nav, ui) {
                                return true;
                            }
                        }
                        for i in 0..len {
                            if self.offer_focus(group, i, nav, ui) {
                                return true;
                            }
                        }
                    }
                }
                false
            }

            Event::Push
            | Event::Enter
            | Event::Move
            | Event::DndEnter
            | Event::DndDrag => {
                for i in (0..len).rev() {
                    let Some(child) = self.child(group, i) else {
                        continue;
                    };
                    if self.rect(child).contains(ui.pointer()) && self.send(event, child, ui) {
                        trace!(?child, ?event, "pointer event consumed");
                        return true;
                    }
                }
                false
            }

            _ => {
                if len > 0 {
                    let start = self
                        .nodes
                        .get(group)
                        .and_then(|n| n.focus_index())
                        .filter(|&f| f < len)
                        .unwrap_or(0);
                    let mut j = start;
                    loop {
                        if let Some(child) = self.child(group, j) {
                            if self.send(event, child, ui) {
                                return true;
                            }
                        }
                        j += 1;
                        if j >= len {
                            j = 0;
                        }
                        if j == start {
                            break;
                        }
                    }
                }
                if let Event::Shortcut(key) = event {
                    if ui.focus() != Some(group)
                        && ui.focus().is_some_and(|f| self.contains(group, f))
                    {
                        return self.navigate(group, *key, ui);
                    }
                }
                false
            }
        }
    }

    fn offer_focus(
        &mut self,
        group: WidgetId,
        index: usize,
        nav: Option<Direction>,
        ui: &mut Ui,
    ) -> bool {
        match self.child(group, index) {
            Some(child) => self.take_focus(child, nav, ui),
            None => false,
        }
    }

    /// Directional keyboard navigation for a shortcut no child consumed.
    /// Walks child indices in the key's direction, wrapping only when this
    /// container is a root; vertical moves skip candidates that do not
    /// horizontally overlap the focused child's span. Fails when the walk
    /// returns to its starting index, letting the parent try instead.
    fn navigate(&mut self, group: WidgetId, key: KeyPress, ui: &mut Ui) -> bool {
        let Some(dir) = navigation_key(key) else {
            return false;
        };
        let len = self.children_len(group);
        if len == 0 {
            return false;
        }
        let start = self
            .nodes
            .get(group)
            .and_then(|n| n.focus_index())
            .filter(|&f| f < len)
            .unwrap_or(0);
        let Some(first) = self.child(group, start) else {
            return false;
        };
        let origin = self.rect(first);
        let (old_x, old_r) = (origin.x, origin.right());
        let root = self.parent(group).is_none();

        let mut i = start;
        loop {
            if dir.is_forward() {
                i += 1;
                if i >= len {
                    if !root {
                        return false;
                    }
                    i = 0;
                }
            } else if i > 0 {
                i -= 1;
            } else {
                if !root {
                    return false;
                }
                i = len - 1;
            }
            if i == start {
                return false;
            }
            let Some(child) = self.child(group, i) else {
                return false;
            };
            if dir.is_vertical() {
                // Vertical moves only land on horizontally overlapping
                // candidates.
                let r = self.rect(child);
                if r.x >= old_r || r.right() <= old_x {
                    continue;
                }
            }
            if self.take_focus(child, Some(dir), ui) {
                trace!(?child, ?dir, "navigation moved focus");
                return true;
            }
        }
    }
}
