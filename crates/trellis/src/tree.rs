//! The widget arena and the structural operations of containers.

use geom::Rect;
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, warn};

use crate::{
    node::Node,
    widget::{Damage, Label, Widget},
};

new_key_type! {
    /// Opaque identifier for a widget stored in the tree arena. Identifiers
    /// are generational: an id that outlives its widget resolves to nothing
    /// rather than to a recycled slot.
    pub struct WidgetId;
}

/// The widget tree. The arena owns every widget; identifiers held elsewhere
/// (parent back-references, focus trackers, the resizable designation) are
/// non-owning. A widget has at most one parent at any time: attaching it to
/// a new container always detaches it from the old one first.
#[derive(Default)]
pub struct Tree {
    pub(crate) nodes: SlotMap<WidgetId, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level window node. Windows have no parent and are
    /// skipped by their own parent's draw and layout cascades if reparented
    /// under another node.
    pub fn new_window(&mut self, widget: impl Into<Box<dyn Widget>>, rect: Rect) -> WidgetId {
        let id = self.nodes.insert(Node::new(widget.into(), rect));
        self.nodes[id].window = true;
        id
    }

    /// Create a node without attaching it anywhere. Used for replace flows
    /// and for building subtrees before attachment.
    pub fn new_detached(&mut self, widget: impl Into<Box<dyn Widget>>, rect: Rect) -> WidgetId {
        self.nodes.insert(Node::new(widget.into(), rect))
    }

    /// Create a widget and place it at `index` in `group`'s child list,
    /// shifting later children back. `index` is clamped to the child count.
    pub fn insert(
        &mut self,
        group: WidgetId,
        widget: impl Into<Box<dyn Widget>>,
        rect: Rect,
        index: usize,
    ) -> WidgetId {
        let id = self.nodes.insert(Node::new(widget.into(), rect));
        self.attach(group, id, index);
        id
    }

    /// Create a widget and append it to `group`'s children.
    pub fn add(
        &mut self,
        group: WidgetId,
        widget: impl Into<Box<dyn Widget>>,
        rect: Rect,
    ) -> WidgetId {
        let index = self.children_len(group);
        self.insert(group, widget, rect, index)
    }

    /// Attach an existing widget at `index` in `group`'s child list. If the
    /// widget is currently attached elsewhere it is detached first; when it
    /// is already a child of `group`, the target index is adjusted for the
    /// slot its removal frees up, and moving it onto itself is a no-op.
    pub fn attach(&mut self, group: WidgetId, id: WidgetId, mut index: usize) {
        if let Some(old) = self.nodes.get(id).and_then(|n| n.parent) {
            let at = self.find(old, id);
            if old == group {
                if index > at {
                    index -= 1;
                }
                if index == at {
                    return;
                }
            }
            self.detach_at(old, at);
        }
        let len = self.children_len(group);
        let index = index.min(len);
        self.nodes[id].parent = Some(group);
        let group_node = &mut self.nodes[group];
        group_node.children.insert(index, id);
        self.init_sizes(group);
        debug!(?group, ?id, index, "attached child");
    }

    /// Detach the child at `index`, keeping it alive in the arena. Returns
    /// the detached widget's id. Out-of-range indices are a no-op.
    pub fn remove_at(&mut self, group: WidgetId, index: usize) -> Option<WidgetId> {
        if index >= self.children_len(group) {
            warn!(?group, index, "remove index out of range");
            return None;
        }
        let id = self.detach_at(group, index);
        self.init_sizes(group);
        Some(id)
    }

    /// Detach a widget from `group` by identity. A widget that is not a
    /// child (directly or through an ancestor) is a no-op.
    pub fn remove(&mut self, group: WidgetId, id: WidgetId) -> Option<WidgetId> {
        let index = self.find(group, id);
        self.remove_at(group, index)
    }

    /// Put a new widget in the slot at `index`, detaching the previous
    /// occupant without shifting its siblings. An out-of-range index
    /// degrades to an append. Returns the new widget's id.
    pub fn replace(
        &mut self,
        group: WidgetId,
        index: usize,
        widget: impl Into<Box<dyn Widget>>,
        rect: Rect,
    ) -> WidgetId {
        if index >= self.children_len(group) {
            warn!(?group, index, "replace index out of range, appending");
            return self.add(group, widget, rect);
        }
        let id = self.nodes.insert(Node::new(widget.into(), rect));
        self.nodes[id].parent = Some(group);
        let old = std::mem::replace(&mut self.nodes[group].children[index], id);
        self.nodes[old].parent = None;
        self.init_sizes(group);
        id
    }

    /// The index of the child that is, or contains, `target`. Walks the
    /// target's ownership chain upward until a node parented by `group` is
    /// found, then scans the child list in reverse for an identity match
    /// (recently added children are the common removal case). Returns the
    /// child count as a one-past-end sentinel when the target is not under
    /// this group.
    pub fn find(&self, group: WidgetId, target: WidgetId) -> usize {
        let len = self.children_len(group);
        let mut cur = Some(target);
        while let Some(id) = cur {
            let Some(node) = self.nodes.get(id) else {
                return len;
            };
            if node.parent == Some(group) {
                for index in (0..len).rev() {
                    if self.nodes[group].children[index] == id {
                        return index;
                    }
                }
                return len;
            }
            cur = node.parent;
        }
        len
    }

    /// Detach and destroy every child of `group`, along with their subtrees.
    /// Container bookkeeping (focus index, resizable designation, layout
    /// snapshot) is reset before any widget is destroyed, so side effects of
    /// destruction observe a consistent empty container.
    pub fn clear(&mut self, group: WidgetId) {
        self.init_sizes(group);
        let Some(node) = self.nodes.get_mut(group) else {
            return;
        };
        if node.children.is_empty() {
            return;
        }
        // Quiesce first: destruction side effects may look back at this
        // container and must see it already empty.
        let children = std::mem::take(&mut node.children);
        node.focus = None;
        if node.resizable.is_some() {
            node.resizable = Some(group);
        }
        for &child in children.iter().rev() {
            self.nodes[child].parent = None;
            self.drop_subtree(child);
        }
        debug!(?group, n = children.len(), "cleared children");
    }

    /// Detach `id` from its parent (if any) and destroy it together with
    /// its entire subtree.
    pub fn destroy(&mut self, id: WidgetId) {
        if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            let at = self.find(parent, id);
            if at < self.children_len(parent) {
                self.detach_at(parent, at);
                self.init_sizes(parent);
            }
        }
        self.drop_subtree(id);
    }

    /// Unlink the child at `index` from `group`, fixing the focus index so
    /// it is never left dangling.
    fn detach_at(&mut self, group: WidgetId, index: usize) -> WidgetId {
        let node = &mut self.nodes[group];
        let id = node.children.remove(index);
        node.focus = match node.focus {
            Some(f) if f == index => None,
            Some(f) if f > index => Some(f - 1),
            other => other,
        };
        self.nodes[id].parent = None;
        id
    }

    fn drop_subtree(&mut self, id: WidgetId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.drop_subtree(child);
            }
        }
    }

    /// Is `id` equal to `ancestor`, or inside its subtree?
    pub fn contains(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cur = Some(id);
        while let Some(x) = cur {
            if x == ancestor {
                return true;
            }
            cur = self.nodes.get(x).and_then(|n| n.parent);
        }
        false
    }

    /// Access a node. Stale identifiers yield `None`.
    pub fn node(&self, id: WidgetId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The widget behavior object of a node, downcast to a concrete type.
    pub fn widget_as<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        let w: &dyn std::any::Any = self.nodes.get(id)?.widget();
        w.downcast_ref()
    }

    /// The child at `index`, if in range.
    pub fn child(&self, group: WidgetId, index: usize) -> Option<WidgetId> {
        self.nodes.get(group)?.children.get(index).copied()
    }

    /// Number of children of `group`.
    pub fn children_len(&self, group: WidgetId) -> usize {
        self.nodes.get(group).map_or(0, |n| n.children.len())
    }

    /// The parent of `id`, if attached.
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Bounds of `id` relative to its parent's origin.
    pub fn rect(&self, id: WidgetId) -> Rect {
        self.nodes.get(id).map_or_else(Rect::default, |n| n.rect)
    }

    pub(crate) fn takes_events(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(Node::takes_events)
    }

    /// Show or hide a node.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.visible = visible;
        }
    }

    /// Activate or deactivate a node.
    pub fn set_active(&mut self, id: WidgetId, active: bool) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.active = active;
        }
    }

    /// Set or clear a node's label.
    pub fn set_label(&mut self, id: WidgetId, label: Option<Label>) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.label = label;
        }
    }

    /// Designate the child (or the group itself) that absorbs size changes
    /// during layout. `None` restores the default: no distribution, children
    /// keep their positions when the group resizes.
    pub fn set_resizable(&mut self, group: WidgetId, target: Option<WidgetId>) {
        if let Some(n) = self.nodes.get_mut(group) {
            n.resizable = target;
        }
    }

    /// The current resizable designation of `group`.
    pub fn resizable(&self, group: WidgetId) -> Option<WidgetId> {
        self.nodes.get(group).and_then(|n| n.resizable)
    }

    /// Move and resize a node. A size change invalidates the node's layout
    /// snapshot; the next layout pass rebuilds it and distributes the
    /// difference.
    pub fn resize(&mut self, id: WidgetId, rect: Rect) {
        let Some(n) = self.nodes.get_mut(id) else {
            return;
        };
        if n.rect.w != rect.w || n.rect.h != rect.h {
            n.sizes = None;
        }
        n.rect = rect;
    }

    /// Pending damage on a node.
    pub fn damage(&self, id: WidgetId) -> Damage {
        self.nodes.get(id).map_or(Damage::empty(), |n| n.damage)
    }

    /// Mark a node fully damaged and note child damage on each ancestor so
    /// the next draw pass descends to it.
    pub fn redraw(&mut self, id: WidgetId) {
        self.add_damage(id, Damage::ALL);
    }

    /// Mark a node's outside label damaged.
    pub fn redraw_label(&mut self, id: WidgetId) {
        self.add_damage(id, Damage::CHILD_LABEL);
    }

    /// Merge damage bits into a node, propagating `CHILD` up its ancestors.
    pub fn add_damage(&mut self, id: WidgetId, damage: Damage) {
        let Some(n) = self.nodes.get_mut(id) else {
            return;
        };
        n.damage |= damage;
        let mut cur = n.parent;
        while let Some(p) = cur {
            let node = &mut self.nodes[p];
            if node.damage.contains(Damage::CHILD) {
                break;
            }
            node.damage |= Damage::CHILD;
            cur = node.parent;
        }
    }

    /// Clear all damage on a node.
    pub fn clear_damage(&mut self, id: WidgetId) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.damage = Damage::empty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutils::Leaf;

    fn tree_with_group() -> (Tree, WidgetId) {
        let mut tree = Tree::new();
        let root = tree.new_window(Leaf::named("root"), Rect::new(0, 0, 100, 100));
        (tree, root)
    }

    #[test]
    fn add_and_remove_shifts() {
        let (mut tree, root) = tree_with_group();
        let ids: Vec<_> = (0..4)
            .map(|i| tree.add(root, Leaf::named("c"), Rect::new(i * 10, 0, 10, 10)))
            .collect();
        assert_eq!(tree.children_len(root), 4);

        tree.remove_at(root, 1);
        assert_eq!(tree.children_len(root), 3);
        assert_eq!(tree.child(root, 0), Some(ids[0]));
        assert_eq!(tree.child(root, 1), Some(ids[2]));
        assert_eq!(tree.child(root, 2), Some(ids[3]));
        // The detached widget is still alive, just unowned.
        assert_eq!(tree.parent(ids[1]), None);
        assert!(tree.node(ids[1]).is_some());
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let (mut tree, root) = tree_with_group();
        tree.add(root, Leaf::named("c"), Rect::new(0, 0, 10, 10));
        assert_eq!(tree.remove_at(root, 5), None);
        assert_eq!(tree.children_len(root), 1);
    }

    #[test]
    fn insert_positions() {
        let (mut tree, root) = tree_with_group();
        let a = tree.add(root, Leaf::named("a"), Rect::new(0, 0, 10, 10));
        let b = tree.add(root, Leaf::named("b"), Rect::new(10, 0, 10, 10));
        let c = tree.insert(root, Leaf::named("c"), Rect::new(20, 0, 10, 10), 1);
        assert_eq!(tree.child(root, 0), Some(a));
        assert_eq!(tree.child(root, 1), Some(c));
        assert_eq!(tree.child(root, 2), Some(b));
    }

    #[test]
    fn reparent_moves_ownership() {
        let (mut tree, root) = tree_with_group();
        let ga = tree.add(root, Leaf::named("ga"), Rect::new(0, 0, 50, 100));
        let gb = tree.add(root, Leaf::named("gb"), Rect::new(50, 0, 50, 100));
        let w = tree.add(ga, Leaf::named("w"), Rect::new(0, 0, 10, 10));
        assert_eq!(tree.children_len(ga), 1);

        tree.attach(gb, w, 0);
        assert_eq!(tree.children_len(ga), 0);
        assert_eq!(tree.children_len(gb), 1);
        assert_eq!(tree.parent(w), Some(gb));
    }

    #[test]
    fn reparent_within_group_adjusts_index() {
        let (mut tree, root) = tree_with_group();
        let a = tree.add(root, Leaf::named("a"), Rect::new(0, 0, 10, 10));
        let b = tree.add(root, Leaf::named("b"), Rect::new(10, 0, 10, 10));
        let c = tree.add(root, Leaf::named("c"), Rect::new(20, 0, 10, 10));

        // Move a to the end: the removal shifts the target index back.
        tree.attach(root, a, 3);
        assert_eq!(tree.child(root, 0), Some(b));
        assert_eq!(tree.child(root, 1), Some(c));
        assert_eq!(tree.child(root, 2), Some(a));
        assert_eq!(tree.children_len(root), 3);

        // Moving a widget onto its own slot changes nothing.
        tree.attach(root, b, 0);
        assert_eq!(tree.child(root, 0), Some(b));
        assert_eq!(tree.children_len(root), 3);
    }

    #[test]
    fn find_walks_ancestry() {
        let (mut tree, root) = tree_with_group();
        let ga = tree.add(root, Leaf::named("ga"), Rect::new(0, 0, 50, 100));
        let w = tree.add(ga, Leaf::named("w"), Rect::new(0, 0, 10, 10));
        let other = tree.new_detached(Leaf::named("other"), Rect::new(0, 0, 10, 10));

        // Direct child.
        assert_eq!(tree.find(root, ga), 0);
        // Grandchild resolves to the child that contains it.
        assert_eq!(tree.find(root, w), 0);
        // Unrelated widgets return the one-past-end sentinel.
        assert_eq!(tree.find(root, other), tree.children_len(root));
    }

    #[test]
    fn find_matches_identity_not_likeness() {
        let (mut tree, root) = tree_with_group();
        // Two identical-looking leaves at different indices.
        let _a = tree.add(root, Leaf::named("twin"), Rect::new(0, 0, 10, 10));
        let b = tree.add(root, Leaf::named("twin"), Rect::new(0, 0, 10, 10));
        assert_eq!(tree.find(root, b), 1);
    }

    #[test]
    fn replace_swaps_slot() {
        let (mut tree, root) = tree_with_group();
        let a = tree.add(root, Leaf::named("a"), Rect::new(0, 0, 10, 10));
        let b = tree.add(root, Leaf::named("b"), Rect::new(10, 0, 10, 10));

        let r = tree.replace(root, 0, Leaf::named("r"), Rect::new(0, 0, 10, 10));
        assert_eq!(tree.children_len(root), 2);
        assert_eq!(tree.child(root, 0), Some(r));
        assert_eq!(tree.child(root, 1), Some(b));
        assert_eq!(tree.parent(a), None);

        // Out of range degrades to append.
        let t = tree.replace(root, 9, Leaf::named("t"), Rect::new(0, 0, 5, 5));
        assert_eq!(tree.children_len(root), 3);
        assert_eq!(tree.child(root, 2), Some(t));
    }

    #[test]
    fn clear_twice_is_safe() {
        let (mut tree, root) = tree_with_group();
        let a = tree.add(root, Leaf::named("a"), Rect::new(0, 0, 10, 10));
        tree.add(a, Leaf::named("nested"), Rect::new(0, 0, 5, 5));
        tree.set_resizable(root, Some(a));

        tree.clear(root);
        assert_eq!(tree.children_len(root), 0);
        assert!(tree.node(a).is_none());
        assert_eq!(tree.node(root).unwrap().focus_index(), None);
        // The resizable designation falls back to the group itself.
        assert_eq!(tree.resizable(root), Some(root));

        tree.clear(root);
        assert_eq!(tree.children_len(root), 0);
    }

    #[test]
    fn focus_index_never_dangles() {
        let (mut tree, root) = tree_with_group();
        for i in 0..3 {
            tree.add(root, Leaf::named("c"), Rect::new(i * 10, 0, 10, 10));
        }
        tree.nodes[root].focus = Some(2);

        tree.remove_at(root, 0);
        assert_eq!(tree.node(root).unwrap().focus_index(), Some(1));
        tree.remove_at(root, 1);
        assert_eq!(tree.node(root).unwrap().focus_index(), None);
    }

    #[test]
    fn damage_propagates_child_bit() {
        let (mut tree, root) = tree_with_group();
        let ga = tree.add(root, Leaf::named("ga"), Rect::new(0, 0, 50, 100));
        let w = tree.add(ga, Leaf::named("w"), Rect::new(0, 0, 10, 10));
        tree.clear_damage(root);
        tree.clear_damage(ga);
        tree.clear_damage(w);

        tree.redraw(w);
        assert_eq!(tree.damage(w), Damage::ALL);
        assert_eq!(tree.damage(ga), Damage::CHILD);
        assert_eq!(tree.damage(root), Damage::CHILD);
    }

    #[test]
    fn destroy_removes_subtree() {
        let (mut tree, root) = tree_with_group();
        let ga = tree.add(root, Leaf::named("ga"), Rect::new(0, 0, 50, 100));
        let w = tree.add(ga, Leaf::named("w"), Rect::new(0, 0, 10, 10));

        tree.destroy(ga);
        assert_eq!(tree.children_len(root), 0);
        assert!(tree.node(ga).is_none());
        assert!(tree.node(w).is_none());
    }
}
