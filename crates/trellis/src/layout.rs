//! Layout: boundary snapshots and delta-based resize distribution.
//!
//! A container records a snapshot of boundary quads when it first lays out:
//! its own bounds, the resizable target's bounds clipped to its own, and one
//! quad per child. When the container is later resized, each child edge is
//! remapped against the resizable span: edges at or past the span's far edge
//! shift by the full delta, edges at or before the near edge hold, and edges
//! inside the span interpolate. The snapshot is dropped on any structural
//! mutation or size change and rebuilt lazily from current positions.

use geom::{Quad, remap_span};
use tracing::trace;

use crate::tree::{Tree, WidgetId};

impl Tree {
    /// Drop the layout snapshot and re-baseline the container at its
    /// current bounds. The snapshot is rebuilt from current child positions
    /// on the next layout pass.
    pub fn init_sizes(&mut self, group: WidgetId) {
        if let Some(n) = self.nodes.get_mut(group) {
            n.sizes = None;
            n.original = n.rect;
        }
    }

    /// The boundary snapshot for `group`, building it if absent: the
    /// group's own quad at the origin, the resizable target clipped to the
    /// group, then one quad per child in child order.
    pub fn sizes(&mut self, group: WidgetId) -> &[Quad] {
        if !self.nodes.contains_key(group) {
            return &[];
        }
        let resizable = self.resizable(group);
        let node = &self.nodes[group];
        if node.sizes.is_none() {
            let own = Quad::new(0, node.original.w, 0, node.original.h);
            let mut target = own;
            if let Some(r) = resizable {
                if r != group {
                    if let Some(rn) = self.nodes.get(r) {
                        target = Quad::from(rn.rect).clip_to(&own);
                    }
                }
            }
            let mut quads = Vec::with_capacity(node.children.len() + 2);
            quads.push(own);
            quads.push(target);
            for &child in &node.children {
                quads.push(Quad::from(self.nodes[child].rect));
            }
            self.nodes[group].sizes = Some(quads);
        }
        self.nodes[group]
            .sizes
            .as_deref()
            .unwrap_or_default()
    }

    /// Lay out `group` and its subtree.
    ///
    /// Without a resizable target, or when the group's size is unchanged
    /// since the last baseline, this is a pure cascade: children keep their
    /// geometry and lay out recursively. Child windows are skipped; they lay
    /// out on their own trigger.
    ///
    /// Otherwise the size delta since the snapshot is distributed across the
    /// children's boundary quads around the resizable span, each child is
    /// resized to its remapped quad, and layout recurses into it. The
    /// current bounds then become the baseline for the next delta.
    pub fn layout(&mut self, group: WidgetId) {
        let Some(node) = self.nodes.get(group) else {
            return;
        };
        let rect = node.rect;
        let unchanged = node.original.w == rect.w && node.original.h == rect.h;
        let children: Vec<WidgetId> = node.children.clone();

        if self.resizable(group).is_none() || unchanged {
            if !self.nodes[group].window {
                for child in children {
                    self.layout(child);
                }
            }
        } else if !children.is_empty() {
            let quads = self.sizes(group).to_vec();
            let dw = rect.w - quads[0].width();
            let dh = rect.h - quads[0].height();
            let span = quads[1];
            trace!(?group, dw, dh, "distributing resize");
            for (i, child) in children.into_iter().enumerate() {
                let q = quads[i + 2];
                let left = remap_span(q.left, span.left, span.right, dw);
                let right = remap_span(q.right, span.left, span.right, dw);
                let top = remap_span(q.top, span.top, span.bottom, dh);
                let bottom = remap_span(q.bottom, span.top, span.bottom, dh);
                self.resize(child, Quad::new(left, right, top, bottom).into());
                self.layout(child);
            }
        }

        // Give the widget its own layout hook, then record the baseline.
        if let Some(n) = self.nodes.get_mut(group) {
            let r = n.rect;
            n.widget.layout(r);
            n.original = r;
        }
    }
}


#[cfg(test)]
mod remap_properties {
    use proptest::prelude::*;

    use geom::remap_span;

    proptest! {
        /// An edge never moves by more than the full delta, and order is
        /// preserved for edges on the same side of the span.
        #[test]
        fn bounded_and_monotonic(
            a in -500i32..500,
            b in -500i32..500,
            delta in 0i32..300,
        ) {
            let (lo, hi) = (0, 100);
            let (a, b) = (a.min(b), a.max(b));
            let ra = remap_span(a, lo, hi, delta);
            let rb = remap_span(b, lo, hi, delta);
            prop_assert!(ra - a >= 0 && ra - a <= delta);
            prop_assert!(rb - b >= 0 && rb - b <= delta);
            prop_assert!(ra <= rb);
        }
    }
}
