//! Damage-driven drawing: the forwarding layer over the current device and
//! the container draw walk.

use geom::{Point, Rect};

use crate::{
    context::Ui,
    device::{Color, Device, Font},
    tree::{Tree, WidgetId},
    widget::{Align, Damage},
};

/// The thin layer widgets draw through. It owns the ambient drawing origin
/// and forwards every primitive to the current device with the origin
/// applied, so the same widget code renders to screen, paper, or file.
pub struct Graphics<'a> {
    device: &'a mut dyn Device,
    origin: Point,
}

impl<'a> Graphics<'a> {
    /// Wrap a device with the origin at zero.
    pub fn new(device: &'a mut dyn Device) -> Self {
        Self {
            device,
            origin: Point::zero(),
        }
    }

    /// Run `f` with the drawing origin shifted by `(dx, dy)`. The origin is
    /// restored on every exit path.
    pub fn translated<R>(&mut self, dx: i32, dy: i32, f: impl FnOnce(&mut Self) -> R) -> R {
        self.origin.x += dx;
        self.origin.y += dy;
        let mut guard = scopeguard::guard(self, move |g| {
            g.origin.x -= dx;
            g.origin.y -= dy;
        });
        f(&mut guard)
    }

    fn at(&self, p: Point) -> Point {
        p + self.origin
    }

    fn rect_at(&self, r: Rect) -> Rect {
        r.translate(self.origin.x, self.origin.y)
    }

    /// Set the drawing color.
    pub fn color(&mut self, c: Color) {
        self.device.color(c);
    }

    /// Set the font for subsequent text.
    pub fn font(&mut self, face: Font, size: i32) {
        self.device.font(face, size);
    }

    /// Stroke a rectangle outline.
    pub fn rect(&mut self, r: Rect) {
        let r = self.rect_at(r);
        self.device.rect(r);
    }

    /// Fill a rectangle.
    pub fn rect_fill(&mut self, r: Rect) {
        let r = self.rect_at(r);
        self.device.rect_fill(r);
    }

    /// Set the stroke style and width for subsequent lines.
    pub fn line_style(&mut self, style: crate::device::LineStyle, width: i32) {
        self.device.line_style(style, width);
    }

    /// Plot a single point.
    pub fn point(&mut self, p: Point) {
        let p = self.at(p);
        self.device.point(p);
    }

    /// Stroke a line segment.
    pub fn line(&mut self, a: Point, b: Point) {
        let (a, b) = (self.at(a), self.at(b));
        self.device.line(a, b);
    }

    /// Stroke a horizontal line from `p` to column `x1`.
    pub fn xyline(&mut self, p: Point, x1: i32) {
        let p = self.at(p);
        self.device.xyline(p, x1 + self.origin.x);
    }

    /// Stroke a vertical line from `p` to row `y1`.
    pub fn yxline(&mut self, p: Point, y1: i32) {
        let p = self.at(p);
        self.device.yxline(p, y1 + self.origin.y);
    }

    /// Begin collecting vertices for a path of the given kind.
    pub fn begin_path(&mut self, kind: crate::device::PathKind) {
        self.device.begin_path(kind);
    }

    /// Add a vertex to the open path.
    pub fn vertex(&mut self, x: f64, y: f64) {
        self.device
            .vertex(x + f64::from(self.origin.x), y + f64::from(self.origin.y));
    }

    /// Finish and emit the open path.
    pub fn end_path(&mut self) {
        self.device.end_path();
    }

    /// Stroke a circle outline.
    pub fn circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.device.circle(
            cx + f64::from(self.origin.x),
            cy + f64::from(self.origin.y),
            radius,
        );
    }

    /// Stroke an elliptical arc inscribed in `r`.
    pub fn arc(&mut self, r: Rect, a1: f64, a2: f64) {
        let r = self.rect_at(r);
        self.device.arc(r, a1, a2);
    }

    /// Fill a pie slice of the ellipse inscribed in `r`.
    pub fn pie(&mut self, r: Rect, a1: f64, a2: f64) {
        let r = self.rect_at(r);
        self.device.pie(r, a1, a2);
    }

    /// Draw text with its baseline origin at `p`.
    pub fn text(&mut self, s: &str, p: Point) {
        let p = self.at(p);
        self.device.text(s, p);
    }

    /// Advance width of `s` in the current font.
    pub fn text_width(&self, s: &str) -> i32 {
        self.device.text_width(s)
    }

    /// Line height of the current font.
    pub fn text_height(&self) -> i32 {
        self.device.text_height()
    }

    /// Blit an image with its top-left corner at `p`.
    pub fn draw_image(&mut self, img: &image::RgbaImage, p: Point) {
        let p = self.at(p);
        self.device.draw_image(img, p);
    }

    /// Intersect the clip state with `r` and push it.
    pub fn push_clip(&mut self, r: Rect) {
        let r = self.rect_at(r);
        self.device.push_clip(r);
    }

    /// Push a clip state that does not clip at all.
    pub fn push_no_clip(&mut self) {
        self.device.push_no_clip();
    }

    /// Restore the previous clip state.
    pub fn pop_clip(&mut self) {
        self.device.pop_clip();
    }

    /// Subtract `r` from the current clip state.
    pub fn clip_out(&mut self, r: Rect) {
        let r = self.rect_at(r);
        self.device.clip_out(r);
    }

    /// Would any part of `r` survive the current clip?
    pub fn not_clipped(&self, r: Rect) -> bool {
        let r = self.rect_at(r);
        self.device.not_clipped(r)
    }

    /// The visible bounding box of `r` under the current clip, in local
    /// coordinates.
    pub fn clip_box(&self, r: Rect) -> Option<Rect> {
        let abs = self.rect_at(r);
        self.device
            .clip_box(abs)
            .map(|v| v.translate(-self.origin.x, -self.origin.y))
    }
}

impl Tree {
    /// Draw `id` and its damaged subtree against the current device in
    /// `ui`.
    pub fn draw(&mut self, id: WidgetId, ui: &mut Ui) {
        let mut g = Graphics::new(ui.device());
        self.draw_node(id, &mut g);
        self.clear_damage(id);
    }

    /// Draw `id` against an explicit device, bypassing the current-device
    /// pointer. Used by print drivers.
    pub fn draw_on(&mut self, id: WidgetId, device: &mut dyn Device) {
        let mut g = Graphics::new(device);
        self.draw_node(id, &mut g);
        self.clear_damage(id);
    }

    /// The two-path damage walk.
    ///
    /// Structural or own damage forces a full repaint: clip to own bounds,
    /// then draw children front to back. Each child clips out the area it
    /// covered, so later-added children end up on top and the box fills
    /// what remains. The box and inside label follow, the clip is popped,
    /// and finally every child's outside label draws unclipped (labels may
    /// overlap siblings intentionally).
    ///
    /// When only children carry damage, skip all clipping for speed and
    /// redraw just the damaged children (and their flagged labels). Output
    /// may differ where siblings overlap.
    fn draw_node(&mut self, id: WidgetId, g: &mut Graphics<'_>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let rect = node.rect;
        let children = node.children.clone();

        if node.damage.beyond_children() {
            g.push_clip(rect.at_origin());
            for &child in children.iter().rev() {
                self.draw_child(child, g);
            }
            if let Some(n) = self.nodes.get(id) {
                n.widget.draw(rect.at_origin(), g);
            }
            self.draw_inside_label(id, g);
            g.pop_clip();
            for &child in &children {
                self.draw_outside_label(id, child, g);
            }
        } else {
            for &child in &children {
                if self.damage(child).contains(Damage::CHILD_LABEL) {
                    self.draw_outside_label(id, child, g);
                    if let Some(n) = self.nodes.get_mut(child) {
                        n.damage.remove(Damage::CHILD_LABEL);
                    }
                }
                self.update_child(child, g);
            }
        }
    }

    /// Full redraw of one child on the repaint path: force its damage,
    /// draw it at its offset, then clip out the area it covered so earlier
    /// siblings and the box cannot paint over it.
    fn draw_child(&mut self, child: WidgetId, g: &mut Graphics<'_>) {
        let Some(node) = self.nodes.get(child) else {
            return;
        };
        if !node.visible() || node.window() {
            return;
        }
        let r = node.rect;
        if !g.not_clipped(r) {
            return;
        }
        self.nodes[child].damage = Damage::ALL;
        g.translated(r.x, r.y, |g| {
            self.draw_node(child, g);
            g.clip_out(r.at_origin());
        });
        self.clear_damage(child);
    }

    /// Redraw one child in response to its own damage, without touching
    /// the clip state.
    fn update_child(&mut self, child: WidgetId, g: &mut Graphics<'_>) {
        let Some(node) = self.nodes.get(child) else {
            return;
        };
        if node.damage.is_empty() || !node.visible() || node.window() {
            return;
        }
        let r = node.rect;
        if !g.not_clipped(r) {
            return;
        }
        g.translated(r.x, r.y, |g| self.draw_node(child, g));
        self.clear_damage(child);
    }

    fn draw_inside_label(&self, id: WidgetId, g: &mut Graphics<'_>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let Some(label) = node.label() else {
            return;
        };
        if label.align.is_outside() {
            return;
        }
        let r = node.rect;
        let w = g.text_width(&label.text);
        let h = g.text_height();
        g.text(&label.text, Point::new((r.w - w) / 2, (r.h + h) / 2));
    }

    /// Draw a child's outside label into the box its alignment carves out
    /// of this container, flipping the alignment so the text sits against
    /// the child's edge.
    fn draw_outside_label(&self, id: WidgetId, child: WidgetId, g: &mut Graphics<'_>) {
        let Some(container) = self.nodes.get(id) else {
            return;
        };
        let Some(node) = self.nodes.get(child) else {
            return;
        };
        if !node.visible() {
            return;
        }
        let Some(label) = node.label() else {
            return;
        };
        if !label.align.is_outside() {
            return;
        }
        let r = node.rect;
        let own = container.rect;
        let align = label.align;
        let area = if align.contains(Align::TOP) {
            Rect::new(r.x, 0, r.w, r.y)
        } else if align.contains(Align::BOTTOM) {
            Rect::new(r.x, r.bottom(), r.w, own.h - r.bottom())
        } else if align.contains(Align::LEFT) {
            Rect::new(0, r.y, r.x - 3, r.h)
        } else {
            let x = r.right() + 3;
            Rect::new(x, r.y, own.w - x, r.h)
        };

        let w = g.text_width(&label.text);
        let h = g.text_height();
        let p = if align.contains(Align::TOP) {
            // Anchored to the bottom of the strip above the child.
            Point::new(area.x + (area.w - w) / 2, area.bottom() - 2)
        } else if align.contains(Align::BOTTOM) {
            Point::new(area.x + (area.w - w) / 2, area.y + h)
        } else if align.contains(Align::LEFT) {
            Point::new(area.right() - w, area.y + (area.h + h) / 2)
        } else {
            Point::new(area.x, area.y + (area.h + h) / 2)
        };
        g.text(&label.text, p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        tutils::{Capture, Leaf},
        widget::Label,
    };

    fn painted() -> (Tree, WidgetId, WidgetId, WidgetId) {
        let mut tree = Tree::new();
        let root = tree.new_window(Leaf::named("root"), Rect::new(0, 0, 100, 50));
        let under = tree.add(root, Leaf::named("under"), Rect::new(10, 10, 30, 30));
        let over = tree.add(root, Leaf::named("over"), Rect::new(20, 10, 30, 30));
        (tree, root, under, over)
    }

    #[test]
    fn full_repaint_order() {
        let (mut tree, root, _under, _over) = painted();
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);

        let ops = cap.ops().to_vec();
        assert_eq!(ops[0], "push_clip 0,0 100x50");
        // The topmost (last-added) child draws first and clips itself out.
        let over_fill = ops.iter().position(|o| o == "fill 20,10 30x30").unwrap();
        let over_out = ops.iter().position(|o| o == "clip_out 20,10 30x30").unwrap();
        let under_fill = ops.iter().position(|o| o == "fill 10,10 30x30").unwrap();
        let box_fill = ops.iter().position(|o| o == "fill 0,0 100x50").unwrap();
        assert!(over_fill < over_out);
        assert!(over_out < under_fill);
        assert!(under_fill < box_fill);
        assert_eq!(ops.last().unwrap(), "pop_clip");
    }

    #[test]
    fn damage_cleared_after_draw() {
        let (mut tree, root, under, over) = painted();
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);
        assert_eq!(tree.damage(root), Damage::empty());
        assert_eq!(tree.damage(under), Damage::empty());
        assert_eq!(tree.damage(over), Damage::empty());
    }

    #[test]
    fn fast_path_draws_only_damaged_children() {
        let (mut tree, root, under, _over) = painted();
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);

        tree.redraw(under);
        assert_eq!(tree.damage(root), Damage::CHILD);
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);

        let ops = cap.ops();
        // No container-level clip, no box repaint, no sibling repaint.
        assert!(ops.iter().any(|o| o == "fill 10,10 30x30"));
        assert!(!ops.iter().any(|o| o == "push_clip 0,0 100x50"));
        assert!(!ops.iter().any(|o| o == "fill 0,0 100x50"));
        assert!(!ops.iter().any(|o| o == "fill 20,10 30x30"));
    }

    #[test]
    fn windows_and_hidden_children_are_skipped() {
        let (mut tree, root, under, over) = painted();
        tree.set_visible(under, false);
        tree.nodes[over].window = true;
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);

        let ops = cap.ops();
        assert!(!ops.iter().any(|o| o == "fill 10,10 30x30"));
        assert!(!ops.iter().any(|o| o == "fill 20,10 30x30"));
        assert!(ops.iter().any(|o| o == "fill 0,0 100x50"));
    }

    #[test]
    fn outside_label_fast_path() {
        let (mut tree, root, under, _over) = painted();
        tree.set_label(under, Some(Label::new("lbl", Align::TOP)));
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);

        tree.redraw_label(under);
        tree.redraw(under);
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);
        let ops = cap.ops();
        let label = ops.iter().position(|o| o.starts_with("text lbl")).unwrap();
        let fill = ops.iter().position(|o| o == "fill 10,10 30x30").unwrap();
        assert!(label < fill);
        assert_eq!(tree.damage(under), Damage::empty());
    }

    #[test]
    fn full_path_draws_labels_after_clip_pop() {
        let (mut tree, root, under, _over) = painted();
        tree.set_label(under, Some(Label::new("lbl", Align::TOP)));
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);
        let ops = cap.ops();
        let pop = ops.iter().rposition(|o| o == "pop_clip").unwrap();
        let label = ops.iter().position(|o| o.starts_with("text lbl")).unwrap();
        assert!(label > pop);
    }

    #[test]
    fn add_then_remove_restores_draw_output() {
        let (mut tree, root, _under, _over) = painted();
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);
        let baseline = cap.ops().to_vec();

        let extra = tree.add(root, Leaf::named("extra"), Rect::new(60, 10, 20, 20));
        tree.remove(root, extra);

        tree.redraw(root);
        let mut cap = Capture::new(Rect::new(0, 0, 100, 50));
        tree.draw_on(root, &mut cap);
        assert_eq!(cap.ops(), baseline.as_slice());
    }

    #[test]
    fn origin_translation_restores_on_exit() {
        let mut cap = crate::device::NullDevice;
        let mut g = Graphics::new(&mut cap);
        g.translated(10, 20, |g| {
            g.translated(1, 2, |_| {});
            assert_eq!(g.origin, Point::new(10, 20));
        });
        assert_eq!(g.origin, Point::zero());
    }
}
