use crate::Rect;

/// A clip region: a set of pairwise-disjoint rectangles. Supports the
/// operations drawing devices need for clip state: intersection with a
/// rectangle, subtraction of a rectangle, and visibility queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// A region covering a single rectangle.
    pub fn rect(r: Rect) -> Self {
        if r.is_empty() {
            Self::empty()
        } else {
            Self { rects: vec![r] }
        }
    }

    /// A region covering nothing.
    pub fn empty() -> Self {
        Self { rects: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The rectangles making up this region.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Restrict the region to the part overlapping `r`.
    pub fn intersect(&mut self, r: Rect) {
        self.rects = self
            .rects
            .iter()
            .filter_map(|x| x.intersect(&r))
            .collect();
    }

    /// Remove the area of `r` from the region. Each covered rectangle is
    /// split into at most four fragments around the hole.
    pub fn subtract(&mut self, r: Rect) {
        if r.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.rects.len());
        for &x in &self.rects {
            let Some(hole) = x.intersect(&r) else {
                out.push(x);
                continue;
            };
            // Band above and below the hole, full width.
            if hole.y > x.y {
                out.push(Rect::new(x.x, x.y, x.w, hole.y - x.y));
            }
            if hole.bottom() < x.bottom() {
                out.push(Rect::new(x.x, hole.bottom(), x.w, x.bottom() - hole.bottom()));
            }
            // Bands left and right, limited to the hole's rows.
            if hole.x > x.x {
                out.push(Rect::new(x.x, hole.y, hole.x - x.x, hole.h));
            }
            if hole.right() < x.right() {
                out.push(Rect::new(hole.right(), hole.y, x.right() - hole.right(), hole.h));
            }
        }
        self.rects = out;
    }

    /// Does any part of `r` fall inside the region?
    pub fn intersects(&self, r: Rect) -> bool {
        self.rects.iter().any(|x| x.intersect(&r).is_some())
    }

    /// The bounding box of the visible part of `r`, or `None` if `r` is
    /// entirely clipped away.
    pub fn clip_box(&self, r: Rect) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for x in &self.rects {
            if let Some(v) = x.intersect(&r) {
                acc = Some(match acc {
                    None => v,
                    Some(a) => {
                        let nx = a.x.min(v.x);
                        let ny = a.y.min(v.y);
                        Rect::new(
                            nx,
                            ny,
                            a.right().max(v.right()) - nx,
                            a.bottom().max(v.bottom()) - ny,
                        )
                    }
                });
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(region: &Region) -> i32 {
        region.rects().iter().map(|r| r.w * r.h).sum()
    }

    #[test]
    fn subtract_center() {
        let mut region = Region::rect(Rect::new(0, 0, 10, 10));
        region.subtract(Rect::new(2, 2, 4, 4));
        assert_eq!(region.rects().len(), 4);
        assert_eq!(area(&region), 100 - 16);
        assert!(!region.intersects(Rect::new(3, 3, 1, 1)));
        assert!(region.intersects(Rect::new(0, 0, 1, 1)));
    }

    #[test]
    fn subtract_disjoint_is_noop() {
        let mut region = Region::rect(Rect::new(0, 0, 10, 10));
        region.subtract(Rect::new(20, 20, 5, 5));
        assert_eq!(region.rects().len(), 1);
        assert_eq!(area(&region), 100);
    }

    #[test]
    fn subtract_all() {
        let mut region = Region::rect(Rect::new(2, 2, 4, 4));
        region.subtract(Rect::new(0, 0, 10, 10));
        assert!(region.is_empty());
    }

    #[test]
    fn intersect_narrows() {
        let mut region = Region::rect(Rect::new(0, 0, 10, 10));
        region.intersect(Rect::new(5, 5, 10, 10));
        assert_eq!(region.rects(), &[Rect::new(5, 5, 5, 5)]);
        region.intersect(Rect::new(20, 20, 5, 5));
        assert!(region.is_empty());
    }

    #[test]
    fn clip_box_bounds() {
        let mut region = Region::rect(Rect::new(0, 0, 10, 10));
        region.subtract(Rect::new(4, 0, 2, 10));
        // The visible parts of a spanning rect bound to the full span.
        assert_eq!(
            region.clip_box(Rect::new(2, 2, 6, 2)),
            Some(Rect::new(2, 2, 6, 2))
        );
        // A rect inside the hole is fully clipped.
        assert_eq!(region.clip_box(Rect::new(4, 2, 2, 2)), None);
    }
}
