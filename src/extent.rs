//! Axis-aligned extents in map coordinates.
//!
//! An empty extent has inverted infinite bounds; extending it with any
//! point produces that point's bounding box.

use glam::DVec2;

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: DVec2,
    pub max: DVec2,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x, min_y),
            max: DVec2::new(max_x, max_y),
        }
    }

    /// The empty extent: contains nothing, intersects nothing.
    pub fn empty() -> Self {
        Self {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[DVec2]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min = points[0];
        let mut max = points[0];

        for &point in points.iter().skip(1) {
            min = min.min(point);
            max = max.max(point);
        }

        Some(Self { min, max })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Grow to cover `other` as well.
    pub fn extend(&mut self, other: &Extent) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn extend_point(&mut self, point: DVec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// True iff `other` lies entirely inside this extent.
    pub fn contains(&self, other: &Extent) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// A copy grown by `dx`/`dy` on each side.
    pub fn buffered(&self, dx: f64, dy: f64) -> Extent {
        Extent {
            min: self.min - DVec2::new(dx, dy),
            max: self.max + DVec2::new(dx, dy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_covers_all() {
        let points = vec![
            DVec2::new(1.0, 2.0),
            DVec2::new(-1.0, 3.0),
            DVec2::new(2.0, -1.0),
        ];

        let extent = Extent::from_points(&points).unwrap();
        assert_eq!(extent.min, DVec2::new(-1.0, -1.0));
        assert_eq!(extent.max, DVec2::new(2.0, 3.0));
        assert_eq!(extent.center(), DVec2::new(0.5, 1.0));
        assert_eq!(extent.width(), 3.0);
        assert_eq!(extent.height(), 4.0);
    }

    #[test]
    fn intersection() {
        let a = Extent::new(0.0, 0.0, 2.0, 2.0);
        let b = Extent::new(1.0, 1.0, 3.0, 3.0);
        let c = Extent::new(3.0, 3.0, 4.0, 4.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn containment() {
        let outer = Extent::new(0.0, 0.0, 10.0, 10.0);
        let inner = Extent::new(2.0, 2.0, 8.0, 8.0);
        let straddling = Extent::new(8.0, 8.0, 12.0, 12.0);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&straddling));
    }

    #[test]
    fn empty_extent_behavior() {
        let empty = Extent::empty();
        let unit = Extent::new(0.0, 0.0, 1.0, 1.0);

        assert!(empty.is_empty());
        assert!(!empty.intersects(&unit));
        assert!(!empty.contains(&unit));

        let mut grown = Extent::empty();
        grown.extend_point(DVec2::new(3.0, 4.0));
        assert!(!grown.is_empty());
        assert_eq!(grown.min, DVec2::new(3.0, 4.0));
        assert_eq!(grown.max, DVec2::new(3.0, 4.0));

        let mut target = Extent::new(0.0, 0.0, 1.0, 1.0);
        target.extend(&Extent::empty());
        assert_eq!(target, unit);
    }

    #[test]
    fn buffered_grows_symmetrically() {
        let extent = Extent::new(0.0, 0.0, 4.0, 2.0);
        let padded = extent.buffered(1.0, 0.5);
        assert_eq!(padded, Extent::new(-1.0, -0.5, 5.0, 2.5));
    }
}
