//! Flat-coordinate geometry for the vector replay engine.
//!
//! Geometries store their coordinates as one interleaved array with a
//! stride, the layout the batch builders consume directly. The kind tag
//! drives draw dispatch; part/ring boundaries live in `ends`.

use crate::extent::Extent;
use glam::DVec2;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    Circle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    kind: GeometryKind,
    flat_coordinates: Vec<f64>,
    stride: usize,
    /// End offsets (in flat-coordinate units) of each part or ring.
    /// Empty for point kinds.
    ends: Vec<usize>,
}

impl Geometry {
    pub fn point(position: DVec2) -> Self {
        Self {
            kind: GeometryKind::Point,
            flat_coordinates: vec![position.x, position.y],
            stride: 2,
            ends: Vec::new(),
        }
    }

    pub fn multi_point(positions: &[DVec2]) -> Self {
        Self {
            kind: GeometryKind::MultiPoint,
            flat_coordinates: flatten(positions),
            stride: 2,
            ends: Vec::new(),
        }
    }

    pub fn line_string(path: &[DVec2]) -> Self {
        let flat_coordinates = flatten(path);
        let ends = vec![flat_coordinates.len()];
        Self {
            kind: GeometryKind::LineString,
            flat_coordinates,
            stride: 2,
            ends,
        }
    }

    pub fn multi_line_string(paths: &[Vec<DVec2>]) -> Self {
        let mut flat_coordinates = Vec::new();
        let mut ends = Vec::with_capacity(paths.len());
        for path in paths {
            flat_coordinates.extend(flatten(path));
            ends.push(flat_coordinates.len());
        }
        Self {
            kind: GeometryKind::MultiLineString,
            flat_coordinates,
            stride: 2,
            ends,
        }
    }

    pub fn polygon(exterior: &[DVec2]) -> Self {
        let flat_coordinates = flatten(exterior);
        let ends = vec![flat_coordinates.len()];
        Self {
            kind: GeometryKind::Polygon,
            flat_coordinates,
            stride: 2,
            ends,
        }
    }

    /// Circle stored as center plus one point on the circumference.
    pub fn circle(center: DVec2, radius: f64) -> Self {
        Self {
            kind: GeometryKind::Circle,
            flat_coordinates: vec![center.x, center.y, center.x + radius, center.y],
            stride: 2,
            ends: Vec::new(),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn flat_coordinates(&self) -> &[f64] {
        &self.flat_coordinates
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Bounding box over every stored coordinate.
    pub fn extent(&self) -> Extent {
        let mut extent = Extent::empty();
        let mut i = 0;
        while i + 1 < self.flat_coordinates.len() {
            extent.extend_point(DVec2::new(
                self.flat_coordinates[i],
                self.flat_coordinates[i + 1],
            ));
            i += self.stride;
        }
        extent
    }

    /// Simplified copy for rendering at a given squared tolerance.
    ///
    /// Point kinds are returned unchanged. Line kinds get a radial
    /// distance pass per part, dropping vertices closer than the
    /// tolerance to the last kept vertex; first and last vertex of every
    /// part survive. Area kinds are returned unchanged here and are the
    /// seam for ring-aware simplification.
    pub fn simplified(&self, squared_tolerance: f64) -> Cow<'_, Geometry> {
        match self.kind {
            GeometryKind::LineString | GeometryKind::MultiLineString => {
                let mut flat = Vec::with_capacity(self.flat_coordinates.len());
                let mut ends = Vec::with_capacity(self.ends.len());
                let mut offset = 0;
                for &end in &self.ends {
                    radial_distance(
                        &self.flat_coordinates,
                        offset,
                        end,
                        self.stride,
                        squared_tolerance,
                        &mut flat,
                    );
                    ends.push(flat.len());
                    offset = end;
                }
                if flat.len() == self.flat_coordinates.len() {
                    return Cow::Borrowed(self);
                }
                Cow::Owned(Geometry {
                    kind: self.kind,
                    flat_coordinates: flat,
                    stride: 2,
                    ends,
                })
            }
            _ => Cow::Borrowed(self),
        }
    }
}

fn flatten(positions: &[DVec2]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(positions.len() * 2);
    for position in positions {
        flat.push(position.x);
        flat.push(position.y);
    }
    flat
}

/// Radial distance simplification of one part of a flat-coordinate array.
fn radial_distance(
    flat_coordinates: &[f64],
    offset: usize,
    end: usize,
    stride: usize,
    squared_tolerance: f64,
    out: &mut Vec<f64>,
) {
    if offset >= end {
        return;
    }
    let mut kept = DVec2::new(flat_coordinates[offset], flat_coordinates[offset + 1]);
    out.push(kept.x);
    out.push(kept.y);

    let mut last = kept;
    let mut i = offset + stride;
    while i < end {
        let point = DVec2::new(flat_coordinates[i], flat_coordinates[i + 1]);
        if point.distance_squared(kept) > squared_tolerance {
            out.push(point.x);
            out.push(point.y);
            kept = point;
        }
        last = point;
        i += stride;
    }
    if last != kept {
        out.push(last.x);
        out.push(last.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_layout() {
        let geometry = Geometry::point(DVec2::new(3.0, -4.0));
        assert_eq!(geometry.kind(), GeometryKind::Point);
        assert_eq!(geometry.flat_coordinates(), &[3.0, -4.0]);
        assert_eq!(geometry.stride(), 2);

        let extent = geometry.extent();
        assert_eq!(extent.min, DVec2::new(3.0, -4.0));
        assert_eq!(extent.max, DVec2::new(3.0, -4.0));
    }

    #[test]
    fn multi_point_extent() {
        let geometry =
            Geometry::multi_point(&[DVec2::new(0.0, 0.0), DVec2::new(2.0, 5.0)]);
        let extent = geometry.extent();
        assert_eq!(extent.min, DVec2::new(0.0, 0.0));
        assert_eq!(extent.max, DVec2::new(2.0, 5.0));
    }

    #[test]
    fn point_simplification_is_identity() {
        let geometry = Geometry::point(DVec2::new(1.0, 2.0));
        let simplified = geometry.simplified(100.0);
        assert!(matches!(simplified, Cow::Borrowed(_)));
    }

    #[test]
    fn line_simplification_drops_close_vertices() {
        let geometry = Geometry::line_string(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(0.1, 0.0),
            DVec2::new(0.2, 0.0),
            DVec2::new(10.0, 0.0),
        ]);
        let simplified = geometry.simplified(1.0);
        // The two near-duplicates collapse; endpoints survive.
        assert_eq!(simplified.flat_coordinates(), &[0.0, 0.0, 10.0, 0.0]);
        assert_eq!(simplified.ends(), &[4]);
    }

    #[test]
    fn multi_line_simplification_is_per_part() {
        let geometry = Geometry::multi_line_string(&[
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(0.1, 0.0),
                DVec2::new(10.0, 0.0),
            ],
            vec![DVec2::new(20.0, 0.0), DVec2::new(30.0, 0.0)],
        ]);
        let simplified = geometry.simplified(1.0);
        // Part boundaries survive: the near-duplicate collapses in the
        // first part, the second part is untouched.
        assert_eq!(
            simplified.flat_coordinates(),
            &[0.0, 0.0, 10.0, 0.0, 20.0, 0.0, 30.0, 0.0]
        );
        assert_eq!(simplified.ends(), &[4, 8]);
    }

    #[test]
    fn line_simplification_keeps_spread_vertices() {
        let path = [
            DVec2::new(0.0, 0.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(10.0, 0.0),
        ];
        let geometry = Geometry::line_string(&path);
        let simplified = geometry.simplified(1.0);
        assert_eq!(simplified.flat_coordinates().len(), 6);
        assert!(matches!(simplified, Cow::Borrowed(_)));
    }
}
