//! Projection transforms from view state to clip space.

use crate::extent::Extent;
use glam::{DMat4, DVec2, DVec3, Mat4};

/// Build the projection transform for a frame: map coordinates to clip
/// space for a viewport of `size` pixels centered on `center` at
/// `resolution` map units per pixel, rotated by `rotation` radians.
///
/// Composed as scale(2/(res*w), 2/(res*h)) * rotate(-rotation) *
/// translate(-center), so the view center lands on the clip-space origin.
pub fn view_transform(center: DVec2, resolution: f64, rotation: f64, size: [u32; 2]) -> Mat4 {
    let width = resolution * size[0] as f64;
    let height = resolution * size[1] as f64;
    let transform = DMat4::from_scale(DVec3::new(2.0 / width, 2.0 / height, 1.0))
        * DMat4::from_rotation_z(-rotation)
        * DMat4::from_translation(DVec3::new(-center.x, -center.y, 0.0));
    transform.as_mat4()
}

/// Map-coordinate extent covered by a viewport, accounting for rotation:
/// the bounding box of the four rotated viewport corners.
pub fn viewport_extent(center: DVec2, resolution: f64, rotation: f64, size: [u32; 2]) -> Extent {
    let half_width = resolution * size[0] as f64 / 2.0;
    let half_height = resolution * size[1] as f64 / 2.0;
    let (sin, cos) = rotation.sin_cos();

    let mut extent = Extent::empty();
    for corner in [
        DVec2::new(-half_width, -half_height),
        DVec2::new(half_width, -half_height),
        DVec2::new(half_width, half_height),
        DVec2::new(-half_width, half_height),
    ] {
        let rotated = DVec2::new(
            corner.x * cos - corner.y * sin,
            corner.x * sin + corner.y * cos,
        );
        extent.extend_point(center + rotated);
    }
    extent
}
