//! # Primitive Shape Generation
//!
//! All shapes are centered at the origin. Triangle shapes carry normals; line
//! shapes use a zero normal and are drawn unlit.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a plane in the XY plane
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Returns a plane centered at the origin with its normal along +Z. Rotate it
/// by -90° about X to lay it flat on the XZ ground.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let pos_y = (y as f32 / h_segs as f32 - 0.5) * height;

        for x in 0..=w_segs {
            let pos_x = (x as f32 / w_segs as f32 - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
        }
    }

    // Counter-clockwise when viewed from +Z
    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Generate a square line grid lying on the XZ plane
///
/// `divisions` cells per side, so `divisions + 1` lines in each direction.
pub fn generate_grid(size: f32, divisions: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        push_line(&mut data, [-half, 0.0, offset], [half, 0.0, offset]);
        push_line(&mut data, [offset, 0.0, -half], [offset, 0.0, half]);
    }

    data
}

/// Generate a single segment from the origin along `axis` with length `size`
pub fn generate_axis(axis: [f32; 3], size: f32) -> GeometryData {
    let mut data = GeometryData::new();
    push_line(&mut data, [0.0; 3], [axis[0] * size, axis[1] * size, axis[2] * size]);
    data
}

/// Generate the outline of a cone with its apex at the origin, opening along -Z
///
/// Draws the base circle plus four generator lines from the apex, the same
/// shape a spot light helper shows.
pub fn generate_cone_outline(length: f32, angle: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = segments.max(4);
    let radius = length * angle.clamp(0.0, PI / 2.0 - 1e-3).tan();

    let ring_point = |i: u32| {
        let theta = i as f32 * 2.0 * PI / segs as f32;
        [radius * theta.cos(), radius * theta.sin(), -length]
    };

    for i in 0..segs {
        push_line(&mut data, ring_point(i), ring_point(i + 1));
    }

    for quarter in 0..4 {
        push_line(&mut data, [0.0; 3], ring_point(quarter * segs / 4));
    }

    data
}

fn push_line(data: &mut GeometryData, from: [f32; 3], to: [f32; 3]) {
    let start = data.vertices.len() as u32;
    data.vertices.push(from);
    data.vertices.push(to);
    data.normals.push([0.0; 3]);
    data.normals.push([0.0; 3]);
    data.indices.push(start);
    data.indices.push(start + 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
    }

    #[test]
    fn test_plane_extent_and_winding() {
        let plane = generate_plane(64.0, 64.0, 1, 1);
        assert_eq!(plane.vertices[0], [-32.0, -32.0, 0.0]);
        assert_eq!(plane.vertices[3], [32.0, 32.0, 0.0]);

        // First triangle faces +Z
        let [a, b, c] = [0, 1, 2].map(|k| plane.vertices[plane.indices[k] as usize]);
        let e1 = [b[0] - a[0], b[1] - a[1]];
        let e2 = [c[0] - a[0], c[1] - a[1]];
        assert!(e1[0] * e2[1] - e1[1] * e2[0] > 0.0);
    }

    #[test]
    fn test_grid_line_count() {
        let grid = generate_grid(64.0, 10);
        assert_eq!(grid.line_count(), 22);
        assert!(grid.vertices.iter().all(|v| v[1] == 0.0));
    }

    #[test]
    fn test_cone_outline_radius() {
        let cone = generate_cone_outline(10.0, std::f32::consts::FRAC_PI_4, 16);
        assert_eq!(cone.line_count(), 20);
        let first = cone.vertices[0];
        assert!((first[0] - 10.0).abs() < 1e-4);
        assert_eq!(first[2], -10.0);
    }
}
