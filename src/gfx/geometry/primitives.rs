//! # Primitive Shape Generation
//!
//! Sphere and box generators. Both produce outward-facing,
//! counter-clockwise triangles with normals and texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a UV sphere centered at the origin
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `width_segments` - Number of horizontal segments (longitude), at least 3
/// * `height_segments` - Number of vertical segments (latitude), at least 2
///
/// U runs once around the equator and V from the south pole (0) to the
/// north pole (1), so an equirectangular image maps directly onto it.
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut data = GeometryData::default();
    let mut grid: Vec<Vec<u32>> = Vec::with_capacity(height_segments as usize + 1);
    let mut index = 0u32;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;

        // Poles get a half-segment U offset so their triangles sample the
        // middle of each column.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;

            let x = -radius * phi.cos() * theta.sin();
            let y = radius * theta.cos();
            let z = radius * phi.sin() * theta.sin();

            data.positions.push([x, y, z]);
            data.normals.push(super::normalize([x, y, z]));
            data.uvs.push([u + u_offset, 1.0 - v]);

            row.push(index);
            index += 1;
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];

            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    data
}

/// Generate a box centered at the origin with one material group per face
///
/// Faces are emitted in the order +X, -X, +Y, -Y, +Z, -Z, so group `i`
/// uses material `i`. Groups 2 and 3 are the top and bottom faces.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::default();

    // (u axis, v axis, w axis, u dir, v dir, plane width, plane height, plane depth)
    let faces = [
        (2, 1, 0, -1.0, -1.0, depth, height, width),
        (2, 1, 0, 1.0, -1.0, depth, height, -width),
        (0, 2, 1, 1.0, 1.0, width, depth, height),
        (0, 2, 1, 1.0, -1.0, width, depth, -height),
        (0, 1, 2, 1.0, -1.0, width, height, depth),
        (0, 1, 2, -1.0, -1.0, width, height, -depth),
    ];

    for (material_index, (u, v, w, udir, vdir, plane_width, plane_height, plane_depth)) in
        faces.into_iter().enumerate()
    {
        build_plane(
            &mut data,
            [u, v, w],
            [udir, vdir],
            [plane_width, plane_height, plane_depth],
            material_index,
        );
    }

    data
}

/// Emits one single-segment face of a box
fn build_plane(
    data: &mut GeometryData,
    axes: [usize; 3],
    dirs: [f32; 2],
    size: [f32; 3],
    material_index: usize,
) {
    let [u, v, w] = axes;
    let [udir, vdir] = dirs;
    let [width, height, depth] = size;

    let first_vertex = data.positions.len() as u32;
    let group_start = data.indices.len() as u32;

    for iy in 0..2u32 {
        let y = iy as f32 * height - height / 2.0;
        for ix in 0..2u32 {
            let x = ix as f32 * width - width / 2.0;

            let mut position = [0.0f32; 3];
            position[u] = x * udir;
            position[v] = y * vdir;
            position[w] = depth / 2.0;

            let mut normal = [0.0f32; 3];
            normal[w] = if depth > 0.0 { 1.0 } else { -1.0 };

            data.positions.push(position);
            data.normals.push(normal);
            data.uvs.push([ix as f32, 1.0 - iy as f32]);
        }
    }

    let a = first_vertex;
    let b = first_vertex + 2;
    let c = first_vertex + 3;
    let d = first_vertex + 1;
    data.indices.extend_from_slice(&[a, b, d, b, c, d]);

    data.add_group(group_start, 6, material_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::Geometry;

    fn face_normal(data: &GeometryData, triangle: &[u32]) -> [f32; 3] {
        let p = |i: u32| data.positions[i as usize];
        let (p0, p1, p2) = (p(triangle[0]), p(triangle[1]), p(triangle[2]));
        let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
        let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }

    fn centroid(data: &GeometryData, triangle: &[u32]) -> [f32; 3] {
        let mut sum = [0.0; 3];
        for &i in triangle {
            for axis in 0..3 {
                sum[axis] += data.positions[i as usize][axis] / 3.0;
            }
        }
        sum
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn sphere_has_expected_topology() {
        let sphere = generate_sphere(500.0, 100, 100);

        assert_eq!(sphere.vertex_count(), 101 * 101);
        assert_eq!(sphere.triangle_count(), 2 * 100 * 99);
        for position in &sphere.positions {
            let radius = dot(*position, *position).sqrt();
            assert!((radius - 500.0).abs() < 1e-2);
        }
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let sphere = generate_sphere(1.0, 16, 8);
        for triangle in sphere.indices.chunks_exact(3) {
            assert!(dot(face_normal(&sphere, triangle), centroid(&sphere, triangle)) > 0.0);
        }
    }

    #[test]
    fn box_has_one_group_per_face() {
        let cube = generate_box(10.0, 10.0, 10.0);

        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(cube.groups.len(), 6);
        for (i, group) in cube.groups.iter().enumerate() {
            assert_eq!(group.material_index, i);
            assert_eq!(group.start, (i * 6) as u32);
            assert_eq!(group.count, 6);
        }
    }

    #[test]
    fn box_top_and_bottom_are_groups_two_and_three() {
        let cube = generate_box(2.0, 2.0, 2.0);
        let top = &cube.indices[12..18];
        let bottom = &cube.indices[18..24];

        assert!(top.iter().all(|&i| cube.positions[i as usize][1] == 1.0));
        assert!(bottom.iter().all(|&i| cube.positions[i as usize][1] == -1.0));
    }

    #[test]
    fn mirroring_one_axis_turns_box_faces_inward() {
        let mut cube = Geometry::new(generate_box(10.0, 10.0, 10.0));
        for triangle in cube.data().indices.chunks_exact(3) {
            assert!(dot(face_normal(cube.data(), triangle), centroid(cube.data(), triangle)) > 0.0);
        }

        cube.scale(1.0, 1.0, -1.0);

        let data = cube.data();
        for triangle in data.indices.chunks_exact(3) {
            assert!(dot(face_normal(data, triangle), centroid(data, triangle)) < 0.0);
        }
    }
}
