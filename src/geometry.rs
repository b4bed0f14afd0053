//! Small vector helpers on `Vector3<f64>`, the coordinate type of every mesh node.
use nalgebra::Vector3;

pub type Vec3 = Vector3<f64>;

/// The coordinates of node `i` in a flat `[x0, y0, z0, x1, ...]` array.
pub fn node_point(xpts: &[f64], i: usize) -> Vec3 {
    Vec3::new(xpts[3 * i], xpts[3 * i + 1], xpts[3 * i + 2])
}

/// Unit normal of the directed edge `a -> b` in the xy-plane, pointing to its right.
///
/// For a counter-clockwise boundary this is the outward normal.
pub fn edge_normal(a: &Vec3, b: &Vec3) -> Vec3 {
    let t = b - a;
    Vec3::new(t.y, -t.x, t.z).normalize()
}

/// Unit tangent of the directed edge `a -> b`.
pub fn edge_tangent(a: &Vec3, b: &Vec3) -> Vec3 {
    (b - a).normalize()
}

/// Unit normal of the planar polygon with the given corners, oriented by the right-hand rule.
///
/// Uses Newell's method, so slightly warped quadrilateral faces get an averaged normal.
pub fn polygon_normal(corners: &[Vec3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for (i, p) in corners.iter().enumerate() {
        let q = &corners[(i + 1) % corners.len()];
        n += p.cross(q);
    }
    n.normalize()
}

/// Signed area of the triangle `a, b, c` in the xy-plane.
pub fn signed_area_2d(a: &Vec3, b: &Vec3, c: &Vec3) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}
