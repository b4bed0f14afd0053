//! Basic procedural mesh generation routines.
//!
//! Generated meshes carry a `domain` region (tag 1) and one region per named boundary, made of
//! cells one dimension lower. Boundary cells are ordered so that their normals point out of
//! the domain.
use crate::connectivity::Connectivity;
use crate::error::{Error, ErrorKind, Result};
use crate::mesh::{Cell, CellType, MeshData, Region};
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Default)]
struct MeshBuilder {
    cells: Vec<Cell>,
    rows: Vec<Vec<usize>>,
    xpts: Vec<f64>,
    regions: Vec<Region>,
}

impl MeshBuilder {
    fn add_node(&mut self, x: f64, y: f64, z: f64) {
        self.xpts.extend_from_slice(&[x, y, z]);
    }

    fn add_region(&mut self, name: &str, dim: usize) -> usize {
        let tag = self.regions.len() + 1;
        self.regions.push(Region::new(name, dim, tag));
        tag
    }

    fn add_cell(&mut self, cell_type: CellType, tag: usize, nodes: Vec<usize>) -> Result<()> {
        self.cells.push(Cell::new(self.cells.len(), cell_type, 1, tag)?);
        self.rows.push(nodes);
        Ok(())
    }

    fn finish(self) -> Result<MeshData> {
        let conn = Connectivity::from_rows(self.xpts.len() / 3, &self.rows)?;
        Ok(MeshData {
            cells: self.cells,
            conn,
            xpts: self.xpts,
            regions: self.regions,
        })
    }
}

fn check_divisions(divisions: &[usize]) -> Result<()> {
    if divisions.iter().any(|&n| n == 0) {
        return Err(Error::new(ErrorKind::Parse {
            what: String::from("mesh divisions (zero cells requested)"),
        }));
    }
    Ok(())
}

/// Adds a structured 2D grid of `n1 x n2` cells whose node `(i, j)` sits at `point(i, j)`,
/// with boundaries `[j = 0, i = n1, j = n2, i = 0]` named by `boundaries`.
fn structured_2d(
    n1: usize,
    n2: usize,
    triangles: bool,
    boundaries: [&str; 4],
    point: impl Fn(usize, usize) -> (f64, f64),
) -> Result<MeshData> {
    check_divisions(&[n1, n2])?;
    let mut builder = MeshBuilder::default();
    let node = |i: usize, j: usize| j * (n1 + 1) + i;
    for j in 0..=n2 {
        for i in 0..=n1 {
            let (x, y) = point(i, j);
            builder.add_node(x, y, 0.0);
        }
    }

    let domain = builder.add_region("domain", 2);
    for j in 0..n2 {
        for i in 0..n1 {
            let quad = [node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)];
            if triangles {
                builder.add_cell(CellType::Triangle, domain, vec![quad[0], quad[1], quad[2]])?;
                builder.add_cell(CellType::Triangle, domain, vec![quad[0], quad[2], quad[3]])?;
            } else {
                builder.add_cell(CellType::Quad, domain, quad.to_vec())?;
            }
        }
    }

    // Counterclockwise walk around the boundary
    let [first, second, third, fourth] = boundaries;
    let tag = builder.add_region(first, 1);
    for i in 0..n1 {
        builder.add_cell(CellType::Line, tag, vec![node(i, 0), node(i + 1, 0)])?;
    }
    let tag = builder.add_region(second, 1);
    for j in 0..n2 {
        builder.add_cell(CellType::Line, tag, vec![node(n1, j), node(n1, j + 1)])?;
    }
    let tag = builder.add_region(third, 1);
    for i in (0..n1).rev() {
        builder.add_cell(CellType::Line, tag, vec![node(i + 1, n2), node(i, n2)])?;
    }
    let tag = builder.add_region(fourth, 1);
    for j in (0..n2).rev() {
        builder.add_cell(CellType::Line, tag, vec![node(0, j + 1), node(0, j)])?;
    }
    builder.finish()
}

/// The rectangle `[0, lx] x [0, ly]` divided into `nx x ny` quads, or twice as many
/// triangles, with boundaries `bottom`, `right`, `top` and `left`.
pub fn create_rectangle_mesh(lx: f64, ly: f64, nx: usize, ny: usize, triangles: bool) -> Result<MeshData> {
    structured_2d(nx, ny, triangles, ["bottom", "right", "top", "left"], |i, j| {
        (lx * i as f64 / nx as f64, ly * j as f64 / ny as f64)
    })
}

/// The quarter annulus `r_inner <= r <= r_outer` in the first quadrant, with `n_radial` cells
/// across and `n_angular` cells around.
///
/// Boundaries are `bottom` (on the x axis), `outer`, `left` (on the y axis) and `inner`.
pub fn create_quarter_annulus_mesh(r_inner: f64, r_outer: f64, n_radial: usize, n_angular: usize) -> Result<MeshData> {
    structured_2d(
        n_radial,
        n_angular,
        false,
        ["bottom", "outer", "left", "inner"],
        |i, j| {
            let r = r_inner + (r_outer - r_inner) * i as f64 / n_radial as f64;
            let theta = FRAC_PI_2 * j as f64 / n_angular as f64;
            (r * theta.cos(), r * theta.sin())
        },
    )
}

/// The box `[0, lx] x [0, ly] x [0, lz]` divided into hexahedra, with the quad faces
/// `x_min`, `x_max`, `y_min`, `y_max`, `z_min` and `z_max` as boundaries.
pub fn create_box_mesh(lengths: [f64; 3], divisions: [usize; 3]) -> Result<MeshData> {
    check_divisions(&divisions)?;
    let [nx, ny, nz] = divisions;
    let mut builder = MeshBuilder::default();
    let node = |[i, j, k]: [usize; 3]| (k * (ny + 1) + j) * (nx + 1) + i;
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                builder.add_node(
                    lengths[0] * i as f64 / nx as f64,
                    lengths[1] * j as f64 / ny as f64,
                    lengths[2] * k as f64 / nz as f64,
                );
            }
        }
    }

    let domain = builder.add_region("domain", 3);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let nodes = vec![
                    node([i, j, k]),
                    node([i + 1, j, k]),
                    node([i + 1, j + 1, k]),
                    node([i, j + 1, k]),
                    node([i, j, k + 1]),
                    node([i + 1, j, k + 1]),
                    node([i + 1, j + 1, k + 1]),
                    node([i, j + 1, k + 1]),
                ];
                builder.add_cell(CellType::Hex, domain, nodes)?;
            }
        }
    }

    for (axis, name) in ["x", "y", "z"].into_iter().enumerate() {
        // The face axes (b, c) are cyclic after `axis`, so b x c points along +axis
        let (b, c) = ((axis + 1) % 3, (axis + 2) % 3);
        for (side, suffix) in [(0, "min"), (divisions[axis], "max")] {
            let tag = builder.add_region(&format!("{name}_{suffix}"), 2);
            for q in 0..divisions[c] {
                for p in 0..divisions[b] {
                    let corner = |dp: usize, dq: usize| {
                        let mut ijk = [0; 3];
                        ijk[axis] = side;
                        ijk[b] = p + dp;
                        ijk[c] = q + dq;
                        node(ijk)
                    };
                    let mut face = vec![corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1)];
                    if suffix == "min" {
                        face.reverse();
                    }
                    builder.add_cell(CellType::Quad, tag, face)?;
                }
            }
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::node_point;

    #[test]
    fn rectangle_counts() {
        let data = create_rectangle_mesh(2.0, 1.0, 4, 2, false).unwrap();
        assert_eq!(data.n_nodes(), 15);
        // 8 quads and 12 boundary lines
        assert_eq!(data.n_cells(), 20);
        let names: Vec<_> = data.regions.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["domain", "bottom", "right", "top", "left"]);

        let triangles = create_rectangle_mesh(2.0, 1.0, 4, 2, true).unwrap();
        assert_eq!(triangles.n_cells(), 16 + 12);
    }

    #[test]
    fn boundary_normals_point_outwards() {
        let data = create_quarter_annulus_mesh(1.0, 2.0, 3, 4).unwrap();
        for (cell, nodes) in data.cells.iter().zip(data.conn.rows()) {
            if cell.dim() != 1 {
                continue;
            }
            let xpts: Vec<f64> = nodes.iter().flat_map(|&n| node_point(&data.xpts, n).as_slice().to_vec()).collect();
            let normal = cell.face_normal(-1, &xpts).unwrap();
            let midpoint = (node_point(&xpts, 0) + node_point(&xpts, 1)) / 2.0;
            let centre = nalgebra::Vector3::new(1.0, 1.0, 0.0);
            let region = &data.regions[cell.tag() - 1];
            let outward = match region.name() {
                "inner" => -midpoint.normalize(),
                "outer" => midpoint.normalize(),
                _ => (midpoint - centre).normalize(),
            };
            assert!(normal.dot(&outward) > 0.0, "region {}", region.name());
        }
    }

    #[test]
    fn box_faces_point_outwards() {
        let data = create_box_mesh([1.0, 2.0, 3.0], [1, 2, 3]).unwrap();
        assert_eq!(data.n_nodes(), 2 * 3 * 4);
        // 6 hexahedra and 2 * (6 + 3 + 2) faces
        assert_eq!(data.n_cells(), 6 + 22);
        let centre = nalgebra::Vector3::new(0.5, 1.0, 1.5);
        for (cell, nodes) in data.cells.iter().zip(data.conn.rows()) {
            if cell.dim() != 2 {
                continue;
            }
            let xpts: Vec<f64> = nodes.iter().flat_map(|&n| node_point(&data.xpts, n).as_slice().to_vec()).collect();
            let normal = cell.face_normal(-1, &xpts).unwrap();
            let face_centre = (0..4).map(|i| node_point(&xpts, i)).sum::<nalgebra::Vector3<f64>>() / 4.0;
            assert!(normal.dot(&(face_centre - centre)) > 0.0);
        }
    }

    #[test]
    fn zero_divisions_are_rejected() {
        assert!(create_rectangle_mesh(1.0, 1.0, 0, 1, false).is_err());
    }
}
