use crate::error::{Error, ErrorKind, Result};
use crate::geometry::{edge_normal, edge_tangent, node_point, polygon_normal, Vec3};
use serde::{Deserialize, Serialize};

/// Geometric shape of a cell.
///
/// The integer codes (`point = 0` through `prism = 6`) are used by the native mesh format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellType {
    Point,
    Line,
    Triangle,
    Quad,
    Tet,
    Hex,
    Prism,
}

impl CellType {
    pub const ALL: [CellType; 7] = [
        CellType::Point,
        CellType::Line,
        CellType::Triangle,
        CellType::Quad,
        CellType::Tet,
        CellType::Hex,
        CellType::Prism,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Dimension of the reference cell.
    pub fn dim(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Triangle | Self::Quad => 2,
            Self::Tet | Self::Hex | Self::Prism => 3,
        }
    }

    pub fn n_faces(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad | Self::Tet => 4,
            Self::Hex => 6,
            Self::Prism => 5,
        }
    }

    pub fn n_corners(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad | Self::Tet => 4,
            Self::Hex => 8,
            Self::Prism => 6,
        }
    }

    /// Number of nodes of a cell of this type and polynomial order, if supported.
    pub fn n_nodes(self, order: usize) -> Option<usize> {
        let n = match (self, order) {
            (Self::Point, 1) => 1,
            (Self::Line, 1) => 2,
            (Self::Line, 2) => 3,
            (Self::Line, 3) => 4,
            (Self::Triangle, 1) => 3,
            (Self::Triangle, 2) => 6,
            (Self::Triangle, 3) => 10,
            (Self::Quad, 1) => 4,
            (Self::Quad, 2) => 9,
            (Self::Quad, 3) => 16,
            (Self::Tet, 1) => 4,
            (Self::Tet, 2) => 10,
            (Self::Tet, 3) => 20,
            (Self::Hex, 1) => 8,
            (Self::Hex, 2) => 20,
            (Self::Prism, 1) => 6,
            _ => return None,
        };
        Some(n)
    }

    /// Local corner nodes of face `face`, oriented so that the right-hand rule gives the
    /// outward normal. Face `-1` denotes the whole cell.
    pub fn face_nodes(self, face: i32) -> Result<&'static [usize]> {
        let nodes: &'static [usize] = match (self, face) {
            (Self::Point, 0) => &[0],
            (Self::Line, -1) => &[0, 1],
            (Self::Line, 0) => &[0],
            (Self::Line, 1) => &[1],
            (Self::Triangle, -1) => &[0, 1, 2],
            (Self::Triangle, 0) => &[0, 1],
            (Self::Triangle, 1) => &[1, 2],
            (Self::Triangle, 2) => &[2, 0],
            (Self::Quad, -1) => &[0, 1, 2, 3],
            (Self::Quad, 0) => &[0, 1],
            (Self::Quad, 1) => &[1, 2],
            (Self::Quad, 2) => &[2, 3],
            (Self::Quad, 3) => &[3, 0],
            (Self::Tet, 0) => &[0, 2, 1],
            (Self::Tet, 1) => &[0, 1, 3],
            (Self::Tet, 2) => &[0, 3, 2],
            (Self::Tet, 3) => &[1, 2, 3],
            (Self::Hex, 0) => &[0, 3, 2, 1],
            (Self::Hex, 1) => &[0, 1, 5, 4],
            (Self::Hex, 2) => &[1, 2, 6, 5],
            (Self::Hex, 3) => &[2, 3, 7, 6],
            (Self::Hex, 4) => &[3, 0, 4, 7],
            (Self::Hex, 5) => &[4, 5, 6, 7],
            (Self::Prism, 0) => &[0, 2, 1],
            (Self::Prism, 1) => &[3, 4, 5],
            (Self::Prism, 2) => &[0, 1, 4, 3],
            (Self::Prism, 3) => &[1, 2, 5, 4],
            (Self::Prism, 4) => &[2, 0, 3, 5],
            _ => return Err(Error::new(ErrorKind::InvalidFace { cell_type: self, face })),
        };
        Ok(nodes)
    }
}

/// Immutable descriptor of one mesh cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    idx: usize,
    cell_type: CellType,
    order: usize,
    tag: usize,
    n_nodes: usize,
}

impl Cell {
    /// Creates a cell with global index `idx` in the region with tag `tag`.
    ///
    /// Fails with an invalid-cell error if `(cell_type, order)` is unsupported.
    #[track_caller]
    pub fn new(idx: usize, cell_type: CellType, order: usize, tag: usize) -> Result<Self> {
        let n_nodes = cell_type.n_nodes(order).ok_or_else(|| {
            Error::new(ErrorKind::InvalidCell {
                id: idx,
                cell_type: cell_type.code(),
                order,
            })
        })?;
        Ok(Self {
            idx,
            cell_type,
            order,
            tag,
            n_nodes,
        })
    }

    /// Like [`Cell::new`], from the integer type code of the native mesh format.
    #[track_caller]
    pub fn from_code(idx: usize, code: i32, order: usize, tag: usize) -> Result<Self> {
        match CellType::from_code(code) {
            Some(cell_type) => Self::new(idx, cell_type, order, tag),
            None => Err(Error::new(ErrorKind::InvalidCell {
                id: idx,
                cell_type: code,
                order,
            })),
        }
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn dim(&self) -> usize {
        self.cell_type.dim()
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_faces(&self) -> usize {
        self.cell_type.n_faces()
    }

    /// Unit normal of face `face`, given the cell's nodal coordinates (3 per node).
    ///
    /// - Lines: face `-1` is the in-plane normal of the whole segment, faces `0` and `1` are the
    ///   end points, whose normal is the segment tangent pointing away from the cell.
    /// - Triangles and quads: face `-1` is the normal of the cell plane, other faces are edges
    ///   with their in-plane normal.
    /// - Tets, hexes and prisms: the outward normal of the given face.
    pub fn face_normal(&self, face: i32, xpts: &[f64]) -> Result<Vec3> {
        let invalid = || Error::new(ErrorKind::InvalidFace {
            cell_type: self.cell_type,
            face,
        });
        let nodes = self.cell_type.face_nodes(face)?;
        let points: Vec<Vec3> = nodes.iter().map(|&i| node_point(xpts, i)).collect();
        let normal = match (self.dim(), face) {
            (0, _) => return Err(invalid()),
            (1, -1) => edge_normal(&points[0], &points[1]),
            (1, _) => {
                let other = node_point(xpts, 1 - nodes[0]);
                edge_tangent(&other, &points[0])
            }
            (2, -1) => polygon_normal(&points),
            (2, _) => edge_normal(&points[0], &points[1]),
            _ => polygon_normal(&points),
        };
        Ok(normal)
    }
}
