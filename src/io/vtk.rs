//! Export of the local mesh and nodal fields to legacy VTK unstructured grids.
use crate::error::{Error, ErrorKind, Result};
use crate::mesh::{Cell, CellType, Field, Mesh};
use eyre::WrapErr;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType as VtkCellType, Cells, DataArray, DataSet, ElementType, Piece,
    UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

fn invalid_cell(cell: &Cell) -> Error {
    Error::new(ErrorKind::InvalidCell {
        id: cell.idx(),
        cell_type: cell.cell_type().code(),
        order: cell.order(),
    })
}

/// The VTK cell type of a cell.
pub fn vtk_cell_type(cell: &Cell) -> Result<VtkCellType> {
    let vtk_type = match (cell.cell_type(), cell.order()) {
        (CellType::Point, 1) => VtkCellType::Vertex,
        (CellType::Line, 1) => VtkCellType::Line,
        (CellType::Line, 2) => VtkCellType::QuadraticEdge,
        (CellType::Line, 3) => VtkCellType::LagrangeCurve,
        (CellType::Triangle, 1) => VtkCellType::Triangle,
        (CellType::Triangle, 2) => VtkCellType::QuadraticTriangle,
        (CellType::Triangle, 3) => VtkCellType::LagrangeTriangle,
        (CellType::Quad, 1) => VtkCellType::Quad,
        (CellType::Quad, 2) => VtkCellType::QuadraticQuad,
        (CellType::Quad, 3) => VtkCellType::LagrangeQuadrilateral,
        (CellType::Tet, 1) => VtkCellType::Tetra,
        (CellType::Tet, 2) => VtkCellType::QuadraticTetra,
        (CellType::Tet, 3) => VtkCellType::LagrangeTetrahedron,
        (CellType::Hex, 1) => VtkCellType::Hexahedron,
        (CellType::Hex, 2) => VtkCellType::QuadraticHexahedron,
        (CellType::Hex, 3) => VtkCellType::LagrangeHexahedron,
        (CellType::Prism, 1) => VtkCellType::Wedge,
        _ => return Err(invalid_cell(cell)),
    };
    Ok(vtk_type)
}

/// Cell nodes in VTK order.
pub fn vtk_cell_nodes(cell: &Cell, nodes: &[usize]) -> Vec<usize> {
    match (cell.cell_type(), cell.order()) {
        (CellType::Tet, 2) => {
            // Gmsh and ParaView disagree on the last two edge nodes of quadratic tets
            let mut out = nodes.to_vec();
            out.swap(8, 9);
            out
        }
        (CellType::Hex, 2) => {
            let mut out = nodes[0..8].to_vec();
            out.extend([8, 11, 13, 9, 16, 18, 19, 17, 10, 12, 14, 15].map(|i| nodes[i]));
            out
        }
        _ => nodes.to_vec(),
    }
}

fn scalars(name: String, data: Vec<f64>) -> Attribute {
    Attribute::DataArray(DataArray {
        name,
        elem: ElementType::Scalars {
            num_comp: 1,
            lookup_table: None,
        },
        data: data.into(),
    })
}

/// Builds the data set of the local mesh with one scalar point array per field component.
///
/// Components are named by the field's component names, or `<field>_<k>` when it has none.
pub fn mesh_data_set(mesh: &Mesh, fields: &[&Field<'_>]) -> Result<DataSet> {
    let mut vertices = Vec::new();
    let mut types = Vec::with_capacity(mesh.cells().len());
    for cell in mesh.cells() {
        let nodes = vtk_cell_nodes(cell, mesh.get_cell_nodes(cell)?);
        vertices.push(nodes.len() as u32);
        vertices.extend(nodes.into_iter().map(|node| node as u32));
        types.push(vtk_cell_type(cell)?);
    }

    let n_nodes = mesh.n_nodes_local();
    let mut point = Vec::new();
    for field in fields {
        let n_vars = field.n_vars();
        let values = field.values();
        for var in 0..n_vars {
            let name = field
                .components()
                .get(var)
                .cloned()
                .unwrap_or_else(|| format!("{}_{var}", field.name()));
            let data = (0..n_nodes).map(|node| values[node * n_vars + var]).collect();
            point.push(scalars(name, data));
        }
    }

    let piece = UnstructuredGridPiece {
        points: mesh.xpts().to_vec().into(),
        cells: Cells {
            cell_verts: VertexNumbers::Legacy {
                num_cells: mesh.cells().len() as u32,
                vertices,
            },
            types,
        },
        data: Attributes { point, cell: Vec::new() },
    };
    Ok(DataSet::UnstructuredGrid {
        meta: None,
        pieces: vec![Piece::Inline(Box::new(piece))],
    })
}

/// Writes the local mesh and fields as a legacy ASCII VTK file.
pub fn write_vtk(path: impl AsRef<Path>, mesh: &Mesh, fields: &[&Field<'_>]) -> eyre::Result<()> {
    let path = path.as_ref();
    let data = mesh_data_set(mesh, fields)?;
    Vtk {
        version: Version { major: 2, minor: 0 },
        title: String::from("parfem"),
        byte_order: ByteOrder::BigEndian,
        data,
        file_path: None,
    }
    .export_ascii(path)
    .wrap_err_with(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_hex_nodes_follow_vtk_edges() {
        let cell = Cell::new(0, CellType::Hex, 2, 0).unwrap();
        let nodes: Vec<usize> = (0..20).collect();
        let reordered = vtk_cell_nodes(&cell, &nodes);
        assert_eq!(&reordered[..8], &nodes[..8]);
        assert_eq!(&reordered[8..], &[8, 11, 13, 9, 16, 18, 19, 17, 10, 12, 14, 15]);
    }

    #[test]
    fn quadratic_tet_swaps_last_edges() {
        let cell = Cell::new(0, CellType::Tet, 2, 0).unwrap();
        let nodes: Vec<usize> = (0..10).collect();
        assert_eq!(vtk_cell_nodes(&cell, &nodes), vec![0, 1, 2, 3, 4, 5, 6, 7, 9, 8]);
    }

    #[test]
    fn prism_maps_to_wedge() {
        let cell = Cell::new(0, CellType::Prism, 1, 0).unwrap();
        assert_eq!(vtk_cell_type(&cell).unwrap(), VtkCellType::Wedge);
    }
}
