//! Import of Gmsh MSH 4.1 files.
//!
//! Every element block whose entity carries a physical group becomes a set of cells tagged
//! with the group's tag; the named physical groups become the mesh regions. Gmsh node tags
//! are 1-based and must be consecutive.
use crate::error::{Error, ErrorKind};
use crate::io::native;
use crate::mesh::{Cell, CellType, Mesh, MeshData, Region};
use crate::connectivity::Connectivity;
use eyre::{eyre, Context};
use log::warn;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Cell type and order of a Gmsh element type code.
pub fn cell_type_from_gmsh(code: i32) -> Result<(CellType, usize), Error> {
    let shape = match code {
        15 => (CellType::Point, 1),
        1 => (CellType::Line, 1),
        8 => (CellType::Line, 2),
        26 => (CellType::Line, 3),
        2 => (CellType::Triangle, 1),
        9 => (CellType::Triangle, 2),
        21 => (CellType::Triangle, 3),
        3 => (CellType::Quad, 1),
        10 => (CellType::Quad, 2),
        36 => (CellType::Quad, 3),
        4 => (CellType::Tet, 1),
        11 => (CellType::Tet, 2),
        29 => (CellType::Tet, 3),
        5 => (CellType::Hex, 1),
        17 => (CellType::Hex, 2),
        6 => (CellType::Prism, 1),
        _ => return Err(Error::new(ErrorKind::UnsupportedGmshType { code })),
    };
    Ok(shape)
}

/// Loads a mesh from a Gmsh MSH file at the given path.
pub fn load_msh_from_file<P: AsRef<Path>>(file_path: P) -> eyre::Result<MeshData> {
    let file_path = file_path.as_ref();
    let msh_bytes = std::fs::read(file_path).wrap_err_with(|| format!("failed to read {}", file_path.display()))?;
    load_msh_from_bytes(&msh_bytes).wrap_err("failed to load mesh from msh file")
}

/// Loads a mesh by parsing the given bytes as a Gmsh MSH file.
pub fn load_msh_from_bytes(bytes: &[u8]) -> eyre::Result<MeshData> {
    let (regions, bytes) = split_physical_names(bytes)?;
    let mut msh_file = mshio::parse_msh_bytes(&bytes).map_err(|e| eyre!("failed to parse msh file: {}", e))?;

    let msh_nodes = msh_file
        .data
        .nodes
        .take()
        .ok_or(eyre!("MSH file does not contain nodes"))?;
    let msh_elements = msh_file
        .data
        .elements
        .take()
        .ok_or(eyre!("MSH file does not contain elements"))?;
    let entities = msh_file
        .data
        .entities
        .take()
        .ok_or(eyre!("MSH file does not contain entities"))?;

    // Physical group of every (dim, entity tag)
    let mut physical = FxHashMap::default();
    let groups = entities
        .points
        .iter()
        .map(|e| (0, e.tag, &e.physical_tags))
        .chain(entities.curves.iter().map(|e| (1, e.tag, &e.physical_tags)))
        .chain(entities.surfaces.iter().map(|e| (2, e.tag, &e.physical_tags)))
        .chain(entities.volumes.iter().map(|e| (3, e.tag, &e.physical_tags)));
    for (dim, tag, physical_tags) in groups {
        if let Some(&group) = physical_tags.first() {
            physical.insert((dim, tag), group.unsigned_abs() as usize);
        }
    }

    let mut xpts = Vec::new();
    for node_block in &msh_nodes.node_blocks {
        if node_block.node_tags.is_some() {
            return Err(eyre!("node block tags are not consecutive in msh file"));
        }
        for node in &node_block.nodes {
            xpts.extend_from_slice(&[node.x, node.y, node.z]);
        }
    }
    let n_nodes = xpts.len() / 3;

    let mut cells = Vec::new();
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for block in &msh_elements.element_blocks {
        let Some(&tag) = physical.get(&(block.entity_dim, block.entity_tag)) else {
            warn!(
                "Skipping {} elements of entity ({}, {}) without a physical group",
                block.elements.len(),
                block.entity_dim,
                block.entity_tag
            );
            continue;
        };
        let (cell_type, order) = cell_type_from_gmsh(block.element_type as i32)?;
        for element in &block.elements {
            let cell = Cell::new(cells.len(), cell_type, order, tag)?;
            if element.nodes.len() < cell.n_nodes() {
                return Err(eyre!("not enough nodes in element {}", element.element_tag));
            }
            let nodes = element.nodes[..cell.n_nodes()]
                .iter()
                .map(|&node| match usize::try_from(node) {
                    Ok(node) if (1..=n_nodes).contains(&node) => Ok(node - 1),
                    _ => Err(eyre!("element {} references unknown node {node}", element.element_tag)),
                })
                .collect::<eyre::Result<Vec<_>>>()?;
            cells.push(cell);
            rows.push(nodes);
        }
    }

    let conn = Connectivity::from_rows(n_nodes, &rows)?;
    Ok(MeshData {
        cells,
        conn,
        xpts,
        regions,
    })
}

/// Reads a Gmsh file and writes it as a native mesh directory.
pub fn convert_msh_to_native(msh_path: impl AsRef<Path>, dir: impl AsRef<Path>) -> eyre::Result<()> {
    let data = load_msh_from_file(msh_path)?;
    let mesh = Mesh::serial(data)?;
    native::write_mesh(dir, &mesh)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Parses and removes the `$PhysicalNames` section, which is always ASCII.
fn split_physical_names(bytes: &[u8]) -> eyre::Result<(Vec<Region>, Vec<u8>)> {
    const BEGIN: &[u8] = b"$PhysicalNames";
    const END: &[u8] = b"$EndPhysicalNames";
    let Some(begin) = find(bytes, BEGIN) else {
        return Ok((Vec::new(), bytes.to_vec()));
    };
    let end = find(&bytes[begin..], END)
        .map(|offset| begin + offset)
        .ok_or(eyre!("unterminated $PhysicalNames section"))?;
    let section =
        std::str::from_utf8(&bytes[begin + BEGIN.len()..end]).wrap_err("$PhysicalNames section is not valid text")?;

    let mut lines = section.lines().map(str::trim).filter(|line| !line.is_empty());
    let count: usize = lines
        .next()
        .ok_or(eyre!("missing physical name count"))?
        .parse()
        .wrap_err("invalid physical name count")?;
    let mut regions = Vec::with_capacity(count);
    for line in lines.take(count) {
        let mut fields = line.splitn(3, char::is_whitespace);
        let (Some(dim), Some(tag), Some(name)) = (fields.next(), fields.next(), fields.next()) else {
            return Err(eyre!("invalid physical name entry '{line}'"));
        };
        let dim = dim.parse().wrap_err_with(|| format!("invalid dimension in '{line}'"))?;
        let tag = tag.parse().wrap_err_with(|| format!("invalid tag in '{line}'"))?;
        regions.push(Region::new(name.trim().trim_matches('"'), dim, tag));
    }
    if regions.len() != count {
        return Err(eyre!("expected {count} physical names, found {}", regions.len()));
    }

    let mut rest = bytes[..begin].to_vec();
    rest.extend_from_slice(&bytes[end + END.len()..]);
    Ok((regions, rest))
}
