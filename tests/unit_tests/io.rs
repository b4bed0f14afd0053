use crate::test_output_dir;
use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::io::msh::load_msh_from_bytes;
use parfem::io::native::{format_cells, read_field_values, read_mesh, read_mesh_data, write_field_values, write_mesh};
use parfem::io::vtk::write_vtk;
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::{create_box_mesh, create_rectangle_mesh};
use parfem::mesh::{CellType, Field, Mesh};

#[test]
fn native_cells_format() {
    let mesh = Mesh::serial(create_rectangle_mesh(1.0, 1.0, 1, 1, false).unwrap()).unwrap();
    insta::assert_snapshot!(format_cells(&mesh).unwrap(), @r###"
    5 4 12
    0 3 1 1 0 1 3 2
    1 1 1 2 0 1
    2 1 1 3 1 3
    3 1 1 4 3 2
    4 1 1 5 2 0
    "###);
}

#[test]
fn native_mesh_round_trip() {
    let dir = test_output_dir("native_mesh_round_trip");
    let data = create_box_mesh([1.0, 0.5, 0.25], [2, 3, 1]).unwrap();
    write_mesh(&dir, &Mesh::serial(data.clone()).unwrap()).unwrap();
    assert_eq!(read_mesh_data(&dir).unwrap(), data);

    let n_cells = run_threaded(2, |ctx| {
        let mesh = read_mesh(ctx, &dir, &BlockPartitioner).unwrap();
        (mesh.n_cells_local(), mesh.n_cells_global(ctx))
    });
    assert_eq!(n_cells[0].0 + n_cells[1].0, data.n_cells());
    assert!(n_cells.iter().all(|&(_, global)| global == data.n_cells()));
}

#[test]
fn missing_mesh_files_are_reported() {
    let dir = test_output_dir("missing_mesh_files");
    let err = read_mesh_data(dir.join("does_not_exist")).unwrap_err();
    assert!(format!("{err:?}").contains("does_not_exist"));
}

fn linear_values(xpts: &[f64]) -> Vec<f64> {
    xpts.chunks_exact(3)
        .flat_map(|x| [x[0] + 2.0 * x[1], 0.5 - x[1]])
        .collect()
}

#[test]
fn field_values_are_read_on_every_partition() {
    let path = test_output_dir("field_values").join("u");
    let data = create_rectangle_mesh(2.0, 1.0, 4, 2, true).unwrap();
    {
        let ctx = ProcessContext::serial();
        let mesh = Mesh::serial(data.clone()).unwrap();
        let mut field = Field::new(&ctx, &mesh, "u", 2, Vec::new()).unwrap();
        field.set_values(&linear_values(mesh.xpts())).unwrap();
        write_field_values(&ctx, &path, &field, true).unwrap();
    }

    let matches = run_threaded(2, |ctx| {
        let mesh = Mesh::distribute(ctx, &data, &BlockPartitioner).unwrap();
        let mut field = Field::new(ctx, &mesh, "u", 2, Vec::new()).unwrap();
        read_field_values(ctx, &path, &mut field).unwrap();
        field.values() == linear_values(mesh.xpts()).as_slice()
    });
    assert_eq!(matches, vec![true, true]);
}

#[test]
fn field_with_wrong_variable_count_is_rejected() {
    let path = test_output_dir("field_wrong_vars").join("t");
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(1.0, 1.0, 2, 2, false).unwrap()).unwrap();
    let mut scalar = Field::new(&ctx, &mesh, "t", 1, Vec::new()).unwrap();
    scalar.set_all(&[4.0]).unwrap();
    write_field_values(&ctx, &path, &scalar, false).unwrap();

    let mut vector = Field::new(&ctx, &mesh, "v", 3, Vec::new()).unwrap();
    assert!(read_field_values(&ctx, &path, &mut vector).is_err());
    let mut copy = Field::new(&ctx, &mesh, "t", 1, Vec::new()).unwrap();
    read_field_values(&ctx, &path, &mut copy).unwrap();
    assert!(copy.values().iter().all(|&t| t == 4.0));
}

const TWO_TRIANGLES_MSH: &str = "\
$MeshFormat
4.1 0 8
$EndMeshFormat
$PhysicalNames
2
1 1 \"left\"
2 2 \"domain\"
$EndPhysicalNames
$Entities
0 1 1 0
1 0 0 0 0 1 0 1 1 0
1 0 0 0 1 1 0 1 2 0
$EndEntities
$Nodes
1 4 1 4
2 1 0 4
1
2
3
4
0 0 0
1 0 0
1 1 0
0 1 0
$EndNodes
$Elements
2 3 1 3
1 1 1 1
1 4 1
2 1 2 2
2 1 2 3
3 1 3 4
$EndElements
";

#[test]
fn gmsh_physical_groups_become_regions() {
    let data = load_msh_from_bytes(TWO_TRIANGLES_MSH.as_bytes()).unwrap();
    assert_eq!(data.n_nodes(), 4);
    assert_eq!(data.n_cells(), 3);
    assert_eq!(data.xpts[6..9], [1.0, 1.0, 0.0]);

    assert_eq!(data.cells[0].cell_type(), CellType::Line);
    assert_eq!(data.cells[0].tag(), 1);
    assert_eq!(data.conn.row(0), &[3, 0]);
    assert_eq!(data.cells[2].cell_type(), CellType::Triangle);
    assert_eq!(data.conn.row(2), &[0, 2, 3]);

    let mesh = Mesh::serial(data).unwrap();
    assert_eq!(mesh.get_region_cells("left").unwrap().len(), 1);
    assert_eq!(mesh.get_region_cells("domain").unwrap().len(), 2);
    assert_eq!(mesh.get_region_nodes("left").unwrap(), vec![3, 0]);
}

#[test]
fn vtk_file_has_legacy_header() {
    let path = test_output_dir("vtk_header").join("plate.vtk");
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(1.0, 1.0, 2, 1, true).unwrap()).unwrap();
    let mut t = Field::new(&ctx, &mesh, "T", 1, vec!["temperature".into()]).unwrap();
    t.set_all(&[300.0]).unwrap();
    write_vtk(&path, &mesh, &[&t]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("# vtk DataFile Version 2.0"));
    assert_eq!(lines.next(), Some("parfem"));
    assert!(text.contains("UNSTRUCTURED_GRID"));
    assert!(text.contains("temperature"));
}
