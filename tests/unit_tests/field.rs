use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_rectangle_mesh;
use parfem::mesh::{Field, Mesh};

#[test]
fn serial_dof_numbering_is_node_major() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(1.0, 1.0, 1, 1, false).unwrap()).unwrap();
    let field = Field::new(&ctx, &mesh, "u", 2, vec!["u_x".into(), "u_y".into()]).unwrap();
    assert_eq!(field.n_dof_global(), 8);
    assert_eq!(field.n_dof_ghost(), 0);
    assert_eq!(field.components(), &["u_x", "u_y"]);
    let quad = mesh.cells()[0];
    assert_eq!(field.get_cell_dof(&quad).unwrap(), vec![0, 1, 2, 3, 6, 7, 4, 5]);
}

#[test]
fn component_names_must_match_variables() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(1.0, 1.0, 1, 1, false).unwrap()).unwrap();
    assert!(Field::new(&ctx, &mesh, "u", 2, vec!["u_x".into()]).is_err());
    assert!(Field::new(&ctx, &mesh, "u", 0, Vec::new()).is_err());
}

#[test]
fn fixed_dof_of_a_region() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(2.0, 1.0, 2, 1, false).unwrap()).unwrap();
    let mut field = Field::new(&ctx, &mesh, "u", 2, Vec::new()).unwrap();
    field.add_fixed_dof("left", 1, 0.5).unwrap();
    // Nodes 0 and 3 lie on the left edge
    assert_eq!(field.get_fixed_dof(), vec![1, 7]);
    assert_eq!(field.get_fixed_dof_values(), vec![0.5, 0.5]);
    assert!(field.add_fixed_dof("left", 2, 0.0).is_err());
    assert!(field.add_fixed_dof("nowhere", 0, 0.0).is_err());
    field.clear_fixed_dof();
    assert!(field.fixed_dof().is_empty());
}

#[test]
fn gathered_values_follow_global_node_order() {
    let data = create_rectangle_mesh(3.0, 1.0, 3, 2, true).unwrap();
    let n_nodes = data.n_nodes();
    let gathered = run_threaded(2, |ctx| {
        let mesh = Mesh::distribute(ctx, &data, &BlockPartitioner).unwrap();
        let mut field = Field::new(ctx, &mesh, "T", 2, Vec::new()).unwrap();
        assert_eq!(field.n_dof_global(), 2 * n_nodes);
        let values: Vec<f64> = (0..mesh.n_nodes_local())
            .flat_map(|local| {
                let global = mesh.node_im().local_to_global(local).unwrap() as f64;
                [global, -global]
            })
            .collect();
        field.set_values(&values).unwrap();
        field.gather_field_values(ctx)
    });
    assert!(gathered[1].is_none());
    let expected: Vec<f64> = (0..n_nodes).flat_map(|node| [node as f64, -(node as f64)]).collect();
    assert_eq!(gathered[0].as_ref().unwrap(), &expected);
}
