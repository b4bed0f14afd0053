use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_rectangle_mesh;
use parfem::mesh::Mesh;
use parfem::sparsity::sparsity_pattern;

#[test]
fn serial_rows_count_node_neighbours() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(2.0, 2.0, 2, 2, false).unwrap()).unwrap();
    let pattern = sparsity_pattern(&ctx, &mesh, 2).unwrap();
    assert_eq!(pattern.n_rows(), 18);
    assert_eq!(pattern.nnz_off_diag(), 0);

    let adjacency = mesh.cell_node_conn().node_to_node();
    for node in 0..mesh.n_nodes_local() {
        for var in 0..2 {
            assert_eq!(pattern.row_nnz(2 * node + var), 2 * adjacency.row(node).len());
        }
    }
    // Corner, edge and centre nodes of a 3x3 grid
    assert_eq!(pattern.row_nnz(0), 8);
    assert_eq!(pattern.row_nnz(2), 12);
    assert_eq!(pattern.row_nnz(8), 18);
}

#[test]
fn distributed_pattern_bounds_the_serial_one() {
    let data = create_rectangle_mesh(4.0, 1.0, 8, 2, true).unwrap();
    let serial = {
        let ctx = ProcessContext::serial();
        let mesh = Mesh::serial(data.clone()).unwrap();
        sparsity_pattern(&ctx, &mesh, 1).unwrap()
    };

    let patterns = run_threaded(2, |ctx| {
        let mesh = Mesh::distribute(ctx, &data, &BlockPartitioner).unwrap();
        sparsity_pattern(ctx, &mesh, 1).unwrap()
    });
    let n_rows: usize = patterns.iter().map(|p| p.n_rows()).sum();
    assert_eq!(n_rows, serial.n_rows());
    let nnz: usize = patterns.iter().map(|p| p.nnz_diag() + p.nnz_off_diag()).sum();
    assert!(nnz >= serial.nnz_diag());
    assert!(patterns.iter().any(|p| p.nnz_off_diag() > 0));
}
