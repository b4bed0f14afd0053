use parfem::comm::run_threaded;
use parfem::connectivity::Connectivity;
use parfem::index_map::Ownership;
use parfem::mesh::partition::{compute_ghost_nodes, BlockPartitioner, Partitioner};
use parfem::mesh::procedural::create_rectangle_mesh;
use parfem::mesh::Mesh;

#[test]
fn block_partitioner_splits_cells_evenly() {
    let conn = Connectivity::from_rows(5, &[[0usize, 1], [1, 2], [2, 3], [3, 4]]).unwrap();
    let (cells, nodes) = BlockPartitioner.compute_owners(2, &conn).unwrap();
    assert_eq!(cells, vec![0, 0, 1, 1]);
    // Node 2 is shared and goes to the lower rank
    assert_eq!(nodes, vec![0, 0, 0, 1, 1]);

    let ghosts = compute_ghost_nodes(2, &conn, &cells, &nodes);
    assert!(ghosts[0].is_empty());
    assert_eq!(ghosts[1], vec![(2, 0)]);
}

#[test]
fn distributed_rectangle_covers_every_entity_once() {
    let data = create_rectangle_mesh(4.0, 1.0, 4, 1, false).unwrap();
    let n_cells = data.n_cells();
    let n_nodes = data.n_nodes();

    let parts = run_threaded(3, |ctx| {
        let mesh = Mesh::distribute(ctx, &data, &BlockPartitioner).unwrap();
        mesh.info(ctx);
        assert_eq!(mesh.n_cells_global(ctx), n_cells);
        assert_eq!(mesh.n_nodes_global(ctx), n_nodes);

        // Every node of a local cell is known locally, and ghosts are owned elsewhere
        for cell in mesh.cells() {
            for &node in mesh.get_cell_nodes(cell).unwrap() {
                assert!(node < mesh.n_nodes_local());
                if let Ownership::Ghost(owner) = mesh.node_im().ownership(node).unwrap() {
                    assert_ne!(owner, ctx.rank());
                }
            }
        }
        (
            mesh.cell_im().owned_indices().to_vec(),
            mesh.node_im().owned_indices().to_vec(),
            mesh.get_region_nodes("right").unwrap().len(),
        )
    });

    let mut cells: Vec<usize> = parts.iter().flat_map(|(cells, _, _)| cells.clone()).collect();
    cells.sort_unstable();
    assert_eq!(cells, (0..n_cells).collect::<Vec<_>>());
    let mut nodes: Vec<usize> = parts.iter().flat_map(|(_, nodes, _)| nodes.clone()).collect();
    nodes.sort_unstable();
    assert_eq!(nodes, (0..n_nodes).collect::<Vec<_>>());

    // The right edge is a single line cell on one rank
    let right: usize = parts.iter().map(|(_, _, right)| right).sum();
    assert_eq!(right, 2);
}

#[test]
fn serial_distribution_keeps_the_mesh() {
    let data = create_rectangle_mesh(1.0, 1.0, 2, 2, true).unwrap();
    let ctx = parfem::context::ProcessContext::serial();
    let mesh = Mesh::distribute(&ctx, &data, &BlockPartitioner).unwrap();
    assert_eq!(mesh.n_cells_local(), data.n_cells());
    assert_eq!(mesh.xpts(), data.xpts.as_slice());
    assert_eq!(mesh.dim(), 2);
}
