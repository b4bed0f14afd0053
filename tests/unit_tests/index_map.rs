use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::index_map::{IndexMap, Ownership};

#[test]
fn serial_map_is_identity() {
    let ctx = ProcessContext::serial();
    let im = IndexMap::serial(4);
    assert_eq!(im.n_owned(), 4);
    assert_eq!(im.n_ghost(), 0);
    assert_eq!(im.n_global(&ctx), 4);
    assert_eq!(im.local_to_global(3).unwrap(), 3);
    assert_eq!(im.global_to_local(2), Some(2));
    assert_eq!(im.global_to_local(4), None);
    assert!(im.local_to_global(4).is_err());
}

#[test]
fn ghosts_follow_owned_entries() {
    let im = IndexMap::new(vec![7, 3], vec![5, 1], vec![2, 1]).unwrap();
    assert_eq!(im.n_local(), 4);
    assert_eq!(im.owned_indices(), &[7, 3]);
    assert_eq!(im.ghost_indices(), &[5, 1]);
    assert_eq!(im.global_to_local(1), Some(3));
    assert_eq!(im.ownership(0).unwrap(), Ownership::Owned);
    assert_eq!(im.ownership(2).unwrap(), Ownership::Ghost(2));
    assert!(im.ownership(4).is_err());
}

#[test]
fn mismatched_ghost_owners_are_rejected() {
    assert!(IndexMap::new(vec![0], vec![1, 2], vec![1]).is_err());
}

#[test]
fn renumbering_is_contiguous_per_rank() {
    let maps = run_threaded(2, |ctx| {
        // Rank 0 owns {0, 2} and sees 1 from rank 1; rank 1 owns {1, 3} and sees 2 from rank 0
        let im = match ctx.rank() {
            0 => IndexMap::new(vec![0, 2], vec![1], vec![1]).unwrap(),
            _ => IndexMap::new(vec![1, 3], vec![2], vec![0]).unwrap(),
        };
        let renumbered = im.renumber(ctx).unwrap();
        assert_eq!(renumbered.n_global(ctx), 4);
        assert_eq!(renumbered.owner(ctx, 2).unwrap(), 1 - ctx.rank());
        renumbered
    });
    assert_eq!(maps[0].owned_indices(), &[0, 1]);
    assert_eq!(maps[0].ghost_indices(), &[2]);
    assert_eq!(maps[1].owned_indices(), &[2, 3]);
    assert_eq!(maps[1].ghost_indices(), &[1]);
}
