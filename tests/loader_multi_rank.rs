mod util;

use mesh_loader::config::LoaderConfig;
use mesh_loader::mesh_error::MeshLoaderError;
use mesh_loader::prelude::*;
use util::{FixedPartitionAssembler, run_ranks, strip};

type Loader = MeshLoader<ThreadComm, &'static str>;

fn scan_strip(comm: ThreadComm) -> Loader {
    let mut loader = MeshLoader::scan(comm, LoaderConfig::default(), strip()).unwrap();
    loader.set_element_object(0, 0, "shell").unwrap();
    loader.set_element_object(1, 0, "beam").unwrap();
    loader
}

#[test]
fn two_ranks_agree_on_ownership() {
    let results = run_ranks(2, |comm| {
        let rank = comm.rank();
        let mut loader = scan_strip(comm);
        let mut assembler =
            FixedPartitionAssembler::new(rank, vec![0, 1, 1], vec![0, 0, 0, 1, 1, 1, 1]);
        loader.create_assembler(&mut assembler).unwrap();

        let elements = loader
            .local_element_ids_from_global(&[11, 12, 13], NodeOrdering::External)
            .unwrap();
        let beam_nodes = loader
            .global_node_ids_for_components(&[1], NodeOrdering::External)
            .unwrap();
        let local_beam_nodes = loader.local_node_ids_for_components(&[1]).unwrap();
        (
            assembler.received_mesh,
            loader.num_owned_nodes().unwrap(),
            elements,
            beam_nodes,
            local_beam_nodes,
        )
    });

    let (mesh0, owned0, elements0, beam0, local0) = &results[0];
    let (mesh1, owned1, elements1, beam1, local1) = &results[1];
    assert!(*mesh0 && !*mesh1);
    assert_eq!((*owned0, *owned1), (3, 4));
    assert_eq!(elements0, &vec![0, NOT_FOUND, NOT_FOUND]);
    assert_eq!(elements1, &vec![NOT_FOUND, 0, 1]);
    assert_eq!(beam0, &vec![6, 7]);
    assert_eq!(beam0, beam1);
    assert!(local0.is_empty());
    assert_eq!(local1, &vec![2, 3]);
}

#[test]
fn unattached_nodes_fail_on_every_rank() {
    let errors = run_ranks(3, |comm| {
        let rank = comm.rank();
        let mut model = strip();
        model.add_grid(99, [5.0, 5.0, 5.0]).unwrap();
        let mut loader: Loader = MeshLoader::scan(comm, LoaderConfig::default(), model).unwrap();
        loader.set_element_object(0, 0, "shell").unwrap();
        loader.set_element_object(1, 0, "beam").unwrap();
        let mut assembler = FixedPartitionAssembler::new(rank, vec![0; 3], vec![0; 8]);
        let err = loader.create_assembler(&mut assembler).unwrap_err();
        (err, assembler.created)
    });
    for (err, created) in errors {
        assert_eq!(err, MeshLoaderError::UnattachedNodes { count: 1 });
        assert!(!created);
    }
}

#[test]
fn doubly_claimed_node_fails_on_every_rank() {
    let errors = run_ranks(2, |comm| {
        let rank = comm.rank();
        let mut loader = scan_strip(comm);
        // rank 1 also claims the last node, which rank 0 owns
        let node_owners = if rank == 0 {
            vec![0; 7]
        } else {
            vec![0, 0, 0, 0, 0, 0, 1]
        };
        let mut assembler = FixedPartitionAssembler::new(rank, vec![0, 0, 0], node_owners);
        loader.create_assembler(&mut assembler).unwrap_err()
    });
    assert_eq!(errors[0], errors[1]);
    assert!(matches!(errors[0], MeshLoaderError::Assembler(_)));
}

#[test]
fn coordinator_can_be_any_rank() {
    let results = run_ranks(2, |comm| {
        let rank = comm.rank();
        let config = LoaderConfig {
            coordinator: 1,
            ..Default::default()
        };
        let mut loader: Loader = MeshLoader::scan(comm, config, strip()).unwrap();
        loader.set_element_object(0, 0, "shell").unwrap();
        loader.set_element_object(1, 0, "beam").unwrap();
        let mut assembler = FixedPartitionAssembler::new(rank, vec![1, 1, 0], vec![1; 7]);
        loader.create_assembler(&mut assembler).unwrap();
        (
            assembler.received_mesh,
            loader.num_owned_nodes().unwrap(),
            loader.local_element_ids_for_components(&[0, 1]).unwrap(),
        )
    });
    assert_eq!(results[0], (false, 0, vec![0]));
    assert_eq!(results[1], (true, 7, vec![0, 1]));
}
