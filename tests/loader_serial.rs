mod util;

use mesh_loader::assembler::SerialAssembler;
use mesh_loader::config::LoaderConfig;
use mesh_loader::constraints::SynthesizedElement;
use mesh_loader::mesh_error::MeshLoaderError;
use mesh_loader::model::{BulkModel, ElementCard, MassCard, RigidElementCard, WeightGroup};
use mesh_loader::prelude::*;
use util::strip;

fn scan(model: BulkModel) -> MeshLoader<NoComm, &'static str> {
    MeshLoader::scan(NoComm, LoaderConfig::default(), model).unwrap()
}

fn fill_objects(loader: &mut MeshLoader<NoComm, &'static str>) {
    for component in 0..loader.num_components() {
        let families = loader.element_object_nums_for_component(component).unwrap();
        for index in 0..families.len() {
            loader.set_element_object(component, index, "user").unwrap();
        }
    }
}

#[test]
fn components_follow_property_comments() {
    let loader = scan(strip());
    assert_eq!(loader.num_components(), 2);
    assert_eq!(loader.component_descriptions(), vec!["SKIN", "STRINGER"]);
    assert_eq!(
        loader.element_descriptions(),
        vec![vec!["CQUAD4".to_string()], vec!["CBAR".to_string()]]
    );
    assert_eq!(loader.element_components(), &[0, 0, 1]);
    assert_eq!(loader.element_object_nums_for_component(1).unwrap(), vec![1]);
}

#[test]
fn constraints_and_masses_reach_the_assembler() {
    let mut model = strip();
    model.add_rigid_element(RigidElementCard::Rbe3 {
        eid: 20,
        dependent_node: 7,
        dependent_components: "123".into(),
        weight_groups: vec![WeightGroup {
            weight: 1.0,
            components: "123".into(),
            nodes: vec![5, 6],
        }],
    });
    let mut matrix = [[0.0; 6]; 6];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] = 2.0;
    }
    model.add_mass(MassCard::Conm1 {
        eid: 21,
        node: 1,
        matrix,
    });

    let mut loader = scan(model);
    fill_objects(&mut loader);
    let mut assembler = SerialAssembler::new();
    loader.create_assembler(&mut assembler).unwrap();

    let input = assembler.input().unwrap();
    assert_eq!(input.num_nodes, 8);
    assert_eq!(input.element_object_nums, vec![0, 0, 1, 2, 3]);
    assert_eq!(input.element_ptr, vec![0, 4, 8, 10, 14, 15]);
    assert_eq!(&input.element_conn[10..], &[6, 4, 5, 7, 0]);
    assert_eq!(input.bc.nodes, vec![0, 2]);
    assert_eq!(input.bc.ptr, vec![0, 6, 12]);
    assert_eq!(input.xpts.len(), 24);

    assert_eq!(loader.num_authored_elements(), 3);
    assert_eq!(loader.num_elements(), 5);
    assert_eq!(loader.multiplier_nodes(), &[7]);
    assert_eq!(
        loader.node_coordinates(&[8, 99], NodeOrdering::External),
        vec![Some([3.0, 1.0, 0.0]), None]
    );

    let rbe3 = loader
        .element_object_for_element(20, NodeOrdering::External)
        .and_then(|object| object.as_synthesized())
        .unwrap();
    match rbe3 {
        SynthesizedElement::Rbe3 {
            num_nodes,
            weights,
            dependent_dofs,
            independent_dofs,
        } => {
            assert_eq!(*num_nodes, 4);
            assert_eq!(weights, &vec![1.0, 1.0]);
            assert_eq!(dependent_dofs.len(), 6);
            assert_eq!(independent_dofs.len(), 12);
        }
        other => panic!("unexpected object {other:?}"),
    }
    let conm1 = loader.element_object_for_element(4, NodeOrdering::Internal);
    assert_eq!(
        conm1.and_then(|o| o.as_synthesized()).map(|s| s.family()),
        Some("CONM1")
    );
}

#[test]
fn element_ids_by_component_keep_request_order() {
    let loader = scan(strip());
    assert_eq!(
        loader
            .global_element_ids_for_components(&[1, 0, 1], NodeOrdering::External)
            .unwrap(),
        vec![13, 11, 12]
    );
    assert_eq!(
        loader
            .global_element_ids_for_components(&[0], NodeOrdering::Internal)
            .unwrap(),
        vec![0, 1]
    );
    assert_eq!(
        loader.global_element_ids_for_components(&[2], NodeOrdering::Internal),
        Err(MeshLoaderError::UnknownComponent(2))
    );
}

#[test]
fn unattached_node_blocks_creation_until_fixed() {
    let mut model = strip();
    model.add_grid(50, [9.0, 9.0, 9.0]).unwrap();
    let mut loader = scan(model);
    fill_objects(&mut loader);
    let mut assembler = SerialAssembler::new();
    for _ in 0..2 {
        assert_eq!(
            loader.create_assembler(&mut assembler),
            Err(MeshLoaderError::UnattachedNodes { count: 1 })
        );
    }
    assert!(assembler.input().is_none());
}

#[test]
fn unsupported_rigid_card_is_fatal() {
    let mut model = strip();
    model.add_rigid_element(RigidElementCard::Unsupported {
        eid: 30,
        card: "RBAR".into(),
    });
    let mut loader = scan(model);
    fill_objects(&mut loader);
    assert_eq!(
        loader.create_assembler(&mut SerialAssembler::new()),
        Err(MeshLoaderError::UnsupportedRigidElement {
            eid: 30,
            card: "RBAR".into()
        })
    );
}

#[test]
fn missing_property_is_patched_and_reported() {
    let mut model = strip();
    model
        .add_element(ElementCard::new(14, "CBAR", 9, vec![5, 7]))
        .unwrap();
    let mut loader = scan(model);
    assert_eq!(loader.diagnostics().missing_properties, vec![(14, 9)]);
    assert_eq!(loader.component_descriptions()[2], "Property group 9");

    fill_objects(&mut loader);
    loader.create_assembler(&mut SerialAssembler::new()).unwrap();
    assert_eq!(loader.num_owned_nodes().unwrap(), 7);
}

#[test]
fn malformed_json_is_rejected() {
    let err = BulkModel::from_json(r#"{ "nodes": [ { "id": 1 } ] }"#).unwrap_err();
    assert!(matches!(err, MeshLoaderError::MalformedModel(_)));
}

#[test]
fn local_queries_in_serial_are_identity() {
    let mut loader = scan(strip());
    fill_objects(&mut loader);
    loader.create_assembler(&mut SerialAssembler::new()).unwrap();
    assert_eq!(
        loader
            .local_node_ids_from_global(&[7, 1, 42], NodeOrdering::External)
            .unwrap(),
        vec![6, 0, NOT_FOUND]
    );
    assert_eq!(loader.local_node_ids_for_components(&[1]).unwrap(), vec![5, 6]);
    assert_eq!(loader.local_element_ids_for_components(&[1, 0]).unwrap(), vec![0, 1, 2]);
    assert_eq!(loader.global_node_id(3).unwrap(), Some(3));
    assert_eq!(loader.global_to_local_element_map().unwrap().len(), 3);
    assert!(loader.local_multiplier_node_ids().unwrap().is_empty());
    assert_eq!(loader.boundary_conditions().map(|bc| bc.num_constraints()), Some(12));
}
