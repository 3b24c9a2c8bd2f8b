//! `MeshLoader`: from an interchange model to a partitioned assembler.
//!
//! A loader is built in two phases. [`MeshLoader::scan`] is purely local and
//! runs identically on every rank: it patches missing properties, numbers
//! nodes, elements and components, builds the reordered connectivity and
//! allocates the element-object slots the caller must fill. After the caller
//! has supplied every object, [`MeshLoader::create_assembler`] synthesizes
//! constraint and mass elements, verifies the mesh, hands it to the assembler
//! and resolves ownership of the partitioned result.
//!
//! Methods marked *collective* must be called on every rank in the same
//! order.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::algs::collective::{broadcast_count, broadcast_indices};
use crate::algs::communicator::Communicator;
use crate::assembler::{AssemblerHandoff, ElementObject, PartitionedAssembler};
use crate::components::{ComponentRegistry, ElementObjectTable, SlotOrigin};
use crate::config::LoaderConfig;
use crate::constraints::synthesize_constraints;
use crate::data::bc::{BoundaryConditionTable, consolidate_boundary_conditions};
use crate::debug_invariants::DebugInvariants;
use crate::distribution::OwnershipResolver;
use crate::mesh_error::MeshLoaderError;
use crate::model::{BulkModel, MaterialCard, PropertyCard};
use crate::numbering::{ModelIdMaps, NOT_FOUND, NodeOrdering};
use crate::topology::ConnectivityTable;

/// Non-fatal conditions found while loading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadDiagnostics {
    /// `(element ID, property ID)` of elements whose property card was missing
    /// and was replaced by a dummy property.
    pub missing_properties: Vec<(i64, i64)>,
    /// Property cards dropped because no element references them.
    pub removed_properties: Vec<i64>,
    /// External node IDs referenced by SPC cards but absent from the model.
    pub skipped_bc_nodes: Vec<i64>,
    /// Set when dummy properties reference a material the model already
    /// defined under the configured dummy material ID.
    pub reused_dummy_material: Option<i64>,
}

impl LoadDiagnostics {
    pub fn has_missing_properties(&self) -> bool {
        !self.missing_properties.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    Scanned,
    Synthesized,
    /// `PartitionedAssembler::create` succeeded; ownership is still pending.
    HandedOff,
    Created,
}

pub struct MeshLoader<C: Communicator, E> {
    comm: C,
    config: LoaderConfig,
    model: BulkModel,
    ids: ModelIdMaps,
    connectivity: ConnectivityTable,
    registry: ComponentRegistry,
    objects: ElementObjectTable<E>,
    num_authored_elements: usize,
    multiplier_nodes: Vec<usize>,
    boundary_conditions: Option<BoundaryConditionTable>,
    resolver: Option<OwnershipResolver>,
    diagnostics: LoadDiagnostics,
    stage: Stage,
}

impl<C: Communicator, E> MeshLoader<C, E> {
    /// Scan `model` and prepare everything that does not need the assembler.
    pub fn scan(comm: C, config: LoaderConfig, mut model: BulkModel) -> Result<Self, MeshLoaderError> {
        config.validate(comm.size())?;
        let is_coordinator = comm.rank() == config.coordinator;
        let mut diagnostics = LoadDiagnostics::default();

        add_missing_properties(&mut model, &config, &mut diagnostics, is_coordinator)?;
        for (pid, elements) in model.property_to_element_ids() {
            if elements.is_empty() {
                model.remove_property(pid);
                diagnostics.removed_properties.push(pid);
            }
        }

        let ids = ModelIdMaps::from_model(&model)?;
        ids.nodes.debug_assert_invariants();
        ids.elements.debug_assert_invariants();
        let connectivity = ConnectivityTable::from_model(&model, &ids)?;
        let registry = ComponentRegistry::classify(&model, &ids)?;
        let objects = ElementObjectTable::with_slots(registry.num_slots());

        if is_coordinator && config.debug_print {
            log::debug!(
                "scanned {} node(s), {} element(s), {} component(s), {} object slot(s)",
                model.num_nodes(),
                model.num_elements(),
                registry.num_components(),
                registry.num_slots()
            );
        }

        Ok(Self {
            num_authored_elements: model.num_elements(),
            comm,
            config,
            model,
            ids,
            connectivity,
            registry,
            objects,
            multiplier_nodes: Vec::new(),
            boundary_conditions: None,
            resolver: None,
            diagnostics,
            stage: Stage::Scanned,
        })
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn model(&self) -> &BulkModel {
        &self.model
    }

    pub fn id_maps(&self) -> &ModelIdMaps {
        &self.ids
    }

    pub fn connectivity(&self) -> &ConnectivityTable {
        &self.connectivity
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &LoadDiagnostics {
        &self.diagnostics
    }

    /// Consolidated SPC table, available once the assembler was created.
    pub fn boundary_conditions(&self) -> Option<&BoundaryConditionTable> {
        self.boundary_conditions.as_ref()
    }

    pub fn is_coordinator(&self) -> bool {
        self.comm.rank() == self.config.coordinator
    }

    pub fn num_components(&self) -> usize {
        self.registry.num_components()
    }

    /// Node count, including multiplier nodes once synthesized.
    pub fn num_nodes(&self) -> usize {
        self.model.num_nodes()
    }

    /// Element count, including synthesized elements once created.
    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn num_authored_elements(&self) -> usize {
        self.num_authored_elements
    }

    /// Label of every component.
    pub fn component_descriptions(&self) -> Vec<String> {
        self.registry.labels()
    }

    /// Distinct element card names of every component.
    pub fn element_descriptions(&self) -> Vec<Vec<String>> {
        self.registry.families()
    }

    /// Component of every authored element, internal element order.
    pub fn element_components(&self) -> &[usize] {
        self.registry.element_components()
    }

    /// Node lists of the elements of one component.
    pub fn connectivity_for_component(
        &self,
        component: usize,
        ordering: NodeOrdering,
    ) -> Result<Vec<Vec<i64>>, MeshLoaderError> {
        let component = self.registry.component(component)?;
        Ok(component
            .elements
            .iter()
            .filter_map(|&element| self.connectivity.element(element))
            .map(|nodes| nodes.iter().map(|&n| self.node_id_in(n, ordering)).collect())
            .collect())
    }

    /// Object slots of one component, one per element family.
    pub fn element_object_nums_for_component(
        &self,
        component: usize,
    ) -> Result<Vec<usize>, MeshLoaderError> {
        Ok(self.registry.component(component)?.object_slots.clone())
    }

    /// Attach the caller's physics object to `(component, index)`.
    pub fn set_element_object(
        &mut self,
        component: usize,
        index: usize,
        object: E,
    ) -> Result<(), MeshLoaderError> {
        let slot = self.registry.slot(component, index)?;
        self.objects.set(slot, ElementObject::User(object))
    }

    pub fn element_object(
        &self,
        component: usize,
        index: usize,
    ) -> Result<Option<&ElementObject<E>>, MeshLoaderError> {
        let slot = self.registry.slot(component, index)?;
        Ok(self.objects.get(slot))
    }

    /// Object used by one element (authored or synthesized).
    pub fn element_object_for_element(
        &self,
        element: i64,
        ordering: NodeOrdering,
    ) -> Option<&ElementObject<E>> {
        let element = match ordering {
            NodeOrdering::Internal => usize::try_from(element).ok()?,
            NodeOrdering::External => self.ids.elements.get(element)?,
        };
        let &slot = self.registry.element_slots().get(element)?;
        self.objects.get(slot)
    }

    /// Coordinates of each requested node; `None` for unknown IDs.
    pub fn node_coordinates(&self, nodes: &[i64], ordering: NodeOrdering) -> Vec<Option<[f64; 3]>> {
        nodes
            .iter()
            .map(|&id| {
                let internal = self.internal_node(id, ordering)?;
                self.model.nodes().get(internal).map(|n| n.xyz)
            })
            .collect()
    }

    /// Flattened `x, y, z` of every node, internal order.
    pub fn xpts(&self) -> Vec<f64> {
        self.model.nodes().iter().flat_map(|n| n.xyz).collect()
    }

    /// Authored element IDs of the given components.
    pub fn global_element_ids_for_components(
        &self,
        components: &[usize],
        ordering: NodeOrdering,
    ) -> Result<Vec<i64>, MeshLoaderError> {
        let mut ids = Vec::new();
        for component in dedup_in_order(components) {
            for &element in &self.registry.component(component)?.elements {
                ids.push(match ordering {
                    NodeOrdering::Internal => element as i64,
                    NodeOrdering::External => {
                        self.ids.elements.external(element).unwrap_or(NOT_FOUND)
                    }
                });
            }
        }
        Ok(ids)
    }

    /// Internal IDs of the synthesized multiplier nodes, all ranks.
    pub fn multiplier_nodes(&self) -> &[usize] {
        &self.multiplier_nodes
    }

    /// Synthesize, verify, hand off and partition. Collective.
    ///
    /// Constraint synthesis happens once; if a later step fails (for example
    /// an unfilled object slot) the caller may fix the cause and call again.
    /// Once the assembler accepted the mesh it is never handed the mesh
    /// again: a retry after an ownership failure only re-runs ownership
    /// resolution against the same assembler.
    pub fn create_assembler<A>(&mut self, assembler: &mut A) -> Result<(), MeshLoaderError>
    where
        A: PartitionedAssembler<Element = E>,
    {
        if self.stage == Stage::Created {
            return Err(MeshLoaderError::AssemblerAlreadyCreated);
        }
        if self.stage == Stage::Scanned {
            self.synthesize()?;
            self.stage = Stage::Synthesized;
        }

        if self.stage == Stage::Synthesized {
            self.hand_off(assembler)?;
            self.stage = Stage::HandedOff;
        }

        let resolver = OwnershipResolver::build(
            &self.comm,
            self.config.coordinator,
            &*assembler,
            self.num_nodes(),
            self.num_elements(),
            &self.multiplier_nodes,
        )?;
        self.resolver = Some(resolver);
        self.stage = Stage::Created;
        Ok(())
    }

    /// Verify the synthesized mesh and pass it to `assembler`. Collective.
    fn hand_off<A>(&mut self, assembler: &mut A) -> Result<(), MeshLoaderError>
    where
        A: PartitionedAssembler<Element = E>,
    {
        self.check_unattached_nodes()?;
        let objects = self.objects.all_filled().map_err(|slot| self.missing_object(slot))?;

        let consolidated = consolidate_boundary_conditions(
            self.model.spcs(),
            &self.ids.nodes,
            self.config.vars_per_node,
        );
        if self.is_coordinator() {
            for node in &consolidated.skipped_nodes {
                log::warn!(
                    "Node ID {node} is referenced by an SPC, but the node was not defined in the model. Skipping SPC."
                );
            }
        }
        self.diagnostics.skipped_bc_nodes = consolidated.skipped_nodes;

        let bc_arrays = consolidated.table.to_arrays();
        let xpts = self.xpts();
        let handoff = self.is_coordinator().then(|| AssemblerHandoff {
            num_nodes: self.model.num_nodes(),
            element_ptr: self.connectivity.offsets(),
            element_conn: self.connectivity.flat(),
            element_object_nums: self.registry.element_slots(),
            bc: &bc_arrays,
            xpts: &xpts,
        });
        assembler.create(self.config.vars_per_node, handoff, &objects)?;
        self.boundary_conditions = Some(consolidated.table);
        Ok(())
    }

    /// Rebuild ownership after the assembler re-partitioned. Collective.
    pub fn refresh_ownership<A>(&mut self, assembler: &A) -> Result<(), MeshLoaderError>
    where
        A: PartitionedAssembler + ?Sized,
    {
        if self.stage != Stage::Created {
            return Err(MeshLoaderError::AssemblerNotCreated);
        }
        let resolver = OwnershipResolver::build(
            &self.comm,
            self.config.coordinator,
            assembler,
            self.num_nodes(),
            self.num_elements(),
            &self.multiplier_nodes,
        )?;
        self.resolver = Some(resolver);
        Ok(())
    }

    pub fn resolver(&self) -> Result<&OwnershipResolver, MeshLoaderError> {
        self.resolver
            .as_ref()
            .ok_or(MeshLoaderError::AssemblerNotCreated)
    }

    /// Local node ID of each global node, `NOT_FOUND` where not owned here.
    pub fn local_node_ids_from_global(
        &self,
        nodes: &[i64],
        ordering: NodeOrdering,
    ) -> Result<Vec<i64>, MeshLoaderError> {
        let resolver = self.resolver()?;
        Ok(nodes
            .iter()
            .map(|&id| {
                self.internal_node(id, ordering)
                    .map_or(NOT_FOUND, |global| resolver.local_node_id(global))
            })
            .collect())
    }

    /// Local element ID of each global element, `NOT_FOUND` where not owned here.
    pub fn local_element_ids_from_global(
        &self,
        elements: &[i64],
        ordering: NodeOrdering,
    ) -> Result<Vec<i64>, MeshLoaderError> {
        let resolver = self.resolver()?;
        Ok(elements
            .iter()
            .map(|&id| {
                let global = match ordering {
                    NodeOrdering::Internal => {
                        usize::try_from(id).ok().filter(|&e| e < self.num_elements())
                    }
                    NodeOrdering::External => self.ids.elements.get(id),
                };
                global.map_or(NOT_FOUND, |global| resolver.local_element_id(global))
            })
            .collect())
    }

    /// Sorted unique nodes of the given components. Collective.
    ///
    /// The coordinator computes the set and broadcasts it, so every rank
    /// receives the same list.
    pub fn global_node_ids_for_components(
        &self,
        components: &[usize],
        ordering: NodeOrdering,
    ) -> Result<Vec<i64>, MeshLoaderError> {
        for &component in components {
            self.registry.component(component)?;
        }
        let mut nodes = Vec::new();
        if self.is_coordinator() {
            for component in dedup_in_order(components) {
                for &element in &self.registry.component(component)?.elements {
                    if let Some(conn) = self.connectivity.element(element) {
                        nodes.extend_from_slice(conn);
                    }
                }
            }
            nodes.sort_unstable();
            nodes.dedup();
        }
        broadcast_indices(&self.comm, self.config.coordinator, &mut nodes)?;

        let mut ids: Vec<i64> = nodes.iter().map(|&n| self.node_id_in(n, ordering)).collect();
        if ordering == NodeOrdering::External {
            ids.sort_unstable();
        }
        Ok(ids)
    }

    /// Local IDs of the nodes of the given components owned here. Collective.
    pub fn local_node_ids_for_components(
        &self,
        components: &[usize],
    ) -> Result<Vec<usize>, MeshLoaderError> {
        let resolver = self.resolver()?;
        let globals = self.global_node_ids_for_components(components, NodeOrdering::Internal)?;
        Ok(globals
            .iter()
            .filter_map(|&global| usize::try_from(resolver.local_node_id(global as usize)).ok())
            .collect())
    }

    /// Local IDs of the elements of the given components owned here, ascending.
    pub fn local_element_ids_for_components(
        &self,
        components: &[usize],
    ) -> Result<Vec<usize>, MeshLoaderError> {
        let resolver = self.resolver()?;
        let mut locals = Vec::new();
        for component in dedup_in_order(components) {
            for &element in &self.registry.component(component)?.elements {
                if let Ok(local) = usize::try_from(resolver.local_element_id(element)) {
                    locals.push(local);
                }
            }
        }
        locals.sort_unstable();
        Ok(locals)
    }

    /// Local IDs of the multiplier nodes owned here.
    pub fn local_multiplier_node_ids(&self) -> Result<&[usize], MeshLoaderError> {
        Ok(self.resolver()?.owned_multiplier_nodes())
    }

    pub fn global_to_local_node_map(&self) -> Result<&HashMap<usize, usize>, MeshLoaderError> {
        Ok(self.resolver()?.global_to_local_node_map())
    }

    pub fn global_to_local_element_map(&self) -> Result<&HashMap<usize, usize>, MeshLoaderError> {
        Ok(self.resolver()?.global_to_local_element_map())
    }

    pub fn num_owned_nodes(&self) -> Result<usize, MeshLoaderError> {
        Ok(self.resolver()?.num_owned_nodes())
    }

    /// Global node ID of a local node on this rank.
    pub fn global_node_id(&self, local: usize) -> Result<Option<usize>, MeshLoaderError> {
        Ok(self.resolver()?.global_node_id(local))
    }

    pub fn global_element_id(&self, local: usize) -> Result<Option<usize>, MeshLoaderError> {
        Ok(self.resolver()?.global_element_id(local))
    }

    fn synthesize(&mut self) -> Result<(), MeshLoaderError> {
        let outcome = synthesize_constraints(
            &mut self.model,
            &mut self.ids,
            &mut self.connectivity,
            self.config.vars_per_node,
        )?;
        let debug = self.is_coordinator() && self.config.debug_print;
        for entry in outcome.elements {
            let slot = self.registry.push_synthesized(entry.element);
            self.objects.ensure_slots(self.registry.num_slots());
            if debug {
                log::debug!(
                    "{} {} -> element {} (slot {slot})",
                    entry.object.family(),
                    entry.eid,
                    entry.element
                );
            }
            self.objects.set(slot, ElementObject::Synthesized(entry.object))?;
        }
        self.multiplier_nodes = outcome.multiplier_nodes;
        self.connectivity.validate_nodes(self.model.num_nodes())?;
        self.connectivity.debug_assert_invariants();
        self.ids.nodes.debug_assert_invariants();
        Ok(())
    }

    /// Raise on every rank if the coordinator finds nodes used by no element.
    fn check_unattached_nodes(&self) -> Result<(), MeshLoaderError> {
        let mut count = 0;
        if self.is_coordinator() {
            let mut attached = vec![false; self.model.num_nodes()];
            for &node in self.connectivity.flat() {
                if let Some(flag) = attached.get_mut(node) {
                    *flag = true;
                }
            }
            for (internal, _) in attached.iter().enumerate().filter(|(_, a)| !**a) {
                if count < self.config.max_reported_unattached {
                    log::warn!(
                        "Node ID {} is not attached to any element in the model. \
                         Please remove this node from the mesh and try again.",
                        self.ids.nodes.external(internal).unwrap_or(NOT_FOUND)
                    );
                }
                count += 1;
            }
        }
        let count = broadcast_count(&self.comm, self.config.coordinator, count)?;
        if count > 0 {
            return Err(MeshLoaderError::UnattachedNodes { count });
        }
        Ok(())
    }

    fn missing_object(&self, slot: usize) -> MeshLoaderError {
        match self.registry.slot_origin(slot) {
            Some(SlotOrigin::Component { component, family }) => {
                MeshLoaderError::MissingElementObject {
                    slot,
                    component: *component,
                    family: family.clone(),
                }
            }
            _ => MeshLoaderError::InvariantViolation(format!(
                "synthesized object slot {slot} is empty"
            )),
        }
    }

    fn internal_node(&self, id: i64, ordering: NodeOrdering) -> Option<usize> {
        match ordering {
            NodeOrdering::Internal => usize::try_from(id).ok().filter(|&n| n < self.num_nodes()),
            NodeOrdering::External => self.ids.nodes.get(id),
        }
    }

    fn node_id_in(&self, internal: usize, ordering: NodeOrdering) -> i64 {
        match ordering {
            NodeOrdering::Internal => internal as i64,
            NodeOrdering::External => self.ids.nodes.external(internal).unwrap_or(NOT_FOUND),
        }
    }
}

/// Give every element whose property card is missing a dummy `PBAR`.
fn add_missing_properties(
    model: &mut BulkModel,
    config: &LoaderConfig,
    diagnostics: &mut LoadDiagnostics,
    is_coordinator: bool,
) -> Result<(), MeshLoaderError> {
    let missing: Vec<(i64, i64)> = model
        .elements()
        .iter()
        .filter(|e| !model.has_property(e.pid))
        .map(|e| (e.id, e.pid))
        .collect();
    let dummy = &config.dummy_material;
    if !missing.is_empty() && model.has_material(dummy.mid) {
        if is_coordinator {
            log::warn!(
                "Material ID {} already exists in the model. \
                 Dummy properties will reference it instead of a default MAT1.",
                dummy.mid
            );
        }
        diagnostics.reused_dummy_material = Some(dummy.mid);
    }
    for &(eid, pid) in &missing {
        if !model.has_material(dummy.mid) {
            model.add_material(MaterialCard {
                id: dummy.mid,
                e: dummy.e,
                g: dummy.g,
                nu: dummy.nu,
            })?;
        }
        if !model.has_property(pid) {
            let mut property = PropertyCard::new(pid, "PBAR");
            property.material = Some(dummy.mid);
            model.add_property(property)?;
        }
        if is_coordinator {
            log::warn!(
                "Element ID {eid} references undefined property ID {pid}. \
                 A caller-supplied element object will be required for it."
            );
        }
    }
    diagnostics.missing_properties = missing;
    Ok(())
}

fn dedup_in_order(components: &[usize]) -> Vec<usize> {
    components.iter().copied().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::assembler::SerialAssembler;
    use crate::model::{ElementCard, MassCard, RigidElementCard, SpcCard};

    fn plate() -> BulkModel {
        let mut model = BulkModel::new();
        let coords = [
            (101, [0.0, 0.0, 0.0]),
            (102, [1.0, 0.0, 0.0]),
            (103, [0.0, 1.0, 0.0]),
            (104, [1.0, 1.0, 0.0]),
            (105, [2.0, 0.0, 0.0]),
            (106, [2.0, 1.0, 0.0]),
        ];
        for (id, xyz) in coords {
            model.add_grid(id, xyz).unwrap();
        }
        model.add_property(PropertyCard::new(7, "PSHELL")).unwrap();
        model.add_property(PropertyCard::new(8, "PSHELL")).unwrap();
        model
            .add_element(ElementCard::new(1, "CQUAD4", 7, vec![101, 102, 104, 103]))
            .unwrap();
        model
            .add_element(ElementCard::new(2, "CQUAD4", 7, vec![102, 105, 106, 104]))
            .unwrap();
        model
    }

    fn loader(model: BulkModel) -> MeshLoader<NoComm, &'static str> {
        MeshLoader::scan(NoComm, LoaderConfig::default(), model).unwrap()
    }

    #[test]
    fn scan_drops_unreferenced_properties() {
        let loader = loader(plate());
        assert_eq!(loader.num_components(), 1);
        assert_eq!(loader.diagnostics().removed_properties, vec![8]);
        assert_eq!(loader.element_descriptions(), vec![vec!["CQUAD4".to_string()]]);
        assert_eq!(loader.component_descriptions(), vec!["Property group 7".to_string()]);
    }

    #[test]
    fn missing_property_gets_dummy_card() {
        let mut model = plate();
        model
            .add_element(ElementCard::new(3, "CBAR", 55, vec![105, 106]))
            .unwrap();
        let loader = loader(model);
        assert_eq!(loader.diagnostics().missing_properties, vec![(3, 55)]);
        let property = loader.model().property(55).unwrap();
        assert_eq!(property.card, "PBAR");
        assert_eq!(property.material, Some(1));
        assert!(loader.model().has_material(1));
        assert_eq!(loader.num_components(), 2);
    }

    #[test]
    fn component_connectivity_in_both_orderings() {
        let loader = loader(plate());
        let internal = loader
            .connectivity_for_component(0, NodeOrdering::Internal)
            .unwrap();
        assert_eq!(internal, vec![vec![0, 1, 2, 3], vec![1, 4, 3, 5]]);
        let external = loader
            .connectivity_for_component(0, NodeOrdering::External)
            .unwrap();
        assert_eq!(external[0], vec![101, 102, 103, 104]);
        assert!(loader.connectivity_for_component(3, NodeOrdering::Internal).is_err());
    }

    #[test]
    fn queries_before_creation_are_rejected() {
        let loader = loader(plate());
        assert_eq!(
            loader.local_node_ids_from_global(&[0], NodeOrdering::Internal),
            Err(MeshLoaderError::AssemblerNotCreated)
        );
        assert!(loader.num_owned_nodes().is_err());
    }

    #[test]
    fn create_requires_every_object() {
        let mut loader = loader(plate());
        let mut assembler = SerialAssembler::new();
        let err = loader.create_assembler(&mut assembler).unwrap_err();
        assert_eq!(
            err,
            MeshLoaderError::MissingElementObject {
                slot: 0,
                component: 0,
                family: "CQUAD4".into()
            }
        );

        loader.set_element_object(0, 0, "shell").unwrap();
        loader.create_assembler(&mut assembler).unwrap();
        assert_eq!(
            loader.create_assembler(&mut assembler),
            Err(MeshLoaderError::AssemblerAlreadyCreated)
        );
    }

    #[test]
    fn serial_creation_hands_off_everything() {
        let mut model = plate();
        model.add_rigid_element(RigidElementCard::Rbe2 {
            eid: 50,
            independent_node: 101,
            dependent_nodes: vec![105],
            components: "123456".into(),
        });
        model.add_mass(MassCard::Conm2 {
            eid: 60,
            node: 106,
            mass: 4.0,
            inertia: [0.0; 6],
        });
        model
            .add_spc(SpcCard::Spc1 {
                sid: 1,
                components: "123".into(),
                nodes: vec![101, 999],
            })
            .unwrap();
        let mut loader = loader(model);
        loader.set_element_object(0, 0, "shell").unwrap();
        let mut assembler = SerialAssembler::new();
        loader.create_assembler(&mut assembler).unwrap();

        let input = assembler.input().unwrap();
        assert_eq!(input.num_nodes, 7);
        assert_eq!(input.num_elements(), 4);
        assert_eq!(input.element_object_nums, vec![0, 0, 1, 2]);
        assert_eq!(&input.element_conn[8..], &[0, 4, 6, 5]);
        assert_eq!(&input.xpts[18..], &[2.0, 0.0, 0.0]);
        assert_eq!(input.bc.nodes, vec![0]);
        assert_eq!(loader.diagnostics().skipped_bc_nodes, vec![999]);
        assert!(assembler.objects()[1].is_synthesized());

        assert_eq!(loader.multiplier_nodes(), &[6]);
        assert_eq!(loader.local_multiplier_node_ids().unwrap(), &[6]);
        assert_eq!(loader.num_owned_nodes().unwrap(), 7);
        assert_eq!(
            loader
                .local_element_ids_from_global(&[60, 1, 5], NodeOrdering::External)
                .unwrap(),
            vec![3, 0, NOT_FOUND]
        );
        let object = loader.element_object_for_element(50, NodeOrdering::External);
        assert_eq!(object.and_then(|o| o.as_synthesized()).map(|s| s.family()), Some("RBE2"));
    }

    #[test]
    fn component_node_sets_are_sorted_and_unique() {
        let mut loader = loader(plate());
        loader.set_element_object(0, 0, "shell").unwrap();
        loader.create_assembler(&mut SerialAssembler::new()).unwrap();
        assert_eq!(
            loader
                .global_node_ids_for_components(&[0, 0], NodeOrdering::Internal)
                .unwrap(),
            vec![0, 1, 2, 3, 4, 5]
        );
        assert_eq!(
            loader
                .global_node_ids_for_components(&[0], NodeOrdering::External)
                .unwrap(),
            vec![101, 102, 103, 104, 105, 106]
        );
        assert_eq!(loader.local_element_ids_for_components(&[0]).unwrap(), vec![0, 1]);
        assert_eq!(loader.local_node_ids_for_components(&[0]).unwrap().len(), 6);
    }

    /// Serial assembler whose partition only becomes available on request.
    struct LatePartition {
        inner: SerialAssembler<&'static str>,
        ready: bool,
        creates: usize,
    }

    impl PartitionedAssembler for LatePartition {
        type Element = &'static str;

        fn create(
            &mut self,
            vars_per_node: usize,
            handoff: Option<AssemblerHandoff<'_>>,
            objects: &[&ElementObject<&'static str>],
        ) -> Result<(), MeshLoaderError> {
            self.creates += 1;
            self.inner.create(vars_per_node, handoff, objects)
        }

        fn element_partition(&self) -> Option<Vec<usize>> {
            if self.ready {
                self.inner.element_partition()
            } else {
                None
            }
        }

        fn local_node_index(&self, global: usize) -> Option<usize> {
            self.inner.local_node_index(global)
        }
    }

    #[test]
    fn ownership_retry_does_not_hand_off_twice() {
        let mut loader = loader(plate());
        loader.set_element_object(0, 0, "shell").unwrap();
        let mut assembler = LatePartition {
            inner: SerialAssembler::new(),
            ready: false,
            creates: 0,
        };
        assert_eq!(
            loader.create_assembler(&mut assembler),
            Err(MeshLoaderError::MissingElementPartition)
        );
        assert!(loader.resolver().is_err());

        assembler.ready = true;
        loader.create_assembler(&mut assembler).unwrap();
        assert_eq!(assembler.creates, 1);
        assert_eq!(loader.num_owned_nodes().unwrap(), 6);
    }

    #[test]
    fn existing_material_is_reused_for_dummy_properties() {
        let mut model = plate();
        model
            .add_material(MaterialCard {
                id: 1,
                e: 210.0,
                g: 80.0,
                nu: 0.29,
            })
            .unwrap();
        model
            .add_element(ElementCard::new(3, "CBAR", 55, vec![105, 106]))
            .unwrap();
        let patched = loader(model);
        assert_eq!(patched.diagnostics().reused_dummy_material, Some(1));
        assert_eq!(patched.model().materials().len(), 1);
        assert_eq!(patched.model().materials()[0].e, 210.0);
        assert_eq!(patched.model().property(55).and_then(|p| p.material), Some(1));

        let clean = loader(plate());
        assert_eq!(clean.diagnostics().reused_dummy_material, None);
    }
}
