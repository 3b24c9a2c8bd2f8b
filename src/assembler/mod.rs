//! Outbound interface to the distributed assembler.
//!
//! The assembler owns partitioning. The loader hands it the global mesh on
//! the coordinator rank only (every other rank passes `None`), then asks it
//! which rank owns each element and which local index each owned node got.
//! [`PartitionedAssembler::create`] is collective: every rank calls it
//! exactly once per creation, in the same position of the call sequence.

use serde::{Deserialize, Serialize};

use crate::constraints::SynthesizedElement;
use crate::data::BoundaryConditionArrays;
use crate::mesh_error::MeshLoaderError;

/// Physics object attached to an object slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementObject<E> {
    /// Supplied by the caller for an authored (component, family) pair.
    User(E),
    /// Built by the loader for a rigid or mass element.
    Synthesized(SynthesizedElement),
}

impl<E> ElementObject<E> {
    pub fn as_user(&self) -> Option<&E> {
        match self {
            ElementObject::User(object) => Some(object),
            ElementObject::Synthesized(_) => None,
        }
    }

    pub fn as_synthesized(&self) -> Option<&SynthesizedElement> {
        match self {
            ElementObject::User(_) => None,
            ElementObject::Synthesized(object) => Some(object),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, ElementObject::Synthesized(_))
    }
}

/// Global mesh, borrowed from the loader for the duration of `create`.
#[derive(Clone, Copy, Debug)]
pub struct AssemblerHandoff<'a> {
    pub num_nodes: usize,
    /// Offsets into `element_conn`, length `num_elements + 1`.
    pub element_ptr: &'a [usize],
    pub element_conn: &'a [usize],
    /// Object slot of every element.
    pub element_object_nums: &'a [usize],
    pub bc: &'a BoundaryConditionArrays,
    /// Flattened `x, y, z` per node, internal order.
    pub xpts: &'a [f64],
}

impl AssemblerHandoff<'_> {
    pub fn num_elements(&self) -> usize {
        self.element_ptr.len().saturating_sub(1)
    }

    pub fn to_input(&self) -> AssemblerInput {
        AssemblerInput {
            num_nodes: self.num_nodes,
            element_ptr: self.element_ptr.to_vec(),
            element_conn: self.element_conn.to_vec(),
            element_object_nums: self.element_object_nums.to_vec(),
            bc: self.bc.clone(),
            xpts: self.xpts.to_vec(),
        }
    }
}

/// Owned copy of a handoff, e.g. for an assembler that defers its setup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblerInput {
    pub num_nodes: usize,
    pub element_ptr: Vec<usize>,
    pub element_conn: Vec<usize>,
    pub element_object_nums: Vec<usize>,
    pub bc: BoundaryConditionArrays,
    pub xpts: Vec<f64>,
}

impl AssemblerInput {
    pub fn num_elements(&self) -> usize {
        self.element_ptr.len().saturating_sub(1)
    }
}

/// Contract the loader needs from a partitioning assembler.
pub trait PartitionedAssembler {
    /// Caller-supplied element physics type.
    type Element;

    /// Build the distributed assembler. Collective.
    ///
    /// `handoff` is `Some` on the coordinator and `None` elsewhere. `objects`
    /// is indexed by object slot and is identical on every rank.
    fn create(
        &mut self,
        vars_per_node: usize,
        handoff: Option<AssemblerHandoff<'_>>,
        objects: &[&ElementObject<Self::Element>],
    ) -> Result<(), MeshLoaderError>;

    /// Owning rank of every global element. Required on the coordinator.
    fn element_partition(&self) -> Option<Vec<usize>>;

    /// Local index of a global node owned by this rank.
    fn local_node_index(&self, global: usize) -> Option<usize>;
}

/// Single-rank assembler: owns everything and keeps a copy of its input.
#[derive(Clone, Debug)]
pub struct SerialAssembler<E> {
    input: Option<AssemblerInput>,
    objects: Vec<ElementObject<E>>,
    vars_per_node: usize,
}

impl<E> Default for SerialAssembler<E> {
    fn default() -> Self {
        Self {
            input: None,
            objects: Vec::new(),
            vars_per_node: 0,
        }
    }
}

impl<E> SerialAssembler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> Option<&AssemblerInput> {
        self.input.as_ref()
    }

    pub fn objects(&self) -> &[ElementObject<E>] {
        &self.objects
    }

    pub fn vars_per_node(&self) -> usize {
        self.vars_per_node
    }
}

impl<E: Clone> PartitionedAssembler for SerialAssembler<E> {
    type Element = E;

    fn create(
        &mut self,
        vars_per_node: usize,
        handoff: Option<AssemblerHandoff<'_>>,
        objects: &[&ElementObject<E>],
    ) -> Result<(), MeshLoaderError> {
        let handoff = handoff.ok_or_else(|| {
            MeshLoaderError::Assembler("serial assembler needs the global mesh".into())
        })?;
        if let Some(&slot) = handoff
            .element_object_nums
            .iter()
            .find(|&&slot| slot >= objects.len())
        {
            return Err(MeshLoaderError::Assembler(format!(
                "element references object slot {slot} but only {} objects were supplied",
                objects.len()
            )));
        }
        self.vars_per_node = vars_per_node;
        self.input = Some(handoff.to_input());
        self.objects = objects.iter().map(|&object| object.clone()).collect();
        Ok(())
    }

    fn element_partition(&self) -> Option<Vec<usize>> {
        self.input.as_ref().map(|input| vec![0; input.num_elements()])
    }

    fn local_node_index(&self, global: usize) -> Option<usize> {
        let input = self.input.as_ref()?;
        (global < input.num_nodes).then_some(global)
    }
}
