#![allow(dead_code)]
use mesh_loader::algs::communicator::ThreadComm;
use mesh_loader::assembler::{AssemblerHandoff, ElementObject, PartitionedAssembler};
use mesh_loader::mesh_error::MeshLoaderError;
use mesh_loader::model::BulkModel;

/// Two CQUAD4 shells sharing an edge, plus a CBAR hanging off node 6.
///
/// ```text
/// 3 --- 4 --- 6
/// |  1  |  2  |
/// 1 --- 2 --- 5
/// ```
pub const STRIP_JSON: &str = r#"{
    "nodes": [
        { "id": 1, "xyz": [0.0, 0.0, 0.0] },
        { "id": 2, "xyz": [1.0, 0.0, 0.0] },
        { "id": 3, "xyz": [0.0, 1.0, 0.0] },
        { "id": 4, "xyz": [1.0, 1.0, 0.0] },
        { "id": 5, "xyz": [2.0, 0.0, 0.0] },
        { "id": 6, "xyz": [2.0, 1.0, 0.0] },
        { "id": 7, "xyz": [3.0, 1.0, 0.0] }
    ],
    "elements": [
        { "id": 11, "card": "CQUAD4", "pid": 1, "nodes": [1, 2, 4, 3] },
        { "id": 12, "card": "CQUAD4", "pid": 1, "nodes": [2, 5, 6, 4] },
        { "id": 13, "card": "CBAR", "pid": 2, "nodes": [6, 7] }
    ],
    "properties": [
        { "id": 1, "card": "PSHELL", "comment": "$ Femap Property 1 : SKIN" },
        { "id": 2, "card": "PBAR", "comment": "$ Femap Property 2 : STRINGER" }
    ],
    "spcs": [
        { "type": "SPC1", "sid": 1, "components": "123456", "nodes": [1, 3] }
    ]
}"#;

pub fn strip() -> BulkModel {
    BulkModel::from_json(STRIP_JSON).unwrap()
}

/// Assembler that deals elements and nodes out from fixed owner tables.
///
/// Every rank holds the full tables; only the coordinator receives the mesh.
pub struct FixedPartitionAssembler {
    pub rank: usize,
    pub element_owners: Vec<usize>,
    pub node_owners: Vec<usize>,
    pub created: bool,
    pub received_mesh: bool,
    pub num_objects: usize,
}

impl FixedPartitionAssembler {
    pub fn new(rank: usize, element_owners: Vec<usize>, node_owners: Vec<usize>) -> Self {
        Self {
            rank,
            element_owners,
            node_owners,
            created: false,
            received_mesh: false,
            num_objects: 0,
        }
    }
}

impl PartitionedAssembler for FixedPartitionAssembler {
    type Element = &'static str;

    fn create(
        &mut self,
        _vars_per_node: usize,
        handoff: Option<AssemblerHandoff<'_>>,
        objects: &[&ElementObject<&'static str>],
    ) -> Result<(), MeshLoaderError> {
        if let Some(handoff) = handoff {
            if handoff.num_elements() != self.element_owners.len()
                || handoff.num_nodes != self.node_owners.len()
            {
                return Err(MeshLoaderError::Assembler("owner tables do not fit the mesh".into()));
            }
            self.received_mesh = true;
        }
        self.created = true;
        self.num_objects = objects.len();
        Ok(())
    }

    fn element_partition(&self) -> Option<Vec<usize>> {
        self.created.then(|| self.element_owners.clone())
    }

    fn local_node_index(&self, global: usize) -> Option<usize> {
        if self.node_owners.get(global) != Some(&self.rank) {
            return None;
        }
        Some(
            self.node_owners[..global]
                .iter()
                .filter(|&&owner| owner == self.rank)
                .count(),
        )
    }
}

/// Run `f` on `size` ranks of one in-process group, returning per-rank results.
pub fn run_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadComm) -> T + Sync,
{
    let comms = ThreadComm::group(size);
    std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}
