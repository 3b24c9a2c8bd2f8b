//! Dense compaction of a sparse external ID space.
//!
//! An [`IdMap`] is two structures serving opposite directions: a sparse hash
//! map for external → internal translation (arbitrary authored keys) and a
//! dense table for internal → external lookups (compact keys). Internal IDs
//! are handed out arena-style: in enumeration order at construction, then
//! strictly increasing as entities are appended. They are never reused.

use hashbrown::HashMap;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{EntityKind, MeshLoaderError};

/// Sentinel returned for IDs that are unknown (or not owned locally).
pub const NOT_FOUND: i64 = -1;

#[derive(Clone, Debug)]
pub struct IdMap {
    kind: EntityKind,
    to_internal: HashMap<i64, usize>,
    to_external: Vec<i64>,
}

impl IdMap {
    /// Empty map for one entity class.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            to_internal: HashMap::new(),
            to_external: Vec::new(),
        }
    }

    /// Assign internal ID `i` to the `i`-th external ID of `external_ids`.
    ///
    /// The enumeration order is the model's natural order and is *not*
    /// sorted. A repeated external ID is rejected.
    pub fn compact<I>(kind: EntityKind, external_ids: I) -> Result<Self, MeshLoaderError>
    where
        I: IntoIterator<Item = i64>,
    {
        let iter = external_ids.into_iter();
        let (lower, _) = iter.size_hint();
        let mut map = Self {
            kind,
            to_internal: HashMap::with_capacity(lower),
            to_external: Vec::with_capacity(lower),
        };
        for id in iter {
            map.push(id)?;
        }
        Ok(map)
    }

    /// Append one external ID, returning its new internal ID.
    pub fn push(&mut self, external: i64) -> Result<usize, MeshLoaderError> {
        if self.to_internal.contains_key(&external) {
            return Err(MeshLoaderError::DuplicateId {
                kind: self.kind,
                id: external,
            });
        }
        let internal = self.to_external.len();
        self.to_internal.insert(external, internal);
        self.to_external.push(external);
        Ok(internal)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.to_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_external.is_empty()
    }

    /// Internal ID for `external`, or `None` if unknown.
    pub fn get(&self, external: i64) -> Option<usize> {
        self.to_internal.get(&external).copied()
    }

    /// Internal ID for `external`, or [`NOT_FOUND`].
    pub fn translate(&self, external: i64) -> i64 {
        self.get(external).map_or(NOT_FOUND, |i| i as i64)
    }

    /// Translate any (possibly nested) collection of external IDs.
    pub fn translate_all<T: Translate + ?Sized>(&self, ids: &T) -> T::Output {
        ids.translate_with(self)
    }

    /// External ID for a dense internal ID.
    pub fn external(&self, internal: usize) -> Option<i64> {
        self.to_external.get(internal).copied()
    }

    /// External IDs in internal order.
    pub fn external_ids(&self) -> &[i64] {
        &self.to_external
    }
}

impl DebugInvariants for IdMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "IdMap");
    }

    fn validate_invariants(&self) -> Result<(), MeshLoaderError> {
        if self.to_internal.len() != self.to_external.len() {
            return Err(MeshLoaderError::InvariantViolation(format!(
                "{} map has {} forward and {} reverse entries",
                self.kind,
                self.to_internal.len(),
                self.to_external.len()
            )));
        }
        for (internal, &external) in self.to_external.iter().enumerate() {
            if self.to_internal.get(&external) != Some(&internal) {
                return Err(MeshLoaderError::InvariantViolation(format!(
                    "{} {external} does not round-trip through internal ID {internal}",
                    self.kind
                )));
            }
        }
        Ok(())
    }
}

/// Recursive external → internal translation.
///
/// Scalars translate to `i64` (with [`NOT_FOUND`] for misses); slices and
/// vectors translate element-wise, so a whole connectivity list
/// (`Vec<Vec<i64>>`) can be mapped in one call.
pub trait Translate {
    type Output;
    fn translate_with(&self, map: &IdMap) -> Self::Output;
}

impl Translate for i64 {
    type Output = i64;
    fn translate_with(&self, map: &IdMap) -> i64 {
        map.translate(*self)
    }
}

impl<T: Translate> Translate for [T] {
    type Output = Vec<T::Output>;
    fn translate_with(&self, map: &IdMap) -> Self::Output {
        self.iter().map(|id| id.translate_with(map)).collect()
    }
}

impl<T: Translate> Translate for Vec<T> {
    type Output = Vec<T::Output>;
    fn translate_with(&self, map: &IdMap) -> Self::Output {
        self.as_slice().translate_with(map)
    }
}

impl<T: Translate, const N: usize> Translate for [T; N] {
    type Output = Vec<T::Output>;
    fn translate_with(&self, map: &IdMap) -> Self::Output {
        self.as_slice().translate_with(map)
    }
}
