//! Slot-indexed storage for element objects.

use crate::assembler::ElementObject;
use crate::mesh_error::MeshLoaderError;

/// One optional object per slot; slots are filled by the caller (authored
/// components) or by constraint synthesis.
#[derive(Clone, Debug)]
pub struct ElementObjectTable<E> {
    slots: Vec<Option<ElementObject<E>>>,
}

impl<E> Default for ElementObjectTable<E> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<E> ElementObjectTable<E> {
    pub fn with_slots(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, || None);
        Self { slots }
    }

    /// Grow to at least `count` slots; new slots start empty.
    pub fn ensure_slots(&mut self, count: usize) {
        if self.slots.len() < count {
            self.slots.resize_with(count, || None);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store `object` in `slot`, replacing any previous one.
    pub fn set(&mut self, slot: usize, object: ElementObject<E>) -> Result<(), MeshLoaderError> {
        let len = self.slots.len();
        let entry = self.slots.get_mut(slot).ok_or_else(|| {
            MeshLoaderError::InvariantViolation(format!(
                "object slot {slot} is outside a table of {len}"
            ))
        })?;
        *entry = Some(object);
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&ElementObject<E>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// First slot that was never filled.
    pub fn first_missing(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Every object in slot order, or the first empty slot.
    pub fn all_filled(&self) -> Result<Vec<&ElementObject<E>>, usize> {
        self.slots
            .iter()
            .enumerate()
            .map(|(slot, object)| object.as_ref().ok_or(slot))
            .collect()
    }
}
