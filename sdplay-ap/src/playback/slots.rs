//! The two mono output slots
//!
//! At any instant one slot is being filled by the engine and the other may be
//! held by the sink. Ownership is tracked by the slot's reference count: a
//! slot can only be written while the engine holds the sole reference.

use crate::audio::sink::SlotBuffer;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Number of alternating slots
pub const SLOT_COUNT: usize = 2;

/// Fixed-capacity pair of mono sample buffers
pub struct SlotPair {
    slots: [SlotBuffer; SLOT_COUNT],
    capacity: usize,
}

impl SlotPair {
    /// Allocate both slots with `capacity` samples each
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("slot capacity must be non-zero".to_string()));
        }
        Ok(Self {
            slots: [allocate_slot(capacity)?, allocate_slot(capacity)?],
            capacity,
        })
    }

    /// Samples per slot
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writable view of slot `index`.
    ///
    /// Fails with [`Error::SlotInUse`] while the sink still holds the slot.
    pub fn fill_target(&mut self, index: usize) -> Result<&mut [i16]> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| Error::Internal(format!("no slot {}", index)))?;
        Arc::get_mut(slot).ok_or(Error::SlotInUse(index))
    }

    /// Handle to slot `index` for submission to the sink
    pub fn share(&self, index: usize) -> Result<SlotBuffer> {
        self.slot(index).map(Arc::clone)
    }

    /// Whether anything besides the engine holds slot `index`
    pub fn is_held(&self, index: usize) -> Result<bool> {
        self.slot(index).map(|slot| Arc::strong_count(slot) > 1)
    }

    fn slot(&self, index: usize) -> Result<&SlotBuffer> {
        self.slots
            .get(index)
            .ok_or_else(|| Error::Internal(format!("no slot {}", index)))
    }
}

fn allocate_slot(capacity: usize) -> Result<SlotBuffer> {
    let bytes = capacity.saturating_mul(std::mem::size_of::<i16>());
    let mut samples: Vec<i16> = Vec::new();
    samples
        .try_reserve_exact(capacity)
        .map_err(|_| Error::AllocationFailure { requested: bytes })?;
    samples.resize(capacity, 0);
    Ok(Arc::from(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_two_slots() {
        let mut slots = SlotPair::new(8).unwrap();
        assert_eq!(slots.capacity(), 8);
        assert_eq!(slots.fill_target(0).unwrap().len(), 8);
        assert_eq!(slots.fill_target(1).unwrap().len(), 8);
    }

    #[test]
    fn test_shared_slot_cannot_be_filled() {
        let mut slots = SlotPair::new(4).unwrap();
        slots.fill_target(0).unwrap()[0] = 42;

        let held = slots.share(0).unwrap();
        assert!(slots.is_held(0).unwrap());
        assert!(matches!(slots.fill_target(0), Err(Error::SlotInUse(0))));
        assert!(slots.fill_target(1).is_ok());
        assert_eq!(held[0], 42);

        drop(held);
        assert!(!slots.is_held(0).unwrap());
        assert!(slots.fill_target(0).is_ok());
    }

    #[test]
    fn test_out_of_range_index_rejected_everywhere() {
        let mut slots = SlotPair::new(4).unwrap();
        assert!(matches!(slots.fill_target(SLOT_COUNT), Err(Error::Internal(_))));
        assert!(matches!(slots.share(SLOT_COUNT), Err(Error::Internal(_))));
        assert!(matches!(slots.is_held(SLOT_COUNT), Err(Error::Internal(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(SlotPair::new(0), Err(Error::Config(_))));
    }

    #[test]
    fn test_huge_capacity_is_allocation_failure() {
        assert!(matches!(
            SlotPair::new(usize::MAX / 2),
            Err(Error::AllocationFailure { .. })
        ));
    }
}
