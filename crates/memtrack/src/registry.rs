//! The allocation registry - a bounded table of outstanding blocks.
//!
//! Every tracked allocation takes the lowest free slot. Slots are cleared on
//! free, so reports list blocks in slot order rather than allocation order;
//! the per-block sequence number gives the allocation order when it matters.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ptr::NonNull;

use crate::block::{BlockRecord, Category, Origin, Status};
use crate::config::{RegistryBuilder, DEFAULT_CAPACITY};
use crate::error::TrackError;
use crate::heap::{HeapSource, LibcHeap};
use crate::output::{Format, Report};

/// What [`Registry::track_free`] did with the pointer it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeOutcome {
    /// The block was tracked; its record (now tagged `Freed`) is returned.
    Released(BlockRecord),
    /// Null pointer, nothing was released.
    NullPointer,
    /// The registry had no record of the pointer. The memory was still released.
    Untracked,
    /// Tracking is disabled, the memory went straight back to the heap.
    Passthrough,
}

pub struct Registry<H = LibcHeap> {
    slots: Vec<Option<BlockRecord>>,
    index: HashMap<usize, usize>,
    free_slots: BTreeSet<usize>,
    outstanding_count: usize,
    outstanding_bytes: usize,
    last_sequence: u64,
    tracking: bool,
    heap: H,
}

impl Registry<LibcHeap> {
    /// Registry over `malloc`/`free` with the default capacity.
    pub fn new() -> Self {
        Self::with_parts(DEFAULT_CAPACITY, true, LibcHeap)
    }

    pub fn builder() -> RegistryBuilder<LibcHeap> {
        RegistryBuilder::new()
    }
}

impl<H> fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("capacity", &self.slots.len())
            .field("outstanding_count", &self.outstanding_count)
            .field("outstanding_bytes", &self.outstanding_bytes)
            .field("last_sequence", &self.last_sequence)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}

impl Default for Registry<LibcHeap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HeapSource> Registry<H> {
    pub(crate) fn with_parts(capacity: usize, tracking: bool, heap: H) -> Self {
        Self {
            slots: vec![None; capacity],
            index: HashMap::with_capacity(capacity),
            free_slots: (0..capacity).collect(),
            outstanding_count: 0,
            outstanding_bytes: 0,
            last_sequence: 0,
            tracking,
            heap,
        }
    }

    /// Forget every tracked block.
    ///
    /// The memory those records describe is *not* released, that stays the
    /// caller's job. The sequence counter keeps running, so blocks tracked
    /// after a reset still sort after everything tracked before it.
    pub fn init(&mut self) {
        if self.outstanding_count > 0 {
            tracing::debug!(
                blocks = self.outstanding_count,
                bytes = self.outstanding_bytes,
                "discarding tracked blocks on reset"
            );
        }

        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.index.clear();
        self.free_slots = (0..self.slots.len()).collect();
        self.outstanding_count = 0;
        self.outstanding_bytes = 0;
    }

    /// Allocate `size` bytes and record the block.
    ///
    /// Fails without producing memory when `size` is 0, when the heap is
    /// exhausted, or when every slot is taken. In the last case the freshly
    /// obtained memory is released again before returning.
    pub fn track_allocate(
        &mut self,
        size: usize,
        origin: Origin,
        category: Category,
    ) -> Result<NonNull<u8>, TrackError> {
        if size == 0 {
            tracing::warn!(origin = %origin, "zero-byte allocation");
            return Err(TrackError::ZeroSize { origin });
        }

        let Some(ptr) = self.heap.obtain(size) else {
            tracing::error!(origin = %origin, size, "allocation failed");
            return Err(TrackError::AllocationFailed { size, origin });
        };

        if !self.tracking {
            return Ok(ptr);
        }

        let address = ptr.as_ptr() as usize;

        // The heap handed out an address we still hold a record for, so that
        // block was released behind our back. Drop the stale record.
        if let Some(stale) = self.remove(address) {
            tracing::warn!(
                origin = %origin,
                address = %format!("{:#x}", address),
                stale_origin = %stale.origin,
                "address reused while still tracked, dropping stale record"
            );
        }

        let Some(slot) = self.free_slots.pop_first() else {
            // SAFETY: `ptr` was obtained from this heap just above and never handed out.
            unsafe { self.heap.release(ptr) };
            tracing::error!(origin = %origin, capacity = self.slots.len(), "memory tracker full");
            return Err(TrackError::CapacityExhausted {
                capacity: self.slots.len(),
                origin,
            });
        };

        self.last_sequence += 1;
        self.slots[slot] = Some(BlockRecord {
            address,
            size,
            origin,
            category,
            status: Status::Allocated,
            sequence: self.last_sequence,
        });
        self.index.insert(address, slot);
        self.outstanding_count += 1;
        self.outstanding_bytes += size;

        Ok(ptr)
    }

    /// Release `ptr` and drop its record.
    ///
    /// Never fails: a null pointer is logged and ignored, an untracked pointer
    /// is logged and released anyway.
    ///
    /// # Safety
    ///
    /// `ptr` must be null, or a live pointer obtained from this registry's heap
    /// source that has not been released yet.
    pub unsafe fn track_free(&mut self, ptr: *mut u8, origin: Origin) -> FreeOutcome {
        let Some(ptr) = NonNull::new(ptr) else {
            tracing::warn!(origin = %origin, "freeing null pointer");
            return FreeOutcome::NullPointer;
        };

        if !self.tracking {
            // SAFETY: upheld by the caller.
            unsafe { self.heap.release(ptr) };
            return FreeOutcome::Passthrough;
        }

        let address = ptr.as_ptr() as usize;
        let outcome = match self.remove(address) {
            Some(mut record) => {
                record.status = Status::Freed;
                FreeOutcome::Released(record)
            }
            None => {
                tracing::warn!(
                    origin = %origin,
                    address = %format!("{:#x}", address),
                    "untracked memory free"
                );
                FreeOutcome::Untracked
            }
        };

        // SAFETY: upheld by the caller.
        unsafe { self.heap.release(ptr) };
        outcome
    }

    fn remove(&mut self, address: usize) -> Option<BlockRecord> {
        let slot = self.index.remove(&address)?;
        let record = self.slots[slot].take()?;

        self.free_slots.insert(slot);
        self.outstanding_count -= 1;
        self.outstanding_bytes -= record.size;
        Some(record)
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> Report {
        Report::from_registry(self)
    }

    /// Plain-text report: one line per outstanding block in slot order, then totals.
    pub fn generate_report(&self) -> String {
        self.snapshot().to_text()
    }

    /// Print the report to stdout in `format`, or as JSON when `MEMTRACK_JSON`
    /// asks for it.
    pub fn print_report(&self, format: Format) -> Result<(), Box<dyn std::error::Error>> {
        self.snapshot().print(format)
    }

    #[inline]
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes
    }

    #[inline]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding_count
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn contains(&self, address: usize) -> bool {
        self.index.contains_key(&address)
    }

    /// Occupied slots as `(slot, record)`, in slot order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &BlockRecord)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| record.as_ref().map(|r| (slot, r)))
    }

    /// Sequence number given to the most recent tracked allocation, 0 if none yet.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }
}
