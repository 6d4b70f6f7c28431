//! Heap implementation for the target machine
//!
//! This module provides the byte arena behind `allocate`/`free`:
//! - A fixed-size byte buffer addressed `0..size`
//! - A per-byte allocation map (`true` iff the byte belongs to a live allocation)
//! - A table of live allocations used to reject double and mismatched frees
//!
//! # Allocation Policy
//!
//! Allocation is linear first-fit over the allocation map: scan left to right
//! counting consecutive free bytes and take the first run that reaches the
//! requested length. There is no compaction, so a fragmented heap fails with
//! `NoFreeMemory` even when the total free space would suffice.
//!
//! Freed bytes are zeroed. Newly allocated bytes are handed out as they are,
//! which is only guaranteed zero for never-used or previously freed memory.

use super::value::{decode_slot, encode_slot, Address, Value, SLOT_BYTES};
use crate::interpreter::errors::{AddressSpace, MachineError, Result};
use rustc_hash::FxHashMap;

/// The heap
#[derive(Debug, Clone)]
pub struct Heap {
    bytes: Box<[u8]>,
    allocated: Box<[bool]>,
    live: FxHashMap<Address, usize>, // address -> size in bytes
}

impl Heap {
    /// Create a zero-filled heap of `size` bytes with nothing allocated
    pub fn new(size: usize) -> Self {
        Heap {
            bytes: vec![0; size].into_boxed_slice(),
            allocated: vec![false; size].into_boxed_slice(),
            live: FxHashMap::default(),
        }
    }

    /// Allocate `size` contiguous bytes, first fit
    ///
    /// A zero-byte request succeeds at address 0 without holding anything.
    pub fn allocate(&mut self, size: usize) -> Result<Address> {
        if size == 0 {
            return Ok(0);
        }

        let mut run = 0;
        let mut found = None;
        for (i, &taken) in self.allocated.iter().enumerate() {
            if taken {
                run = 0;
            } else {
                run += 1;
            }

            if run == size {
                found = Some(i + 1 - size);
                break;
            }
        }

        let addr = found.ok_or_else(|| MachineError::NoFreeMemory {
            requested: size,
            largest_free: self.largest_free_run(),
        })?;

        self.allocated[addr..addr + size].fill(true);
        self.live.insert(addr, size);
        Ok(addr)
    }

    /// Release a live allocation and zero its bytes
    ///
    /// The `(addr, size)` pair must match an allocation exactly; anything else
    /// (double free, interior address, wrong size) is `InvalidFree`. Freeing
    /// zero bytes is a no-op.
    pub fn free(&mut self, addr: Address, size: usize) -> Result<()> {
        if size == 0 {
            return Ok(());
        }

        match self.live.get(&addr) {
            Some(&held) if held == size => {
                self.live.remove(&addr);
                self.allocated[addr..addr + size].fill(false);
                self.bytes[addr..addr + size].fill(0);
                Ok(())
            }
            _ => Err(MachineError::InvalidFree {
                address: addr,
                size,
            }),
        }
    }

    /// Fail with `InvalidAddress` unless `addr..addr + len` lies inside the heap
    pub fn check_range(&self, addr: Address, len: usize) -> Result<()> {
        match addr.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(()),
            _ => Err(MachineError::InvalidAddress {
                space: AddressSpace::Heap,
                index: addr.saturating_add(len).saturating_sub(1),
                limit: self.bytes.len(),
            }),
        }
    }

    /// Read bytes
    pub fn read_bytes(&self, addr: Address, len: usize) -> Result<&[u8]> {
        self.check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// Write bytes
    pub fn write_bytes(&mut self, addr: Address, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Decode the slot at `addr`
    pub fn read_slot(&self, addr: Address) -> Result<Value> {
        let mut raw = [0u8; SLOT_BYTES];
        raw.copy_from_slice(self.read_bytes(addr, SLOT_BYTES)?);
        Ok(decode_slot(raw))
    }

    /// Encode `value` into the slot at `addr`
    pub fn write_slot(&mut self, addr: Address, value: Value) -> Result<()> {
        self.write_bytes(addr, &encode_slot(value))
    }

    /// Length of the longest run of free bytes
    pub fn largest_free_run(&self) -> usize {
        let mut best = 0;
        let mut run = 0;
        for &taken in self.allocated.iter() {
            if taken {
                run = 0;
            } else {
                run += 1;
                best = best.max(run);
            }
        }
        best
    }

    /// The per-byte allocation map
    pub fn allocation_map(&self) -> &[bool] {
        &self.allocated
    }

    /// Raw heap contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Live allocations as `(address, size)` pairs, lowest address first
    pub fn allocations(&self) -> Vec<(Address, usize)> {
        let mut allocs: Vec<_> = self.live.iter().map(|(&a, &s)| (a, s)).collect();
        allocs.sort_unstable_by_key(|&(addr, _)| addr);
        allocs
    }

    /// Total bytes currently allocated
    pub fn allocated_bytes(&self) -> usize {
        self.live.values().sum()
    }

    /// Heap size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_reuses_earliest_hole() {
        let mut heap = Heap::new(32);
        let a = heap.allocate(8).unwrap();
        let b = heap.allocate(8).unwrap();
        let c = heap.allocate(8).unwrap();
        assert_eq!((a, b, c), (0, 8, 16));

        heap.free(b, 8).unwrap();
        assert_eq!(heap.allocate(4).unwrap(), 8);
        assert_eq!(heap.allocate(4).unwrap(), 12);
        assert_eq!(heap.allocate(8).unwrap(), 24);
    }

    #[test]
    fn test_fragmentation_is_reported() {
        let mut heap = Heap::new(16);
        let a = heap.allocate(4).unwrap();
        heap.allocate(4).unwrap();
        let c = heap.allocate(4).unwrap();
        heap.allocate(4).unwrap();
        heap.free(a, 4).unwrap();
        heap.free(c, 4).unwrap();

        // 8 bytes free in total, but never contiguous
        assert_eq!(
            heap.allocate(8),
            Err(MachineError::NoFreeMemory {
                requested: 8,
                largest_free: 4
            })
        );
    }

    #[test]
    fn test_free_zeroes_but_allocate_does_not() {
        let mut heap = Heap::new(8);
        let addr = heap.allocate(4).unwrap();
        heap.write_bytes(addr, &[1, 2, 3, 4]).unwrap();
        heap.free(addr, 4).unwrap();
        assert_eq!(heap.read_bytes(0, 4).unwrap(), &[0, 0, 0, 0]);

        // Bytes written outside any allocation survive a later allocate
        heap.write_bytes(4, &[9, 9, 9, 9]).unwrap();
        let addr = heap.allocate(8).unwrap();
        assert_eq!(heap.read_bytes(addr + 4, 4).unwrap(), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_invalid_frees() {
        let mut heap = Heap::new(16);
        let addr = heap.allocate(8).unwrap();

        // Wrong size, interior address
        assert!(matches!(heap.free(addr, 4), Err(MachineError::InvalidFree { .. })));
        assert!(matches!(heap.free(addr + 4, 4), Err(MachineError::InvalidFree { .. })));

        heap.free(addr, 8).unwrap();
        // Double free
        assert_eq!(
            heap.free(addr, 8),
            Err(MachineError::InvalidFree {
                address: addr,
                size: 8
            })
        );
    }

    #[test]
    fn test_zero_sized_requests() {
        let mut heap = Heap::new(4);
        assert_eq!(heap.allocate(0).unwrap(), 0);
        assert!(heap.allocations().is_empty());
        heap.free(3, 0).unwrap();
    }

    #[test]
    fn test_out_of_range_access() {
        let mut heap = Heap::new(8);
        assert!(heap.read_slot(4).is_ok());
        assert!(matches!(
            heap.read_slot(6),
            Err(MachineError::InvalidAddress {
                space: AddressSpace::Heap,
                ..
            })
        ));
        assert!(heap.write_bytes(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn test_allocation_map_tracks_live_bytes() {
        let mut heap = Heap::new(8);
        let addr = heap.allocate(4).unwrap();
        assert_eq!(
            heap.allocation_map(),
            &[true, true, true, true, false, false, false, false]
        );
        heap.free(addr, 4).unwrap();
        assert!(heap.allocation_map().iter().all(|&b| !b));
    }
}
