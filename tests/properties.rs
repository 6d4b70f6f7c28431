//! Property-based tests for the machine's memory and calling laws.

use lolvm::interpreter::constants::TEXT_BUFFER_WIDTH;
use lolvm::interpreter::engine::Machine;
use lolvm::memory::value::{Value, SLOT_BYTES};
use proptest::prelude::*;

proptest! {
    /// Values come off the stack in reverse push order.
    #[test]
    fn prop_stack_is_lifo(values in prop::collection::vec(any::<f32>(), 0..64)) {
        let mut machine = Machine::new(64, 0);
        for &v in &values {
            machine.push(v).unwrap();
        }
        for &v in values.iter().rev() {
            prop_assert_eq!(machine.pop().unwrap().to_bits(), v.to_bits());
        }
        prop_assert!(machine.pop().is_err());
    }

    /// `store n` then `load n` at the same address reproduces the values bit for bit.
    #[test]
    fn prop_store_load_round_trip(
        values in prop::collection::vec(any::<f32>(), 1..16),
        slot in 0usize..16,
    ) {
        let mut machine = Machine::new(64, 32 * SLOT_BYTES);
        let addr = slot * SLOT_BYTES;
        for &v in &values {
            machine.push(v).unwrap();
        }
        machine.push(addr as Value).unwrap();
        machine.store(values.len()).unwrap();
        prop_assert_eq!(machine.stack_pointer(), 0);

        machine.push(addr as Value).unwrap();
        machine.load(values.len()).unwrap();
        let loaded: Vec<u32> = machine.stack().live().iter().map(|v| v.to_bits()).collect();
        let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(loaded, expected);
    }

    /// Live allocations never overlap, allocate then free is undone exactly,
    /// and freeing everything restores an empty map.
    #[test]
    fn prop_allocations_disjoint_and_reversible(
        sizes in prop::collection::vec(1usize..8, 1..12),
        extra_slots in 1usize..8,
    ) {
        let mut machine = Machine::new(64, 256);
        let mut blocks = Vec::new();
        for &slots in &sizes {
            machine.push(slots as Value).unwrap();
            match machine.allocate() {
                Ok(addr) => {
                    machine.pop().unwrap();
                    blocks.push((addr, slots * SLOT_BYTES, slots));
                }
                Err(_) => {
                    machine.pop().unwrap();
                }
            }
        }

        let mut ranges: Vec<_> = blocks.iter().map(|&(a, s, _)| (a, a + s)).collect();
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0);
        }

        // A fresh allocation released straight away leaves the map as it was
        let map_before = machine.heap().allocation_map().to_vec();
        machine.push(extra_slots as Value).unwrap();
        if let Ok(addr) = machine.allocate() {
            machine.pop().unwrap();
            machine.push(extra_slots as Value).unwrap();
            machine.push(addr as Value).unwrap();
            machine.free().unwrap();
        } else {
            machine.pop().unwrap();
        }
        prop_assert_eq!(machine.heap().allocation_map(), map_before.as_slice());

        for &(addr, _, slots) in &blocks {
            machine.push(slots as Value).unwrap();
            machine.push(addr as Value).unwrap();
            machine.free().unwrap();
        }
        prop_assert!(machine.heap().allocation_map().iter().all(|&b| !b));
        prop_assert_eq!(machine.heap().allocated_bytes(), 0);
    }

    /// A call followed by `end_frame` restores the caller's stack and base pointer.
    #[test]
    fn prop_frame_teardown_restores_caller(
        caller in prop::collection::vec(-100.0f32..100.0, 0..8),
        args in 0usize..6,
        locals in 0usize..6,
        nested in any::<bool>(),
    ) {
        let mut machine = Machine::new(64, 0);
        if nested {
            machine.establish_frame().unwrap();
        }
        for &v in &caller {
            machine.push(v).unwrap();
        }
        let before = machine.stack().live().to_vec();
        let bp = machine.base_pointer();

        for i in 0..args {
            machine.push(i as Value).unwrap();
        }
        machine.push(1.0).unwrap();
        machine.establish_frame().unwrap();
        for i in 0..locals {
            machine.push(i as Value).unwrap();
        }
        machine.end_frame(args, locals).unwrap();

        prop_assert_eq!(machine.stack().live(), before.as_slice());
        prop_assert_eq!(machine.base_pointer(), bp);
    }

    /// Integers survive formatting and parsing back.
    #[test]
    fn prop_integer_text_round_trip(n in -16_777_216i32..=16_777_216) {
        let mut machine = Machine::new(8, 256);
        machine.push(n as Value).unwrap();
        machine.integer_to_text().unwrap();
        machine.push(TEXT_BUFFER_WIDTH as Value).unwrap();
        prop_assert_eq!(machine.text_to_integer().unwrap(), n as Value);
    }
}
