use lolvm::interpreter::engine::{Machine, MachineConfig};
use lolvm::interpreter::errors::{AddressSpace, MachineError};
use lolvm::interpreter::trace::Trace;

fn run(source: &str) -> Machine {
    let trace = Trace::parse(source).expect("trace should parse");
    let mut machine = Machine::new(64, 1024);
    for traced in trace.ops() {
        traced
            .op
            .apply(&mut machine)
            .unwrap_or_else(|e| panic!("line {} failed: {}", traced.line, e));
    }
    machine
}

#[test]
fn test_compiled_entry_prologue() {
    // Entry point: one zero per hook the program uses, then the outer frame
    let machine = run("push 0\npush 0\npush 0\nenter\n");
    assert_eq!(machine.stack_pointer(), 4);
    assert_eq!(machine.base_pointer(), 4);
    assert_eq!(machine.frame_depth(), 1);
}

#[test]
fn test_function_call_multiplies_arguments() {
    let source = "
        enter
        push 3        # first argument
        push 4        # second argument
        push 1        # return slot
        enter
        # first argument lives at bp - 4, i.e. reference bp - 3
        load_base_ptr
        push 3
        sub
        copy
        load_base_ptr
        push 2
        sub
        copy
        mul
        set_ret
        leave 2 0
        get_ret
    ";
    let machine = run(source);
    assert_eq!(machine.stack().live(), &[0.0, 12.0]);
    assert_eq!(machine.base_pointer(), 1);
    assert_eq!(machine.frame_depth(), 1);
    assert_eq!(machine.return_register(), 12.0);
}

#[test]
fn test_locals_are_discarded_by_leave() {
    let source = "
        push 1
        enter
        push 10
        push 20
        push 30
        leave 0 3
    ";
    let machine = run(source);
    assert!(machine.stack().is_empty());
    assert_eq!(machine.base_pointer(), 0);
}

#[test]
fn test_heap_record_round_trip() {
    let source = "
        push 3
        alloc         # address 0
        hook 0
        push 7
        push 8
        push 9
        ref_hook 0
        copy
        store 3
        ref_hook 0
        copy
        load 3
    ";
    let machine = run(source);
    assert_eq!(machine.stack().live(), &[0.0, 7.0, 8.0, 9.0]);
    assert_eq!(machine.heap().allocations(), vec![(0, 12)]);
}

#[test]
fn test_variable_update_through_hook() {
    // A local variable is updated in place with mov
    let source = "
        push 5
        hook 1
        push 6
        ref_hook 1
        mov
        push 1
        add
    ";
    let machine = run(source);
    assert_eq!(machine.stack().live(), &[7.0]);
}

#[test]
fn test_fragmented_heap_fails_allocation() {
    let mut machine = Machine::new(16, 16);
    for _ in 0..4 {
        machine.push(1.0).unwrap();
        machine.allocate().unwrap();
    }
    assert_eq!(machine.stack().live(), &[0.0, 4.0, 8.0, 12.0]);

    // Free the blocks at 0 and 8
    machine.push(1.0).unwrap();
    machine.push(0.0).unwrap();
    machine.free().unwrap();
    machine.push(1.0).unwrap();
    machine.push(8.0).unwrap();
    machine.free().unwrap();
    assert_eq!(machine.heap().allocated_bytes(), 8);

    machine.push(2.0).unwrap();
    assert_eq!(
        machine.allocate(),
        Err(MachineError::NoFreeMemory {
            requested: 8,
            largest_free: 4
        })
    );
    assert_eq!(machine.allocate().unwrap_err().exit_code(), 1);
}

#[test]
fn test_double_free_is_rejected() {
    let mut machine = Machine::new(16, 16);
    machine.push(2.0).unwrap();
    machine.push(2.0).unwrap();
    machine.allocate().unwrap();
    machine.free().unwrap();

    machine.push(2.0).unwrap();
    machine.push(0.0).unwrap();
    let err = machine.free().unwrap_err();
    assert_eq!(err, MachineError::InvalidFree { address: 0, size: 8 });
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_load_past_heap_end() {
    let mut machine = Machine::new(16, 16);
    machine.push(12.0).unwrap();
    let err = machine.load(2).unwrap_err();
    assert!(matches!(
        err,
        MachineError::InvalidAddress {
            space: AddressSpace::Heap,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_stack_overflow_and_underflow_codes() {
    let mut machine = Machine::with_config(MachineConfig {
        stack_capacity: 1,
        heap_size: 0,
        hook_count: 4,
    });
    machine.push(1.0).unwrap();
    assert_eq!(machine.push(2.0).unwrap_err().exit_code(), 1);
    machine.pop().unwrap();
    assert_eq!(machine.pop().unwrap_err().exit_code(), 2);
    assert_eq!(machine.hooks().len(), 4);
}

#[test]
fn test_divide_by_zero_code() {
    let mut machine = Machine::new(4, 0);
    machine.push(1.0).unwrap();
    machine.push(0.0).unwrap();
    let err = machine.divide().unwrap_err();
    assert_eq!(err.exit_code(), 5);
    assert_eq!(err.to_string(), "division by zero in divide");
}

#[test]
fn test_non_integral_count_is_invalid_operand() {
    let mut machine = Machine::new(4, 64);
    machine.push(1.5).unwrap();
    let err = machine.allocate().unwrap_err();
    assert!(matches!(err, MachineError::InvalidOperand { .. }));
    assert_eq!(err.exit_code(), 7);
    assert_eq!(machine.stack().live(), &[1.5]);
}
