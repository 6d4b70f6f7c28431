use lolvm::interpreter::engine::Machine;
use lolvm::interpreter::errors::MachineError;
use lolvm::interpreter::trace::{Op, Trace};
use lolvm::snapshot::{Outcome, Replay, DEFAULT_SNAPSHOT_LIMIT};

const FACTORIAL_STEP: &str = "
# n * (n - 1) for n = 5, as a compiled expression would leave it
push 5
hook 0
ref_hook 0
copy
push 1
sub
mul
itoa
halt
";

#[test]
fn test_run_returns_halt_code() {
    let trace = Trace::parse(FACTORIAL_STEP).expect("trace should parse");
    assert_eq!(trace.len(), 9);
    assert_eq!(trace.run(Machine::new(16, 256)), Ok(0));
}

#[test]
fn test_run_reports_first_failure() {
    let trace = Trace::parse("push 1\nfree\nhalt").unwrap();
    assert!(matches!(
        trace.run(Machine::new(16, 256)),
        Err(MachineError::StackUnderflow { required: 2, .. })
    ));
}

#[test]
fn test_running_off_the_end_halts() {
    let trace = Trace::from_ops([Op::Push(1.0), Op::Push(2.0)]);
    assert_eq!(trace.run(Machine::new(4, 0)), Ok(0));
}

#[test]
fn test_replay_records_every_step() {
    let trace = Trace::parse(FACTORIAL_STEP).unwrap();
    let mut replay = Replay::record(trace, Machine::new(16, 256), DEFAULT_SNAPSHOT_LIMIT);
    assert_eq!(replay.outcome(), &Outcome::Halted(0));
    assert_eq!(replay.total_snapshots(), 10);

    // After `sub` (op 5): 5 and 4 on the stack
    for _ in 0..6 {
        replay.step_forward().unwrap();
    }
    let snapshot = replay.current().unwrap();
    assert_eq!(snapshot.op_index, Some(5));
    assert_eq!(snapshot.machine.stack().live(), &[5.0, 4.0]);

    // After `itoa` the product lives in a heap buffer
    replay.jump_to_end();
    let machine = &replay.current().unwrap().machine;
    assert_eq!(machine.heap().allocations().len(), 1);
    let addr = machine.stack().top().unwrap() as usize;
    assert_eq!(machine.heap().read_slot(addr).unwrap(), '2' as u32 as f32);
    assert_eq!(machine.heap().read_slot(addr + 4).unwrap(), '0' as u32 as f32);
}

#[test]
fn test_replay_keeps_state_before_failure() {
    let trace = Trace::parse("push 4\npush 0\nmod\npush 1").unwrap();
    let mut replay = Replay::record(trace, Machine::new(4, 0), DEFAULT_SNAPSHOT_LIMIT);

    match replay.outcome() {
        Outcome::Failed { op_index, error } => {
            assert_eq!(*op_index, 2);
            assert_eq!(error.exit_code(), 5);
        }
        other => panic!("expected a failure, got {:?}", other),
    }

    replay.jump_to_end();
    assert_eq!(replay.current().unwrap().machine.stack().live(), &[4.0, 0.0]);
}

#[test]
fn test_parse_error_names_line() {
    let err = Trace::parse("push 1\n# fine\nleave 1\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(
        err.to_string(),
        "trace error at line 3: `leave` takes 2 operand(s), found 1"
    );
}
