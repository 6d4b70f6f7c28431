// Snapshot management for stepping through a recorded execution

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::MachineError;
use crate::interpreter::trace::{Flow, Trace};
use std::mem::size_of;
use thiserror::Error;
use tracing::{debug, warn};

/// Default memory budget for recorded history (256 MiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;

/// Machine state after a prefix of the trace
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub machine: Machine,
    /// Index of the op that produced this state, `None` for the initial state
    pub op_index: Option<usize>,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        let machine = &self.machine;
        let stack = machine.stack().capacity() * size_of::<f32>();
        // Byte arena plus the allocation map
        let heap = machine.heap().size() * 2;
        let hooks = machine.hooks().len() * size_of::<Option<usize>>();
        let live = machine.heap().allocations().len() * 2 * size_of::<usize>();

        size_of::<Self>() + stack + heap + hooks + live
    }
}

/// History budget exhausted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot memory limit exceeded: {current} + {requested} > {limit}")]
pub struct SnapshotLimitExceeded {
    pub current: usize,
    pub requested: usize,
    pub limit: usize,
}

/// Manages execution history
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), SnapshotLimitExceeded> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(SnapshotLimitExceeded {
                current: self.current_memory,
                requested: snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

/// How a recorded execution ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A `halt` (explicit or at the end of the trace) with its exit code
    Halted(i32),
    /// An op failed; the machine state before it is the last snapshot
    Failed { op_index: usize, error: MachineError },
    /// Recording stopped early because the history budget ran out
    Truncated { op_index: usize },
}

/// Navigation past either end of the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("already at the beginning of execution")]
    AtStart,
    #[error("no more snapshots available (execution finished)")]
    AtEnd,
}

/// A recorded execution and a cursor into it
#[derive(Debug)]
pub struct Replay {
    trace: Trace,
    snapshots: SnapshotManager,
    outcome: Outcome,
    position: usize,
}

impl Replay {
    /// Run `trace` on `machine`, keeping the state after every op
    ///
    /// Recording never fails: a failing op or an exhausted budget ends the
    /// history and is reported through [`Replay::outcome`].
    pub fn record(trace: Trace, mut machine: Machine, snapshot_limit: usize) -> Self {
        let mut snapshots = SnapshotManager::new(snapshot_limit);
        let initial = Snapshot {
            machine: machine.clone(),
            op_index: None,
        };
        if let Err(err) = snapshots.push(initial) {
            warn!("{err}");
            return Replay {
                trace,
                snapshots,
                outcome: Outcome::Truncated { op_index: 0 },
                position: 0,
            };
        }

        let mut outcome = None;
        for (op_index, traced) in trace.ops().iter().enumerate() {
            let flow = match traced.op.apply(&mut machine) {
                Ok(flow) => flow,
                Err(error) => {
                    debug!(op_index, line = traced.line, %error, "recorded failure");
                    outcome = Some(Outcome::Failed { op_index, error });
                    break;
                }
            };

            let snapshot = Snapshot {
                machine: machine.clone(),
                op_index: Some(op_index),
            };
            if let Err(err) = snapshots.push(snapshot) {
                warn!("{err}");
                outcome = Some(Outcome::Truncated { op_index });
                break;
            }

            if flow == Flow::Halt {
                break;
            }
        }

        let outcome = outcome.unwrap_or_else(|| Outcome::Halted(machine.halt()));
        debug!(
            snapshots = snapshots.len(),
            memory = snapshots.memory_usage(),
            "history recorded"
        );
        Replay {
            trace,
            snapshots,
            outcome,
            position: 0,
        }
    }

    /// Step to the next recorded state
    pub fn step_forward(&mut self) -> Result<(), HistoryError> {
        if self.position + 1 >= self.snapshots.len() {
            return Err(HistoryError::AtEnd);
        }
        self.position += 1;
        Ok(())
    }

    /// Step to the previous recorded state
    pub fn step_backward(&mut self) -> Result<(), HistoryError> {
        if self.position == 0 {
            return Err(HistoryError::AtStart);
        }
        self.position -= 1;
        Ok(())
    }

    /// Rewind to the beginning of execution history
    pub fn rewind_to_start(&mut self) {
        self.position = 0;
    }

    /// Jump to the last recorded state
    pub fn jump_to_end(&mut self) {
        self.position = self.snapshots.len().saturating_sub(1);
    }

    /// The snapshot under the cursor
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.position)
    }

    /// Index of the op that runs next from the current state
    pub fn next_op_index(&self) -> usize {
        self.current()
            .and_then(|s| s.op_index)
            .map_or(0, |index| index + 1)
    }

    pub fn history_position(&self) -> usize {
        self.position
    }

    pub fn total_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.position + 1 >= self.snapshots.len()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }
}
