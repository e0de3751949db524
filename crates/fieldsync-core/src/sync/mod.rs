//! Ordered sub-task orchestration with bounded waits.

mod completion;
mod orchestrator;
mod tally;

pub use completion::{completion, Completer, Completion, WaitOutcome};
pub use orchestrator::{subtask, FnSubTask, SubTask, SyncOrchestrator};
pub use tally::SyncTally;
