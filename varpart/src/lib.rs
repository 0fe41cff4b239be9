//! Welcome to `varpart`!
//!
//! A tick-driven simulator of variable-partition memory allocation.
//! A batch of processes arrives over time; each one must be *selected*
//! (a hole is chosen for it), *loaded*, kept *resident* while it runs,
//! and finally *released*. Selection, loading and release are carried out
//! by a single dispatcher, one at a time, while any number of resident
//! processes run side by side in their own partitions.

mod process;
mod pipeline;
mod engine;

pub mod partition;
pub mod history;
pub mod indicators;
pub mod records;
pub mod helpe;

pub use crate::helpe::*;

/// Our fundamental unit of interest. A [`Process`] asks for
/// [`memory`](Process::memory) units of contiguous memory at logical time
/// [`arrival`](Process::arrival), and keeps them for
/// [`duration`](Process::duration) ticks once it becomes resident.
///
/// The remaining fields are filled in as the process travels through the
/// administrative pipeline. Each `*_done` timestamp is the tick at which the
/// corresponding stage is *scheduled* to complete; the stage is observed as
/// complete at the first engine check on or after that tick.
#[derive(Debug, Clone)]
pub struct Process {
    pub id:                 ProcessId,
    pub name:               String,
    pub arrival:            Ticks,
    pub duration:           Ticks,
    pub memory:             Units,
    pub state:              ProcessState,
    /// Which collection currently holds the process. Kept apart from
    /// [`state`](Process::state): a `Selecting` process sits in the dispatcher,
    /// a `Selected` one in the waiting queue, yet both report as "selecting".
    pub holder:             Holder,
    /// Start offset of the hole chosen for this process, if any.
    /// Cleared whenever the hole turns out to be gone at loading time.
    pub target:             Option<Units>,
    pub selection_start:    Option<Ticks>,
    pub selection_done:     Option<Ticks>,
    pub load_done:          Option<Ticks>,
    pub exec_done:          Option<Ticks>,
    pub release_done:       Option<Ticks>,
}

/// The whole simulated system. Every collection the rules touch lives
/// here; nothing is shared, nothing is global. A [`Simulator`] is advanced
/// one tick at a time by [`Simulator::step`].
#[derive(Clone)]
pub struct Simulator {
    config:     Config,
    now:        Ticks,
    registry:   process::ProcessRegistry,
    table:      PartitionTable,
    // The single administrative resource. Holds whoever is being
    // selected, loaded or released right now.
    dispatcher: Option<ProcessId>,
    // Processes that left the dispatcher and wait for their next milestone.
    queue:      Vec<ProcessId>,
    // Finished executions waiting for their turn at the dispatcher.
    backlog:    VecDeque<ProcessId>,
    log:        EventLog,
    history:    History,
    frag:       Units,
}
