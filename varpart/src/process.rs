use crate::helpe::*;

/// Where a [`Process`] stands in its lifecycle. States are listed in the
/// order a process goes through them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessState {
    /// Not yet admitted.
    New,
    /// The dispatcher is choosing a hole for it.
    Selecting,
    /// A hole was chosen; waiting for its turn to be loaded.
    Selected,
    /// The dispatcher is loading it.
    Loading,
    /// Loaded, waiting to actually be placed into memory.
    AwaitingMemory,
    /// In memory and executing.
    Resident,
    /// The dispatcher is reclaiming its partition.
    Releasing,
    Completed,
}

impl ProcessState {
    /// The externally visible name of the state. Being selected and
    /// having been selected look the same from the outside.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessState::New               => "new",
            ProcessState::Selecting         => "selecting",
            ProcessState::Selected          => "selecting",
            ProcessState::Loading           => "loading",
            ProcessState::AwaitingMemory    => "awaiting-memory",
            ProcessState::Resident          => "resident",
            ProcessState::Releasing         => "releasing",
            ProcessState::Completed         => "completed",
        }
    }
}

/// The collection currently holding a [`Process`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Holder {
    Pending,
    Dispatcher,
    WaitingQueue,
    /// Finished executing, waiting in line for the dispatcher to release it.
    /// Such a process is still listed in the waiting queue until pulled.
    Backlog,
    Completed,
}

impl Process {
    pub fn from_record(id: ProcessId, r: ProcessRecord) -> Self {
        Self {
            id,
            name:               r.name,
            arrival:            r.arrival,
            duration:           r.duration,
            memory:             r.memory_required,
            state:              ProcessState::New,
            holder:             Holder::Pending,
            target:             None,
            selection_start:    None,
            selection_done:     None,
            load_done:          None,
            exec_done:          None,
            release_done:       None,
        }
    }

    /// Returns `true` if the process has arrived by tick `t`.
    #[inline(always)]
    pub fn has_arrived(&self, t: Ticks) -> bool {
        self.arrival <= t
    }

    /// Returns `true` if `deadline` is set and has been reached at tick `t`.
    #[inline(always)]
    pub fn is_due(deadline: Option<Ticks>, t: Ticks) -> bool {
        deadline.is_some_and(|d| t >= d)
    }

    /// Elapsed ticks from the start of selection to the end of release,
    /// both ends included. `None` until the process has completed.
    pub fn turnaround(&self) -> Option<Ticks> {
        if self.state != ProcessState::Completed { return None; }
        let start = self.selection_start?;
        let end = self.release_done?;

        Some(end + 1 - start)
    }

    /// A frozen copy of the public fields, for snapshots.
    pub fn view(&self) -> ProcessView {
        ProcessView {
            name:           self.name.clone(),
            arrival:        self.arrival,
            duration:       self.duration,
            memory:         self.memory,
            state:          self.state,
            target:         self.target,
            selection_done: self.selection_done,
            load_done:      self.load_done,
            exec_done:      self.exec_done,
            release_done:   self.release_done,
        }
    }
}

/// Sole owner of every [`Process`] of a run. Active processes (pending or
/// in flight) and completed ones live in separate maps, both kept in
/// insertion order.
#[derive(Clone, Debug)]
pub struct ProcessRegistry {
    active:     IndexMap<ProcessId, Process>,
    // Not yet admitted, sorted by arrival.
    pending:    VecDeque<ProcessId>,
    completed:  IndexMap<ProcessId, Process>,
}

impl ProcessRegistry {
    pub fn new(procs: Vec<Process>) -> Self {
        let pending = procs.iter().map(|p| p.id).collect();
        Self {
            active:     procs.into_iter().map(|p| (p.id, p)).collect(),
            pending,
            completed:  IndexMap::new(),
        }
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.active.get(&id).or_else(|| self.completed.get(&id))
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        match self.active.get_mut(&id) {
            Some(p) => Some(p),
            None    => self.completed.get_mut(&id),
        }
    }

    /// The earliest-arrived process not yet admitted.
    pub fn front_pending(&self) -> Option<&Process> {
        self.pending.front().and_then(|id| self.active.get(id))
    }

    pub fn dequeue_pending(&mut self) -> Option<ProcessId> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Process> {
        self.pending.iter().filter_map(|id| self.active.get(id))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Moves a process from the active map into the completed one.
    /// Returns `false` if it was not active.
    pub fn complete(&mut self, id: ProcessId) -> bool {
        match self.active.shift_remove(&id) {
            Some(mut p) => {
                p.state = ProcessState::Completed;
                p.holder = Holder::Completed;
                self.completed.insert(id, p);
                true
            },
            None    => false,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Process> {
        self.active.values()
    }

    pub fn completed(&self) -> impl Iterator<Item = &Process> {
        self.completed.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(id: usize, name: &str, arrival: Ticks) -> Process {
        Process::from_record(ProcessId(id), ProcessRecord {
            name:               name.to_string(),
            arrival,
            duration:           3,
            memory_required:    10,
        })
    }

    #[test]
    fn selected_reports_as_selecting() {
        assert_eq!(ProcessState::Selected.label(), ProcessState::Selecting.label());
        assert_ne!(ProcessState::Selected, ProcessState::Selecting);
    }

    #[test]
    fn turnaround_counts_both_ends() {
        let mut p = proc(0, "A", 5);
        p.selection_start = Some(5);
        p.selection_done = Some(7);
        p.release_done = Some(20);
        assert_eq!(p.turnaround(), None);
        p.state = ProcessState::Completed;
        assert_eq!(p.turnaround(), Some(16));
    }

    #[test]
    fn completion_moves_between_maps() {
        let mut reg = ProcessRegistry::new(vec![proc(0, "A", 0), proc(1, "B", 1)]);
        assert_eq!(reg.dequeue_pending(), Some(ProcessId(0)));
        assert_eq!(reg.front_pending().map(|p| p.name.as_str()), Some("B"));
        assert!(reg.complete(ProcessId(0)));
        assert!(!reg.complete(ProcessId(0)));
        assert_eq!(reg.active().count(), 1);
        let done = reg.get(ProcessId(0)).unwrap();
        assert_eq!(done.state, ProcessState::Completed);
        assert_eq!(done.holder, Holder::Completed);
    }
}
