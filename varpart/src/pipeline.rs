use crate::helpe::*;

// The administrative rules. Each one either fires completely or does
// nothing; none of them advances the clock.
impl Simulator {
    /// Returns `true` if some process in the waiting queue is in `state`.
    fn queue_holds(&self, state: ProcessState) -> bool {
        self.queue
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .any(|p| p.state == state)
    }

    pub(crate) fn dispatched_state(&self) -> Option<ProcessState> {
        self.dispatcher
            .and_then(|id| self.registry.get(id))
            .map(|p| p.state)
    }

    /// Admission. Takes the earliest pending process into selection, as
    /// long as the dispatcher is idle and nobody else is between selection
    /// and residency.
    pub(crate) fn admit_next(&mut self) {
        if self.dispatcher.is_some() { return; }
        if self.queue_holds(ProcessState::Selected)
            || self.queue_holds(ProcessState::AwaitingMemory) { return; }
        match self.registry.front_pending() {
            Some(p) if p.has_arrived(self.now)  => {},
            _                                   => { return; }
        }
        let Some(id) = self.registry.dequeue_pending() else { return; };
        let now = self.now;
        let Some(p) = self.registry.get_mut(id) else { return; };
        p.state = ProcessState::Selecting;
        p.holder = Holder::Dispatcher;
        p.selection_start = Some(now);
        self.log.record(now, format!("Process {} entered selection", p.name));
        // A miss is fine; loading will retry.
        self.table.select_for(self.config.strategy, p, now, &mut self.log);
        p.selection_done = Some(now + self.config.selection_time);
        self.dispatcher = Some(id);
    }

    /// Completes whatever the dispatcher is doing, if its time has come.
    /// Finishing a release immediately hands the dispatcher to the next
    /// finished execution in the backlog, if any.
    pub(crate) fn finish_dispatched(&mut self) {
        let Some(id) = self.dispatcher else { return; };
        let now = self.now;
        let Some(p) = self.registry.get_mut(id) else { return; };
        match p.state {
            ProcessState::Selecting if Process::is_due(p.selection_done, now)  => {
                p.state = ProcessState::Selected;
                p.holder = Holder::WaitingQueue;
                self.log.record(now, format!("Process {} finished selection", p.name));
                self.queue.push(id);
                self.dispatcher = None;
            },
            ProcessState::Loading if Process::is_due(p.load_done, now)         => {
                p.state = ProcessState::AwaitingMemory;
                p.holder = Holder::WaitingQueue;
                self.log.record(now, format!("Process {} finished loading", p.name));
                self.queue.push(id);
                self.dispatcher = None;
            },
            ProcessState::Releasing if Process::is_due(p.release_done, now)    => {
                // A miss means the partition was already swallowed by a
                // neighbour's merge. Nothing is left to give back.
                if !self.table.release(p, now, &mut self.log) {
                    debug!(tick = now, process = %p.name, "partition already merged away");
                }
                p.release_done = Some(now);
                let msg = format!("Process {} released memory and completed its cycle", p.name);
                self.registry.complete(id);
                self.log.record(now, msg);
                self.dispatcher = None;
                self.pull_next_release();
            },
            _   => {},
        }
    }

    /// Load start. Hands the dispatcher to a selected process.
    pub(crate) fn begin_load(&mut self) {
        if self.dispatcher.is_some() || self.queue.is_empty() { return; }
        if self.queue_holds(ProcessState::AwaitingMemory) { return; }
        let registry = &self.registry;
        let Some(idx) = self.queue
            .iter()
            .position(|id| registry.get(*id).is_some_and(|p| p.state == ProcessState::Selected)) else {
            return;
        };
        let id = self.queue.remove(idx);
        let now = self.now;
        let Some(p) = self.registry.get_mut(id) else { return; };
        p.state = ProcessState::Loading;
        p.holder = Holder::Dispatcher;
        p.load_done = Some(now + self.config.load_time);
        self.log.record(now, format!("Process {} started loading into memory", p.name));
        self.dispatcher = Some(id);
    }

    /// Placement. Every loaded process gets one attempt to actually move
    /// into memory, choosing a fresh hole first if it has none.
    pub(crate) fn commit_to_memory(&mut self) {
        if self.dispatcher.is_some() || self.queue.is_empty() { return; }
        let now = self.now;
        let strategy = self.config.strategy;
        for &id in &self.queue {
            let Some(p) = self.registry.get_mut(id) else { continue; };
            if p.state != ProcessState::AwaitingMemory { continue; }
            if p.target.is_none() {
                self.table.select_for(strategy, p, now, &mut self.log);
            }
            let Some(start) = p.target else { continue; };
            if self.table.allocate(start, p, now, &mut self.log) {
                p.state = ProcessState::Resident;
                p.exec_done = Some(now + p.duration);
                self.log.record(now, format!("Process {} left waiting and was loaded into memory", p.name));
            } else {
                p.target = None;
            }
        }
    }

    /// Execution completion. Every resident process whose time is up gives
    /// its memory back right away and lines up for the dispatcher, in order
    /// of arrival; the first in line gets the dispatcher.
    pub(crate) fn release_intake(&mut self) {
        if self.dispatcher.is_some() || self.queue.is_empty() { return; }
        let now = self.now;
        let registry = &self.registry;
        self.queue.sort_by_key(|id| registry.get(*id).map(|p| p.arrival));
        let finished = self.queue
            .iter()
            .copied()
            .filter(|id| {
                registry.get(*id).is_some_and(|p| {
                    p.state == ProcessState::Resident && Process::is_due(p.exec_done, now)
                })
            })
            .collect_vec();
        for id in finished {
            self.table.reclaim(id);
            if let Some(p) = self.registry.get_mut(id) {
                p.holder = Holder::Backlog;
            }
            self.backlog.push_back(id);
        }
        self.pull_next_release();
    }

    /// Hands the idle dispatcher to the first process of the backlog.
    pub(crate) fn pull_next_release(&mut self) {
        if self.dispatcher.is_some() { return; }
        let Some(id) = self.backlog.pop_front() else { return; };
        let now = self.now;
        self.queue.retain(|q| *q != id);
        let Some(p) = self.registry.get_mut(id) else { return; };
        p.state = ProcessState::Releasing;
        p.holder = Holder::Dispatcher;
        p.release_done = Some(now + self.config.release_time);
        self.log.record(now, format!("Process {} finished execution, awaiting memory release", p.name));
        self.dispatcher = Some(id);
    }
}
