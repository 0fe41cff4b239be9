use crate::helpe::*;

/// What a [`Partition`] currently holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionState {
    Free,
    Occupied(ProcessId),
    /// Freed ahead of its formal release: available to every placement
    /// decision, but still remembering the process whose release
    /// bookkeeping is pending.
    Reclaimed(ProcessId),
}

impl PartitionState {
    #[inline(always)]
    pub fn is_free(&self) -> bool {
        !matches!(self, PartitionState::Occupied(_))
    }

    /// The process this partition refers to, if any.
    #[inline(always)]
    pub fn holder(&self) -> Option<ProcessId> {
        match self {
            PartitionState::Free            => None,
            PartitionState::Occupied(id)    => Some(*id),
            PartitionState::Reclaimed(id)   => Some(*id),
        }
    }
}

/// A contiguous range `[start, start + size)` of the simulated memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub start:  Units,
    pub size:   Units,
    pub state:  PartitionState,
}

impl Partition {
    pub fn free(start: Units, size: Units) -> Self {
        Self {
            start,
            size,
            state: PartitionState::Free,
        }
    }

    #[inline(always)]
    pub fn end(&self) -> Units {
        self.start + self.size
    }

    /// Returns `true` if `[start, start + size)` lies entirely within.
    #[inline(always)]
    pub fn contains(&self, start: Units, size: Units) -> bool {
        self.start <= start && start + size <= self.end()
    }

    #[inline(always)]
    fn fits(&self, size: Units) -> bool {
        self.state.is_free() && self.size >= size
    }
}

/// The memory layout: an ordered list of partitions covering
/// `[0, total)` without gaps or overlaps.
///
/// Partitions are only ever created by splitting a free one during
/// [allocation](PartitionTable::allocate), and only ever destroyed by
/// [merging](PartitionTable::merge_adjacent_free) after a release.
#[derive(Clone, Debug)]
pub struct PartitionTable {
    parts:          Vec<Partition>,
    total:          Units,
    // Index (not offset!) from which next-fit resumes scanning.
    next_fit_from:  usize,
}

impl PartitionTable {
    pub fn new(total: Units) -> Self {
        Self {
            parts:          vec![Partition::free(0, total)],
            total,
            next_fit_from:  0,
        }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.parts
    }

    pub fn total(&self) -> Units {
        self.total
    }

    pub fn next_fit_cursor(&self) -> usize {
        self.next_fit_from
    }

    /// Sum of all free space, reclaimed partitions included.
    pub fn free_total(&self) -> Units {
        self.parts.iter()
            .filter(|p| p.state.is_free())
            .map(|p| p.size)
            .sum()
    }

    /// Checks the layout invariant: sorted, gapless, non-overlapping,
    /// and summing up to the total memory.
    pub fn is_consistent(&self) -> bool {
        let mut expected_start = 0;
        for p in &self.parts {
            if p.start != expected_start || p.size == 0 { return false; }
            expected_start = p.end();
        }

        expected_start == self.total
    }

    /// Returns `true` if some pair of neighbours are both free.
    pub fn has_adjacent_free(&self) -> bool {
        self.parts
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.state.is_free() && b.state.is_free())
    }

    //---START FIT STRATEGIES
    pub fn first_fit(&self, size: Units) -> Option<Units> {
        self.parts.iter()
            .find(|p| p.fits(size))
            .map(|p| p.start)
    }

    pub fn best_fit(&self, size: Units) -> Option<Units> {
        let mut best: Option<&Partition> = None;
        let mut smallest_waste = Units::MAX;
        for p in self.parts.iter().filter(|p| p.fits(size)) {
            let waste = p.size - size;
            // Strictly smaller, so that ties keep the first one found.
            if waste < smallest_waste {
                smallest_waste = waste;
                best = Some(p);
            }
        }

        best.map(|p| p.start)
    }

    pub fn worst_fit(&self, size: Units) -> Option<Units> {
        let mut worst: Option<&Partition> = None;
        for p in self.parts.iter().filter(|p| p.fits(size)) {
            if worst.map_or(true, |w| p.size > w.size) {
                worst = Some(p);
            }
        }

        worst.map(|p| p.start)
    }

    /// Circular scan starting right after the last successful pick.
    /// Moves the cursor on success.
    pub fn next_fit(&mut self, size: Units) -> Option<Units> {
        let n = self.parts.len();
        for i in 0..n {
            let idx = (self.next_fit_from + i) % n;
            if self.parts[idx].fits(size) {
                self.next_fit_from = idx + 1;
                return Some(self.parts[idx].start);
            }
        }

        None
    }

    pub fn placement(&mut self, strategy: Strategy, size: Units) -> Option<Units> {
        match strategy {
            Strategy::FirstFit  => self.first_fit(size),
            Strategy::BestFit   => self.best_fit(size),
            Strategy::WorstFit  => self.worst_fit(size),
            Strategy::NextFit   => self.next_fit(size),
        }
    }
    //---END FIT STRATEGIES

    /// Chooses a hole for `proc` and stores its start as the process'
    /// target. Failing to find one is not an error: the target is left
    /// unresolved and the attempt is simply logged.
    pub fn select_for(
        &mut self,
        strategy:   Strategy,
        proc:       &mut Process,
        now:        Ticks,
        log:        &mut EventLog,
    ) -> Option<Units> {
        let found = self.placement(strategy, proc.memory);
        match found {
            Some(start) => {
                log.record(now, format!("Selected hole start={start} for {} ({}KB)", proc.name, proc.memory));
            },
            None        => {
                log.record(now, format!("No space for {} ({}KB)", proc.name, proc.memory));
            }
        }
        proc.target = found;

        found
    }

    /// Carves `[start, start + proc.memory)` out of the free partition
    /// that contains it. The chosen hole may have changed since selection,
    /// in which case nothing happens and `false` is returned.
    pub fn allocate(
        &mut self,
        start:  Units,
        proc:   &Process,
        now:    Ticks,
        log:    &mut EventLog,
    ) -> bool {
        let size = proc.memory;
        let Some(idx) = self.parts
            .iter()
            .position(|p| p.state.is_free() && p.contains(start, size)) else {
            log.record(now, format!("No free partition contains start={start} for {}", proc.name));
            return false;
        };

        let host = self.parts[idx].clone();
        let left = start - host.start;
        let right = host.end() - (start + size);
        let mut pieces = Vec::with_capacity(3);
        if left > 0 {
            pieces.push(Partition::free(host.start, left));
        }
        pieces.push(Partition {
            start,
            size,
            state: PartitionState::Occupied(proc.id),
        });
        if right > 0 {
            pieces.push(Partition::free(start + size, right));
        }
        self.parts.splice(idx..=idx, pieces);

        if left > 0 || right > 0 {
            log.record(now, format!("Partition split for {}: {size}KB", proc.name));
        }
        log.record(now, format!("Assigned partition to {} ({size}KB) at start {start}", proc.name));
        debug_assert!(self.is_consistent(), "Bad split!");

        true
    }

    /// Frees the partition occupied by `id` without any bookkeeping.
    /// The partition keeps referring to the process until
    /// [`release`](Self::release) runs for it.
    pub fn reclaim(&mut self, id: ProcessId) -> bool {
        match self.parts
            .iter_mut()
            .find(|p| p.state == PartitionState::Occupied(id)) {
            Some(p) => {
                p.state = PartitionState::Reclaimed(id);
                true
            },
            None    => false,
        }
    }

    /// Marks the partition referring to `proc` as free and coalesces the
    /// layout. Returns `false`, touching nothing, if no partition refers
    /// to it anymore.
    pub fn release(&mut self, proc: &Process, now: Ticks, log: &mut EventLog) -> bool {
        let Some(part) = self.parts
            .iter_mut()
            .find(|p| p.state.holder() == Some(proc.id)) else {
            return false;
        };
        part.state = PartitionState::Free;
        log.record(now, format!("Released partition of {} (size {}KB)", proc.name, part.size));
        self.merge_adjacent_free(now, log);

        true
    }

    /// Single left-to-right pass coalescing runs of free partitions.
    /// The left partition absorbs its right neighbour and keeps its own state.
    pub fn merge_adjacent_free(&mut self, now: Ticks, log: &mut EventLog) {
        let mut i = 0;
        while i + 1 < self.parts.len() {
            if self.parts[i].state.is_free() && self.parts[i + 1].state.is_free() {
                let absorbed = self.parts.remove(i + 1);
                self.parts[i].size += absorbed.size;
                log.record(now, format!("Partitions merged at start {}", self.parts[i].start));
            } else {
                i += 1;
            }
        }
    }

    /// Frozen copy of the layout, resolving process references
    /// through `lookup`.
    pub fn snapshot<'a, F>(&self, lookup: F) -> Vec<PartitionView>
    where F: Fn(ProcessId) -> Option<&'a Process> {
        self.parts.iter()
            .map(|p| PartitionView {
                start:      p.start,
                size:       p.size,
                status:     if p.state.is_free() { Status::Free } else { Status::Occupied },
                process:    p.state.holder().and_then(&lookup).map(Process::view),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proc(id: usize, memory: Units) -> Process {
        Process::from_record(ProcessId(id), ProcessRecord {
            name:               format!("P{id}"),
            arrival:            0,
            duration:           1,
            memory_required:    memory,
        })
    }

    // free [0,100), occupied [100,150), free [150,400)
    fn worked_layout() -> (PartitionTable, EventLog) {
        let mut table = PartitionTable::new(400);
        let mut log = EventLog::default();
        assert!(table.allocate(100, &proc(9, 50), 0, &mut log));
        (table, log)
    }

    fn layout(table: &PartitionTable) -> Vec<(Units, Units, bool)> {
        table.partitions()
            .iter()
            .map(|p| (p.start, p.size, p.state.is_free()))
            .collect()
    }

    #[test]
    fn worked_layout_is_as_expected() {
        let (table, log) = worked_layout();
        assert_eq!(layout(&table), vec![(0, 100, true), (100, 50, false), (150, 250, true)]);
        assert_eq!(log.lines().collect::<Vec<_>>(), vec![
            "[0]: Partition split for P9: 50KB".to_string(),
            "[0]: Assigned partition to P9 (50KB) at start 100".to_string(),
        ]);
    }

    #[test]
    fn first_and_best_fit_pick_the_low_hole() {
        let (mut table, _) = worked_layout();
        assert_eq!(table.placement(Strategy::FirstFit, 80), Some(0));
        assert_eq!(table.placement(Strategy::BestFit, 80), Some(0));
    }

    #[test]
    fn worst_fit_picks_the_biggest_hole() {
        let (mut table, _) = worked_layout();
        assert_eq!(table.placement(Strategy::WorstFit, 80), Some(150));
        // Only the big hole qualifies.
        assert_eq!(table.placement(Strategy::BestFit, 120), Some(150));
        assert_eq!(table.placement(Strategy::FirstFit, 251), None);
    }

    #[test]
    fn best_and_worst_fit_ties_keep_the_first() {
        let mut table = PartitionTable::new(300);
        let mut log = EventLog::default();
        // free [0,100), occupied [100,200), free [200,300)
        assert!(table.allocate(100, &proc(1, 100), 0, &mut log));
        assert_eq!(table.best_fit(50), Some(0));
        assert_eq!(table.worst_fit(50), Some(0));
    }

    #[test]
    fn next_fit_wraps_around_from_its_cursor() {
        let (mut table, _) = worked_layout();
        assert_eq!(table.next_fit_cursor(), 0);
        assert_eq!(table.placement(Strategy::NextFit, 80), Some(0));
        assert_eq!(table.next_fit_cursor(), 1);
        assert_eq!(table.placement(Strategy::NextFit, 80), Some(150));
        assert_eq!(table.next_fit_cursor(), 3);
        assert_eq!(table.placement(Strategy::NextFit, 80), Some(0));
        assert_eq!(table.next_fit_cursor(), 1);
        // Failure leaves the cursor alone.
        assert_eq!(table.placement(Strategy::NextFit, 500), None);
        assert_eq!(table.next_fit_cursor(), 1);
    }

    #[test]
    fn allocation_fails_when_hole_is_gone() {
        let (mut table, mut log) = worked_layout();
        assert!(!table.allocate(120, &proc(2, 10), 3, &mut log));
        assert!(!table.allocate(60, &proc(2, 50), 3, &mut log));
        assert_eq!(log.events().last().map(|e| e.message.as_str()),
            Some("No free partition contains start=60 for P2"));
        assert_eq!(layout(&table), vec![(0, 100, true), (100, 50, false), (150, 250, true)]);
    }

    #[test]
    fn exact_fit_does_not_split() {
        let mut table = PartitionTable::new(64);
        let mut log = EventLog::default();
        assert!(table.allocate(0, &proc(1, 64), 0, &mut log));
        assert_eq!(log.len(), 1);
        assert_eq!(table.free_total(), 0);
    }

    #[test]
    fn release_merges_neighbours() {
        let mut table = PartitionTable::new(100);
        let mut log = EventLog::default();
        let (a, b, c) = (proc(1, 20), proc(2, 30), proc(3, 10));
        assert!(table.allocate(0, &a, 0, &mut log));
        assert!(table.allocate(20, &b, 0, &mut log));
        assert!(table.allocate(50, &c, 0, &mut log));
        assert!(table.release(&a, 1, &mut log));
        assert!(!table.has_adjacent_free());
        assert!(table.release(&c, 2, &mut log));
        assert!(!table.has_adjacent_free());
        assert_eq!(layout(&table), vec![(0, 20, true), (20, 30, false), (50, 50, true)]);
        assert!(table.release(&b, 3, &mut log));
        assert!(!table.has_adjacent_free());
        assert_eq!(layout(&table), vec![(0, 100, true)]);
        assert!(table.is_consistent());
    }

    #[test]
    fn release_of_unknown_process_fails_softly() {
        let (mut table, mut log) = worked_layout();
        let before = log.len();
        assert!(!table.release(&proc(4, 10), 1, &mut log));
        assert_eq!(log.len(), before);
        assert_eq!(layout(&table), vec![(0, 100, true), (100, 50, false), (150, 250, true)]);
    }

    #[test]
    fn reclaimed_partition_counts_as_free_until_released() {
        let mut table = PartitionTable::new(100);
        let mut log = EventLog::default();
        let a = proc(1, 40);
        assert!(table.allocate(0, &a, 0, &mut log));
        assert!(table.reclaim(a.id));
        assert!(!table.reclaim(a.id));
        assert_eq!(table.free_total(), 100);
        assert_eq!(table.partitions()[0].state, PartitionState::Reclaimed(a.id));
        assert!(table.release(&a, 2, &mut log));
        assert_eq!(layout(&table), vec![(0, 100, true)]);
    }

    #[test]
    fn merging_keeps_the_left_state() {
        let mut table = PartitionTable::new(100);
        let mut log = EventLog::default();
        let (a, b) = (proc(1, 50), proc(2, 50));
        assert!(table.allocate(0, &a, 0, &mut log));
        assert!(table.allocate(50, &b, 0, &mut log));
        assert!(table.reclaim(b.id));
        // Releasing `a` swallows b's reclaimed partition...
        assert!(table.release(&a, 1, &mut log));
        assert_eq!(layout(&table), vec![(0, 100, true)]);
        // ...so b's own release finds nothing to do.
        assert!(!table.release(&b, 2, &mut log));
    }
}
