use crate::{helpe::*, process::ProcessRegistry};

impl Simulator {
    /// Creates a new [Simulator] at tick 0, with all memory in a single
    /// free partition and every process pending.
    pub fn new(config: Config, records: Vec<ProcessRecord>) -> Result<Self, SimError> {
        config.validate()?;
        let records = crate::records::init(records)?;
        let procs = crate::records::spawn_processes(records);
        info!(
            processes = procs.len(),
            memory = config.total_memory,
            strategy = %config.strategy,
            "simulation created"
        );

        let mut log = EventLog::default();
        log.record(0, format!(
            "Simulation started. Memory={}, Strategy={}",
            config.total_memory,
            config.strategy
        ));

        Ok(Self {
            table:      PartitionTable::new(config.total_memory),
            config,
            now:        0,
            registry:   ProcessRegistry::new(procs),
            dispatcher: None,
            queue:      vec![],
            backlog:    VecDeque::new(),
            log,
            history:    History::default(),
            frag:       0,
        })
    }

    /// Advances the simulation by exactly one tick.
    ///
    /// The order below is load-bearing: the repeated completion checks let
    /// zero-length stages finish within the tick they start in, and the
    /// second placement pass picks up a load that just completed.
    pub fn step(&mut self) {
        self.finish_dispatched();
        self.release_intake();
        self.finish_dispatched();
        self.commit_to_memory();
        self.admit_next();
        self.finish_dispatched();
        self.begin_load();
        self.finish_dispatched();
        self.commit_to_memory();

        self.record_frame();
        self.frag += self.fragmentation_sample();
        debug_assert!(self.table.is_consistent(), "Broken partition table at tick {}", self.now);
        self.now += 1;
    }

    /// Returns `true` while some process is pending, waiting or held by
    /// the dispatcher.
    pub fn has_pending_work(&self) -> bool {
        self.registry.has_pending()
            || !self.queue.is_empty()
            || self.dispatcher.is_some()
    }

    /// Steps until there is no work left, or `max_ticks` ticks have run.
    /// A request that can never be satisfied stalls forever, so the cap is
    /// the only thing that stops such a run. Returns the ticks executed.
    pub fn run(&mut self, max_ticks: Ticks) -> Ticks {
        let mut ticks = 0;
        while self.has_pending_work() && ticks < max_ticks {
            self.step();
            ticks += 1;
        }
        if self.has_pending_work() {
            warn!(
                ticks,
                stuck = self.registry.active().count(),
                "tick cap reached with work still pending"
            );
        } else {
            info!(
                ticks,
                completed = self.registry.completed().count(),
                "simulation finished"
            );
        }

        ticks
    }

    fn record_frame(&mut self) {
        let registry = &self.registry;
        let partitions = self.table.snapshot(|id| registry.get(id));
        self.history.push(Frame {
            tick: self.now,
            partitions,
        });
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The tick about to be simulated.
    pub fn now(&self) -> Ticks {
        self.now
    }

    /// Processes not yet completed, in order of arrival.
    pub fn active(&self) -> impl Iterator<Item = &Process> {
        self.registry.active()
    }

    /// Completed processes, in order of completion.
    pub fn completed(&self) -> impl Iterator<Item = &Process> {
        self.registry.completed()
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.registry.get(id)
    }

    pub fn dispatcher(&self) -> Option<&Process> {
        self.dispatcher.and_then(|id| self.registry.get(id))
    }

    pub fn partitions(&self) -> &[Partition] {
        self.table.partitions()
    }

    pub fn events(&self) -> &[Event] {
        self.log.events()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Free memory summed over every tick in which some process was
    /// waiting for it.
    pub fn external_fragmentation(&self) -> Units {
        self.frag
    }
}
