use crate::helpe::*;

/// Turnaround of a single completed process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turnaround {
    pub name:   String,
    pub ticks:  Ticks,
}

/// Every indicator of a run, gathered for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub strategy:               Strategy,
    pub completed:              usize,
    pub unfinished:             usize,
    pub elapsed:                Ticks,
    pub turnarounds:            Vec<Turnaround>,
    pub batch_turnaround:       Option<Ticks>,
    pub mean_turnaround:        f64,
    pub external_fragmentation: Units,
}

impl Simulator {
    /// How much free memory counts as fragmentation this tick. Free space
    /// only counts while some process is actually waiting for memory:
    /// it has arrived but not been admitted, it is being selected or
    /// loaded, or it is queued between those stages. Resident processes
    /// alone create no demand.
    pub(crate) fn fragmentation_sample(&self) -> Units {
        let now = self.now;
        let arrived_waiting = self.registry
            .pending()
            .any(|p| p.has_arrived(now));
        let dispatcher_busy = matches!(
            self.dispatched_state(),
            Some(ProcessState::Selecting | ProcessState::Loading)
        );
        let queue_busy = self.queue
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .any(|p| matches!(
                p.state,
                ProcessState::Selected | ProcessState::Loading | ProcessState::AwaitingMemory
            ));

        if arrived_waiting || dispatcher_busy || queue_busy {
            self.table.free_total()
        } else { 0 }
    }

    /// Per-process turnaround, in order of completion.
    pub fn turnarounds(&self) -> Vec<Turnaround> {
        self.registry
            .completed()
            .filter_map(|p| p.turnaround().map(|ticks| Turnaround {
                name: p.name.clone(),
                ticks,
            }))
            .collect()
    }

    /// Arithmetic mean of [`turnarounds`](Self::turnarounds); 0 when
    /// nothing has completed.
    pub fn mean_turnaround(&self) -> f64 {
        let trs = self.turnarounds();
        if trs.is_empty() { return 0.0; }
        let sum: Ticks = trs.iter().map(|t| t.ticks).sum();

        sum as f64 / trs.len() as f64
    }

    /// Time from the earliest selection start to the latest release
    /// among completed processes. `None` when nothing has completed.
    pub fn batch_turnaround(&self) -> Option<Ticks> {
        let sel = self.config.selection_time;
        let first_start = self.registry
            .completed()
            .filter_map(|p| p.selection_done)
            .min()?
            - sel;
        let last_release = self.registry
            .completed()
            .filter_map(|p| p.release_done)
            .max()?;

        Some(last_release - first_start)
    }

    /// Index of the last simulated tick.
    pub fn elapsed(&self) -> Ticks {
        self.now.saturating_sub(1)
    }

    pub fn report(&self) -> Report {
        Report {
            strategy:               self.config.strategy,
            completed:              self.registry.completed().count(),
            unfinished:             self.registry.active().count(),
            elapsed:                self.elapsed(),
            turnarounds:            self.turnarounds(),
            batch_turnaround:       self.batch_turnaround(),
            mean_turnaround:        self.mean_turnaround(),
            external_fragmentation: self.frag,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy:\t\t\t{}", self.strategy)?;
        writeln!(f, "Completed processes:\t\t{}", self.completed)?;
        if self.unfinished > 0 {
            writeln!(f, "Unfinished processes:\t\t{}", self.unfinished)?;
        }
        writeln!(f, "Total time (ticks):\t\t{}", self.elapsed)?;
        writeln!(f, "Turnaround per process:")?;
        for t in &self.turnarounds {
            writeln!(f, "\t{}:\t{}", t.name, t.ticks)?;
        }
        match self.batch_turnaround {
            Some(b) => writeln!(f, "Batch turnaround:\t\t{b}")?,
            None    => writeln!(f, "Batch turnaround:\t\t-")?,
        }
        writeln!(f, "Mean turnaround:\t\t{:.2}", self.mean_turnaround)?;
        write!(f, "External fragmentation:\t\t{}", self.external_fragmentation)
    }
}

/// Runs the same batch once per placement strategy and returns one
/// [Report] each, in [Strategy] declaration order.
///
/// Runs are independent, so they are spread over rayon's pool; each one
/// stays deterministic.
pub fn compare_strategies(
    base:       &Config,
    records:    &[ProcessRecord],
    max_ticks:  Ticks,
) -> Result<Vec<Report>, SimError> {
    Strategy::value_variants()
        .par_iter()
        .map(|&strategy| {
            let config = Config { strategy, ..base.clone() };
            let mut sim = Simulator::new(config, records.to_vec())?;
            sim.run(max_ticks);

            Ok(sim.report())
        })
        .collect()
}
