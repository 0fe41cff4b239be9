use crate::helpe::*;

/// A human-readable, timestamped record of something the simulator did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick:       Ticks,
    pub message:    String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.tick, self.message)
    }
}

/// Append-only list of [`Event`]s, in order of occurence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn record(&mut self, tick: Ticks, message: impl Into<String>) {
        let message = message.into();
        debug!(tick, %message, "event");
        self.events.push(Event { tick, message });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The log rendered as `"[tick]: message"` lines.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.events.iter().map(|e| e.to_string())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Frozen copy of a process' public fields, as seen at snapshot time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessView {
    pub name:           String,
    pub arrival:        Ticks,
    pub duration:       Ticks,
    pub memory:         Units,
    pub state:          ProcessState,
    pub target:         Option<Units>,
    pub selection_done: Option<Ticks>,
    pub load_done:      Option<Ticks>,
    pub exec_done:      Option<Ticks>,
    pub release_done:   Option<Ticks>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Free,
    Occupied,
}

/// Frozen copy of a partition. A free partition may still carry a
/// process, if that process' release is underway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionView {
    pub start:      Units,
    pub size:       Units,
    pub status:     Status,
    pub process:    Option<ProcessView>,
}

impl PartitionView {
    /// Returns `true` if the partition is attributable, at tick `t`, to a
    /// process that is still running.
    pub fn is_running_at(&self, t: Ticks) -> bool {
        if self.status != Status::Occupied { return false; }
        match &self.process {
            Some(p) => {
                p.state != ProcessState::Releasing
                    && p.exec_done.map_or(true, |done| t < done)
            },
            None    => true,
        }
    }
}

/// The memory layout as it stood at the end of tick [`tick`](Frame::tick).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub tick:       Ticks,
    pub partitions: Vec<PartitionView>,
}

/// One [`Frame`] per simulated tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    frames: Vec<Frame>,
}

impl History {
    pub fn push(&mut self, frame: Frame) {
        debug_assert!(self.frames.last().map_or(true, |f| f.tick < frame.tick), "Frames out of order!");
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The latest tick at which some occupied partition still belongs to
    /// a running process, or 0 if there is none. This is where a chart
    /// of the run would stop drawing.
    pub fn last_visible_tick(&self) -> Ticks {
        self.frames
            .iter()
            .filter(|f| f.partitions.iter().any(|p| p.is_running_at(f.tick)))
            .map(|f| f.tick)
            .max()
            .unwrap_or(0)
    }

    /// Serializes all frames as a JSON array.
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(&self.frames)?)
    }
}
