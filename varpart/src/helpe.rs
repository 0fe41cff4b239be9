pub use std::{
    collections::VecDeque,
    io::{BufRead, BufReader},
    path::PathBuf,
    fmt,
};
pub use thiserror::Error;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use indexmap::IndexMap;
pub use clap::{Parser, ValueEnum};
pub use serde::{Deserialize, Serialize};
pub use tracing::{debug, info, warn};

pub use crate::{Process, Simulator,
    process::{ProcessState, Holder},
    partition::*,
    history::*,
    indicators::*,
    records::*,
};

/// The unit for measuring logical time. Every duration and every
/// timestamp in `varpart` is a whole number of ticks.
pub type Ticks = usize;

/// The unit for measuring memory. The simulator does not care whether
/// these are bytes or kilobytes; messages print them as `KB`.
pub type Units = usize;

/// Non-owning handle to a [`Process`]. Partitions, the dispatcher and
/// the queues refer to processes through this; only the registry owns them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(pub usize);

/// Policy for choosing which free partition serves a request.
#[derive(Copy, Clone, PartialEq, Eq, Hash, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// First hole, in address order, that is big enough
    FirstFit,
    /// Hole that leaves the smallest leftover
    BestFit,
    /// Biggest hole
    WorstFit,
    /// First big-enough hole after the last successful pick, wrapping around
    NextFit,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::FirstFit  => "first-fit",
            Strategy::BestFit   => "best-fit",
            Strategy::WorstFit  => "worst-fit",
            Strategy::NextFit   => "next-fit",
        };
        f.write_str(name)
    }
}

/// Run parameters. The three administrative times may be zero, in which
/// case the corresponding stage completes within the tick it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub total_memory:   Units,
    pub strategy:       Strategy,
    pub selection_time: Ticks,
    pub load_time:      Ticks,
    pub release_time:   Ticks,
}

impl Config {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.total_memory < 1 {
            return Err(SimError::InvalidConfig(
                String::from("total memory must be at least 1")
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV input at line {line}: {message}")]
    Csv {
        line:       usize,
        message:    String,
    },
}

#[derive(Error, Debug)]
#[error("{message}\n{:?}", culprit)]
/// Raised by [`records::init`](crate::records::init) when a record breaks
/// the input rules. `culprit` is `None` only for an empty batch.
pub struct InputError {
    pub message: String,
    pub culprit: Option<ProcessRecord>,
}

/// One line of user input: a process to be simulated.
///
/// Both the camel-case keys and the keys of the older Spanish-language
/// input files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    #[serde(alias = "nombre")]
    pub name:               String,
    #[serde(alias = "tiempo_arribo")]
    pub arrival:            Ticks,
    #[serde(alias = "duracion")]
    pub duration:           Ticks,
    #[serde(alias = "memoria_requerida")]
    pub memory_required:    Units,
}

/// Defines the interface for reading process records.
///
/// We ship a JSON reader and a CSV reader; the user can implement
/// their own types as needed.
pub trait RecordGen {
    fn new(path: PathBuf) -> Self;
    /// Either the raw records are returned, or the reason they
    /// could not be read. No validation happens here.
    fn read_records(&self) -> Result<Vec<ProcessRecord>, SimError>;
}

//---START EXTERNAL INTERFACES
/// A JSON array of [`ProcessRecord`] objects.
pub struct JsonParser {
    pub path: PathBuf,
}

impl RecordGen for JsonParser {
    fn new(path: PathBuf) -> Self {
        Self {
            path
        }
    }

    fn read_records(&self) -> Result<Vec<ProcessRecord>, SimError> {
        let fd = std::fs::File::open(self.path.as_path())?;
        let records = serde_json::from_reader(BufReader::new(fd))?;

        Ok(records)
    }
}

/// A CSV file with a header line followed by
/// `name,arrival,duration,memory` rows.
pub struct CsvParser {
    pub path: PathBuf,
}

impl CsvParser {
    fn parse_field(raw: &str, line: usize, what: &str) -> Result<usize, SimError> {
        raw.trim()
            .parse::<usize>()
            .map_err(|e| SimError::Csv {
                line,
                message: format!("bad {what} {raw:?} ({e})"),
            })
    }
}

impl RecordGen for CsvParser {
    fn new(path: PathBuf) -> Self {
        Self {
            path
        }
    }

    fn read_records(&self) -> Result<Vec<ProcessRecord>, SimError> {
        let fd = std::fs::File::open(self.path.as_path())?;
        let reader = BufReader::new(fd);
        let mut res = vec![];
        for (idx, line) in reader.lines()
            .enumerate()
            // First line is the header!
            .skip(1) {
            let line = line?;
            let line_num = idx + 1;
            if line.trim().is_empty() { continue; }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 4 {
                return Err(SimError::Csv {
                    line:       line_num,
                    message:    format!("expected 4 columns, found {}", fields.len()),
                });
            }
            res.push(ProcessRecord {
                name:               fields[0].trim().to_string(),
                arrival:            Self::parse_field(fields[1], line_num, "arrival")?,
                duration:           Self::parse_field(fields[2], line_num, "duration")?,
                memory_required:    Self::parse_field(fields[3], line_num, "memory")?,
            });
        }

        Ok(res)
    }
}
//---END EXTERNAL INTERFACES

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum InputFormat {
    /// A JSON array of process objects
    Json,
    /// A CSV file with a header line (name,arrival,duration,memory)
    Csv,
}

/// Reads records with the given parser and puts them through the
/// [`records::init`](crate::records::init) gatekeeper.
pub fn read_from_path<T>(file_path: PathBuf) -> Result<Vec<ProcessRecord>, SimError>
where T: RecordGen {
    let parser = T::new(file_path);
    let records = parser.read_records()?;
    let checked = crate::records::init(records)?;

    Ok(checked)
}
