use crate::helpe::*;

/// Checks a batch of raw records. A successfully returned batch is
/// guaranteed to be compliant with all of `varpart`'s assumptions:
/// - the batch is not empty
/// - no process has zero duration
/// - no process asks for zero memory
/// - no two processes share a name
///
/// This function is the gatekeeper to the rest of the library.
pub fn init(mut records: Vec<ProcessRecord>) -> Result<Vec<ProcessRecord>, InputError> {
    if records.is_empty() {
        return Err(InputError {
            message: String::from("No processes to simulate!"),
            culprit: None,
        });
    }
    let mut seen = std::collections::HashSet::new();
    for idx in 0..records.len() {
        let r = &records[idx];
        let message = if r.duration == 0 {
            "Process with 0 duration found!"
        } else if r.memory_required == 0 {
            "Process with 0 memory requirement found!"
        } else if !seen.insert(r.name.clone()) {
            "Duplicate process name found!"
        } else { continue; };

        return Err(InputError {
            message: String::from(message),
            culprit: Some(records.swap_remove(idx)),
        });
    }

    Ok(records)
}

/// Turns checked records into processes, in order of increasing
/// arrival. Ties keep their input order, and ids follow the sorted order.
pub fn spawn_processes(records: Vec<ProcessRecord>) -> Vec<Process> {
    records.into_iter()
        .sorted_by_key(|r| r.arrival)
        .enumerate()
        .map(|(idx, r)| Process::from_record(ProcessId(idx), r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(name: &str, arrival: Ticks, duration: Ticks, memory: Units) -> ProcessRecord {
        ProcessRecord {
            name:               name.to_string(),
            arrival,
            duration,
            memory_required:    memory,
        }
    }

    #[test]
    fn rejects_empty_batch() {
        let err = init(vec![]).unwrap_err();
        assert!(err.culprit.is_none());
    }

    #[test]
    fn rejects_zero_duration_and_names_culprit() {
        let err = init(vec![rec("A", 0, 3, 10), rec("B", 1, 0, 10)]).unwrap_err();
        assert_eq!(err.culprit, Some(rec("B", 1, 0, 10)));
    }

    #[test]
    fn rejects_zero_memory() {
        let err = init(vec![rec("A", 0, 3, 0)]).unwrap_err();
        assert!(err.message.contains("memory"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = init(vec![rec("A", 0, 3, 5), rec("A", 2, 3, 5)]).unwrap_err();
        assert_eq!(err.culprit.map(|r| r.arrival), Some(2));
    }

    #[test]
    fn spawning_sorts_by_arrival_stably() {
        let procs = spawn_processes(vec![
            rec("late", 9, 1, 1),
            rec("tie-a", 2, 1, 1),
            rec("early", 0, 1, 1),
            rec("tie-b", 2, 1, 1),
        ]);
        let names: Vec<&str> = procs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["early", "tie-a", "tie-b", "late"]);
        assert_eq!(procs[3].id, ProcessId(3));
    }

    #[test]
    fn accepts_spanish_key_names() {
        let raw = r#"[{"nombre": "P1", "tiempo_arribo": 0, "duracion": 4, "memoria_requerida": 30},
                      {"name": "P2", "arrival": 1, "duration": 2, "memoryRequired": 10}]"#;
        let parsed: Vec<ProcessRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, vec![rec("P1", 0, 4, 30), rec("P2", 1, 2, 10)]);
    }
}
