use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::SnapshotError;
use crate::id::IdGenerator;
use crate::model::{
    CrisisRecord, DiplomacyState, DiplomaticAgent, DiplomaticRelation, Negotiation, Treaty,
    TrendSnapshot,
};

const RELATIONS_FILE: &str = "relations.jsonl";
const TREATIES_FILE: &str = "treaties.jsonl";
const NEGOTIATIONS_FILE: &str = "negotiations.jsonl";
const CORPS_FILE: &str = "corps.jsonl";
const CRISES_FILE: &str = "crises.jsonl";
const TRENDS_FILE: &str = "trends.jsonl";
const META_FILE: &str = "meta.json";

/// Registry-wide scalars that do not belong to any one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub current_day: u32,
    pub id_gen: IdGenerator,
}

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Read a JSONL file back, skipping blank lines. Parse errors carry the file
/// name and 1-based line number.
fn read_jsonl<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, SnapshotError> {
    let reader = BufReader::new(File::open(dir.join(file))?);
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|source| SnapshotError::Parse {
            file: file.to_string(),
            line: index + 1,
            source,
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Flush the registry to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes one file per
/// record kind, each in registry order:
/// - `relations.jsonl`, `treaties.jsonl`, `negotiations.jsonl`
/// - `corps.jsonl`, `crises.jsonl`, `trends.jsonl`
/// - `meta.json` with the current day and the id counter
pub fn flush_to_jsonl(state: &DiplomacyState, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join(RELATIONS_FILE), state.relations.values())?;
    write_jsonl(&output_dir.join(TREATIES_FILE), state.treaties.values())?;
    write_jsonl(&output_dir.join(NEGOTIATIONS_FILE), state.negotiations.values())?;
    write_jsonl(&output_dir.join(CORPS_FILE), state.corps.values())?;
    write_jsonl(&output_dir.join(CRISES_FILE), state.crises.iter())?;
    write_jsonl(&output_dir.join(TRENDS_FILE), state.trends.values())?;

    let meta = SnapshotMeta {
        current_day: state.current_day,
        id_gen: state.id_gen.clone(),
    };
    let mut writer = BufWriter::new(File::create(output_dir.join(META_FILE))?);
    serde_json::to_writer_pretty(&mut writer, &meta)?;
    writer.flush()
}

/// Rebuild a registry from a directory written by [`flush_to_jsonl`].
///
/// The result is validated before it is returned; a snapshot that breaks a
/// registry invariant (hand-edited, or written by a buggy build) is rejected
/// rather than resumed.
pub fn restore_from_jsonl(dir: &Path) -> Result<DiplomacyState, SnapshotError> {
    let meta_file = File::open(dir.join(META_FILE))?;
    let meta: SnapshotMeta =
        serde_json::from_reader(BufReader::new(meta_file)).map_err(|source| {
            SnapshotError::Parse {
                file: META_FILE.to_string(),
                line: 1,
                source,
            }
        })?;

    let mut state = DiplomacyState::new();
    state.current_day = meta.current_day;
    state.id_gen = meta.id_gen;

    for rel in read_jsonl::<DiplomaticRelation>(dir, RELATIONS_FILE)? {
        let key = rel.key;
        if !state.insert_relation(rel) {
            return Err(reject(format!("duplicate relation {key}")));
        }
    }
    for treaty in read_jsonl::<Treaty>(dir, TREATIES_FILE)? {
        state.id_gen.reserve_past(treaty.id);
        if state.treaties.insert(treaty.id, treaty).is_some() {
            return Err(reject("duplicate treaty id".to_string()));
        }
    }
    for negotiation in read_jsonl::<Negotiation>(dir, NEGOTIATIONS_FILE)? {
        state.id_gen.reserve_past(negotiation.id);
        if state
            .negotiations
            .insert(negotiation.id, negotiation)
            .is_some()
        {
            return Err(reject("duplicate negotiation id".to_string()));
        }
    }
    for agent in read_jsonl::<DiplomaticAgent>(dir, CORPS_FILE)? {
        if state.corps.insert(agent.agent_id, agent).is_some() {
            return Err(reject("agent serves in two corps".to_string()));
        }
    }
    for crisis in read_jsonl::<CrisisRecord>(dir, CRISES_FILE)? {
        state.id_gen.reserve_past(crisis.id);
        state.crises.push(crisis);
    }
    for trend in read_jsonl::<TrendSnapshot>(dir, TRENDS_FILE)? {
        state.trends.insert(trend.day, trend);
    }

    state.validate().map_err(reject)?;
    Ok(state)
}

fn reject(problem: String) -> SnapshotError {
    tracing::warn!("rejecting diplomacy snapshot: {problem}");
    SnapshotError::Invariant(problem)
}
