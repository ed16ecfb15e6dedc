//! Preprocessed judged-run format: `topic_id document_id relevance_label`

use super::{parse_field, read_lines};
use crate::error::{FusionError, Result};
use crate::types::{JudgedCorpus, JudgedEntry, JudgedRun, Relevance, RunId};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const JUDGED_FIELDS: usize = 3;
const JUDGED_SUFFIX: &str = "_preprocessed.txt";

/// File name of a run's preprocessed judgments
pub fn judged_file_name(run: RunId) -> String {
    format!("{}{}", run, JUDGED_SUFFIX)
}

/// Parse one preprocessed file; lines keep their rank order within each topic
pub fn read_judged_run(path: &Path, run: RunId) -> Result<JudgedRun> {
    let mut judged = JudgedRun::new(run);
    for (line_number, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != JUDGED_FIELDS {
            return Err(FusionError::MalformedLine {
                path: path.to_path_buf(),
                line_number,
                expected: format!("{} fields", JUDGED_FIELDS),
                found: format!("{} fields", fields.len()),
                line,
            });
        }

        let topic = parse_field(path, line_number, &line, fields[0], "topic id")?;
        let label = Relevance::from_label(fields[2]).ok_or_else(|| FusionError::MalformedLine {
            path: path.to_path_buf(),
            line_number,
            expected: "relevance label 1, 0 or -1".to_string(),
            found: format!("'{}'", fields[2]),
            line: line.clone(),
        })?;

        judged
            .topics
            .entry(topic)
            .or_default()
            .push(JudgedEntry::new(fields[1], label));
    }
    Ok(judged)
}

/// Write one run's judgments
pub fn write_judged_run(path: &Path, run: &JudgedRun) -> Result<()> {
    super::ensure_parent(path)?;
    let file = std::fs::File::create(path)
        .map_err(|e| FusionError::io(e, format!("Failed to create {:?}", path)))?;
    let mut writer = std::io::BufWriter::new(file);
    write_entries(&mut writer, run)
        .and_then(|_| writer.flush())
        .map_err(|e| FusionError::io(e, format!("Failed to write {:?}", path)))
}

fn write_entries<W: Write>(writer: &mut W, run: &JudgedRun) -> std::io::Result<()> {
    for (topic, entries) in &run.topics {
        for entry in entries {
            writeln!(writer, "{} {} {}", topic, entry.doc_id, entry.label.as_label())?;
        }
    }
    Ok(())
}

/// Read every `<run>_preprocessed.txt` in `dir`; exactly `expected_runs` are required
pub fn read_judged_dir(dir: &Path, expected_runs: usize) -> Result<JudgedCorpus> {
    if !dir.is_dir() {
        return Err(FusionError::Structural(format!(
            "expected a directory of preprocessed judgments at {:?}",
            dir
        )));
    }

    let mut files: Vec<(RunId, PathBuf)> = Vec::new();
    let entries =
        std::fs::read_dir(dir).map_err(|e| FusionError::io(e, format!("Failed to list {:?}", dir)))?;
    for entry in entries {
        let path = entry
            .map_err(|e| FusionError::io(e, format!("Failed to list {:?}", dir)))?
            .path();
        let run = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(JUDGED_SUFFIX))
            .and_then(|prefix| prefix.parse::<RunId>().ok());
        if let Some(run) = run {
            if let Some((_, existing)) = files.iter().find(|(seen, _)| *seen == run) {
                return Err(FusionError::Structural(format!(
                    "run {} has two preprocessed files: {:?} and {:?}",
                    run, existing, path
                )));
            }
            files.push((run, path));
        }
    }

    if files.len() != expected_runs {
        return Err(FusionError::Structural(format!(
            "expected {} preprocessed runs in {:?}, found {}",
            expected_runs,
            dir,
            files.len()
        )));
    }

    let runs = files
        .iter()
        .map(|(run, path)| read_judged_run(path, *run))
        .collect::<Result<Vec<_>>>()?;
    let corpus = JudgedCorpus::new(runs);
    super::ensure_same_topics(
        corpus
            .runs()
            .iter()
            .map(|run| (run.run, run.topics.keys().copied().collect())),
    )?;
    info!("Loaded {} judged runs from {:?}", corpus.len(), dir);
    Ok(corpus)
}
