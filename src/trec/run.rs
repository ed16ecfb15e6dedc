//! Ranked-run format: `topic_id Q0 document_id rank score run_label`

use super::{parse_field, read_lines};
use crate::error::{FusionError, Result};
use crate::fusion::FusedRanking;
use crate::types::{RankedRun, RunId, ScoredEntry, TopicId};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RUN_FIELDS: usize = 6;

/// Parse a ranked-run file, grouping entries by topic in ascending rank order
pub fn read_run(path: &Path, run: RunId) -> Result<RankedRun> {
    let mut ranked: BTreeMap<TopicId, Vec<(i64, ScoredEntry)>> = BTreeMap::new();

    for (line_number, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != RUN_FIELDS {
            return Err(FusionError::MalformedLine {
                path: path.to_path_buf(),
                line_number,
                expected: format!("{} fields", RUN_FIELDS),
                found: format!("{} fields", fields.len()),
                line,
            });
        }

        let topic: TopicId = parse_field(path, line_number, &line, fields[0], "topic id")?;
        let rank: i64 = parse_field(path, line_number, &line, fields[3], "rank")?;
        let score: f64 = parse_field(path, line_number, &line, fields[4], "score")?;
        if !score.is_finite() {
            return Err(FusionError::MalformedLine {
                path: path.to_path_buf(),
                line_number,
                expected: "finite score".to_string(),
                found: format!("'{}'", fields[4]),
                line,
            });
        }

        ranked
            .entry(topic)
            .or_default()
            .push((rank, ScoredEntry::new(fields[2], score)));
    }

    let mut result = RankedRun::new(run);
    for (topic, mut entries) in ranked {
        entries.sort_by_key(|(rank, _)| *rank);
        result
            .topics
            .insert(topic, entries.into_iter().map(|(_, e)| e).collect());
    }

    debug!(
        "Read run {} from {:?}: {} topics",
        run,
        path,
        result.topics.len()
    );
    Ok(result)
}

/// Locate `run1 .. runN` under `dir`, each holding exactly one `.res` file
pub fn discover_run_files(dir: &Path, expected_runs: usize) -> Result<Vec<(RunId, PathBuf)>> {
    if !dir.is_dir() {
        return Err(FusionError::Structural(format!(
            "expected a directory {:?} containing run1 .. run{}",
            dir, expected_runs
        )));
    }

    let mut files = Vec::with_capacity(expected_runs);
    for run in 1..=expected_runs {
        let run_dir = dir.join(format!("run{}", run));
        if !run_dir.is_dir() {
            return Err(FusionError::Structural(format!(
                "missing run directory {:?}",
                run_dir
            )));
        }

        let entries = std::fs::read_dir(&run_dir)
            .map_err(|e| FusionError::io(e, format!("Failed to list {:?}", run_dir)))?;
        let mut res_files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| FusionError::io(e, format!("Failed to list {:?}", run_dir)))?
                .path();
            if path.extension().is_some_and(|ext| ext == "res") {
                res_files.push(path);
            }
        }

        match res_files.as_slice() {
            [single] => files.push((run, single.clone())),
            other => {
                return Err(FusionError::Structural(format!(
                    "expected exactly one .res file in {:?}, found {}",
                    run_dir,
                    other.len()
                )))
            }
        }
    }
    Ok(files)
}

/// Discover and parse every run under `dir`
pub fn read_runs(dir: &Path, expected_runs: usize) -> Result<Vec<RankedRun>> {
    let runs = discover_run_files(dir, expected_runs)?
        .into_iter()
        .map(|(run, path)| read_run(&path, run))
        .collect::<Result<Vec<_>>>()?;
    super::ensure_same_topics(
        runs.iter()
            .map(|run| (run.run, run.topics.keys().copied().collect())),
    )?;
    info!("Loaded {} runs from {:?}", runs.len(), dir);
    Ok(runs)
}

/// Serialize a fused ranking, rank 0-based, at most `depth` lines per topic
pub fn write_ranking<W: Write>(
    writer: &mut W,
    ranking: &FusedRanking,
    run_label: &str,
    depth: usize,
) -> std::io::Result<()> {
    for (topic, entries) in ranking.iter() {
        for (rank, entry) in entries.iter().take(depth).enumerate() {
            writeln!(
                writer,
                "{} Q0 {} {} {} {}",
                topic, entry.doc_id, rank, entry.score, run_label
            )?;
        }
    }
    Ok(())
}

/// Write a fused ranking to `path`, creating parent directories
pub fn write_ranking_file(
    path: &Path,
    ranking: &FusedRanking,
    run_label: &str,
    depth: usize,
) -> Result<()> {
    super::ensure_parent(path)?;
    let file = std::fs::File::create(path)
        .map_err(|e| FusionError::io(e, format!("Failed to create {:?}", path)))?;
    let mut writer = std::io::BufWriter::new(file);
    write_ranking(&mut writer, ranking, run_label, depth)
        .and_then(|_| writer.flush())
        .map_err(|e| FusionError::io(e, format!("Failed to write {:?}", path)))?;

    info!("Wrote {} ({} topics) to {:?}", run_label, ranking.topic_count(), path);
    Ok(())
}
