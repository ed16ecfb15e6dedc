//! Reading evaluator summaries and picking the best run by MAP
//!
//! The evaluator itself is an external tool; this module only consumes its
//! `measure<TAB>query<TAB>value` summary output.

use crate::error::{FusionError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EVAL_SUFFIX: &str = "_eval.txt";

/// Aggregate ("all") measures of one evaluated run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalSummary {
    pub measures: BTreeMap<String, f64>,
}

impl EvalSummary {
    /// Parse an evaluator summary, keeping only the rows aggregated over all queries
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut measures = BTreeMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() != 3 {
                return Err(FusionError::MalformedLine {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    expected: "3 tab-separated fields".to_string(),
                    found: format!("{} fields", fields.len()),
                    line: line.to_string(),
                });
            }
            if fields[1] != "all" {
                continue;
            }

            // Non-numeric rows such as runid are skipped
            if let Ok(value) = fields[2].parse::<f64>() {
                measures.insert(fields[0].to_string(), value);
            }
        }

        Ok(Self { measures })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FusionError::io(e, format!("Failed to read {:?}", path)))?;
        Self::parse(path, &content)
    }

    pub fn map(&self) -> Option<f64> {
        self.measures.get("map").copied()
    }
}

/// Collect every `<name>_eval.txt` below `dir`, keyed by `<name>`
pub fn read_eval_tree(dir: &Path) -> Result<BTreeMap<String, EvalSummary>> {
    let mut summaries = BTreeMap::new();
    let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .map_err(|e| FusionError::io(e, format!("Failed to list {:?}", current)))?;
        for entry in entries {
            let path = entry
                .map_err(|e| FusionError::io(e, format!("Failed to list {:?}", current)))?
                .path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(EVAL_SUFFIX))
                .map(str::to_string);
            if let Some(name) = name {
                debug!("Reading evaluation {:?}", path);
                summaries.insert(name, EvalSummary::read(&path)?);
            }
        }
    }

    info!("Read {} evaluation summaries from {:?}", summaries.len(), dir);
    Ok(summaries)
}

/// MAP of every summary that reports one
pub fn map_by_run(summaries: &BTreeMap<String, EvalSummary>) -> BTreeMap<String, f64> {
    summaries
        .iter()
        .filter_map(|(name, summary)| summary.map().map(|map| (name.clone(), map)))
        .collect()
}

/// Name and MAP of the best run; ties go to the lexicographically first name
pub fn best_by_map(maps: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
    maps.iter()
        .fold(None, |best: Option<(&str, f64)>, (name, map)| match best {
            Some((_, best_map)) if *map <= best_map => best,
            _ => Some((name.as_str(), *map)),
        })
}
