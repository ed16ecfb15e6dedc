//! TREC-style file formats
//!
//! Ranked runs, judgment tables and the preprocessed judged-run format, plus
//! the relevance judger that produces the latter from the first two. Every
//! reader fails fast on the first malformed line.

mod judged;
mod qrels;
mod run;

pub use judged::{judged_file_name, read_judged_dir, read_judged_run, write_judged_run};
pub use qrels::{judge_run, Qrels};
pub use run::{discover_run_files, read_run, read_runs, write_ranking, write_ranking_file};

use crate::error::{FusionError, Result};
use crate::types::{RunId, TopicId};
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Non-blank lines of a file with their 1-based line numbers
pub(crate) fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let file = std::fs::File::open(path)
        .map_err(|e| FusionError::io(e, format!("Failed to open {:?}", path)))?;

    let mut lines = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| FusionError::io(e, format!("Failed to read {:?}", path)))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push((idx + 1, trimmed.to_string()));
        }
    }
    Ok(lines)
}

pub(crate) fn parse_field<T: FromStr>(
    path: &Path,
    line_number: usize,
    line: &str,
    field: &str,
    what: &str,
) -> Result<T> {
    field.parse().map_err(|_| FusionError::MalformedLine {
        path: path.to_path_buf(),
        line_number,
        expected: what.to_string(),
        found: format!("'{}'", field),
        line: line.to_string(),
    })
}

/// Every run must answer exactly the topics of the first run
pub(crate) fn ensure_same_topics<I>(runs: I) -> Result<()>
where
    I: IntoIterator<Item = (RunId, BTreeSet<TopicId>)>,
{
    let mut runs = runs.into_iter();
    let Some((first_run, reference)) = runs.next() else {
        return Ok(());
    };

    for (run, topics) in runs {
        if topics == reference {
            continue;
        }
        let missing: Vec<TopicId> = reference.difference(&topics).copied().collect();
        let extra: Vec<TopicId> = topics.difference(&reference).copied().collect();
        return Err(FusionError::Structural(format!(
            "run {} topics differ from run {}: missing {:?}, extra {:?}",
            run, first_run, missing, extra
        )));
    }
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| FusionError::io(e, format!("Failed to create directory {:?}", parent)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_sets_must_match() {
        let set = |topics: &[TopicId]| topics.iter().copied().collect::<BTreeSet<_>>();

        assert!(ensure_same_topics(vec![(1, set(&[351, 352])), (2, set(&[352, 351]))]).is_ok());
        assert!(ensure_same_topics(Vec::<(RunId, BTreeSet<TopicId>)>::new()).is_ok());

        let err = ensure_same_topics(vec![(1, set(&[351, 352])), (2, set(&[351, 360]))])
            .unwrap_err()
            .to_string();
        assert!(err.contains("run 2"), "{}", err);
        assert!(err.contains("missing [352]"), "{}", err);
        assert!(err.contains("extra [360]"), "{}", err);
    }
}
