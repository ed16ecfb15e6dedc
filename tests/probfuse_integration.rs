//! Integration Test: Judging and ProbFuse
//!
//! Runs the judged pipeline from run directories and a judgment file through
//! preprocessed files to fused ProbFuse runs

use probfuse::probfuse::{run_seeded, Policy, ProbFuseConfig, ProbFuseGrid};
use probfuse::trec::{
    discover_run_files, judge_run, judged_file_name, read_judged_dir, read_run, read_runs,
    write_judged_run, write_ranking_file, Qrels,
};
use probfuse::types::{JudgedCorpus, Relevance, RunId};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const TOPICS: [u32; 4] = [401, 402, 403, 404];

fn setup(root: &Path) {
    let mut qrels = String::new();
    let mut run1 = String::new();
    let mut run2 = String::new();

    for topic in TOPICS {
        for (doc, weight) in [("d1", 1), ("d2", 0), ("d3", 2), ("d4", 0), ("x2", 1)] {
            qrels.push_str(&format!("{} 0 {} {}\n", topic, doc, weight));
        }
        for (rank, doc) in ["d1", "d2", "d3", "d4"].iter().enumerate() {
            run1.push_str(&format!("{} Q0 {} {} {} bm25\n", topic, doc, rank, 10 - rank));
        }
        for (rank, doc) in ["d4", "d3", "d2", "x2"].iter().enumerate() {
            run2.push_str(&format!("{} Q0 {} {} {} lm\n", topic, doc, rank, 10 - rank));
        }
    }

    fs::write(root.join("qrels.txt"), qrels).unwrap();
    for (run, content) in [(1, run1), (2, run2)] {
        let dir = root.join("runs").join(format!("run{}", run));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.res"), content).unwrap();
    }
}

fn judge_all(root: &Path) -> JudgedCorpus {
    let qrels = Qrels::read(&root.join("qrels.txt")).unwrap();
    let preprocessed = root.join("preprocessed_scores");

    for (run, path) in discover_run_files(&root.join("runs"), 2).unwrap() {
        let judged = judge_run(&read_run(&path, run).unwrap(), &qrels);
        write_judged_run(&preprocessed.join(judged_file_name(run)), &judged).unwrap();
    }
    read_judged_dir(&preprocessed, 2).unwrap()
}

// Both runs learn [0.5, 0.5] for two segments whatever topics they sample,
// so each document's score only depends on which runs hold the topic out
fn expected(scored_by_run1: bool, scored_by_run2: bool) -> Vec<(&'static str, f64)> {
    match (scored_by_run1, scored_by_run2) {
        (true, true) => vec![
            ("d2", 0.75),
            ("d3", 0.75),
            ("d4", 0.75),
            ("d1", 0.5),
            ("x2", 0.25),
        ],
        (true, false) => vec![("d1", 0.5), ("d2", 0.5), ("d3", 0.25), ("d4", 0.25)],
        (false, true) => vec![("d4", 0.5), ("d3", 0.5), ("d2", 0.25), ("x2", 0.25)],
        (false, false) => Vec::new(),
    }
}

#[test]
fn test_judge_then_probfuse() {
    println!("\n=== Integration Test: ProbFuse Pipeline ===\n");

    let temp = TempDir::new().unwrap();
    setup(temp.path());

    let corpus = judge_all(temp.path());
    assert_eq!(corpus.len(), 2);
    let run2 = &corpus.runs()[1];
    let labels: Vec<Relevance> = run2.topics[&401].iter().map(|e| e.label).collect();
    assert_eq!(
        labels,
        vec![
            Relevance::NotRelevant,
            Relevance::Relevant,
            Relevance::NotRelevant,
            Relevance::Relevant
        ]
    );
    println!("✓ Judged {} runs", corpus.len());

    for policy in Policy::BOTH {
        let config = ProbFuseConfig::new(2, 0.5, policy).unwrap();
        let result = run_seeded(&corpus, config, 1000, 42).unwrap();

        for run in [1 as RunId, 2] {
            let training = result.outcome.training_topics.for_run(run).unwrap();
            assert_eq!(training.len(), 2);
            assert_eq!(result.outcome.table.run(run).unwrap(), &[0.5, 0.5]);
        }

        for topic in TOPICS {
            let by_run1 = !result.outcome.training_topics.contains(1, topic);
            let by_run2 = !result.outcome.training_topics.contains(2, topic);
            let want = expected(by_run1, by_run2);

            match result.ranking.topic(topic) {
                Some(entries) => {
                    let got: Vec<(&str, f64)> = entries
                        .iter()
                        .map(|e| (e.doc_id.as_str(), e.score))
                        .collect();
                    assert_eq!(got, want, "topic {} under {}", topic, policy);
                }
                None => assert!(want.is_empty(), "topic {} missing under {}", topic, policy),
            }
        }
        println!("✓ {} scores verified", config.label());
    }
}

#[test]
fn test_training_only_document_not_emitted() {
    let temp = TempDir::new().unwrap();
    setup(temp.path());
    let corpus = judge_all(temp.path());

    let config = ProbFuseConfig::new(2, 0.5, Policy::All).unwrap();
    let result = run_seeded(&corpus, config, 1000, 7).unwrap();

    // x2 is only retrieved by run 2
    for topic in result.outcome.training_topics.for_run(2).unwrap() {
        if let Some(entries) = result.ranking.topic(*topic) {
            assert!(entries.iter().all(|e| e.doc_id != "x2"));
        }
    }
}

#[test]
fn test_probfuse_output_file() {
    let temp = TempDir::new().unwrap();
    setup(temp.path());
    let corpus = judge_all(temp.path());

    let config = ProbFuseConfig::new(2, 0.25, Policy::Judged).unwrap();
    let result = run_seeded(&corpus, config, 3, 11).unwrap();

    let label = config.label();
    assert_eq!(label, "ProbFuseJudged_2_0.25");
    let path = temp.path().join("probfuse").join(format!("{}.res", label));
    write_ranking_file(&path, &result.ranking, &label, 3).unwrap();

    let written = read_run(&path, 0).unwrap();
    assert_eq!(written.topics.len(), result.ranking.topic_count());
    for (topic, entries) in written.topics.iter() {
        assert!(entries.len() <= 3);
        assert_eq!(entries.len(), result.ranking.topic(*topic).unwrap().len());
    }
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.lines().all(|l| l.ends_with(" ProbFuseJudged_2_0.25")));
}

#[test]
fn test_topic_without_judgments_is_unjudged() {
    let temp = TempDir::new().unwrap();
    setup(temp.path());

    for run in 1..=2 {
        let extra = temp.path().join(format!("runs/run{}/model.res", run));
        let mut content = fs::read_to_string(&extra).unwrap();
        content.push_str("499 Q0 d9 0 1.0 model\n");
        fs::write(&extra, content).unwrap();
    }

    let corpus = judge_all(temp.path());
    for run in corpus.runs() {
        let topic = &run.topics[&499];
        assert_eq!(topic.len(), 1);
        assert_eq!(topic[0].label, Relevance::Unjudged);
    }
}

#[test]
fn test_run_missing_a_topic_is_rejected() {
    let temp = TempDir::new().unwrap();
    setup(temp.path());

    let extra = temp.path().join("runs/run1/model.res");
    let mut content = fs::read_to_string(&extra).unwrap();
    content.push_str("499 Q0 d9 0 1.0 bm25\n");
    fs::write(&extra, content).unwrap();

    let err = read_runs(&temp.path().join("runs"), 2).unwrap_err();
    assert!(err.to_string().contains("missing [499]"), "{}", err);
}

#[tokio::test]
async fn test_grid_over_judged_files() {
    let temp = TempDir::new().unwrap();
    setup(temp.path());
    let corpus = Arc::new(judge_all(temp.path()));

    let grid = ProbFuseGrid::new(vec![1, 2], vec![0.5], Policy::BOTH.to_vec());
    let results = grid.run(Arc::clone(&corpus), 1000, 2006, 2).await.unwrap();

    let labels: Vec<String> = results.iter().map(|r| r.config.label()).collect();
    assert_eq!(
        labels,
        vec![
            "ProbFuseJudged_1_0.5",
            "ProbFuseAll_1_0.5",
            "ProbFuseJudged_2_0.5",
            "ProbFuseAll_2_0.5"
        ]
    );

    let again = grid.run(corpus, 1000, 2006, 1).await.unwrap();
    for (first, second) in results.iter().zip(&again) {
        assert_eq!(first.ranking, second.ranking);
    }
}
