//! ProbFuse configurations and the parallel configuration grid

use super::scorer::ProbFuseScorer;
use super::table::Policy;
use super::trainer::{validate_parameters, ProbFuseTrainer, TrainingOutcome};
use crate::error::{FusionError, Result};
use crate::fusion::FusedRanking;
use crate::types::JudgedCorpus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// One ProbFuse parameter tuple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbFuseConfig {
    pub n_segments: usize,
    pub training_fraction: f64,
    pub policy: Policy,
}

impl ProbFuseConfig {
    pub fn new(n_segments: usize, training_fraction: f64, policy: Policy) -> Result<Self> {
        validate_parameters(n_segments, training_fraction)?;
        Ok(Self {
            n_segments,
            training_fraction,
            policy,
        })
    }

    /// Run label and output file stem, e.g. `ProbFuseJudged_25_0.1`
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}",
            self.policy.label(),
            self.n_segments,
            self.training_fraction
        )
    }

    /// Segmentation, training-topic sampling, probability estimation and scoring, in that order
    pub fn run<R: Rng + ?Sized>(
        &self,
        corpus: &JudgedCorpus,
        depth: usize,
        rng: &mut R,
    ) -> Result<(TrainingOutcome, FusedRanking)> {
        let trainer = ProbFuseTrainer::new(self.n_segments, self.training_fraction, self.policy)?;
        let outcome = trainer.train(corpus, rng)?;
        let ranking = ProbFuseScorer::new(depth).score(
            corpus,
            &outcome.table,
            &outcome.training_topics,
        )?;
        Ok((outcome, ranking))
    }
}

/// Result of one configuration
#[derive(Debug, Clone)]
pub struct ProbFuseRun {
    pub config: ProbFuseConfig,
    pub seed: u64,
    pub outcome: TrainingOutcome,
    pub ranking: FusedRanking,
    pub duration_ms: u64,
}

/// Run one configuration with its own seeded generator
pub fn run_seeded(
    corpus: &JudgedCorpus,
    config: ProbFuseConfig,
    depth: usize,
    seed: u64,
) -> Result<ProbFuseRun> {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(seed);
    let (outcome, ranking) = config.run(corpus, depth, &mut rng)?;
    let duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "{}: {} topics fused in {}ms (seed {})",
        config.label(),
        ranking.topic_count(),
        duration_ms,
        seed
    );

    Ok(ProbFuseRun {
        config,
        seed,
        outcome,
        ranking,
        duration_ms,
    })
}

/// Cartesian product of segment counts, training fractions and policies
#[derive(Debug, Clone)]
pub struct ProbFuseGrid {
    segments: Vec<usize>,
    fractions: Vec<f64>,
    policies: Vec<Policy>,
}

impl ProbFuseGrid {
    pub fn new(segments: Vec<usize>, fractions: Vec<f64>, policies: Vec<Policy>) -> Self {
        Self {
            segments,
            fractions,
            policies,
        }
    }

    /// Configurations ordered by segments, then fractions, then policies
    pub fn configurations(&self) -> Result<Vec<ProbFuseConfig>> {
        let mut configs = Vec::new();
        for &n_segments in &self.segments {
            for &fraction in &self.fractions {
                for &policy in &self.policies {
                    configs.push(ProbFuseConfig::new(n_segments, fraction, policy)?);
                }
            }
        }
        Ok(configs)
    }

    /// Run every configuration on blocking worker threads
    ///
    /// Configuration `i` is seeded with `base_seed + i`. At most `max_workers`
    /// configurations run at once; results come back in grid order.
    pub async fn run(
        &self,
        corpus: Arc<JudgedCorpus>,
        depth: usize,
        base_seed: u64,
        max_workers: usize,
    ) -> Result<Vec<ProbFuseRun>> {
        let configs = self.configurations()?;
        let total = configs.len();
        info!(
            "Running {} ProbFuse configurations with up to {} workers",
            total, max_workers
        );

        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, config) in configs.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| FusionError::Other(anyhow::Error::new(e)))?;
            let corpus = Arc::clone(&corpus);
            let seed = base_seed.wrapping_add(index as u64);

            debug!("Scheduling {} (seed {})", config.label(), seed);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, run_seeded(&corpus, config, depth, seed))
            });
        }

        let mut results: Vec<Option<ProbFuseRun>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| FusionError::Other(anyhow::Error::new(e)))?;
            results[index] = Some(result?);
        }

        Ok(results.into_iter().flatten().collect())
    }
}
