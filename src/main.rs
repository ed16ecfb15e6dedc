use probfuse::cli::{Cli, Commands, ConfigAction};
use probfuse::config::Config;
use probfuse::error::{FusionError, Result};
use probfuse::eval::{best_by_map, map_by_run, read_eval_tree};
use probfuse::fusion::BasicFusionEngine;
use probfuse::probfuse::{Policy, ProbFuseGrid};
use probfuse::trec::{
    judge_run, judged_file_name, read_judged_dir, read_runs, write_judged_run, write_ranking_file,
    Qrels,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Combine { runs_dir, output } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_combine(&config, runs_dir, output)?;
        }
        Commands::Judge {
            runs_dir,
            qrels,
            output,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_judge(&config, runs_dir, qrels, output)?;
        }
        Commands::Fuse {
            judged_dir,
            output,
            segments,
            fractions,
            policy,
            seed,
        } => {
            let mut config = load_config(cli.config, cli.profile)?;
            if let Some(segments) = segments {
                config.probfuse.segments = segments;
            }
            if let Some(fractions) = fractions {
                config.probfuse.training_fractions = fractions;
            }
            if let Some(policy) = policy {
                config.probfuse.policies = vec![policy];
            }
            if seed.is_some() {
                config.probfuse.seed = seed;
            }
            cmd_fuse(&config, judged_dir, output)?;
        }
        Commands::Best { evals_dir, json } => {
            cmd_best(&evals_dir, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "probfuse=debug" } else { "probfuse=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_combine(config: &Config, runs_dir: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let runs_dir = runs_dir.unwrap_or_else(|| config.input.runs_dir.clone());
    let output = output.unwrap_or_else(|| config.output.base_combinations_dir());
    let depth = config.output.depth;

    let runs = read_runs(&runs_dir, config.input.expected_runs)?;
    let engine = BasicFusionEngine::new(config.fusion.normalization, depth);
    let rankings = engine.fuse(&runs)?;

    for (operator, ranking) in &rankings {
        let path = output.join(format!("{}.res", operator.name()));
        write_ranking_file(&path, ranking, operator.name(), depth)?;
    }

    println!("✓ Base combinations written to {}", output.display());
    println!("  Elapsed: {:.2?}", start.elapsed());
    Ok(())
}

fn cmd_judge(
    config: &Config,
    runs_dir: Option<PathBuf>,
    qrels: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();
    let runs_dir = runs_dir.unwrap_or_else(|| config.input.runs_dir.clone());
    let qrels_path = qrels.unwrap_or_else(|| config.input.qrels.clone());
    let output = output.unwrap_or_else(|| config.output.preprocessed_dir());

    if !qrels_path.exists() {
        return Err(FusionError::Structural(format!(
            "judgment file not found: {:?}",
            qrels_path
        )));
    }
    let qrels = Qrels::read(&qrels_path)?;

    for run in read_runs(&runs_dir, config.input.expected_runs)? {
        let judged = judge_run(&run, &qrels);
        write_judged_run(&output.join(judged_file_name(run.run)), &judged)?;
        tracing::debug!("Judged run {}", run.run);
    }

    println!("✓ Preprocessed judgments written to {}", output.display());
    println!("  Elapsed: {:.2?}", start.elapsed());
    Ok(())
}

fn cmd_fuse(config: &Config, judged_dir: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let judged_dir = judged_dir.unwrap_or_else(|| config.output.preprocessed_dir());
    let output = output.unwrap_or_else(|| config.output.probfuse_dir());
    let settings = &config.probfuse;
    let depth = config.output.depth;

    let corpus = Arc::new(read_judged_dir(&judged_dir, config.input.expected_runs)?);
    let grid = ProbFuseGrid::new(
        settings.segments.clone(),
        settings.training_fractions.clone(),
        settings.policies.clone(),
    );

    let seed = settings.seed.unwrap_or_else(|| {
        let seed = rand::random();
        tracing::info!("No seed configured, using {}", seed);
        seed
    });

    println!("Running ProbFuse");
    println!("  X: {:?}", settings.segments);
    println!("  t: {:?}", settings.training_fractions);
    println!(
        "  policies: {}",
        settings
            .policies
            .iter()
            .map(Policy::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  seed: {}", seed);

    // Configurations run on blocking worker threads
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| FusionError::io(e, "Failed to create tokio runtime"))?;
    let results = rt.block_on(grid.run(corpus, depth, seed, settings.max_workers))?;

    let mut total_ms = 0;
    for result in &results {
        let label = result.config.label();
        let path = output.join(format!("{}.res", label));
        write_ranking_file(&path, &result.ranking, &label, depth)?;
        total_ms += result.duration_ms;
    }

    println!(
        "✓ {} ProbFuse runs written to {}",
        results.len(),
        output.display()
    );
    println!("  Compute time: {}ms", total_ms);
    Ok(())
}

fn cmd_best(evals_dir: &Path, json: bool) -> Result<()> {
    let summaries = read_eval_tree(evals_dir)?;
    let maps = map_by_run(&summaries);
    let best = best_by_map(&maps);

    if json {
        let report = serde_json::json!({
            "maps": maps,
            "best": best.map(|(name, map)| serde_json::json!({ "run": name, "map": map })),
        });
        let text = serde_json::to_string_pretty(&report).map_err(|e| FusionError::Json {
            source: e,
            context: "Failed to serialize MAP report".to_string(),
        })?;
        println!("{}", text);
        return Ok(());
    }

    for (name, map) in &maps {
        println!("  {:<32} {:.4}", name, map);
    }
    match best {
        Some((name, map)) => println!("\nBest run: {} (MAP {:.4})", name, map),
        None => println!("No evaluation summaries with a MAP found in {}", evals_dir.display()),
    }
    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| FusionError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FusionError::io(e, format!("Failed to create config directory: {:?}", parent))
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::load_or_default(&path, profile.as_deref())
}
