//! Benchmarking and experimentation module for the garden layout solver.
//!
//! Provides tools for running repeated seeded experiments, collecting
//! statistics, and exporting results.

use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use crate::instance::GardenInstance;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of a single seeded run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Run label (algorithm + seed)
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of plants in the instance
    pub dimension: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Best layout score found
    pub score: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of generations run
    pub generations: Option<usize>,
}

/// Aggregated statistics over all runs on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Instance name
    pub instance: String,
    /// Number of runs aggregated
    pub num_runs: usize,
    /// Average score
    pub avg_score: f64,
    /// Best score
    pub best_score: f64,
    /// Worst score
    pub worst_score: f64,
    /// Sample standard deviation of scores
    pub std_score: f64,
    /// Average time per run
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per instance
    pub num_runs: usize,
    /// Time limit per run in seconds
    pub time_limit: f64,
    /// Run seeds in parallel
    pub parallel: bool,
    /// Base GA parameters; the seed is overridden per run
    pub ga: GAConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            time_limit: 60.0,
            parallel: true,
            ga: GAConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run the genetic algorithm `num_runs` times on an instance, one seed
    /// per run. Runs are independent, so they may execute in parallel.
    pub fn run_genetic(&mut self, instance: &GardenInstance) {
        log::info!(
            "benchmarking {} ({} runs, n={})",
            instance.name,
            self.config.num_runs,
            instance.dimension()
        );

        let configs: Vec<GAConfig> = (0..self.config.num_runs)
            .map(|seed| GAConfig {
                seed: seed as u64,
                time_limit: self.config.time_limit,
                ..self.config.ga.clone()
            })
            .collect();

        let run_one = |config: GAConfig| -> Option<RunResult> {
            let seed = config.seed;
            let mut ga = GeneticAlgorithm::new(instance.clone(), config);
            match ga.run() {
                Ok(layout) => Some(RunResult {
                    algorithm: format!("GA-run{}", seed),
                    instance: instance.name.clone(),
                    dimension: instance.dimension(),
                    seed,
                    score: layout.score,
                    time: layout.computation_time,
                    generations: layout.generations,
                }),
                Err(e) => {
                    log::error!("run with seed {} failed: {}", seed, e);
                    None
                }
            }
        };

        let results: Vec<RunResult> = if self.config.parallel {
            configs.into_par_iter().filter_map(run_one).collect()
        } else {
            configs.into_iter().filter_map(run_one).collect()
        };

        self.results.extend(results);
    }

    /// Run the benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[GardenInstance]) {
        for instance in instances {
            self.run_genetic(instance);
        }
    }

    /// Compute aggregate statistics per instance
    pub fn compute_statistics(&self) -> Vec<RunStatistics> {
        let mut by_instance: HashMap<String, Vec<&RunResult>> = HashMap::new();

        for result in &self.results {
            by_instance
                .entry(result.instance.clone())
                .or_insert_with(Vec::new)
                .push(result);
        }

        let mut statistics = Vec::new();

        for (instance, results) in by_instance {
            let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();

            let std_score = if scores.len() > 1 {
                scores.iter().std_dev()
            } else {
                0.0
            };

            statistics.push(RunStatistics {
                instance,
                num_runs: results.len(),
                avg_score: scores.iter().mean(),
                best_score: scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                worst_score: scores.iter().cloned().fold(f64::INFINITY, f64::min),
                std_score,
                avg_time: times.iter().mean(),
                total_time: times.iter().sum(),
            });
        }

        statistics.sort_by(|a, b| a.instance.cmp(&b.instance));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let stats = self.compute_statistics();
        for stat in stats {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("   Garden Layout Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let stats = self.compute_statistics();

        report.push_str("Instance Performance Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>6} {:>12} {:>12} {:>12} {:>10}\n",
            "Instance", "Runs", "Avg Score", "Best Score", "Std Dev", "Avg Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<20} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10.4}\n",
                stat.instance,
                stat.num_runs,
                stat.avg_score,
                stat.best_score,
                stat.std_score,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

/// Helper function to load instances from a directory of CSV tables
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<GardenInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                match GardenInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by size
    instances.sort_by_key(|i| i.dimension());

    instances
}
