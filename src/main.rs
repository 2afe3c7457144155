//! Garden Layout Solver - Command Line Interface
//!
//! A genetic-algorithm solver for companion-planting layouts.

use clap::{Parser, Subcommand};
use garden_layout_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use garden_layout_solver::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use garden_layout_solver::instance::{GardenInstance, ScoringMode};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "garden-layout-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A genetic-algorithm solver for companion-planting layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        /// Path to the CSV compatibility table
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of candidate layouts per generation
        #[arg(short, long, default_value = "50")]
        population_size: usize,

        /// Number of generations to run
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Upper bound (exclusive) on pairwise swaps per exchange mutation
        #[arg(short, long, default_value = "2")]
        max_mutations: usize,

        /// Number of top layouts carried unchanged into the next generation
        #[arg(short, long, default_value = "0")]
        elite: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Time limit in seconds (0 = no limit)
        #[arg(short, long, default_value = "0")]
        time_limit: f64,

        /// Score the closing pair between the last and first plant (garden ring)
        #[arg(long)]
        circular: bool,

        /// Evaluate fitness in parallel
        #[arg(long)]
        parallel: bool,

        /// Output layout to file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the CSV compatibility table
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing CSV compatibility tables
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeded runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Time limit per run
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Compare parameter settings on an instance
    Compare {
        /// Path to the CSV compatibility table
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs per setting
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            population_size,
            generations,
            max_mutations,
            elite,
            seed,
            time_limit,
            circular,
            parallel,
            output,
            verbose,
        } => {
            solve_instance(
                &instance,
                population_size,
                generations,
                max_mutations,
                elite,
                seed,
                time_limit,
                circular,
                parallel,
                output,
                verbose,
            );
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            time_limit,
            max_size,
        } => {
            run_benchmark(&dir, &output, runs, time_limit, max_size);
        }

        Commands::Compare {
            instance,
            runs,
            output,
        } => {
            compare_settings(&instance, runs, output);
        }
    }
}

fn load_or_exit(path: &PathBuf) -> GardenInstance {
    match GardenInstance::from_file(path) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    population_size: usize,
    generations: usize,
    max_mutations: usize,
    elite: usize,
    seed: u64,
    time_limit: f64,
    circular: bool,
    parallel: bool,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);

    let mut instance = load_or_exit(path);

    if circular {
        instance.scoring = ScoringMode::Circular;
    }

    if verbose {
        println!("{}", instance.statistics());
    }

    let config = GAConfig {
        population_size,
        num_generations: generations,
        max_mutations,
        num_elite: elite,
        seed,
        time_limit: if time_limit > 0.0 {
            time_limit
        } else {
            f64::INFINITY
        },
        parallel,
        ..Default::default()
    };

    println!("Solving with genetic algorithm...");
    let start = Instant::now();

    let mut ga = GeneticAlgorithm::new(instance.clone(), config);

    let plant_names = instance.plants.clone();
    ga.on_improvement(move |generation, order, score| {
        let layout: Vec<&str> = order.iter().map(|&i| plant_names[i].as_str()).collect();
        println!("Generation {}: score {:.2}", generation, score);
        println!("  {}", layout.join(" -> "));
    });

    let layout = match ga.run() {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", layout.algorithm);
    println!("Scoring: {:?}", instance.scoring);
    println!("Score: {:.2}", layout.score);
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if let Some(gens) = layout.generations {
        println!("Generations: {}", gens);
    }
    println!("Layout: {}", layout.plants.join(" -> "));

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&layout).unwrap();
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nLayout saved to {:?}", out_path);
    }
}

fn analyze_instance(path: &PathBuf) {
    let instance = load_or_exit(path);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let n = instance.dimension();
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                pairs.push((i, j, instance.score(i, j)));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());

    println!("\nMost compatible pairs:");
    for (a, b, s) in pairs.iter().take(5) {
        println!("  {} -> {}: {:.2}", instance.plants[*a], instance.plants[*b], s);
    }

    println!("\nLeast compatible pairs:");
    for (a, b, s) in pairs.iter().rev().take(5) {
        println!("  {} -> {}: {:.2}", instance.plants[*a], instance.plants[*b], s);
    }

    // Short search to gauge what scores are reachable
    let config = GAConfig {
        population_size: 20,
        num_generations: 50,
        ..Default::default()
    };
    let mut ga = GeneticAlgorithm::new(instance.clone(), config);
    match ga.run() {
        Ok(layout) => {
            println!("\nQuick Layout Estimate:");
            println!("  Score: {:.2}", layout.score);
            println!("  Order: {}", layout.plants.join(" -> "));
        }
        Err(e) => eprintln!("\nQuick estimate failed: {}", e),
    }
}

fn run_benchmark(
    dir: &PathBuf,
    output: &PathBuf,
    runs: usize,
    time_limit: f64,
    max_size: Option<usize>,
) {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.dimension() <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    std::fs::create_dir_all(output).expect("Failed to create output directory");

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit,
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    let bar = ProgressBar::new(instances.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}").unwrap(),
    );

    for instance in &instances {
        bar.set_message(instance.name.clone());
        benchmark.run_genetic(instance);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let results_path = output.join("results.csv");
    benchmark
        .export_to_csv(&results_path)
        .expect("Failed to export results");
    println!("Results exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark
        .export_statistics_csv(&stats_path)
        .expect("Failed to export statistics");
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).expect("Failed to save report");
    println!("Report saved to {:?}", report_path);
}

fn compare_settings(path: &PathBuf, runs: usize, output: Option<PathBuf>) {
    let instance = load_or_exit(path);

    println!(
        "Comparing parameter settings on {} (n={})...\n",
        instance.name,
        instance.dimension()
    );

    let settings: Vec<(&str, GAConfig)> = vec![
        ("baseline", GAConfig::default()),
        (
            "elitist",
            GAConfig {
                num_elite: 2,
                ..Default::default()
            },
        ),
        (
            "heavy-mutation",
            GAConfig {
                inversion_prob: 0.3,
                exchange_prob: 0.5,
                max_mutations: 4,
                ..Default::default()
            },
        ),
        (
            "large-population",
            GAConfig {
                population_size: 150,
                ..Default::default()
            },
        ),
        (
            "no-mutation",
            GAConfig {
                inversion_prob: 0.0,
                exchange_prob: 0.0,
                ..Default::default()
            },
        ),
    ];

    let mut results: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();

    for (name, base) in &settings {
        let mut scores = Vec::new();
        let mut times = Vec::new();

        print!("Testing {}... ", name);
        std::io::Write::flush(&mut std::io::stdout()).unwrap();

        for seed in 0..runs as u64 {
            let config = GAConfig {
                seed,
                ..base.clone()
            };
            let mut ga = GeneticAlgorithm::new(instance.clone(), config);

            let start = Instant::now();
            match ga.run() {
                Ok(layout) => {
                    scores.push(layout.score);
                    times.push(start.elapsed().as_secs_f64());
                }
                Err(e) => eprintln!("run failed: {}", e),
            }
        }

        if !scores.is_empty() {
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;
            println!("avg={:.2}, best={:.2}, time={:.4}s", avg, best, avg_time);
        } else {
            println!("no successful runs");
        }

        results.push((name.to_string(), scores, times));
    }

    println!("\n========== Summary ==========");
    println!(
        "{:<18} {:>10} {:>10} {:>10} {:>10}",
        "Setting", "Best", "Average", "Worst", "Avg Time"
    );
    println!("{}", "-".repeat(62));

    for (name, scores, times) in &results {
        if !scores.is_empty() {
            let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            let worst = scores.iter().cloned().fold(f64::INFINITY, f64::min);
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;

            println!(
                "{:<18} {:>10.2} {:>10.2} {:>10.2} {:>10.4}",
                name, best, avg, worst, avg_time
            );
        }
    }

    if let Some(out_path) = output {
        let mut csv = String::new();
        csv.push_str("setting,run,score,time\n");

        for (name, scores, times) in &results {
            for (i, (score, time)) in scores.iter().zip(times.iter()).enumerate() {
                csv.push_str(&format!("{},{},{:.2},{:.4}\n", name, i, score, time));
            }
        }

        std::fs::write(&out_path, csv).expect("Failed to write CSV");
        println!("\nResults exported to {:?}", out_path);
    }
}
