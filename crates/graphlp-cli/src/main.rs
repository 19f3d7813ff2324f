mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use graphlp_core::{Objective, OptimizationResult, Optimizer, PlotPayload, RestrictionStore, Solver};
use tracing_subscriber::EnvFilter;

use crate::render::SvgConfig;

#[derive(Parser)]
#[command(name = "graphlp")]
#[command(about = "Plot the feasible region of a two-variable LP and find its optimal vertex", long_about = None)]
struct Cli {
    /// Log solver activity (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Find the optimal vertex of the problem's objective
    Solve {
        /// The problem file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Solver tolerance
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
    },
    /// Draw the feasible region (and the optimum, when an objective is given)
    Plot {
        /// The problem file
        file: PathBuf,
        /// Where to write the plot
        #[arg(short, long)]
        output: PathBuf,
        /// Lower end of both axes
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lo: f64,
        /// Upper end of both axes
        #[arg(long, default_value_t = 50.0, allow_negative_numbers = true)]
        hi: f64,
        /// Samples per axis
        #[arg(short, long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(2..=graphlp_core::MAX_RESOLUTION as i64))]
        resolution: u32,
        /// Image width in pixels
        #[arg(long, default_value_t = 800)]
        width: u32,
        /// Image height in pixels
        #[arg(long, default_value_t = 700)]
        height: u32,
        /// Write the raw payload as JSON instead of an SVG image
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Check { file } => check(&file),
        Commands::Solve { file, format, tolerance } => solve(&file, format, tolerance),
        Commands::Plot {
            file,
            output,
            lo,
            hi,
            resolution,
            width,
            height,
            json,
        } => {
            if !(hi > lo) {
                bail!("--hi ({}) must be greater than --lo ({})", hi, lo);
            }
            let grid = graphlp_core::Grid::new(lo, hi, resolution as usize);
            plot(&file, &output, grid, SvgConfig::default().with_size(width, height), json)
        }
    }
}

/// A problem file, its restrictions held in a store
struct Loaded {
    store: RestrictionStore,
    objective: Option<Objective>,
}

fn load(file: &Path) -> Result<Loaded> {
    let source = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let problem = graphlp_core::Parser::parse(&source).map_err(|e| {
        let (line, column) = e.line_col(&source);
        anyhow::anyhow!("{}:{}:{}: {}", file.display(), line, column, e)
    })?;
    tracing::debug!(file = %file.display(), restrictions = problem.restrictions.len(), "problem loaded");
    Ok(Loaded {
        store: problem.store(),
        objective: problem.objective,
    })
}

fn check(file: &Path) -> Result<ExitCode> {
    let problem = load(file)?;

    println!("✓ {} is valid", file.display());
    match &problem.objective {
        Some(objective) => println!("  objective: {}", objective),
        None => println!("  no objective (plot only)"),
    }
    println!("  {} restrictions", problem.store.len());

    for (i, r) in problem.store.iter().enumerate() {
        if r.a == 0.0 && r.b == 0.0 {
            let verdict = if r.is_satisfied(0.0, 0.0) { "always" } else { "never" };
            println!("  warning: restriction {} ({}) is {} satisfied", i + 1, r, verdict);
        } else if r.b == 0.0 {
            println!("  note: restriction {} ({}) has a vertical boundary", i + 1, r);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn solve(file: &Path, format: Format, tolerance: f64) -> Result<ExitCode> {
    let problem = load(file)?;
    let Some(objective) = problem.objective else {
        bail!("{} has no objective line (start one with 'max' or 'min')", file.display());
    };
    let restrictions = problem.store.snapshot();

    let optimizer = Optimizer::with_solver(Solver::new().with_tolerance(tolerance));
    let result = optimizer.optimize(&restrictions, &objective);
    let binding = match result.vertex() {
        Some((x1, x2)) => graphlp_core::binding_restrictions(&restrictions, x1, x2, 1e-6),
        None => Vec::new(),
    };

    match format {
        Format::Json => {
            let output = serde_json::json!({
                "objective": objective,
                "restrictions": restrictions,
                "result": result,
                "binding": binding,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Format::Pretty => {
            println!("Objective: {}", objective);
            println!("Restrictions:");
            for (i, r) in restrictions.iter().enumerate() {
                let mark = if binding.contains(&i) { "*" } else { " " };
                println!(" {} {:3}. {}", mark, i + 1, r);
            }
            println!();
            match &result {
                OptimizationResult::Optimal { x1, x2, z } => {
                    println!("Status: OPTIMAL");
                    println!("  x1 = {:.4}", x1);
                    println!("  x2 = {:.4}", x2);
                    println!("  Z  = {:.4}", z);
                    if !binding.is_empty() {
                        println!("  (* marks restrictions binding at the optimum)");
                    }
                }
                OptimizationResult::Infeasible => println!("Status: INFEASIBLE"),
                OptimizationResult::Unbounded => println!("Status: UNBOUNDED"),
                OptimizationResult::SolverFailure(_) => println!("Status: ERROR"),
            }
            if !result.is_optimal() {
                println!("{}", result.message());
            }
        }
    }

    Ok(exit_code(&result))
}

fn plot(file: &Path, output: &Path, grid: graphlp_core::Grid, config: SvgConfig, json: bool) -> Result<ExitCode> {
    let problem = load(file)?;
    if problem.store.is_empty() {
        tracing::warn!("no restrictions; the whole domain is drawn as feasible");
    }

    let payload = PlotPayload::from_store(&problem.store, problem.objective.as_ref(), &grid);

    if json {
        let data = serde_json::to_vec(&payload)?;
        std::fs::write(output, data).with_context(|| format!("writing {}", output.display()))?;
    } else {
        render::write_svg(output, &payload, &config).with_context(|| format!("writing {}", output.display()))?;
    }
    tracing::info!(output = %output.display(), feasible_cells = payload.mask.count_feasible(), "plot written");

    println!("Wrote {}", output.display());
    match &payload.result {
        Some(result) => {
            println!("{}", result.message());
            Ok(exit_code(result))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Optimal answers succeed; infeasible, unbounded and failed solves exit with 1
fn exit_code(result: &OptimizationResult) -> ExitCode {
    if result.is_optimal() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
