//! Stride motion optimizer CLI.
//!
//! Provides two modes of operation:
//! - `plan`: Assemble and solve a problem from a TOML file and sample it
//! - `info`: Print crate versions, or the variable tree a config assembles

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use stride_planner::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Motion planning for legged robots.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print or write the sampled trajectory.
    Plan {
        /// Optimization parameters (TOML).
        config: PathBuf,

        /// Robot model the parameters are written for.
        #[arg(short, long, value_enum, default_value_t = Robot::Monoped)]
        robot: Robot,

        /// Sampling step in seconds.
        #[arg(long, default_value_t = 0.1)]
        dt: f64,

        /// Forward distance the base travels over the horizon (m).
        #[arg(long, default_value_t = 0.0)]
        distance: f64,

        /// Write the last iterate's samples as CSV instead of printing them.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print crate information, or the variable tree of a configuration.
    Info {
        /// Optimization parameters (TOML) whose variable tree to print.
        config: Option<PathBuf>,

        /// Robot model the parameters are written for.
        #[arg(short, long, value_enum, default_value_t = Robot::Monoped)]
        robot: Robot,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Robot {
    Monoped,
    Quadruped,
}

impl Robot {
    fn model(self) -> Arc<dyn RobotModel> {
        match self {
            Self::Monoped => Arc::new(MonopedModel::default()),
            Self::Quadruped => Arc::new(QuadrupedModel::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_plan(
    config: &Path,
    robot: Robot,
    dt: f64,
    distance: f64,
    output: Option<&Path>,
) -> Result<()> {
    let params = OptimizationParameters::from_file(config)?;
    info!(
        config = %config.display(),
        representation = %params.base_representation,
        solver = %params.solver,
        "loaded parameters"
    );

    let mut optimizer = MotionOptimizer::new(params, robot.model())?;
    let start = *optimizer.initial_base();
    optimizer.set_final_base(base_at(start.lin.p + Vector3::new(distance, 0.0, 0.0)));

    let solution = optimizer.solve()?;
    let trajectories = optimizer.trajectories(&solution.problem, dt)?;
    let Some(last) = trajectories.last() else {
        println!("solver recorded no iterates");
        return Ok(());
    };

    let csv = to_csv(last);
    match output {
        Some(path) => {
            std::fs::write(path, csv).map_err(ConfigError::from)?;
            println!(
                "wrote {} samples of iterate {} to {}",
                last.len(),
                trajectories.len() - 1,
                path.display()
            );
        }
        None => print!("{csv}"),
    }
    println!(
        "iterations={}, cost={:.6}, max_violation={:.3e}",
        solution.report.iterations, solution.report.cost, solution.report.max_violation
    );
    Ok(())
}

/// One row per sample: time, base position and orientation quaternion, then
/// contact flag, position and force of every end-effector.
fn to_csv(states: &[RobotStateCartesian]) -> String {
    let mut out = String::from("t,base_x,base_y,base_z,base_qw,base_qx,base_qy,base_qz");
    let ee_count = states.first().map_or(0, RobotStateCartesian::ee_count);
    for ee in 0..ee_count {
        let _ = write!(
            out,
            ",contact_{ee},ee_x_{ee},ee_y_{ee},ee_z_{ee},f_x_{ee},f_y_{ee},f_z_{ee}"
        );
    }
    out.push('\n');

    for s in states {
        let p = s.base.lin.p;
        let q = s.base.ang.q;
        let _ = write!(
            out,
            "{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            s.t_global, p.x, p.y, p.z, q.w, q.i, q.j, q.k
        );
        for ee in 0..s.ee_count() {
            let m = s.ee_motion[ee].p;
            let f = s.ee_forces[ee];
            let _ = write!(
                out,
                ",{},{:.6},{:.6},{:.6},{:.3},{:.3},{:.3}",
                u8::from(s.ee_contact[ee]),
                m.x,
                m.y,
                m.z,
                f.x,
                f.y,
                f.z
            );
        }
        out.push('\n');
    }
    out
}

fn run_info(config: Option<&Path>, robot: Robot) -> Result<()> {
    if let Some(config) = config {
        let params = OptimizationParameters::from_file(config)?;
        let vars = MotionOptimizer::new(params, robot.model())?.build_variables()?;
        print!("{}", vars.summary());
        return Ok(());
    }

    println!("stride v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  stride-core    {}", env!("CARGO_PKG_VERSION"));
    println!("  stride-vars    {}", env!("CARGO_PKG_VERSION"));
    println!("  stride-nlp     {}", env!("CARGO_PKG_VERSION"));
    println!("  stride-planner {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("base representations: cubic_hermite, poly_coeff");
    println!("solvers: initial_guess (built in), ipopt, snopt (need a registered backend)");
    println!("edition: 2024");
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan {
            config,
            robot,
            dt,
            distance,
            output,
        } => run_plan(&config, robot, dt, distance, output.as_deref()),
        Commands::Info { config, robot } => run_info(config.as_deref(), robot),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
