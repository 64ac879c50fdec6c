use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use ta_ams::{AmsError, AmsParams, AmsResult, Endpoints, TransientFactory};
use ta_core::SerialComm;
use ta_core::timing::{self, ams_timing};
use ta_models::{Stommel, StommelParams};
use ta_sim::{RunStatus, ThetaModel, ThetaStepper};

#[derive(Parser)]
#[command(name = "ta-cli")]
#[command(about = "Implicit theta stepping and AMS sampling of the Stommel box model", long_about = None)]
struct Cli {
    /// Log accumulated evaluation timings at exit
    #[arg(long, global = true)]
    timing: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the steady states of the configured model
    Equilibria {
        /// Path to the run configuration YAML file
        config: PathBuf,
    },
    /// March the model with the adaptive theta stepper
    Step {
        /// Path to the run configuration YAML file
        config: PathBuf,
        /// Directory for tdata.txt and snapshots (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sample noisy trajectories from the thermal towards the salinity state
    Ams {
        /// Path to the run configuration YAML file
        config: PathBuf,
        /// Number of sample paths
        #[arg(long, default_value_t = 10)]
        paths: u64,
    },
}

/// Model section of the run configuration.
#[derive(Deserialize)]
struct ModelSection {
    #[serde(default)]
    model: StommelParams,
}

fn main() -> AmsResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.timing {
        timing::enable_timing();
    }

    let status = match cli.command {
        Commands::Equilibria { config } => cmd_equilibria(&config).map(|()| RunStatus::Completed),
        Commands::Step { config, output } => cmd_step(&config, output),
        Commands::Ams { config, paths } => cmd_ams(&config, paths).map(|()| RunStatus::Completed),
    }?;

    if cli.timing {
        ams_timing::log_summary();
    }
    if status != RunStatus::Completed {
        std::process::exit(status.code());
    }
    Ok(())
}

fn load_config(path: &Path) -> AmsResult<(AmsParams, Stommel)> {
    let text = std::fs::read_to_string(path).map_err(|source| AmsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let params = AmsParams::from_yaml_str(&text)?;
    let section: ModelSection = serde_yaml::from_str(&text)?;
    Ok((params, Stommel::new(section.model)?))
}

fn cmd_equilibria(config: &Path) -> AmsResult<()> {
    let (_, stommel) = load_config(config)?;
    let states = stommel.equilibria();
    println!("{} steady state(s):", states.len());
    for x in states {
        println!("  T = {:.6}  S = {:.6}  psi = {:.6}", x[0], x[1], x[0] - x[1]);
    }
    Ok(())
}

fn cmd_step(config: &Path, output: Option<PathBuf>) -> AmsResult<RunStatus> {
    let (params, stommel) = load_config(config)?;
    let mut theta = params.theta;
    if let Some(dir) = output {
        theta.output_dir = dir;
    }
    println!("Theta stepping from {}", config.display());
    println!(
        "  theta = {}, dt = {}, end time = {} y, output = {}",
        theta.theta,
        theta.initial_dt,
        theta.end_time_years,
        theta.output_dir.display()
    );

    let mut model = ThetaModel::deterministic(stommel, &theta)?;
    let summary = ThetaStepper::new(&mut model, &theta)?.run()?;

    match summary.status {
        RunStatus::Completed => println!("✓ Completed"),
        RunStatus::MinimumStepReached => println!("✗ Minimum step size reached"),
    }
    println!("  Steps: {}", summary.steps);
    println!("  Time: {:.6} y", summary.time_years);
    println!("  Final dt: {:e}", summary.dt);
    println!("  Newton iterations: {}", summary.total_newton_iterations);
    println!("  Rejected steps: {}", summary.rejected_steps);
    Ok(summary.status)
}

fn cmd_ams(config: &Path, paths: u64) -> AmsResult<()> {
    let (params, stommel) = load_config(config)?;
    let (thermal, saddle, salinity) = stommel.transition_states()?;
    let endpoints = Endpoints::new(thermal, saddle, salinity);

    let factory = TransientFactory::new(params, &SerialComm)?;
    let mut entropy = rand::thread_rng();
    let transient = factory.stochastic_from_config(stommel, endpoints, &mut entropy)?;

    println!(
        "Sampling {} path(s), seed {}, dt = {}, end time = {}",
        paths,
        transient.seed().unwrap_or_default(),
        transient.time_step_size(),
        transient.end_time()
    );

    let mut reached = 0;
    for path in 0..paths {
        let trajectory = transient.run_path(path)?;
        if trajectory.reached_target() {
            reached += 1;
        }
        println!(
            "  path {:>4}: steps {:>6}  max score {:.4}{}",
            path,
            trajectory.steps,
            trajectory.max_score().unwrap_or(0.0),
            if trajectory.reached_target() { "  (reached)" } else { "" }
        );
    }
    println!("✓ {reached}/{paths} path(s) reached the salinity state");
    Ok(())
}
