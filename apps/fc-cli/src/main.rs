use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use fc_core::{FcError, UnitContext};
use fc_equipment::{EquipmentError, HydraulicEquivalent, NetworkEquipment};
use fc_project::{Project, ProjectError, build_network};
use fc_sim::{SimError, SimOptions, SimProgressEvent, SimulationManager};
use tracing::debug;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(about = "FlowCAD CLI - hydraulic equipment network simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project file and its equipment network
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Print the equipment network with its ports and connections
    Show {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Translate the equipment network into solver input
    Translate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = TranslateFormat::Inp)]
        format: TranslateFormat,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a steady-state simulation and print equipment results
    Run {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Display pressure unit (bar, kPa, Pa, mCE); overrides the project setting
        #[arg(long)]
        pressure_unit: Option<String>,
        /// Display flow unit (m3/s, m3/h, L/s, L/min, L/h); overrides the project setting
        #[arg(long)]
        flow_unit: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TranslateFormat {
    /// EPANET input file
    Inp,
    /// JSON solver model
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Equipment(#[from] EquipmentError),

    #[error(transparent)]
    Simulation(#[from] SimError),

    #[error(transparent)]
    Units(#[from] FcError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{count} validation problem(s) found")]
    Invalid { count: usize },
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Show { project_path } => cmd_show(&project_path),
        Commands::Translate {
            project_path,
            format,
            output,
        } => cmd_translate(&project_path, format, output.as_deref()),
        Commands::Run {
            project_path,
            pressure_unit,
            flow_unit,
        } => cmd_run(&project_path, pressure_unit, flow_unit),
    }
}

fn load(project_path: &Path) -> CliResult<(Project, NetworkEquipment)> {
    let project = fc_project::load(project_path)?;
    let network = build_network(&project)?;
    debug!(
        project = %project.name,
        equipment = network.len(),
        "loaded project"
    );
    Ok((project, network))
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let (project, network) = load(project_path)?;
    let mut problems = network.validate();
    if problems.is_empty() {
        let hydraulic = network.to_hydraulic_network(&project.fluid.to_fluid()?)?;
        problems.extend(hydraulic.validate());
    }
    if problems.is_empty() {
        println!("✓ Project is valid ({} equipment)", network.len());
        return Ok(());
    }
    for problem in &problems {
        println!("  ✗ {problem}");
    }
    Err(CliError::Invalid {
        count: problems.len(),
    })
}

fn cmd_show(project_path: &Path) -> CliResult<()> {
    let (_, network) = load(project_path)?;
    print!("{network}");
    Ok(())
}

fn cmd_translate(
    project_path: &Path,
    format: TranslateFormat,
    output: Option<&Path>,
) -> CliResult<()> {
    let (project, network) = load(project_path)?;
    let hydraulic = network.to_hydraulic_network(&project.fluid.to_fluid()?)?;
    let text = match format {
        TranslateFormat::Inp => hydraulic.to_inp(),
        TranslateFormat::Json => hydraulic.to_solver_model().to_json_pretty()?,
    };
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!(
                "✓ Wrote {} nodes and {} links to {}",
                hydraulic.node_count(),
                hydraulic.link_count(),
                path.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    pressure_unit: Option<String>,
    flow_unit: Option<String>,
) -> CliResult<()> {
    let (project, network) = load(project_path)?;
    let mut units = project.units;
    units.set_from_names(
        pressure_unit.as_deref().unwrap_or(units.pressure.symbol()),
        flow_unit.as_deref().unwrap_or(units.flow.symbol()),
    )?;

    println!("Running steady-state simulation: {}", project.name);
    let options = SimOptions {
        solver: project.solver.clone(),
        fluid: project.fluid.to_fluid()?,
        ..SimOptions::default()
    };
    let manager = SimulationManager::new(network, options);

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let report = manager.run_with_progress(Some(&mut |event: SimProgressEvent| {
        let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_cli_progress(&event);
            last_stage = Some(event.stage);
            last_emit = Instant::now();
        }
    }));
    clear_progress_line();
    let report = report?;

    println!(
        "✓ Simulation completed in {} iterations ({:.3} s)",
        report.iterations, report.elapsed_wall_s
    );
    println!(
        "  Nodes: {}  Links: {}",
        report.solved.network.node_count(),
        report.solved.network.link_count()
    );
    manager.read_network(|net| print_results(net, &units));
    Ok(())
}

fn print_results(network: &NetworkEquipment, units: &UnitContext) {
    for eq in network.equipment() {
        println!("{} ({})", eq.id(), eq.kind());
        for (name, value) in eq.result_bag() {
            let shown = if name.starts_with("flow_rate") {
                units.format_flow(Some(value), 4)
            } else if name.starts_with("pressure")
                || name == "head_gain"
                || name == "total_headloss"
            {
                units.format_pressure(Some(value), 3)
            } else if name.starts_with("head") {
                format!("{value:.3} m")
            } else if name == "velocity" {
                format!("{value:.3} m/s")
            } else if name == "headloss" {
                format!("{value:.2} Pa/m")
            } else {
                format!("{value:.5}")
            };
            println!("  {name:<16} {shown}");
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SimProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx], event.stage, event.elapsed_wall_s
    );
    if let Some(s) = &event.solve {
        if let Some(iter) = s.iteration {
            line.push_str(&format!("  iter={iter}"));
        }
        if let Some(residual) = s.residual_norm {
            line.push_str(&format!("  residual={residual:.3e}"));
        }
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {msg}"));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}
