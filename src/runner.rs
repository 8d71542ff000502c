use std::path::{Path, PathBuf};

use clap::{Args, Command, FromArgMatches as _};

use crate::error::EpinetError;
use crate::log::{parse_module_filter, set_log_level, set_module_filters, LevelFilter};
use crate::parameters::{Parameters, SimulationBuilder};
use crate::report::{write_reports, ReportOptions};
use crate::simulation::Simulation;
use crate::state::Day;
use crate::info;

/// Default cli arguments for the epinet runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Random seed; overrides the seed in the config file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Optional directory for `statistics.csv` and `nodes.csv`
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Replace existing report files
    #[arg(long)]
    pub overwrite: bool,

    /// Maximum number of days to simulate
    #[arg(short, long, default_value = "100")]
    pub max_days: Day,

    /// Enable logging at this level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,

    /// Override the log level of one module, as `<module>=<level>`; may be repeated
    #[arg(long, value_parser = parse_module_filter)]
    pub log_filter: Vec<(String, LevelFilter)>,

    /// Optional path for a JSON snapshot of the final state
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,
}

fn create_epinet_cli() -> Command {
    let cli = Command::new("epinet").about("Simulates an epidemic on a contact network");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs a simulation.
///
/// # Errors
/// Returns an error if argument parsing, configuration, the run or report output fails
pub fn run_with_args() -> Result<Simulation, Box<dyn std::error::Error>> {
    let matches = create_epinet_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(args)?)
}

fn load_parameters(args: &BaseArgs) -> Result<Parameters, EpinetError> {
    let mut parameters = if args.config.is_empty() {
        Parameters::default()
    } else {
        info!("Loading parameters from: {}", args.config);
        Parameters::load_from_json(Path::new(&args.config))?
    };
    if let Some(seed) = args.random_seed {
        parameters.seed = seed;
    }
    Ok(parameters)
}

fn run_with_args_internal(args: BaseArgs) -> Result<Simulation, EpinetError> {
    if let Some(level) = args.log_level {
        set_log_level(level);
    }
    set_module_filters(&args.log_filter);

    let parameters = load_parameters(&args)?;
    let mut simulation = SimulationBuilder::from_parameters(&parameters).build()?;
    simulation.run(args.max_days)?;

    if !args.output_dir.is_empty() {
        let mut report_options = ReportOptions::new();
        report_options
            .directory(PathBuf::from(&args.output_dir))
            .overwrite(args.overwrite);
        let (statistics_path, nodes_path) = write_reports(&simulation, &report_options)?;
        info!(
            "Wrote {} and {}",
            statistics_path.display(),
            nodes_path.display()
        );
    }

    if let Some(path) = &args.snapshot {
        simulation.snapshot().save_json(path)?;
        info!("Wrote snapshot to {}", path.display());
    }

    let summary = simulation.summary();
    println!(
        "day {}: susceptible={} infected={} recovered={} deceased={}",
        summary.day, summary.susceptible, summary.infected, summary.recovered, summary.deceased
    );
    Ok(simulation)
}
