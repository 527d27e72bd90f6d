//! `mtbf` command-line interface.
//!
//! Payloads go to stdout in the format chosen with `--format`; logs and
//! errors go to stderr. The process exit code is one of
//! [`ExitCode`](mtbf_core::exit_codes::ExitCode).

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use mtbf_common::{
    write_dataset, Dataset, DistributionFamily, Error, MaintenancePolicy, OutputFormat, PlanId,
    Result, RunId,
};
use mtbf_config::{
    collect_issues, load_config, resolve_config, EngineConfig, FleetSection, LoadedConfig,
    ValidationError,
};
use mtbf_core::cost::{compare, PolicyParameters};
use mtbf_core::distribution::LifetimeDistribution;
use mtbf_core::exit_codes::ExitCode;
use mtbf_core::fit::{fit_with, FitOptions, FitReport};
use mtbf_core::log_event;
use mtbf_core::logging::{event_names, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage};
use mtbf_core::output::{
    render, render_error, ConfigReport, ConfigValidationReport, CostPayload, FitPayload,
    GeneratePayload, OcPayload, PlanAddPayload, PlanListPayload, Report, SimulatePayload,
    SprtRunPayload,
};
use mtbf_core::simulate::{export_trials, generate_censored, SimulationRunner};
use mtbf_core::sprt::{evaluate, PlanRegistry, PlanValidation, SprtPlan, SprtState, TestPlan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// MTBF reliability engine: fit lifetimes, price maintenance, simulate fleets, run sequential tests
#[derive(Parser)]
#[command(name = "mtbf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.json (overrides MTBF_CONFIG and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a lifetime distribution to a censored dataset
    Fit(FitArgs),

    /// Compare yearly cost with and without preventive maintenance
    Cost(CostArgs),

    /// Monte Carlo simulation of a maintained fleet
    Simulate(SimulateArgs),

    /// Generate a censored toy dataset
    Generate(GenerateArgs),

    /// Sequential probability ratio test
    Sprt(SprtArgs),

    /// Manage the test plan collection
    Plan(PlanArgs),

    /// Configuration management
    Config(ConfigArgs),
}

/// Distribution overrides; unset values come from the configuration.
#[derive(Args, Debug, Default)]
struct DistArgs {
    /// Distribution family
    #[arg(long, value_enum)]
    family: Option<DistributionFamily>,

    /// Shape parameter
    #[arg(long)]
    shape: Option<f64>,

    /// Scale parameter in hours
    #[arg(long)]
    scale: Option<f64>,

    /// Fit the distribution to this dataset instead
    #[arg(long, conflicts_with_all = ["shape", "scale"])]
    dataset: Option<PathBuf>,
}

/// Fleet and cost overrides.
#[derive(Args, Debug, Default)]
struct FleetArgs {
    /// Number of components in the fleet
    #[arg(long)]
    components: Option<u32>,

    /// Yearly operating hours of one component
    #[arg(long)]
    hours_per_component: Option<f64>,

    /// Preventive maintenance interval in hours
    #[arg(long)]
    interval: Option<f64>,

    /// Cost of one failure
    #[arg(long)]
    failure_cost: Option<f64>,

    /// Cost of one preventive maintenance
    #[arg(long)]
    maintenance_cost: Option<f64>,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// CSV dataset with duration and status columns
    dataset: PathBuf,

    /// Distribution family to fit
    #[arg(long, value_enum)]
    family: Option<DistributionFamily>,

    /// Initial shape guess
    #[arg(long, requires = "scale0")]
    shape0: Option<f64>,

    /// Initial scale guess
    #[arg(long, requires = "shape0")]
    scale0: Option<f64>,

    /// Iteration cap per optimizer attempt
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Do not retry with Nelder-Mead when BFGS fails
    #[arg(long)]
    no_fallback: bool,
}

#[derive(Args, Debug)]
struct CostArgs {
    #[command(flatten)]
    dist: DistArgs,

    #[command(flatten)]
    fleet: FleetArgs,

    /// Iteration cap for the interval optimizer
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    dist: DistArgs,

    #[command(flatten)]
    fleet: FleetArgs,

    /// Maintenance policy
    #[arg(long, value_enum)]
    policy: Option<MaintenancePolicy>,

    /// Number of repeats
    #[arg(long)]
    repeats: Option<usize>,

    /// Trial length in years
    #[arg(long)]
    years: Option<f64>,

    /// Random seed (drawn and reported when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Write every trial's event sequences to this CSV file
    #[arg(long)]
    trials_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    dist: DistArgs,

    /// Number of rows
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// Censoring cutoff in hours (defaults to the maintenance interval)
    #[arg(long)]
    cutoff: Option<f64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Destination CSV file
    #[arg(long, short = 'o')]
    output: PathBuf,
}

/// SPRT plan overrides; unset values come from the configuration.
#[derive(Args, Debug, Default)]
struct PlanParamArgs {
    /// Producer's risk
    #[arg(long)]
    alpha: Option<f64>,

    /// Consumer's risk
    #[arg(long)]
    beta: Option<f64>,

    /// Discrimination ratio d
    #[arg(long)]
    ratio: Option<f64>,

    /// Specified MTBF m0 in hours
    #[arg(long)]
    m0: Option<f64>,
}

#[derive(Args, Debug)]
struct PlanSource {
    #[command(flatten)]
    params: PlanParamArgs,

    /// Use this plan from the plan collection
    #[arg(long, conflicts_with_all = ["alpha", "beta", "ratio", "m0"])]
    plan_id: Option<String>,

    /// Plan collection file
    #[arg(long, default_value = "plans.json")]
    plans: PathBuf,

    /// Components under test
    #[arg(long)]
    components: Option<u32>,
}

#[derive(Args, Debug)]
struct SprtArgs {
    #[command(subcommand)]
    command: SprtCommands,
}

#[derive(Subcommand, Debug)]
enum SprtCommands {
    /// Run the test over a dataset, record by record
    Run {
        /// CSV dataset with duration and status columns
        dataset: PathBuf,

        #[command(flatten)]
        source: PlanSource,
    },

    /// Operating characteristic of a plan
    Oc {
        #[command(flatten)]
        source: PlanSource,

        /// Number of points
        #[arg(long)]
        points: Option<usize>,

        /// Half-width of the h grid
        #[arg(long)]
        h_limit: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(subcommand)]
    command: PlanCommands,
}

#[derive(Subcommand, Debug)]
enum PlanCommands {
    /// Validate a plan and add it to the collection
    Add {
        /// Plan id
        id: String,

        #[command(flatten)]
        params: PlanParamArgs,

        /// Plan collection file
        #[arg(long, default_value = "plans.json")]
        plans: PathBuf,
    },

    /// List plans in the collection
    List {
        /// Plan collection file
        #[arg(long, default_value = "plans.json")]
        plans: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration and its provenance
    Show,

    /// Validate the configuration file
    Validate,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Fit(_) => "fit",
            Commands::Cost(_) => "cost",
            Commands::Simulate(_) => "simulate",
            Commands::Generate(_) => "generate",
            Commands::Sprt(a) => match a.command {
                SprtCommands::Run { .. } => "sprt run",
                SprtCommands::Oc { .. } => "sprt oc",
            },
            Commands::Plan(a) => match a.command {
                PlanCommands::Add { .. } => "plan add",
                PlanCommands::List { .. } => "plan list",
            },
            Commands::Config(a) => match a.command {
                ConfigCommands::Show => "config show",
                ConfigCommands::Validate => "config validate",
            },
        }
    }
}

/// Per-invocation state shared by the command handlers.
struct Session {
    run_id: RunId,
    ctx: LogContext,
    format: OutputFormat,
}

impl Session {
    fn emit<T: Report>(&self, payload: &T) {
        println!("{}", render(&self.run_id, payload, self.format));
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let g = &cli.global;
    let cli_level = (g.verbose > 0 || g.quiet > 0).then(|| LogLevel::Info.adjusted(g.verbose, g.quiet));
    init_logging(&LogConfig::from_env(cli_level, g.log_format));

    let run_id = RunId::new();
    let session = Session {
        ctx: LogContext::new(run_id.0.clone()),
        run_id,
        format: g.format,
    };
    let command = cli.command.name();
    log_event!(session.ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "starting", command = command);

    let code = match run(&cli, &session) {
        Ok(code) => code,
        Err(err) => {
            log_event!(session.ctx, DEBUG, event_names::INTERNAL_ERROR, Stage::Output, err.to_string(),
                code = err.code());
            eprintln!("{}", render_error(&session.run_id, command, &err, session.format));
            ExitCode::from(&err)
        }
    };
    log_event!(session.ctx, DEBUG, event_names::RUN_FINISHED, Stage::Output, "finished",
        exit_code = code.as_i32());
    std::process::exit(code.as_i32());
}

fn run(cli: &Cli, session: &Session) -> Result<ExitCode> {
    let config_path = cli.global.config.as_deref();
    if let Commands::Config(args) = &cli.command {
        if let ConfigCommands::Validate = args.command {
            return run_config_validate(config_path, session);
        }
    }

    let loaded = load(config_path, session)?;
    let config = &loaded.config;
    match &cli.command {
        Commands::Fit(args) => run_fit(args, config, session),
        Commands::Cost(args) => run_cost(args, config, session),
        Commands::Simulate(args) => run_simulate(args, config, session),
        Commands::Generate(args) => run_generate(args, config, session),
        Commands::Sprt(args) => match &args.command {
            SprtCommands::Run { dataset, source } => run_sprt(dataset, source, config, session),
            SprtCommands::Oc {
                source,
                points,
                h_limit,
            } => run_oc(source, *points, *h_limit, config, session),
        },
        Commands::Plan(args) => match &args.command {
            PlanCommands::Add { id, params, plans } => run_plan_add(id, params, plans, config, session),
            PlanCommands::List { plans } => run_plan_list(plans, session),
        },
        Commands::Config(_) => {
            session.emit(&ConfigReport {
                snapshot: loaded.snapshot.clone(),
                config: loaded.config.clone(),
            });
            Ok(ExitCode::Clean)
        }
    }
}

fn load(config_path: Option<&Path>, session: &Session) -> Result<LoadedConfig> {
    let loaded = load_config(config_path).map_err(|e| {
        log_event!(session.ctx, WARN, event_names::CONFIG_ERROR, Stage::Init, e.to_string());
        Error::from(e)
    })?;
    match loaded.snapshot.config_path.as_deref() {
        Some(path) => log_event!(session.ctx, INFO, event_names::CONFIG_LOADED, Stage::Init,
            "configuration loaded", path = path, config_id = loaded.snapshot.short_id()),
        None => log_event!(session.ctx, DEBUG, event_names::CONFIG_DEFAULT_USED, Stage::Init,
            "using built-in configuration"),
    }
    Ok(loaded)
}

fn load_dataset(path: &Path, session: &Session) -> Result<Dataset> {
    let dataset = Dataset::from_path(path)?;
    log_event!(session.ctx, INFO, event_names::DATASET_LOADED, Stage::Load, "dataset loaded",
        path = %path.display(), records = dataset.len(), failures = dataset.failure_count());
    Ok(dataset)
}

fn fit_options(config: &EngineConfig, family: Option<DistributionFamily>) -> FitOptions {
    let opts = FitOptions::default()
        .with_family(family.unwrap_or(config.distribution.family))
        .with_max_iterations(config.fitting.max_iterations);
    if config.fitting.fallback {
        opts
    } else {
        opts.without_fallback()
    }
}

fn fit_dataset(
    path: &Path,
    opts: &FitOptions,
    session: &Session,
) -> Result<FitReport> {
    let dataset = load_dataset(path, session)?;
    log_event!(session.ctx, DEBUG, event_names::FIT_STARTED, Stage::Fit, "fitting",
        family = %opts.family, records = dataset.len());
    let report = fit_with(&dataset, opts)?;
    log_event!(session.ctx, INFO, event_names::FIT_FINISHED, Stage::Fit, "fit converged",
        method = %report.method, iterations = report.iterations,
        shape = report.shape, scale = report.scale);
    Ok(report)
}

/// Distribution from a fitted dataset, CLI overrides or the configuration.
fn distribution(args: &DistArgs, config: &EngineConfig, session: &Session) -> Result<LifetimeDistribution> {
    if let Some(path) = &args.dataset {
        return fit_dataset(path, &fit_options(config, args.family), session)?.distribution();
    }
    let d = &config.distribution;
    LifetimeDistribution::new(
        args.family.unwrap_or(d.family),
        args.shape.unwrap_or(d.shape),
        args.scale.unwrap_or(d.scale),
    )
}

fn maintenance_interval(
    explicit: Option<f64>,
    config: &EngineConfig,
    dist: &LifetimeDistribution,
) -> f64 {
    explicit
        .or(config.maintenance.interval)
        .unwrap_or_else(|| dist.default_interval())
}

fn run_fit(args: &FitArgs, config: &EngineConfig, session: &Session) -> Result<ExitCode> {
    let mut opts = fit_options(config, args.family);
    if let (Some(shape), Some(scale)) = (args.shape0, args.scale0) {
        opts = opts.with_initial(shape, scale);
    }
    if let Some(n) = args.max_iterations {
        opts = opts.with_max_iterations(n);
    }
    if args.no_fallback {
        opts = opts.without_fallback();
    }
    let fit = fit_dataset(&args.dataset, &opts, session)?;
    let mean = fit.distribution()?.mean();
    session.emit(&FitPayload {
        dataset: args.dataset.display().to_string(),
        fit,
        mean,
    });
    Ok(ExitCode::Clean)
}

fn run_cost(args: &CostArgs, config: &EngineConfig, session: &Session) -> Result<ExitCode> {
    let dist = distribution(&args.dist, config, session)?;
    let f = &args.fleet;
    let fleet = FleetSection {
        components: f.components.unwrap_or(config.fleet.components),
        operating_hours_per_component: f
            .hours_per_component
            .unwrap_or(config.fleet.operating_hours_per_component),
    };
    let policy = PolicyParameters::new(
        fleet.fleet_operating_hours(),
        f.failure_cost.unwrap_or(config.costs.failure_cost),
        f.maintenance_cost.unwrap_or(config.costs.maintenance_cost),
        maintenance_interval(f.interval, config, &dist),
    )?;
    let max_iterations = args.max_iterations.unwrap_or(config.optimizer.max_iterations);
    let comparison = compare(&dist, &policy, max_iterations)?;
    let converged = comparison.optimization.converged;
    log_event!(session.ctx, INFO, event_names::COST_OPTIMIZED, Stage::Cost, "interval optimized",
        interval = comparison.optimization.interval,
        total_cost = comparison.optimized.total_cost,
        converged = converged);
    session.emit(&CostPayload {
        distribution: dist,
        policy,
        comparison,
    });
    Ok(if converged {
        ExitCode::Clean
    } else {
        ExitCode::NotConverged
    })
}

fn run_simulate(args: &SimulateArgs, config: &EngineConfig, session: &Session) -> Result<ExitCode> {
    let dist = distribution(&args.dist, config, session)?;
    let f = &args.fleet;
    let sim = &config.simulation;
    let components = f.components.unwrap_or(config.fleet.components) as usize;
    let cutoff = maintenance_interval(f.interval, config, &dist);
    let runner = SimulationRunner::new(
        dist,
        args.policy.unwrap_or(sim.policy),
        cutoff,
        components,
        args.years.unwrap_or(sim.trial_years),
        f.hours_per_component
            .unwrap_or(config.fleet.operating_hours_per_component),
        args.repeats.unwrap_or(sim.repeats),
        args.seed.or(sim.seed),
    )?
    .with_costs(
        f.failure_cost.unwrap_or(config.costs.failure_cost),
        f.maintenance_cost.unwrap_or(config.costs.maintenance_cost),
    );
    log_event!(session.ctx, INFO, event_names::SIMULATION_STARTED, Stage::Simulate, "simulating",
        repeats = runner.repeats(), seed = runner.seed(), horizon = runner.horizon());
    let run = runner.run()?;
    log_event!(session.ctx, INFO, event_names::SIMULATION_FINISHED, Stage::Simulate, "simulation finished",
        maintenance_mean = run.summary.maintenance.mean,
        failures_mean = run.summary.failures.mean);

    let trials_path = match &args.trials_csv {
        Some(path) => {
            export_trials(&run.trials, BufWriter::new(File::create(path)?))?;
            Some(path.display().to_string())
        }
        None => None,
    };
    session.emit(&SimulatePayload {
        distribution: dist,
        cutoff,
        components,
        horizon: runner.horizon(),
        run,
        trials_path,
    });
    Ok(ExitCode::Clean)
}

fn run_generate(args: &GenerateArgs, config: &EngineConfig, session: &Session) -> Result<ExitCode> {
    let dist = distribution(&args.dist, config, session)?;
    let cutoff = maintenance_interval(args.cutoff, config, &dist);
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let dataset = generate_censored(&dist, args.rows, cutoff, &mut rng)?;
    write_dataset(&dataset, BufWriter::new(File::create(&args.output)?))?;
    let failures = dataset.failure_count();
    session.emit(&GeneratePayload {
        distribution: dist,
        rows: dataset.len(),
        cutoff,
        failures,
        censored: dataset.len() - failures,
        path: args.output.display().to_string(),
    });
    Ok(ExitCode::Clean)
}

fn plan_from_params(params: &PlanParamArgs, config: &EngineConfig) -> Result<SprtPlan> {
    let s = &config.sequential;
    SprtPlan::new(
        params.alpha.unwrap_or(s.alpha),
        params.beta.unwrap_or(s.beta),
        params.ratio.unwrap_or(s.discrimination_ratio),
        params.m0.unwrap_or(s.specified_mtbf),
    )
}

fn resolve_plan(source: &PlanSource, config: &EngineConfig, session: &Session) -> Result<SprtPlan> {
    let Some(id) = &source.plan_id else {
        return plan_from_params(&source.params, config);
    };
    let registry = PlanRegistry::load(&source.plans)?;
    log_event!(session.ctx, DEBUG, event_names::PLANS_LOADED, Stage::Load, "plan collection loaded",
        path = %source.plans.display(), plans = registry.plans().len());
    registry
        .get(id)
        .ok_or_else(|| {
            Error::InvalidParameter(format!(
                "no plan with id '{}' in {}",
                id,
                source.plans.display()
            ))
        })?
        .sprt()
}

fn run_sprt(dataset: &Path, source: &PlanSource, config: &EngineConfig, session: &Session) -> Result<ExitCode> {
    let plan = resolve_plan(source, config, session)?;
    let data = load_dataset(dataset, session)?;
    let components = source.components.unwrap_or(config.sequential.components) as usize;
    let outcome = evaluate(&plan, data.iter());
    let test_years = outcome.test_years(components, config.fleet.operating_hours_per_component)?;
    log_event!(session.ctx, INFO, event_names::SPRT_DECIDED, Stage::Sequential, "sequential test finished",
        state = %outcome.state, decision_index = ?outcome.decision_index,
        failures = outcome.cumulative_failures);
    let code = match outcome.state {
        SprtState::Accepted => ExitCode::Clean,
        SprtState::Rejected => ExitCode::Rejected,
        SprtState::Testing | SprtState::Indeterminate => ExitCode::Indeterminate,
    };
    session.emit(&SprtRunPayload {
        plan_id: source.plan_id.clone(),
        plan,
        dataset: dataset.display().to_string(),
        components,
        test_years,
        outcome,
    });
    Ok(code)
}

fn run_oc(
    source: &PlanSource,
    points: Option<usize>,
    h_limit: Option<f64>,
    config: &EngineConfig,
    session: &Session,
) -> Result<ExitCode> {
    let plan = resolve_plan(source, config, session)?;
    let s = &config.sequential;
    let components = source.components.unwrap_or(s.components) as usize;
    let h_limit = h_limit.unwrap_or(s.h_limit);
    if !h_limit.is_finite() || h_limit <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "h limit must be positive, got {h_limit}"
        )));
    }
    let points = points.unwrap_or(s.oc_points);
    if points < 2 {
        return Err(Error::InvalidParameter(format!(
            "at least 2 OC points are needed, got {points}"
        )));
    }
    session.emit(&OcPayload {
        boundaries: plan.boundaries(),
        decision_lines: plan.decision_lines(),
        minimum_test_time: plan.minimum_test_time(components)?,
        points: plan.operating_characteristic(components, h_limit, points)?,
        components,
        plan,
    });
    Ok(ExitCode::Clean)
}

fn run_plan_add(
    id: &str,
    params: &PlanParamArgs,
    path: &Path,
    config: &EngineConfig,
    session: &Session,
) -> Result<ExitCode> {
    let id = PlanId::parse(id)
        .ok_or_else(|| Error::InvalidParameter(format!("invalid plan id '{id}'")))?;
    let plan = TestPlan::new(id, plan_from_params(params, config)?);
    let mut registry = PlanRegistry::load(path)?;
    let validation = registry.add(plan.clone());
    log_event!(session.ctx, INFO, event_names::PLAN_VALIDATED, Stage::Sequential, "plan validated",
        id = %plan.id, outcome = %validation);
    if validation == PlanValidation::Pass {
        registry.save(path)?;
    }
    session.emit(&PlanAddPayload {
        path: path.display().to_string(),
        validation,
        plan,
        plans: registry.plans().len(),
    });
    Ok(match validation {
        PlanValidation::Pass => ExitCode::Clean,
        PlanValidation::IdError | PlanValidation::ParamError => ExitCode::PlanConflict,
    })
}

fn run_plan_list(path: &Path, session: &Session) -> Result<ExitCode> {
    let registry = PlanRegistry::load(path)?;
    session.emit(&PlanListPayload {
        path: path.display().to_string(),
        plans: registry.plans().to_vec(),
    });
    Ok(ExitCode::Clean)
}

fn run_config_validate(config_path: Option<&Path>, session: &Session) -> Result<ExitCode> {
    let paths = resolve_config(config_path);
    let issues = match paths.config.as_deref() {
        None => collect_issues(&EngineConfig::default()),
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => collect_issues(&config),
            Err(e) => vec![e],
        },
    };
    for issue in &issues {
        log_event!(session.ctx, WARN, event_names::CONFIG_ERROR, Stage::Init, issue.to_string());
    }
    let valid = issues.is_empty();
    let io_failure = issues
        .iter()
        .any(|e| matches!(e, ValidationError::IoError(_)));
    session.emit(&ConfigValidationReport::new(
        paths.config.as_ref().map(|p| p.display().to_string()),
        &issues,
    ));
    Ok(if valid {
        ExitCode::Clean
    } else if io_failure {
        ExitCode::IoError
    } else {
        ExitCode::ConfigError
    })
}
