//! Hexbattle - Main Binary
//!
//! Compile single movement paths or play scenario files from the command line

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use hexbattle_rs::{
    board::{BoardLayout, HexBoard},
    core::{EntityId, Facing, HexCoord, MovementStats, PlayerId, Unit, UnitCategory},
    game::{GameOptions, OutputMode, Scenario, VerbosityLevel},
    movement::{parse_step_list, LateralDirection, MoveContext, MovePath, MoveState, MovementConfig},
};
use std::path::{Path, PathBuf};

/// Unit category for single-path compilation
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Mech,
    Quad,
    Tank,
    Infantry,
    Proto,
    Aero,
}

impl From<CategoryArg> for UnitCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Mech => UnitCategory::Mech,
            CategoryArg::Quad => UnitCategory::QuadMech,
            CategoryArg::Tank => UnitCategory::Tank,
            CategoryArg::Infantry => UnitCategory::Infantry,
            CategoryArg::Proto => UnitCategory::ProtoMech,
            CategoryArg::Aero => UnitCategory::Aero,
        }
    }
}

/// Which way turn/move/turn triples are folded into lateral shifts
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollapseArg {
    Forward,
    Backward,
}

impl From<CollapseArg> for LateralDirection {
    fn from(arg: CollapseArg) -> Self {
        match arg {
            CollapseArg::Forward => LateralDirection::Forward,
            CollapseArg::Backward => LateralDirection::Backward,
        }
    }
}

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "hexbattle")]
#[command(about = "Hexbattle - hex-grid battle simulation core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one movement path and print every step
    Path {
        /// Step codes, space or comma separated (e.g. "F F R LL J")
        #[arg(value_name = "STEPS")]
        steps: String,

        /// Unit category
        #[arg(long, value_enum, default_value = "mech")]
        category: CategoryArg,

        /// Walking MP
        #[arg(long, default_value_t = 4)]
        walk: u32,

        /// Running MP (default: derived from walking MP)
        #[arg(long)]
        run: Option<u32>,

        /// Jumping MP
        #[arg(long, default_value_t = 0)]
        jump: u32,

        /// Starting hex, axial q
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        q: i32,

        /// Starting hex, axial r
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        r: i32,

        /// Starting facing (0=N, 1=NE, 2=SE, 3=S, 4=SW, 5=NW)
        #[arg(long, default_value_t = 0)]
        facing: u8,

        /// Board layout (JSON); default is an open clear board
        #[arg(long, value_name = "BOARD_FILE")]
        board: Option<PathBuf>,

        /// Match options (JSON)
        #[arg(long, value_name = "OPTIONS_FILE")]
        options: Option<PathBuf>,

        /// Fold turn/move/turn triples into lateral shifts
        #[arg(long, value_enum)]
        collapse: Option<CollapseArg>,

        /// Drop illegal steps from the end of the path
        #[arg(long)]
        clip: bool,
    },

    /// Play a scenario file through deployment and its rounds
    Scenario {
        /// Scenario file (JSON)
        #[arg(value_name = "SCENARIO_FILE")]
        file: PathBuf,

        /// Override the scenario's random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of rounds
        #[arg(long)]
        rounds: Option<u32>,

        /// Override the scenario's match options (JSON)
        #[arg(long, value_name = "OPTIONS_FILE")]
        options: Option<PathBuf>,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Print the outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Path {
            steps,
            category,
            walk,
            run,
            jump,
            q,
            r,
            facing,
            board,
            options,
            collapse,
            clip,
        } => run_path(
            &steps,
            category.into(),
            (walk, run, jump),
            MoveState::start(HexCoord::new(q, r), Facing::new(facing as i32), 0, false),
            board.as_deref(),
            options.as_deref(),
            collapse.map(Into::into),
            clip,
        )?,
        Commands::Scenario {
            file,
            seed,
            rounds,
            options,
            verbosity,
            json,
        } => run_scenario(&file, seed, rounds, options.as_deref(), verbosity.into(), json)?,
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> anyhow::Result<GameOptions> {
    match path {
        Some(path) => GameOptions::load(path)
            .with_context(|| format!("failed to load options from {}", path.display())),
        None => Ok(GameOptions::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_path(
    steps: &str,
    category: UnitCategory,
    (walk, run, jump): (u32, Option<u32>, u32),
    start: MoveState,
    board: Option<&Path>,
    options: Option<&Path>,
    collapse: Option<LateralDirection>,
    clip: bool,
) -> anyhow::Result<()> {
    let types = parse_step_list(steps).map_err(anyhow::Error::msg)?;
    let options = load_options(options)?;
    let board = match board {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read board {}", path.display()))?;
            let layout: BoardLayout = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse board {}", path.display()))?;
            HexBoard::from_layout(&layout)
        }
        None => HexBoard::open(),
    };

    let unit = Unit::new(
        EntityId::new(1),
        PlayerId::new(1),
        "Unit",
        category,
        MovementStats::walking(walk).with_jump(jump),
    );
    let mut config = MovementConfig::from_profile(&unit, &options.movement_rules());
    if let Some(run) = run {
        if run < config.walk_mp {
            bail!("running MP {run} is below walking MP {}", config.walk_mp);
        }
        config.run_mp = run;
    }
    if !options.running_fall_checks {
        config.running_risks_fall = false;
    }
    let ctx = MoveContext::new(&config, &board);

    let mut path = MovePath::compiled(unit.id, &types, start, &ctx);
    if let Some(direction) = collapse {
        path.collapse_to_lateral_shifts(direction);
        path.recompile(&ctx);
    }
    if clip {
        path.clip_to_possible();
    }

    print!("{path}");
    if let Some((step, reason)) = path.first_illegal() {
        println!("first illegal step: {} ({reason})", step + 1);
    }
    Ok(())
}

fn run_scenario(
    file: &Path,
    seed: Option<u64>,
    rounds: Option<u32>,
    options: Option<&Path>,
    verbosity: VerbosityLevel,
    json: bool,
) -> anyhow::Result<()> {
    let mut scenario = Scenario::load(file)
        .with_context(|| format!("failed to load scenario {}", file.display()))?;
    if let Some(seed) = seed {
        scenario.seed = seed;
    }
    if let Some(rounds) = rounds {
        scenario.rounds = rounds;
    }
    if options.is_some() {
        scenario.options = load_options(options)?;
    }

    let mut game = scenario.build()?;
    game.reports_mut().set_verbosity(verbosity);
    if json {
        game.reports_mut().set_output_mode(OutputMode::Memory);
    }
    let outcome = scenario.play(&mut game)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    println!("=== {} ===", scenario.name);
    println!("Rounds played: {}", outcome.rounds_played);
    println!("Final phase:   {}", outcome.final_phase);
    for (entity, position, facing) in &outcome.positions {
        match position {
            Some(hex) => println!("  unit {entity}: {hex} facing {facing}"),
            None => println!("  unit {entity}: off board"),
        }
    }
    for clipped in &outcome.clipped {
        println!(
            "  round {}: unit {} stopped before step {} ({})",
            clipped.round,
            clipped.entity,
            clipped.step + 1,
            clipped.reason
        );
    }
    println!("State hash:    {}", outcome.hash_string());
    Ok(())
}
