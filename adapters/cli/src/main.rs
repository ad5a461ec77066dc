#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host loop that plays a grid tactics skirmish turn by turn.

mod scenario;
mod skirmish;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use grid_tactics_system_decision::DecisionTuning;
use grid_tactics_system_terrain_analysis::{InfluenceTuning, MapsAnalyser};
use grid_tactics_world::{Core, GameState, Terrain};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;
use crate::skirmish::TurnReport;

/// Plays computer-controlled combatants against each other on a grid.
#[derive(Parser, Debug)]
#[command(name = "grid-tactics")]
#[command(about = "Run a turn-based skirmish driven by the decision engine")]
struct Args {
    /// Scenario file; a random skirmish is generated when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximum number of turns to play
    #[arg(long, default_value_t = 20)]
    turns: u32,

    /// Seed for damage rolls and random generation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print one JSON object per decision instead of text
    #[arg(long)]
    json: bool,

    /// Print the first combatant's attraction map before playing
    #[arg(long)]
    influence: bool,

    /// Columns of a generated grid
    #[arg(long, default_value_t = 12)]
    width: u32,

    /// Rows of a generated grid
    #[arg(long, default_value_t = 8)]
    height: u32,

    /// Teams in a generated skirmish
    #[arg(long, default_value_t = 2)]
    teams: u32,

    /// Combatants per team in a generated skirmish
    #[arg(long, default_value_t = 3)]
    per_team: u32,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let (mut core, tuning, influence) = match &args.scenario {
        Some(path) => {
            let scenario = Scenario::load(path)?;
            let tuning = scenario.tuning.clone();
            let influence = scenario.influence.clone();
            (scenario.into_core()?, tuning, influence)
        }
        None => {
            let terrain = Terrain::generate(args.width, args.height, &mut rng)
                .context("failed to generate terrain")?;
            let roster = GameState::generate(&terrain, args.teams, args.per_team, &mut rng)
                .context("failed to place combatants")?;
            (
                Core::new(terrain, roster),
                DecisionTuning::default(),
                InfluenceTuning::default(),
            )
        }
    };
    info!(
        width = core.terrain().width(),
        height = core.terrain().height(),
        combatants = core.game_state().players().len(),
        seed = args.seed,
        "skirmish ready"
    );

    if args.influence {
        print_influence(&core, influence)?;
    }

    let json = args.json;
    let _ = skirmish::run(&mut core, &tuning, args.turns, &mut rng, |report| {
        print_report(report, json)
    })?;

    for player in core.game_state().players() {
        println!(
            "combatant {} (team {}) at ({}, {}) with {}/{} life",
            player.id().get(),
            player.team().get(),
            player.position().x,
            player.position().y,
            player.life(),
            player.max_life()
        );
    }
    Ok(())
}

fn print_influence(core: &Core, tuning: InfluenceTuning) -> Result<()> {
    let Some(actor) = core.game_state().living().next() else {
        return Ok(());
    };
    let map = MapsAnalyser::new(tuning)
        .attraction_map(core.analyser(), actor, core.game_state().players())
        .context("failed to build attraction map")?;

    println!("attraction map for combatant {}:", actor.id().get());
    for row in map.rows() {
        let cells: Vec<String> = row.iter().map(|value| format!("{value:.2}")).collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

fn print_report(report: &TurnReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(report).context("failed to serialise turn report")?
        );
        return Ok(());
    }

    let decision = &report.decision;
    let target = decision
        .target
        .map_or_else(|| "nobody".to_owned(), |id| format!("combatant {}", id.get()));
    let outcome = match (report.roll, report.target_life) {
        (Some(roll), Some(life)) => format!(", rolled {} leaving {life} life", roll.damage),
        _ if decision.reaches_target => ", out of position".to_owned(),
        _ => format!(", planning round {}", decision.round),
    };
    println!(
        "turn {} combatant {}: ({}, {}) -> ({}, {}) towards {target} score {:.6}{outcome}",
        report.turn,
        report.actor.get(),
        report.from.x,
        report.from.y,
        report.to.x,
        report.to.y,
        decision.score,
    );
    Ok(())
}
