//! Self-play data generation.
//!
//! Plays tic-tac-toe games against itself with a full search per move and
//! writes one JSON record per game: the move sequence, the search policy
//! at every position, the root value estimates, and the final outcome from
//! the first player's perspective. Games run in parallel, each with its
//! own deterministically derived seed.

use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use zerosearch_core::Game;
use zerosearch_mcts::{games::TicTacToe, Mcts, MctsConfig, RolloutEvaluator};

#[derive(Parser, Debug)]
#[command(name = "selfplay", about = "Generate self-play training games")]
struct Args {
    /// Number of games to generate.
    #[arg(long, default_value_t = 100)]
    games: u64,

    /// Output directory for game records.
    #[arg(long, default_value = "selfplay-out")]
    output: PathBuf,

    /// Simulations per move.
    #[arg(long, default_value_t = 200)]
    simulations: usize,

    /// Base seed; game i plays with seed `base + i`.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Sampling temperature for the opening moves.
    #[arg(long, default_value_t = 1.0)]
    temperature: f32,

    /// Move number after which selection turns greedy (0 = never).
    #[arg(long, default_value_t = 6)]
    temperature_drop: usize,

    /// Maximum rollout depth for the evaluator.
    #[arg(long, default_value_t = 10)]
    rollout_depth: usize,
}

/// One completed game, in training-ready form.
#[derive(Serialize, Deserialize, Debug)]
struct GameRecord {
    seed: u64,
    /// Action indices in play order.
    moves: Vec<usize>,
    /// Search policy at each position, aligned with `moves`.
    policies: Vec<Vec<f32>>,
    /// Root value estimate at each position, from the player to move.
    root_values: Vec<f32>,
    /// Final outcome from the first player's perspective.
    outcome: f32,
}

fn play_game(args: &Args, seed: u64) -> Result<GameRecord> {
    let game = TicTacToe;

    let mut config = MctsConfig::with_simulations(args.simulations);
    config.temperature = args.temperature;
    config.temperature_drop_move = args.temperature_drop;

    let search_rng = ChaCha8Rng::seed_from_u64(seed);
    let evaluator = RolloutEvaluator::new(search_rng.clone(), args.rollout_depth);
    let mut mcts = Mcts::new(config.clone(), evaluator, search_rng);
    let mut sample_rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5e1f_91a7);

    let mut state = game.initial_state();
    let mut record = GameRecord {
        seed,
        moves: Vec::new(),
        policies: Vec::new(),
        root_values: Vec::new(),
        outcome: 0.0,
    };

    let mut move_number = 0;
    loop {
        let result = mcts
            .search(&game, &state)
            .with_context(|| format!("search failed at move {move_number} of game {seed}"))?;

        let temperature = config.effective_temperature(move_number);
        let action = result.select_action(temperature, &mut sample_rng);

        record.moves.push(game.action_to_index(action));
        record.policies.push(result.policy);
        record.root_values.push(result.root_value);

        state = game.apply(&state, action).state;
        move_number += 1;

        if let Some(outcome) = game.outcome(&state) {
            // outcome is from the side that just moved; the first player
            // moved on even move numbers.
            record.outcome = if move_number % 2 == 1 { outcome } else { -outcome };
            break;
        }
    }

    Ok(record)
}

fn write_record(output: &PathBuf, index: u64, record: &GameRecord) -> Result<()> {
    let path = output.join(format!("game_{index:05}.json"));
    let file = fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), record)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let outcomes: Vec<f32> = (0..args.games)
        .into_par_iter()
        .map(|index| {
            let record = play_game(&args, args.seed + index)?;
            write_record(&args.output, index, &record)?;
            Ok(record.outcome)
        })
        .collect::<Result<_>>()?;

    let wins = outcomes.iter().filter(|&&o| o > 0.0).count();
    let losses = outcomes.iter().filter(|&&o| o < 0.0).count();
    let draws = outcomes.len() - wins - losses;
    println!(
        "{} games written to {}: {wins} first-player wins, {losses} losses, {draws} draws",
        outcomes.len(),
        args.output.display()
    );

    Ok(())
}
