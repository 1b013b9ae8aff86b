//! MCTS-2048: play 2048 with Monte Carlo Tree Search.
//!
//! ## Usage
//!
//! - `mcts-2048` - Play one game and print every move
//! - `mcts-2048 play --seed 1 --simulations 50` - Reproducible game with a stronger search
//! - `mcts-2048 decide --board 2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0` - Choose one move
//!
//! Set `RUST_LOG=debug` (or pass `-v`) to see per-decision search statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fastrand::Rng;
use log::{LevelFilter, info};

use mcts_2048::agent::Agent;
use mcts_2048::constants::N_SIMS;
use mcts_2048::game::{Board, Game};
use mcts_2048::mcts::SearchConfig;

/// MCTS-2048: a Monte Carlo Tree Search player for 2048
#[derive(Parser)]
#[command(name = "mcts-2048")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log search statistics (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a full game from a fresh board
    Play {
        /// Seed for tile spawns and search (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// MCTS iterations per move
        #[arg(long, default_value_t = N_SIMS)]
        simulations: usize,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<usize>,
        /// Only print the final board
        #[arg(short, long)]
        quiet: bool,
    },
    /// Choose one move for a given board
    Decide {
        /// Rows separated by '/', cells by ',' (e.g. 2,2,0,0/0,0,0,0/0,0,0,0/0,0,0,0)
        #[arg(long)]
        board: String,
        /// Current score
        #[arg(long, default_value_t = 0)]
        score: u64,
        /// MCTS iterations
        #[arg(long, default_value_t = N_SIMS)]
        simulations: usize,
        /// Seed for the search (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Some(Commands::Play {
            seed,
            simulations,
            max_moves,
            quiet,
        }) => play(seed, simulations, max_moves, quiet),
        Some(Commands::Decide {
            board,
            score,
            simulations,
            seed,
        }) => decide(&board, score, simulations, seed),
        None => play(None, N_SIMS, None, false),
    }
}

fn make_agent(simulations: usize, seed: Option<u64>) -> Agent {
    let config = SearchConfig::default().with_simulations(simulations);
    match seed {
        Some(seed) => Agent::with_seed(config, seed),
        None => Agent::new(config),
    }
}

fn play(seed: Option<u64>, simulations: usize, max_moves: Option<usize>, quiet: bool) -> Result<()> {
    let mut agent = make_agent(simulations, seed);
    let mut rng = seed.map_or_else(Rng::new, |s| Rng::with_seed(s.wrapping_add(1)));

    let mut game = Game::new();
    game.reset(&mut rng);
    info!("new game, {simulations} simulations per move");

    let mut moves = 0;
    while !game.is_terminal() && max_moves.is_none_or(|m| moves < m) {
        let decision = agent
            .decide(&game)
            .with_context(|| format!("search failed after {moves} moves"))?;
        game.step(decision.action, &mut rng);
        moves += 1;
        if !quiet {
            println!("move {moves}: {}  score: {}", decision.action, game.score());
            println!("{}", game.board());
        }
    }

    println!(
        "Game over after {moves} moves. Score: {}, max tile: {}",
        game.score(),
        game.board().max_tile()
    );
    if quiet {
        println!("{}", game.board());
    }
    Ok(())
}

fn decide(board: &str, score: u64, simulations: usize, seed: Option<u64>) -> Result<()> {
    let board: Board = board.parse().context("could not parse --board")?;
    let game = Game::from_state(board, score);
    let decision = make_agent(simulations, seed)
        .decide(&game)
        .context("no move to choose")?;

    println!("{}", game.board());
    for child in &decision.children {
        println!(
            "{:>5}: visits={} mean={:.1}",
            child.action, child.visits, child.mean_reward
        );
    }
    println!("Best move: {}", decision.action);
    Ok(())
}
