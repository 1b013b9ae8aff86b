//! MCTS-2048: a Monte Carlo Tree Search player for the 2048 sliding-tile game.
//!
//! This crate provides the 2048 game model and a UCT search that picks the
//! next move by running heuristic-guided playouts from the current board.
//!
//! ## Modules
//!
//! - [`constants`] - Board size, spawn odds, search and heuristic parameters
//! - [`game`] - Core game logic (moves, merges, legality, spawning)
//! - [`heuristic`] - Board evaluation used by rollouts
//! - [`mcts`] - Monte Carlo Tree Search over an arena of nodes
//! - [`agent`] - Decision API returning the most visited action
//! - [`error`] - Error type shared by the crate
//!
//! ## Example
//!
//! ```
//! use fastrand::Rng;
//! use mcts_2048::agent::{Agent, decide};
//! use mcts_2048::game::Game;
//! use mcts_2048::mcts::SearchConfig;
//!
//! // One-shot decision from a raw board
//! let board = [[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
//! let action = decide(board, 0, 10).unwrap();
//! println!("Best move: {action}");
//!
//! // Reproducible play with a seeded agent
//! let mut rng = Rng::with_seed(7);
//! let mut game = Game::new();
//! game.reset(&mut rng);
//! let mut agent = Agent::with_seed(SearchConfig::default(), 7);
//! let decision = agent.decide(&game).unwrap();
//! game.step(decision.action, &mut rng);
//! ```

pub mod agent;
pub mod constants;
pub mod error;
pub mod game;
pub mod heuristic;
pub mod mcts;

pub use error::{Error, Result};
