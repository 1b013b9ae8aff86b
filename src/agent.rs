//! Move selection for a given board and score.
//!
//! Each decision builds a fresh search tree rooted at the caller's state,
//! runs the configured number of iterations and returns the most visited
//! root action. Nothing is kept between decisions.
//!
//! ## Example
//!
//! ```
//! use mcts_2048::agent::decide;
//! use mcts_2048::game::Action;
//!
//! let board = [[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
//! let action = decide(board, 0, 10).unwrap();
//! assert!(Action::ALL.contains(&action));
//! ```

use fastrand::Rng;
use log::debug;

use crate::error::{Error, Result};
use crate::game::{Action, Board, Game, Grid};
use crate::mcts::{SearchConfig, Tree, tree_search};

/// Statistics of one root child after a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub action: Action,
    pub visits: u32,
    pub mean_reward: f64,
}

/// The outcome of one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Most visited root action
    pub action: Action,
    /// Visits of the root (equals the number of simulations)
    pub root_visits: u32,
    /// Root children in attachment order
    pub children: Vec<ChildStats>,
}

impl Decision {
    fn from_tree(tree: &Tree) -> Result<Self> {
        let best = tree
            .most_visited_child(Tree::ROOT)
            .ok_or(Error::NoLegalAction)?;
        let action = tree.node(best).action.ok_or(Error::NoLegalAction)?;

        let children = tree
            .root()
            .children
            .iter()
            .filter_map(|&id| {
                let node = tree.node(id);
                node.action.map(|action| ChildStats {
                    action,
                    visits: node.visits,
                    mean_reward: node.mean_reward(),
                })
            })
            .collect();

        Ok(Self {
            action,
            root_visits: tree.root().visits,
            children,
        })
    }
}

/// An MCTS player with its own random source.
pub struct Agent {
    config: SearchConfig,
    rng: Rng,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Agent {
    /// Create an agent seeded from the system.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            rng: Rng::new(),
        }
    }

    /// Create an agent whose decisions are reproducible.
    pub fn with_seed(config: SearchConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Rng::with_seed(seed),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Access the agent's random source, e.g. to drive the real game.
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Search from `game` and return the chosen action with root statistics.
    pub fn decide(&mut self, game: &Game) -> Result<Decision> {
        search(game, &self.config, &mut self.rng)
    }
}

fn search(game: &Game, config: &SearchConfig, rng: &mut Rng) -> Result<Decision> {
    if config.simulations == 0 {
        return Err(Error::ZeroSimulations);
    }
    if game.is_terminal() || game.legal_actions().is_empty() {
        return Err(Error::NoLegalAction);
    }

    let tree = tree_search(game, config, rng);
    let decision = Decision::from_tree(&tree)?;

    debug!(
        "decide: score={} sims={} nodes={} -> {} [{}]",
        game.score(),
        config.simulations,
        tree.len(),
        decision.action,
        decision
            .children
            .iter()
            .map(|c| format!("{}:{}/{:.1}", c.action, c.visits, c.mean_reward))
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(decision)
}

/// Pick the next action for `board` and `score` using `simulations` iterations.
///
/// Randomness is seeded from the system; use [`decide_with_rng`] for
/// reproducible results.
pub fn decide(board: Grid, score: u64, simulations: usize) -> Result<Action> {
    decide_with_rng(board, score, simulations, &mut Rng::new())
}

/// Like [`decide`], drawing every spawn and expansion choice from `rng`.
pub fn decide_with_rng(
    board: Grid,
    score: u64,
    simulations: usize,
    rng: &mut Rng,
) -> Result<Action> {
    let game = Game::from_state(Board::from_rows(board)?, score);
    let config = SearchConfig::default().with_simulations(simulations);
    search(&game, &config, rng).map(|d| d.action)
}
