//! Monte Carlo Tree Search (MCTS) over 2048 moves.
//!
//! This module implements plain UCT search with:
//! - UCB1 selection among fully expanded nodes
//! - Expansion of one random untried legal action per iteration
//! - Greedy heuristic rollouts (one-step lookahead with [`evaluate`])
//! - Backpropagation of the final rollout score to the root
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index.
//! Children are owned through the arena; the parent index is only used to
//! walk back up during backpropagation.
//!
//! Tile spawns make the game stochastic, so a node's stored state is the
//! one seen when it was created. Every iteration replays the chosen actions
//! on its own clone of the game, and legality is always checked against that
//! clone rather than the stored snapshot.

use fastrand::Rng;
use log::trace;

use crate::constants::{N_SIMS, UCT_C};
use crate::game::{Action, Game, GameState};
use crate::heuristic::evaluate;

/// Index of a node in the [`Tree`] arena.
pub type NodeId = usize;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Number of iterations to run.
    pub simulations: usize,
    /// UCT exploration constant.
    pub exploration: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: N_SIMS,
            exploration: UCT_C,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulations(mut self, n: usize) -> Self {
        self.simulations = n;
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }
}

// =============================================================================
// Tree
// =============================================================================

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Board and score when the node was created
    pub state: GameState,
    /// Action that led here from the parent (`None` for the root)
    pub action: Option<Action>,
    /// Non-owning link used by backpropagation
    pub parent: Option<NodeId>,
    /// Children in attachment order
    pub children: Vec<NodeId>,
    /// Number of visits
    pub visits: u32,
    /// Sum of rollout rewards
    pub total_reward: f64,
}

impl Node {
    fn new(state: GameState, action: Option<Action>, parent: Option<NodeId>) -> Self {
        Self {
            state,
            action,
            parent,
            children: Vec::new(),
            visits: 0,
            total_reward: 0.0,
        }
    }

    /// Mean reward, or 0 for an unvisited node.
    #[inline]
    pub fn mean_reward(&self) -> f64 {
        if self.visits > 0 {
            self.total_reward / self.visits as f64
        } else {
            0.0
        }
    }
}

/// Arena of search nodes. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: NodeId = 0;

    /// Create a tree holding only a root for `state`.
    pub fn new(state: GameState) -> Self {
        Self {
            nodes: vec![Node::new(state, None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a new child under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, action: Action, state: GameState) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(state, Some(action), Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    /// Actions already represented among the children of `id`.
    pub fn tried_actions(&self, id: NodeId) -> Vec<Action> {
        self.nodes[id]
            .children
            .iter()
            .filter_map(|&c| self.nodes[c].action)
            .collect()
    }

    /// Whether `id` has one child per action currently legal in `game`.
    pub fn is_fully_expanded(&self, id: NodeId, game: &Game) -> bool {
        self.nodes[id].children.len() == game.legal_actions().len()
    }

    /// Compute the UCT score of `child` given its parent's visit count.
    fn uct(&self, child: NodeId, parent_visits: u32, c: f64) -> f64 {
        let node = &self.nodes[child];
        let visits = node.visits as f64;
        node.total_reward / visits + c * ((parent_visits as f64).ln() / visits).sqrt()
    }

    /// Select the child of `id` with the highest UCT score.
    ///
    /// Ties go to the earliest attached child.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no children, or if `id` or any child is unvisited.
    /// Selection only runs on fully expanded nodes, whose children were all
    /// backpropagated when they were created.
    pub fn best_child(&self, id: NodeId, c: f64) -> NodeId {
        let parent = &self.nodes[id];
        assert!(!parent.children.is_empty(), "best_child on a leaf node");
        assert!(parent.visits > 0, "best_child on an unvisited node");

        let mut best = parent.children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &child in &parent.children {
            assert!(
                self.nodes[child].visits > 0,
                "best_child found an unvisited child"
            );
            let score = self.uct(child, parent.visits, c);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        best
    }

    /// Child of `id` with the most visits, earliest attached on ties.
    pub fn most_visited_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for &child in &self.nodes[id].children {
            match best {
                Some(b) if self.nodes[b].visits >= self.nodes[child].visits => {}
                _ => best = Some(child),
            }
        }
        best
    }

    /// Add one visit and `reward` to `leaf` and every ancestor up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            node.visits += 1;
            node.total_reward += reward;
            current = node.parent;
        }
    }
}

// =============================================================================
// Search Phases
// =============================================================================

/// Descend from the root through fully expanded nodes using UCT.
///
/// Each chosen action is replayed on `game`. Stops early if the game
/// becomes terminal. Returns the node reached and the path depth.
pub fn select(tree: &Tree, game: &mut Game, c: f64, rng: &mut Rng) -> (NodeId, usize) {
    let mut node = Tree::ROOT;
    let mut depth = 0;

    while !tree.node(node).children.is_empty() && tree.is_fully_expanded(node, game) {
        node = tree.best_child(node, c);
        depth += 1;
        let Some(action) = tree.node(node).action else {
            break;
        };
        if game.step(action, rng).terminal {
            break;
        }
    }

    (node, depth)
}

/// Try one untried legal action from `node`, attaching a child for it.
///
/// Returns the new child, or `node` itself if the game is terminal or every
/// legal action already has a child.
pub fn expand(tree: &mut Tree, node: NodeId, game: &mut Game, rng: &mut Rng) -> NodeId {
    if game.is_terminal() {
        return node;
    }

    let tried = tree.tried_actions(node);
    let untried: Vec<Action> = game
        .legal_actions()
        .into_iter()
        .filter(|a| !tried.contains(a))
        .collect();
    if untried.is_empty() {
        return node;
    }

    let action = untried[rng.usize(..untried.len())];
    game.step(action, rng);
    tree.add_child(node, action, game.state())
}

/// Play greedy heuristic moves on `game` until no legal move remains.
///
/// Each legal action is tried on a throwaway copy (spawn included) and
/// scored with [`evaluate`]; the best one is then played for real, the first
/// in enumeration order on ties. Returns the final score.
pub fn rollout(game: &mut Game, rng: &mut Rng) -> f64 {
    while !game.is_terminal() {
        let Some(action) = greedy_action(game, rng) else {
            break;
        };
        if game.step(action, rng).terminal {
            break;
        }
    }
    game.score() as f64
}

/// Best legal action by one-step heuristic lookahead, or `None` if none is legal.
fn greedy_action(game: &Game, rng: &mut Rng) -> Option<Action> {
    let mut best: Option<(Action, f64)> = None;
    for action in game.legal_actions() {
        let mut probe = game.clone();
        let outcome = probe.step(action, rng);
        let value = evaluate(&outcome.board, outcome.score);
        match best {
            Some((_, v)) if v >= value => {}
            _ => best = Some((action, value)),
        }
    }
    best.map(|(action, _)| action)
}

/// Run one select-expand-rollout-backpropagate iteration on a clone of `game`.
fn iterate(tree: &mut Tree, game: &Game, c: f64, rng: &mut Rng) {
    let mut sim = game.clone();

    let (selected, depth) = select(tree, &mut sim, c, rng);
    let leaf = expand(tree, selected, &mut sim, rng);
    let reward = rollout(&mut sim, rng);
    tree.backpropagate(leaf, reward);

    trace!(
        "iteration: depth={depth} expanded={} reward={reward}",
        leaf != selected
    );
}

/// Run `config.simulations` iterations from `game` on a fresh tree.
///
/// The game itself is never modified; each iteration works on its own clone.
pub fn tree_search(game: &Game, config: &SearchConfig, rng: &mut Rng) -> Tree {
    let mut tree = Tree::new(game.state());
    for _ in 0..config.simulations {
        iterate(&mut tree, game, config.exploration, rng);
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;

    fn game(rows: [[u32; 4]; 4], score: u64) -> Game {
        Game::from_state(Board::from_rows(rows).unwrap(), score)
    }

    fn opening() -> Game {
        game([[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]], 0)
    }

    #[test]
    fn test_backpropagate_reaches_root() {
        let mut tree = Tree::new(GameState::default());
        let a = tree.add_child(Tree::ROOT, Action::Left, GameState::default());
        let b = tree.add_child(a, Action::Up, GameState::default());
        tree.backpropagate(b, 10.0);
        tree.backpropagate(a, 4.0);

        assert_eq!(tree.root().visits, 2);
        assert_eq!(tree.root().total_reward, 14.0);
        assert_eq!(tree.node(a).visits, 2);
        assert_eq!(tree.node(b).visits, 1);
        assert_eq!(tree.node(b).mean_reward(), 10.0);
        assert_eq!(tree.node(b).parent, Some(a));
    }

    #[test]
    fn test_best_child_prefers_value_and_breaks_ties_first() {
        let mut tree = Tree::new(GameState::default());
        let a = tree.add_child(Tree::ROOT, Action::Up, GameState::default());
        let b = tree.add_child(Tree::ROOT, Action::Down, GameState::default());
        tree.backpropagate(a, 5.0);
        tree.backpropagate(b, 5.0);
        assert_eq!(tree.best_child(Tree::ROOT, UCT_C), a);

        tree.backpropagate(b, 50.0);
        assert_eq!(tree.best_child(Tree::ROOT, UCT_C), b);
    }

    #[test]
    #[should_panic(expected = "unvisited child")]
    fn test_best_child_asserts_visited_children() {
        let mut tree = Tree::new(GameState::default());
        let a = tree.add_child(Tree::ROOT, Action::Up, GameState::default());
        tree.add_child(Tree::ROOT, Action::Down, GameState::default());
        tree.backpropagate(a, 1.0);
        tree.best_child(Tree::ROOT, UCT_C);
    }

    #[test]
    fn test_most_visited_child_ties() {
        let mut tree = Tree::new(GameState::default());
        assert_eq!(tree.most_visited_child(Tree::ROOT), None);
        let a = tree.add_child(Tree::ROOT, Action::Up, GameState::default());
        let b = tree.add_child(Tree::ROOT, Action::Left, GameState::default());
        tree.backpropagate(a, 0.0);
        tree.backpropagate(b, 0.0);
        assert_eq!(tree.most_visited_child(Tree::ROOT), Some(a));
        tree.backpropagate(b, 0.0);
        assert_eq!(tree.most_visited_child(Tree::ROOT), Some(b));
    }

    #[test]
    fn test_expand_adds_untried_legal_action() {
        let mut rng = Rng::with_seed(3);
        let start = opening();
        let mut tree = Tree::new(start.state());
        let legal = start.legal_actions();

        let mut seen = Vec::new();
        for _ in 0..legal.len() {
            let mut sim = start.clone();
            let child = expand(&mut tree, Tree::ROOT, &mut sim, &mut rng);
            assert_ne!(child, Tree::ROOT);
            let action = tree.node(child).action.unwrap();
            assert!(legal.contains(&action));
            assert!(!seen.contains(&action));
            assert_eq!(tree.node(child).state, sim.state());
            seen.push(action);
        }

        assert!(tree.is_fully_expanded(Tree::ROOT, &start));
        let mut sim = start.clone();
        assert_eq!(expand(&mut tree, Tree::ROOT, &mut sim, &mut rng), Tree::ROOT);
        assert_eq!(sim, start);
    }

    #[test]
    fn test_rollout_ends_terminal() {
        let mut rng = Rng::with_seed(11);
        let mut sim = opening();
        let reward = rollout(&mut sim, &mut rng);
        assert!(sim.is_terminal());
        assert_eq!(reward, sim.score() as f64);
    }

    #[test]
    fn test_rollout_on_terminal_returns_score() {
        let mut rng = Rng::with_seed(5);
        let mut sim = game([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], 36);
        assert_eq!(rollout(&mut sim, &mut rng), 36.0);
    }

    #[test]
    fn test_tree_search_visit_conservation() {
        let mut rng = Rng::with_seed(9);
        let start = opening();
        for sims in [1, 2, 10, 25] {
            let config = SearchConfig::default().with_simulations(sims);
            let tree = tree_search(&start, &config, &mut rng);
            assert_eq!(tree.root().visits as usize, sims);
            let child_visits: u32 = tree
                .root()
                .children
                .iter()
                .map(|&c| tree.node(c).visits)
                .sum();
            assert_eq!(child_visits as usize, sims);
        }
    }

    #[test]
    fn test_tree_search_leaves_game_untouched() {
        let mut rng = Rng::with_seed(2);
        let start = opening();
        let copy = start.clone();
        tree_search(&start, &SearchConfig::default(), &mut rng);
        assert_eq!(start, copy);
    }

    #[test]
    fn test_tree_search_reproducible() {
        let start = opening();
        let config = SearchConfig::default().with_simulations(15);
        let a = tree_search(&start, &config, &mut Rng::with_seed(77));
        let b = tree_search(&start, &config, &mut Rng::with_seed(77));
        assert_eq!(a.len(), b.len());
        for id in 0..a.len() {
            assert_eq!(a.node(id).visits, b.node(id).visits);
            assert_eq!(a.node(id).action, b.node(id).action);
            assert_eq!(a.node(id).total_reward, b.node(id).total_reward);
        }
    }

    #[test]
    fn test_config_builder() {
        let config = SearchConfig::new().with_simulations(50).with_exploration(2.0);
        assert_eq!(config.simulations, 50);
        assert_eq!(config.exploration, 2.0);
        assert_eq!(SearchConfig::default().simulations, 10);
        assert_eq!(SearchConfig::default().exploration, 1.4);
    }
}
