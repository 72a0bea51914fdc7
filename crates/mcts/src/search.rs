//! Direct-state Monte Carlo Tree Search with PUCT selection.
//!
//! Each search call builds a fresh tree from the given root state and runs
//! a fixed budget of simulations, each fully sequential:
//! select → expand → backup. Values alternate sign between plies since the
//! two players take turns; each node stores values from the perspective of
//! the player to move there.

use std::hash::Hash;
use std::marker::PhantomData;

use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use zerosearch_core::{Game, Policy, Result, SearchError, Value};

use crate::{
    config::MctsConfig,
    evaluator::Evaluator,
    node::{Node, NodeId},
    policy::visit_policy,
    tree::Tree,
};

/// Counters describing what a single search call did. The
/// `uniform_fallbacks` counter makes the zero-mass-policy recovery path
/// observable, as that condition usually indicates a predictor problem.
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    /// Predictor invocations; terminal leaves do not evaluate.
    pub evaluator_calls: u32,

    /// Expansions where the masked policy had zero mass and fell back to a
    /// uniform distribution over legal actions.
    pub uniform_fallbacks: u32,

    /// Nodes in the tree when the search finished.
    pub tree_nodes: usize,

    /// Deepest simulation path, in plies from the root.
    pub max_depth: usize,
}

/// Result of one search call.
#[derive(Clone, Debug)]
pub struct SearchResult<A: Clone + Copy + Eq + Hash> {
    /// Visit count per root child, in ascending action-index order.
    pub visit_counts: Vec<(A, u32)>,

    /// Dense visit counts over the full action space.
    pub visits: Vec<u32>,

    /// Action with the highest visit count; ties go to the lowest index.
    pub best_action: A,

    /// Visit-count-proportional policy (temperature 1), length equals the
    /// action-space size, zero at illegal actions.
    pub policy: Vec<f32>,

    /// Root value estimate from the perspective of the player to move.
    pub root_value: f32,

    pub stats: SearchStats,
}

impl<A: Clone + Copy + Eq + Hash> SearchResult<A> {
    /// Temperature-scaled policy extraction: `pi(a) ∝ N(a)^(1/τ)`.
    /// τ = 0 collapses to a one-hot on `best_action`.
    pub fn policy_with_temperature(&self, temperature: f32) -> Vec<f32> {
        visit_policy(&self.visits, temperature)
    }

    /// Samples an action from the temperature-scaled visit distribution.
    /// Greedy at temperature 0.
    pub fn select_action<R: Rng>(&self, temperature: f32, rng: &mut R) -> A {
        if temperature <= 0.0 || self.visit_counts.len() <= 1 {
            return self.best_action;
        }

        let inv_temp = 1.0 / temperature as f64;
        let n_max = self
            .visit_counts
            .iter()
            .fold(0u32, |m, &(_, n)| m.max(n)) as f64;
        if n_max <= 0.0 {
            return self.best_action;
        }
        let weights: Vec<f64> = self
            .visit_counts
            .iter()
            .map(|&(_, n)| (n as f64 / n_max).powf(inv_temp))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return self.best_action;
        }

        let threshold = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if cumulative >= threshold {
                return self.visit_counts[i].0;
            }
        }
        self.best_action
    }

    /// The policy as a validated [`Policy`].
    pub fn typed_policy(&self) -> Result<Policy> {
        Policy::new(self.policy.clone())
    }

    /// The root value as a clamped [`Value`].
    pub fn typed_value(&self) -> Value {
        Value::clamped(self.root_value)
    }
}

/// Mixes Dirichlet noise into the root priors, once, directly after root
/// expansion. Shared by the direct and latent variants.
pub(crate) fn mix_root_noise<A, R>(tree: &mut Tree<A>, rng: &mut R, alpha: f32, fraction: f32)
where
    A: Clone + Copy + Eq + Hash,
    R: Rng,
{
    let num_children = tree.root().children.len();
    // Dirichlet needs at least two components.
    if num_children < 2 {
        return;
    }

    let alphas = vec![alpha; num_children];
    let dirichlet =
        Dirichlet::new(&alphas).expect("alpha and dimension are checked before sampling");
    let noise: Vec<f32> = dirichlet.sample(rng);

    let child_ids: Vec<NodeId> = tree.root().children.iter().map(|&(_, id)| id).collect();
    for (id, eta) in child_ids.into_iter().zip(noise) {
        let prior = &mut tree.get_mut(id).stats.prior;
        *prior = (1.0 - fraction) * *prior + fraction * eta;
    }
}

/// PUCT exploration coefficient:
/// `c(s) = ln((N(s) + c_base + 1) / c_base) + c_init`.
pub(crate) fn exploration_coefficient(parent_visits: f32, c_base: f32, c_init: f32) -> f32 {
    ((parent_visits + c_base + 1.0) / c_base).ln() + c_init
}

/// Direct-state MCTS engine.
///
/// Generic over the game oracle `G`, the evaluation strategy `E`, and the
/// random number generator `R`. The engine exclusively owns its tree; one
/// simulation always completes before the next begins.
pub struct Mcts<G: Game, E: Evaluator<G>, R: Rng> {
    config: MctsConfig,
    evaluator: E,
    rng: R,
    tree: Tree<G::Action>,
    stats: SearchStats,
    _game: PhantomData<G>,
}

impl<G, E, R> Mcts<G, E, R>
where
    G: Game,
    E: Evaluator<G>,
    R: Rng,
{
    pub fn new(config: MctsConfig, evaluator: E, rng: R) -> Self {
        Self {
            config,
            evaluator,
            rng,
            tree: Tree::new(),
            stats: SearchStats::default(),
            _game: PhantomData,
        }
    }

    /// Runs the configured simulation budget from `state` and returns the
    /// visit-count-derived policy.
    ///
    /// # Errors
    /// - [`SearchError::InvalidBudget`] for a zero budget, before any
    ///   simulation runs.
    /// - [`SearchError::TerminalRoot`] when the game is already over.
    /// - [`SearchError::NoLegalMoves`] / [`SearchError::BadEvaluation`] on
    ///   collaborator contract violations.
    pub fn search(&mut self, game: &G, state: &G::State) -> Result<SearchResult<G::Action>> {
        self.config.validate()?;
        if game.is_terminal(state) {
            return Err(SearchError::TerminalRoot);
        }

        self.tree.clear();
        self.stats = SearchStats::default();

        self.expand_node(game, state, NodeId::ROOT)?;
        if self.config.root_noise_enabled() {
            mix_root_noise(
                &mut self.tree,
                &mut self.rng,
                self.config.dirichlet_alpha,
                self.config.root_noise_fraction,
            );
        }

        for _ in 0..self.config.num_simulations {
            self.simulate(game, state.clone())?;
        }

        self.stats.tree_nodes = self.tree.len();
        Ok(self.extract_result(game))
    }

    /// The tree built by the last search, for inspection and diagnostics.
    pub fn tree(&self) -> &Tree<G::Action> {
        &self.tree
    }

    /// One simulation: select a leaf, expand it (or read its terminal
    /// outcome), back the value up the visited path.
    fn simulate(&mut self, game: &G, root_state: G::State) -> Result<()> {
        let mut path = vec![NodeId::ROOT];
        let mut state = root_state;
        let mut current = NodeId::ROOT;

        loop {
            let node = self.tree.get(current);

            if node.terminal {
                // Ground-truth outcome, recorded at first visit.
                let value = node.terminal_value.unwrap_or(0.0);
                self.backup(&path, value);
                return Ok(());
            }
            if !node.expanded {
                break;
            }

            let action = self.select_child(current);
            let transition = game.apply(&state, action);
            state = transition.state;

            let child_id = self
                .tree
                .get(current)
                .child(action)
                .expect("selection only returns actions with child nodes");
            self.tree.get_mut(child_id).reward = transition.reward;
            path.push(child_id);
            current = child_id;
        }

        if game.is_terminal(&state) {
            // outcome() is from the player who just moved; this node's
            // perspective is the player to move, so negate.
            let value = -game.outcome(&state).unwrap_or(0.0);
            let node = self.tree.get_mut(current);
            node.terminal = true;
            node.terminal_value = Some(value);
            node.state_key = Some(game.state_key(&state));
            self.backup(&path, value);
            return Ok(());
        }

        let value = self.expand_node(game, &state, current)?;
        self.backup(&path, value);
        Ok(())
    }

    /// Expands a leaf: one predictor call, one child per legal action in
    /// ascending index order, priors masked and renormalized. Returns the
    /// predictor's value estimate for the ensuing backup.
    fn expand_node(&mut self, game: &G, state: &G::State, node_id: NodeId) -> Result<f32> {
        let mask = game.legal_mask(state);
        if !mask.iter().any(|&m| m) {
            return Err(SearchError::NoLegalMoves);
        }

        let evaluation = self.evaluator.evaluate(game, &game.canonical(state))?;
        self.stats.evaluator_calls += 1;
        evaluation.validate(game.num_actions())?;

        let (priors, fell_back) = Policy::masked(&evaluation.policy, &mask)?;
        if fell_back {
            self.stats.uniform_fallbacks += 1;
        }

        let parent_player = self.tree.get(node_id).player;
        for (index, &legal) in mask.iter().enumerate() {
            if !legal {
                continue;
            }
            let action = game.index_to_action(index).ok_or_else(|| {
                SearchError::Oracle(format!("legal mask set at unmapped action index {index}"))
            })?;
            let child = Node::new(Some(action), priors[index], -parent_player);
            let child_id = self.tree.add(child);
            self.tree.get_mut(node_id).children.push((action, child_id));
        }

        let node = self.tree.get_mut(node_id);
        node.expanded = true;
        node.state_key = Some(game.state_key(state));
        Ok(evaluation.value)
    }

    /// Picks the child maximizing
    /// `Q(s,a) + c(s) · P(s,a) · √N(s) / (1 + N(s,a))`.
    ///
    /// The strict `>` together with ascending-index child order breaks ties
    /// toward the lowest action index. `N(s)` counts the node's own
    /// initializing visit, which the root never receives, hence `max(1)`.
    fn select_child(&self, node_id: NodeId) -> G::Action {
        let node = self.tree.get(node_id);
        let parent_visits = node.stats.visit_count.max(1) as f32;
        let c = exploration_coefficient(parent_visits, self.config.c_base, self.config.c_init);

        let mut best_action = None;
        let mut best_score = f32::NEG_INFINITY;

        for &(action, child_id) in &node.children {
            let child = self.tree.get(child_id);

            // The child stores values from its own (opponent) perspective.
            let q = -child.stats.mean_value();
            let n = child.stats.visit_count as f32;
            let score = q + c * child.stats.prior * parent_visits.sqrt() / (1.0 + n);

            if score > best_score {
                best_score = score;
                best_action = Some(action);
            }
        }

        best_action.expect("select_child is only called on expanded nodes")
    }

    /// Adds the leaf value to every node on the path, negating per ply.
    fn backup(&mut self, path: &[NodeId], leaf_value: f32) {
        self.stats.max_depth = self.stats.max_depth.max(path.len() - 1);

        let mut value = leaf_value;
        for &id in path.iter().rev() {
            let node = self.tree.get_mut(id);
            node.stats.visit_count += 1;
            node.stats.value_sum += value;
            value = -value;
        }
    }

    fn extract_result(&self, game: &G) -> SearchResult<G::Action> {
        let root = self.tree.root();

        let visit_counts: Vec<(G::Action, u32)> = root
            .children
            .iter()
            .map(|&(a, id)| (a, self.tree.get(id).stats.visit_count))
            .collect();

        let mut visits = vec![0u32; game.num_actions()];
        for &(action, count) in &visit_counts {
            visits[game.action_to_index(action)] = count;
        }

        // Children are in ascending index order; strict > keeps the lowest
        // index on ties.
        let mut best = visit_counts[0];
        for &(action, count) in &visit_counts[1..] {
            if count > best.1 {
                best = (action, count);
            }
        }

        let total: u32 = visit_counts.iter().map(|&(_, n)| n).sum();
        let root_value = if total > 0 {
            let weighted: f32 = root
                .children
                .iter()
                .map(|&(_, id)| {
                    let child = self.tree.get(id);
                    -child.stats.mean_value() * child.stats.visit_count as f32
                })
                .sum();
            weighted / total as f32
        } else {
            0.0
        };

        SearchResult {
            policy: visit_policy(&visits, 1.0),
            visit_counts,
            visits,
            best_action: best.0,
            root_value,
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::RolloutEvaluator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use zerosearch_core::Transition;

    // Race to five: players alternately add 1 or 2; whoever reaches
    // exactly 5 wins. The first player wins with optimal play.
    #[derive(Clone)]
    struct RaceToFive;

    #[derive(Clone, PartialEq, Eq, Debug, Hash)]
    struct RaceState {
        count: u8,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    struct RaceAction(u8);

    impl Game for RaceToFive {
        type State = RaceState;
        type Action = RaceAction;
        type Observation = ();

        fn initial_state(&self) -> RaceState {
            RaceState { count: 0 }
        }

        fn legal_actions(&self, state: &RaceState) -> Vec<RaceAction> {
            let mut actions = Vec::new();
            if state.count < 5 {
                actions.push(RaceAction(1));
                if state.count + 2 <= 5 {
                    actions.push(RaceAction(2));
                }
            }
            actions
        }

        fn apply(&self, state: &RaceState, action: RaceAction) -> Transition<RaceState> {
            Transition::new(RaceState {
                count: state.count + action.0,
            })
        }

        fn is_terminal(&self, state: &RaceState) -> bool {
            state.count >= 5
        }

        fn outcome(&self, state: &RaceState) -> Option<f32> {
            // The player who just moved reached 5 and won.
            (state.count >= 5).then_some(1.0)
        }

        fn canonical(&self, state: &RaceState) -> RaceState {
            state.clone()
        }

        fn observe(&self, _state: &RaceState) {}

        fn state_key(&self, state: &RaceState) -> u64 {
            let mut hasher = DefaultHasher::new();
            state.hash(&mut hasher);
            hasher.finish()
        }

        fn action_to_index(&self, action: RaceAction) -> usize {
            (action.0 - 1) as usize
        }

        fn index_to_action(&self, index: usize) -> Option<RaceAction> {
            match index {
                0 => Some(RaceAction(1)),
                1 => Some(RaceAction(2)),
                _ => None,
            }
        }

        fn num_actions(&self) -> usize {
            2
        }
    }

    fn build_mcts(
        seed: u64,
        simulations: usize,
    ) -> Mcts<RaceToFive, RolloutEvaluator<ChaCha8Rng>, ChaCha8Rng> {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let evaluator = RolloutEvaluator::new(rng.clone(), 20);
        Mcts::new(MctsConfig::with_simulations(simulations), evaluator, rng)
    }

    #[test]
    fn search_returns_valid_policy() {
        let game = RaceToFive;
        let mut mcts = build_mcts(42, 100);

        let result = mcts.search(&game, &game.initial_state()).unwrap();

        let sum: f32 = result.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(result.visits.iter().sum::<u32>(), 100);
        assert_eq!(result.stats.tree_nodes, mcts.tree().len());
    }

    #[test]
    fn root_visits_equal_budget() {
        let game = RaceToFive;
        let mut mcts = build_mcts(7, 64);

        mcts.search(&game, &game.initial_state()).unwrap();
        assert_eq!(mcts.tree().root().stats.visit_count, 64);
    }

    #[test]
    fn same_seed_same_result() {
        let game = RaceToFive;
        let run = |seed: u64| {
            let mut mcts = build_mcts(seed, 50);
            mcts.search(&game, &game.initial_state()).unwrap()
        };

        let a = run(12345);
        let b = run(12345);
        assert_eq!(a.best_action, b.best_action);
        assert_eq!(a.visit_counts, b.visit_counts);
        assert_eq!(a.policy, b.policy);
    }

    #[test]
    fn terminal_root_is_rejected() {
        let game = RaceToFive;
        let mut mcts = build_mcts(1, 10);

        let result = mcts.search(&game, &RaceState { count: 5 });
        assert!(matches!(result, Err(SearchError::TerminalRoot)));
    }

    #[test]
    fn zero_budget_is_rejected() {
        let game = RaceToFive;
        let mut mcts = build_mcts(1, 0);

        let result = mcts.search(&game, &game.initial_state());
        assert!(matches!(result, Err(SearchError::InvalidBudget(0))));
    }

    #[test]
    fn sampling_at_tiny_temperature_is_greedy() {
        let result = SearchResult {
            visit_counts: vec![(RaceAction(1), 800), (RaceAction(2), 1)],
            visits: vec![800, 1],
            best_action: RaceAction(1),
            policy: vec![800.0 / 801.0, 1.0 / 801.0],
            root_value: 0.0,
            stats: SearchStats::default(),
        };

        // (1/800)^(1/0.005) underflows to zero weight, so every sample
        // must land on the dominant action, never a NaN fallthrough.
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            assert_eq!(result.select_action(0.005, &mut rng), RaceAction(1));
        }
    }

    #[test]
    fn state_keys_recorded_at_expansion() {
        let game = RaceToFive;
        let mut mcts = build_mcts(3, 30);
        let root_state = game.initial_state();

        mcts.search(&game, &root_state).unwrap();
        assert_eq!(
            mcts.tree().root().state_key,
            Some(game.state_key(&root_state))
        );
    }
}
