//! Latent-state search: unrolling an opaque learned model.
//!
//! The engine never consults game rules after the root. Transitions go
//! through the model's own `recurrent` step, legality is expressed only
//! through priors (plus an optional caller-supplied mask at the root), and
//! every value is from one consistent perspective: the model is required
//! to return canonical values, so backup composes rewards and discounting
//! with no sign flips.

use rand::Rng;
use zerosearch_core::{Policy, Result, SearchError};

use crate::{
    config::MctsConfig,
    node::{Node, NodeId},
    policy::visit_policy,
    search::{exploration_coefficient, mix_root_noise, SearchResult, SearchStats},
    tree::Tree,
};

/// Output of the model's representation + prediction step at the root.
#[derive(Clone, Debug)]
pub struct InitialInference<L> {
    pub latent: L,
    pub policy: Vec<f32>,
    pub value: f32,
}

/// Output of the model's dynamics + prediction step.
#[derive(Clone, Debug)]
pub struct RecurrentInference<L> {
    pub reward: f32,
    pub latent: L,
    pub policy: Vec<f32>,
    pub value: f32,
}

/// The latent predictor: a representation function over observations and a
/// transition function over latent states.
///
/// The latent handle is an opaque token. The engine stores and forwards
/// it, but only the model can construct or consume one.
pub trait LatentModel {
    type Observation;
    type Latent: Clone;

    /// Size of the action space (length of every policy vector).
    fn num_actions(&self) -> usize;

    /// `observation -> (latent, policy, value)`.
    fn initial(&self, observation: &Self::Observation) -> Result<InitialInference<Self::Latent>>;

    /// `(latent, action) -> (reward, next latent, policy, value)`.
    fn recurrent(
        &self,
        latent: &Self::Latent,
        action: usize,
    ) -> Result<RecurrentInference<Self::Latent>>;
}

/// Running min/max of observed Q values, used to normalize Q into [0, 1]
/// for the selection formula. Identity until two distinct values are seen.
#[derive(Clone, Debug)]
pub struct MinMaxStats {
    min: f32,
    max: f32,
}

impl MinMaxStats {
    pub fn new() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn normalize(&self, value: f32) -> f32 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            value
        }
    }
}

impl Default for MinMaxStats {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_inference(policy: &[f32], value: f32, reward: f32, num_actions: usize) -> Result<()> {
    if policy.len() != num_actions {
        return Err(SearchError::BadEvaluation(format!(
            "policy length {} does not match action space {}",
            policy.len(),
            num_actions
        )));
    }
    if policy.iter().any(|&p| p < 0.0 || !p.is_finite()) {
        return Err(SearchError::BadEvaluation(
            "policy contains negative or non-finite entries".into(),
        ));
    }
    if !value.is_finite() || !reward.is_finite() {
        return Err(SearchError::BadEvaluation(format!(
            "non-finite value {value} or reward {reward}"
        )));
    }
    Ok(())
}

/// Latent-state MCTS engine. Actions are dense indices into the model's
/// action space.
pub struct LatentMcts<M: LatentModel, R: Rng> {
    config: MctsConfig,
    model: M,
    rng: R,
    tree: Tree<usize>,
    /// Latent handle per node, parallel to the tree arena. `None` until
    /// the node is expanded.
    latents: Vec<Option<M::Latent>>,
    minmax: MinMaxStats,
    stats: SearchStats,
}

impl<M: LatentModel, R: Rng> LatentMcts<M, R> {
    pub fn new(config: MctsConfig, model: M, rng: R) -> Self {
        Self {
            config,
            model,
            rng,
            tree: Tree::new(),
            latents: vec![None],
            minmax: MinMaxStats::new(),
            stats: SearchStats::default(),
        }
    }

    /// Runs the configured budget from an observation.
    ///
    /// `root_mask`, when given, restricts the root to the oracle's legal
    /// actions; interior nodes are unrolled without rule knowledge.
    pub fn search(
        &mut self,
        observation: &M::Observation,
        root_mask: Option<&[bool]>,
    ) -> Result<SearchResult<usize>> {
        self.config.validate()?;

        self.tree.clear();
        self.latents.clear();
        self.latents.push(None);
        self.minmax = MinMaxStats::new();
        self.stats = SearchStats::default();

        self.expand_root(observation, root_mask)?;
        if self.config.root_noise_enabled() {
            mix_root_noise(
                &mut self.tree,
                &mut self.rng,
                self.config.dirichlet_alpha,
                self.config.root_noise_fraction,
            );
        }

        for _ in 0..self.config.num_simulations {
            self.simulate()?;
        }

        self.stats.tree_nodes = self.tree.len();
        Ok(self.extract_result())
    }

    /// The tree built by the last search, for inspection and diagnostics.
    pub fn tree(&self) -> &Tree<usize> {
        &self.tree
    }

    fn add_node(&mut self, node: Node<usize>) -> NodeId {
        let id = self.tree.add(node);
        self.latents.push(None);
        id
    }

    fn expand_root(
        &mut self,
        observation: &M::Observation,
        root_mask: Option<&[bool]>,
    ) -> Result<()> {
        let num_actions = self.model.num_actions();
        let inference = self.model.initial(observation)?;
        self.stats.evaluator_calls += 1;
        validate_inference(&inference.policy, inference.value, 0.0, num_actions)?;

        let mask: Vec<bool> = match root_mask {
            Some(mask) => {
                if mask.len() != num_actions {
                    return Err(SearchError::Oracle(format!(
                        "root mask length {} does not match action space {}",
                        mask.len(),
                        num_actions
                    )));
                }
                mask.to_vec()
            }
            None => vec![true; num_actions],
        };

        let (priors, fell_back) = Policy::masked(&inference.policy, &mask)?;
        if fell_back {
            self.stats.uniform_fallbacks += 1;
        }

        for (index, &legal) in mask.iter().enumerate() {
            if !legal {
                continue;
            }
            let child_id = self.add_node(Node::new(Some(index), priors[index], 1));
            self.tree.root_mut().children.push((index, child_id));
        }

        self.tree.root_mut().expanded = true;
        self.latents[NodeId::ROOT.index()] = Some(inference.latent);
        Ok(())
    }

    /// One simulation: descend to an unexpanded leaf, expand it through
    /// the model's dynamics step, back the value up.
    fn simulate(&mut self) -> Result<()> {
        let mut path = vec![NodeId::ROOT];
        let mut current = NodeId::ROOT;

        while self.tree.get(current).expanded {
            let (_, child_id) = self.select_child(current);
            path.push(child_id);
            current = child_id;
        }

        // The root is expanded before any simulation, so the leaf always
        // has a parent on the path.
        let action = self
            .tree
            .get(current)
            .action
            .expect("non-root nodes record their incoming action");
        let parent = path[path.len() - 2];
        let parent_latent = self.latents[parent.index()]
            .clone()
            .expect("expanded nodes hold a latent state");

        let inference = self.model.recurrent(&parent_latent, action)?;
        self.stats.evaluator_calls += 1;
        let num_actions = self.model.num_actions();
        validate_inference(
            &inference.policy,
            inference.value,
            inference.reward,
            num_actions,
        )?;

        // Legality is unknown off the root: every action gets a child,
        // with zero-prior children effectively unreachable.
        let all = vec![true; num_actions];
        let (priors, fell_back) = Policy::masked(&inference.policy, &all)?;
        if fell_back {
            self.stats.uniform_fallbacks += 1;
        }

        for index in 0..num_actions {
            let child_id = self.add_node(Node::new(Some(index), priors[index], 1));
            self.tree.get_mut(current).children.push((index, child_id));
        }

        let node = self.tree.get_mut(current);
        node.reward = inference.reward;
        node.expanded = true;
        self.latents[current.index()] = Some(inference.latent);

        self.backup(&path, inference.value);
        Ok(())
    }

    /// PUCT over `Q(s,a) = reward(a) + discount · Q(child)`, min-max
    /// normalized. Unvisited children score with Q = 0; ties break toward
    /// the lowest action index via strict `>`.
    fn select_child(&self, node_id: NodeId) -> (usize, NodeId) {
        let node = self.tree.get(node_id);
        let parent_visits = node.stats.visit_count.max(1) as f32;
        let c = exploration_coefficient(parent_visits, self.config.c_base, self.config.c_init);

        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;

        for &(action, child_id) in &node.children {
            let child = self.tree.get(child_id);
            let n = child.stats.visit_count as f32;
            let q = if child.stats.visit_count > 0 {
                self.minmax
                    .normalize(child.reward + self.config.discount * child.stats.mean_value())
            } else {
                0.0
            };
            let score = q + c * child.stats.prior * parent_visits.sqrt() / (1.0 + n);

            if score > best_score {
                best_score = score;
                best = Some((action, child_id));
            }
        }

        best.expect("select_child is only called on expanded nodes")
    }

    /// Walks leaf → root adding the value to each node, then composing
    /// `value = reward + discount · value` for the next ancestor. No sign
    /// flips: the model's values are canonical by contract.
    fn backup(&mut self, path: &[NodeId], leaf_value: f32) {
        self.stats.max_depth = self.stats.max_depth.max(path.len() - 1);

        let discount = self.config.discount;
        let mut value = leaf_value;
        for &id in path.iter().rev() {
            let node = self.tree.get_mut(id);
            node.stats.visit_count += 1;
            node.stats.value_sum += value;
            let edge_q = node.reward + discount * node.stats.mean_value();
            value = node.reward + discount * value;
            self.minmax.update(edge_q);
        }
    }

    fn extract_result(&self) -> SearchResult<usize> {
        let root = self.tree.root();

        let visit_counts: Vec<(usize, u32)> = root
            .children
            .iter()
            .map(|&(a, id)| (a, self.tree.get(id).stats.visit_count))
            .collect();

        let mut visits = vec![0u32; self.model.num_actions()];
        for &(action, count) in &visit_counts {
            visits[action] = count;
        }

        let mut best = visit_counts[0];
        for &(action, count) in &visit_counts[1..] {
            if count > best.1 {
                best = (action, count);
            }
        }

        SearchResult {
            policy: visit_policy(&visits, 1.0),
            visit_counts,
            visits,
            best_action: best.0,
            root_value: root.stats.mean_value(),
            stats: self.stats.clone(),
        }
    }
}
