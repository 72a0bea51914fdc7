use std::hash::Hash;

/// Result of applying an action: the successor state plus the immediate
/// transition reward. Board games report a reward of 0; the reward only
/// carries information for single-player/reward-bearing environments.
/// The player to move next is implicit in the successor state.
#[derive(Clone, Debug)]
pub struct Transition<S> {
    pub state: S,
    pub reward: f32,
}

impl<S> Transition<S> {
    /// Transition with no immediate reward (the common board-game case).
    pub fn new(state: S) -> Self {
        Self { state, reward: 0.0 }
    }

    pub fn with_reward(state: S, reward: f32) -> Self {
        Self { state, reward }
    }
}

/// The game oracle consumed by the direct-state search variant.
///
/// Supports single-player and two-player turn-based games. States are
/// opaque to the engine beyond the operations below; the engine never
/// assumes anything about their representation.
pub trait Game: Clone + Send + Sync {
    /// The environment state (e.g. a board position).
    type State: Clone + Send;

    /// An action (e.g. a move). Must map to a dense index space.
    type Action: Clone + Copy + Send + Eq + Hash;

    /// The observation format handed to a learned predictor.
    type Observation;

    /// The initial state of the game.
    fn initial_state(&self) -> Self::State;

    /// All legal actions from the given state, in ascending index order.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Dense legality mask over the full action space.
    fn legal_mask(&self, state: &Self::State) -> Vec<bool> {
        let mut mask = vec![false; self.num_actions()];
        for action in self.legal_actions(state) {
            mask[self.action_to_index(action)] = true;
        }
        mask
    }

    /// Applies an action, returning the successor state and immediate reward.
    /// Deterministic; the original state is not modified.
    fn apply(&self, state: &Self::State, action: Self::Action) -> Transition<Self::State>;

    /// Whether the game has ended in this state.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// The game outcome from the perspective of the player who just moved:
    /// `Some(1.0)` won, `Some(-1.0)` lost, `Some(0.0)` (or a small score)
    /// for a draw, `None` while the game is ongoing.
    fn outcome(&self, state: &Self::State) -> Option<f32>;

    /// Perspective-normalized form of the state, so a predictor need not
    /// know whose turn it is.
    fn canonical(&self, state: &Self::State) -> Self::State;

    /// Converts a state into the predictor's observation format.
    fn observe(&self, state: &Self::State) -> Self::Observation;

    /// A hashable identifier of the state, usable for transposition
    /// bookkeeping and debugging.
    fn state_key(&self, state: &Self::State) -> u64;

    /// Maps an action to its flat policy-vector index.
    fn action_to_index(&self, action: Self::Action) -> usize;

    /// Maps a flat index back to an action, `None` if the index is invalid.
    fn index_to_action(&self, index: usize) -> Option<Self::Action>;

    /// Size of the action space (length of every policy vector).
    fn num_actions(&self) -> usize;
}
