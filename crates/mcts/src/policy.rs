//! Policy extraction: converting root visit counts into a move
//! distribution.

/// Computes `pi(a) ∝ N(a)^(1/temperature)` over a dense visit vector.
///
/// At temperature 0 (or below) this collapses to a one-hot on the
/// max-visit action, ties broken by the lowest action index. Actions with
/// zero visits always receive probability exactly 0. Returns an all-zero
/// vector if no action was visited.
pub fn visit_policy(visits: &[u32], temperature: f32) -> Vec<f32> {
    let mut policy = vec![0.0f32; visits.len()];
    if visits.iter().all(|&n| n == 0) {
        return policy;
    }

    if temperature <= 0.0 {
        let mut best = 0;
        for (i, &n) in visits.iter().enumerate() {
            if n > visits[best] {
                best = i;
            }
        }
        policy[best] = 1.0;
        return policy;
    }

    // Exponentiate relative to the max visit count: (N/N_max)^(1/tau) is
    // in [0, 1], so small temperatures sharpen without overflowing the way
    // raw N^(1/tau) does.
    let inv_temp = 1.0 / temperature as f64;
    let n_max = visits.iter().fold(0u32, |m, &n| m.max(n)) as f64;
    let weights: Vec<f64> = visits
        .iter()
        .map(|&n| (n as f64 / n_max).powf(inv_temp))
        .collect();
    let total: f64 = weights.iter().sum();

    for (p, w) in policy.iter_mut().zip(&weights) {
        *p = (w / total) as f32;
    }
    policy
}
