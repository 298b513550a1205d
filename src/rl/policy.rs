//! Action-selection policies over tabular action values
//!
//! A `Policy` turns the action values of one state into either a probability
//! distribution over actions or a sampled action. Policies are plain enum
//! variants so they can be built directly from JSON configuration:
//!
//! ```rust
//! use reinforcelearn::rl::Policy;
//!
//! let policy: Policy = serde_json::from_str(r#"{"type": "softmax", "temperature": 0.5}"#).unwrap();
//! assert_eq!(policy, Policy::Softmax { temperature: 0.5 });
//! ```

use super::value::argmax;
use crate::error::{Result, RlError};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

/// Action-selection rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Policy {
    /// Uniform over all actions, ignoring values
    Random,

    /// Always the highest-valued action (first index on ties)
    Greedy,

    /// Uniform with probability `epsilon`, greedy otherwise
    EpsilonGreedy { epsilon: f64 },

    /// Boltzmann distribution `exp(q / temperature)`
    Softmax { temperature: f64 },
}

impl Default for Policy {
    fn default() -> Self {
        Policy::EpsilonGreedy { epsilon: 0.1 }
    }
}

impl Policy {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        match *self {
            Policy::Random | Policy::Greedy => Ok(()),
            Policy::EpsilonGreedy { epsilon } => {
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(RlError::invalid(format!(
                        "epsilon must be in [0, 1], got {}",
                        epsilon
                    )));
                }
                Ok(())
            }
            Policy::Softmax { temperature } => {
                if !(temperature.is_finite() && temperature > 0.0) {
                    return Err(RlError::invalid(format!(
                        "temperature must be positive and finite, got {}",
                        temperature
                    )));
                }
                Ok(())
            }
        }
    }

    /// Probability of each action given the action values of one state
    pub fn probabilities(&self, values: &[f64]) -> Result<Vec<f64>> {
        let n = values.len();
        let best = argmax(values).ok_or_else(|| RlError::invalid("no actions to choose from"))?;

        let probs = match *self {
            Policy::Random => vec![1.0 / n as f64; n],
            Policy::Greedy => one_hot(n, best),
            Policy::EpsilonGreedy { epsilon } => {
                let mut probs = vec![epsilon / n as f64; n];
                probs[best] += 1.0 - epsilon;
                probs
            }
            Policy::Softmax { temperature } => softmax(values, temperature),
        };

        Ok(probs)
    }

    /// Choose an action for the given action values
    ///
    /// Greedy selection (including epsilon-greedy with `epsilon = 0`) is
    /// deterministic and returns the first maximal index.
    pub fn select_action<R: Rng + ?Sized>(&self, values: &[f64], rng: &mut R) -> Result<usize> {
        let n = values.len();
        let best = argmax(values).ok_or_else(|| RlError::invalid("no actions to choose from"))?;

        match *self {
            Policy::Random => Ok(rng.gen_range(0..n)),
            Policy::Greedy => Ok(best),
            Policy::EpsilonGreedy { epsilon } => {
                if epsilon > 0.0 && rng.gen_bool(epsilon.min(1.0)) {
                    Ok(rng.gen_range(0..n))
                } else {
                    Ok(best)
                }
            }
            Policy::Softmax { temperature } => {
                let probs = softmax(values, temperature);
                let dist = WeightedIndex::new(&probs)
                    .map_err(|e| RlError::invalid(format!("softmax weights: {}", e)))?;
                Ok(dist.sample(rng))
            }
        }
    }
}

fn one_hot(n: usize, idx: usize) -> Vec<f64> {
    let mut probs = vec![0.0; n];
    probs[idx] = 1.0;
    probs
}

/// Numerically stable softmax: shift by the max before exponentiating
fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_sums_to_one(probs: &[f64]) {
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {}", sum);
    }

    #[test]
    fn test_random_probabilities_uniform() {
        let probs = Policy::Random.probabilities(&[5.0, -1.0, 0.0, 2.0]).unwrap();
        assert!(probs.iter().all(|&p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_greedy_probabilities() {
        let probs = Policy::Greedy.probabilities(&[1.0, 3.0, 3.0]).unwrap();
        assert_eq!(probs, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_epsilon_greedy_probabilities() {
        let policy = Policy::EpsilonGreedy { epsilon: 0.2 };
        let probs = policy.probabilities(&[0.0, 1.0]).unwrap();
        assert!((probs[0] - 0.1).abs() < 1e-12);
        assert!((probs[1] - 0.9).abs() < 1e-12);
        assert_sums_to_one(&probs);
    }

    #[test]
    fn test_softmax_probabilities() {
        let policy = Policy::Softmax { temperature: 1.0 };
        let probs = policy.probabilities(&[0.0, 1.0_f64.ln()]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);

        let probs = policy.probabilities(&[1000.0, 0.0, -1000.0]).unwrap();
        assert_sums_to_one(&probs);
        assert!(probs[0] > 0.999);
    }

    #[test]
    fn test_softmax_temperature_flattens() {
        let values = [0.0, 1.0, 2.0];
        let sharp = Policy::Softmax { temperature: 0.1 }.probabilities(&values).unwrap();
        let flat = Policy::Softmax { temperature: 100.0 }.probabilities(&values).unwrap();
        assert!(sharp[2] > flat[2]);
        assert!((flat[0] - 1.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_epsilon_zero_always_greedy() {
        let policy = Policy::EpsilonGreedy { epsilon: 0.0 };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            assert_eq!(policy.select_action(&[0.5, 2.0, 2.0, -1.0], &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_epsilon_one_explores_all_actions() {
        let policy = Policy::EpsilonGreedy { epsilon: 1.0 };
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[policy.select_action(&[0.0, 10.0, 0.0], &mut rng).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_select_action_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let values = [0.1, 0.2, 0.3, 0.4, 0.5];
        for policy in [
            Policy::Random,
            Policy::Greedy,
            Policy::EpsilonGreedy { epsilon: 0.5 },
            Policy::Softmax { temperature: 0.7 },
        ] {
            for _ in 0..100 {
                assert!(policy.select_action(&values, &mut rng).unwrap() < values.len());
            }
        }
    }

    #[test]
    fn test_empty_values_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Policy::Random.select_action(&[], &mut rng),
            Err(RlError::InvalidArgument(_))
        ));
        assert!(Policy::Greedy.probabilities(&[]).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(Policy::EpsilonGreedy { epsilon: 1.5 }.validate().is_err());
        assert!(Policy::EpsilonGreedy { epsilon: -0.1 }.validate().is_err());
        assert!(Policy::Softmax { temperature: 0.0 }.validate().is_err());
        assert!(Policy::Softmax { temperature: f64::INFINITY }.validate().is_err());
        assert!(Policy::default().validate().is_ok());
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Policy::EpsilonGreedy { epsilon: 0.25 }).unwrap();
        assert_eq!(json, r#"{"type":"epsilon_greedy","epsilon":0.25}"#);

        let random: Policy = serde_json::from_str(r#"{"type":"random"}"#).unwrap();
        assert_eq!(random, Policy::Random);
    }
}
