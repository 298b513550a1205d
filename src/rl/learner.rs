//! Q-learning updates for tabular action values
//!
//! Three update flavours share one set of hyperparameters:
//!
//! ```text
//! target = r + γ · max_a' Q(s', a') · (1 - done)
//! δ      = target - Q(s, a)
//! ```
//!
//! - one-step: `Q(s, a) += α · δ`
//! - TD(λ): visit `e(s, a)`, then `Q += α · δ · e` for every traced pair and `e *= γλ`
//! - batch: targets for the whole minibatch use the table as it was before the batch

use super::buffer::Transition;
use super::value::{EligibilityTrace, TraceKind, ValueTable};
use crate::error::Result;
use tracing::debug;

/// Q-learning hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearning {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Trace decay λ
    pub lambda: f64,
    pub trace_kind: TraceKind,
}

impl QLearning {
    pub fn new(alpha: f64, gamma: f64, lambda: f64, trace_kind: TraceKind) -> Self {
        Self {
            alpha,
            gamma,
            lambda,
            trace_kind,
        }
    }

    /// TD error of `transition` under the current table
    ///
    /// Validates every index the update will touch.
    pub fn td_error(&self, transition: &Transition, table: &ValueTable) -> Result<f64> {
        let current = table.get(transition.state, transition.action)?;
        let next_max = table.max_value(transition.next_state)?;
        let bootstrap = if transition.done { 0.0 } else { next_max };
        let target = transition.reward + self.gamma * bootstrap;
        Ok(target - current)
    }

    /// One-step Q-learning update, returns δ
    pub fn update_step(&self, transition: &Transition, table: &mut ValueTable) -> Result<f64> {
        let delta = self.td_error(transition, table)?;
        table.add(transition.state, transition.action, self.alpha * delta)?;
        Ok(delta)
    }

    /// Q(λ) update with an eligibility trace, returns δ
    pub fn update(
        &self,
        transition: &Transition,
        table: &mut ValueTable,
        trace: &mut EligibilityTrace,
    ) -> Result<f64> {
        let delta = self.td_error(transition, table)?;
        trace.visit(transition.state, transition.action, self.trace_kind)?;

        let step = self.alpha * delta;
        if step != 0.0 {
            // Entries come from a trace of the same shape, so indices are in range
            let updates: Vec<(usize, usize, f64)> = trace.nonzero().collect();
            for (s, a, e) in updates {
                table.add(s, a, step * e)?;
            }
        }
        trace.decay(self.gamma * self.lambda);

        Ok(delta)
    }

    /// Replay update over a minibatch, returns the mean absolute δ
    ///
    /// All targets are computed before any entry changes, so the result does
    /// not depend on the order of the batch except where it repeats a pair.
    pub fn update_batch(&self, batch: &[Transition], table: &mut ValueTable) -> Result<f64> {
        if batch.is_empty() {
            return Ok(0.0);
        }

        let deltas = batch
            .iter()
            .map(|t| self.td_error(t, table))
            .collect::<Result<Vec<f64>>>()?;

        for (t, delta) in batch.iter().zip(&deltas) {
            table.add(t.state, t.action, self.alpha * delta)?;
        }

        let mean_abs = deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64;
        debug!(batch_size = batch.len(), mean_abs_td = mean_abs, "replay update");
        Ok(mean_abs)
    }
}
