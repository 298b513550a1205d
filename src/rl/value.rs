//! Tabular action-value storage and eligibility traces
//!
//! `ValueTable` maps `(state, action)` index pairs to scalar estimates stored
//! densely in row-major order. `EligibilityTrace` reuses the same storage to
//! remember recently visited pairs for TD(λ) updates.

use crate::error::{Result, RlError};
use serde::{Deserialize, Serialize};

/// Entries whose magnitude falls below this after a decay are zeroed
const TRACE_EPSILON: f64 = 1e-12;

/// Dense table of action-value estimates
///
/// # Example
///
/// ```rust
/// use reinforcelearn::rl::ValueTable;
///
/// let mut table = ValueTable::new(3, 2, 0.0);
/// table.set(1, 1, 2.5).unwrap();
///
/// assert_eq!(table.get(1, 1).unwrap(), 2.5);
/// assert_eq!(table.greedy_action(1).unwrap(), 1);
/// assert!(table.get(3, 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValueTable")]
pub struct ValueTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

/// Unchecked serialized form; shape is validated by `from_values`
#[derive(Deserialize)]
struct RawValueTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl TryFrom<RawValueTable> for ValueTable {
    type Error = RlError;

    fn try_from(raw: RawValueTable) -> Result<Self> {
        ValueTable::from_values(raw.n_states, raw.n_actions, raw.values)
    }
}

impl ValueTable {
    /// Create a table with every entry set to `initial_value`
    pub fn new(n_states: usize, n_actions: usize, initial_value: f64) -> Self {
        Self {
            n_states,
            n_actions,
            values: vec![initial_value; n_states * n_actions],
        }
    }

    /// Build a table from row-major values
    ///
    /// Fails if `values.len() != n_states * n_actions`.
    pub fn from_values(n_states: usize, n_actions: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != n_states * n_actions {
            return Err(RlError::invalid(format!(
                "expected {} values for a {}x{} table, got {}",
                n_states * n_actions,
                n_states,
                n_actions,
                values.len()
            )));
        }
        Ok(Self {
            n_states,
            n_actions,
            values,
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Read the estimate for `(state, action)`
    pub fn get(&self, state: usize, action: usize) -> Result<f64> {
        let idx = self.index(state, action)?;
        Ok(self.values[idx])
    }

    /// Overwrite the estimate for `(state, action)`
    pub fn set(&mut self, state: usize, action: usize, value: f64) -> Result<()> {
        let idx = self.index(state, action)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Add `delta` to the estimate for `(state, action)`
    pub fn add(&mut self, state: usize, action: usize, delta: f64) -> Result<()> {
        let idx = self.index(state, action)?;
        self.values[idx] += delta;
        Ok(())
    }

    /// All action values for one state
    pub fn action_values(&self, state: usize) -> Result<&[f64]> {
        self.check_state(state)?;
        let start = state * self.n_actions;
        Ok(&self.values[start..start + self.n_actions])
    }

    /// Largest action value in `state`
    pub fn max_value(&self, state: usize) -> Result<f64> {
        let row = self.action_values(state)?;
        Ok(row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Index of the largest action value in `state`, first index on ties
    pub fn greedy_action(&self, state: usize) -> Result<usize> {
        let row = self.action_values(state)?;
        argmax(row).ok_or_else(|| RlError::invalid("table has no actions"))
    }

    /// Greedy state values `V(s) = max_a Q(s, a)`
    pub fn state_values(&self) -> Vec<f64> {
        if self.n_actions == 0 {
            return vec![0.0; self.n_states];
        }
        self.values
            .chunks(self.n_actions)
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    /// Multiply every entry by `factor`
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    /// Set every entry to `value`
    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    /// Raw row-major values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Row-major entries for bulk in-place updates; the shape stays fixed
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.n_states {
            return Err(RlError::invalid(format!(
                "state index {} out of range (n_states = {})",
                state, self.n_states
            )));
        }
        Ok(())
    }

    fn index(&self, state: usize, action: usize) -> Result<usize> {
        self.check_state(state)?;
        if action >= self.n_actions {
            return Err(RlError::invalid(format!(
                "action index {} out of range (n_actions = {})",
                action, self.n_actions
            )));
        }
        Ok(state * self.n_actions + action)
    }
}

/// First index of the maximum, `None` for an empty slice
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// How a visit updates the trace entry of the visited pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// `e(s, a) += 1`
    #[default]
    Accumulating,
    /// `e(s, a) = 1`
    Replacing,
}

/// Decaying memory of visited state-action pairs
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityTrace {
    table: ValueTable,
}

impl EligibilityTrace {
    pub fn new(n_states: usize, n_actions: usize) -> Self {
        Self {
            table: ValueTable::new(n_states, n_actions, 0.0),
        }
    }

    /// Mark `(state, action)` as visited
    pub fn visit(&mut self, state: usize, action: usize, kind: TraceKind) -> Result<()> {
        match kind {
            TraceKind::Accumulating => self.table.add(state, action, 1.0),
            TraceKind::Replacing => self.table.set(state, action, 1.0),
        }
    }

    /// Multiply every entry by `factor`, flushing entries that become negligible
    pub fn decay(&mut self, factor: f64) {
        for v in &mut self.table.values {
            *v *= factor;
            if v.abs() < TRACE_EPSILON {
                *v = 0.0;
            }
        }
    }

    pub fn get(&self, state: usize, action: usize) -> Result<f64> {
        self.table.get(state, action)
    }

    /// Clear all entries, e.g. at the start of an episode
    pub fn reset(&mut self) {
        self.table.fill(0.0);
    }

    /// `(state, action, trace)` for every nonzero entry
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n_actions = self.table.n_actions;
        self.table
            .values
            .iter()
            .enumerate()
            .filter(|(_, e)| **e != 0.0)
            .map(move |(i, &e)| (i / n_actions, i % n_actions, e))
    }
}
