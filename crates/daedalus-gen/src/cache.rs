//! Incremental stage cache.
//!
//! A [`Stage`] memoizes one pipeline transform by the structural value of
//! its input. Each run computes the misses in parallel, reuses every hit
//! verbatim, and evicts entries the run did not touch.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GeneratorError;

/// Counters from one stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Stage name.
    pub name: &'static str,
    /// Outputs reused from the previous run.
    pub cached: usize,
    /// Outputs computed by this run.
    pub computed: usize,
    /// Entries evicted because this run did not use them.
    pub removed: usize,
}

impl fmt::Display for StageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} cached, {} computed, {} removed",
            self.name, self.cached, self.computed, self.removed
        )
    }
}

/// A named memo table from input to output.
pub struct Stage<I, O> {
    name: &'static str,
    entries: HashMap<I, O>,
}

impl<I, O> Stage<I, O>
where
    I: Eq + Hash + Clone + Send + Sync,
    O: Clone + Send + Sync,
{
    /// Creates an empty stage.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
        }
    }

    /// The stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Produces one output per input, in input order.
    ///
    /// Cancellation is checked before each computation; a cancelled run
    /// leaves the previous entries in place.
    pub fn run<F>(
        &mut self,
        inputs: &[I],
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<(Vec<O>, StageStats), GeneratorError>
    where
        F: Fn(&I) -> O + Send + Sync,
    {
        let (hits, mut misses): (Vec<&I>, Vec<&I>) =
            inputs.iter().partition(|input| self.entries.contains_key(*input));
        let mut seen = HashSet::new();
        misses.retain(|input| seen.insert(*input));

        let computed: Vec<(I, O)> = misses
            .par_iter()
            .map(|input| {
                if cancel.is_cancelled() {
                    return Err(GeneratorError::Cancelled);
                }
                Ok(((*input).clone(), compute(input)))
            })
            .collect::<Result<_, _>>()?;

        let mut stats = StageStats {
            name: self.name,
            cached: hits.len(),
            computed: computed.len(),
            removed: 0,
        };

        let mut next: HashMap<I, O> = HashMap::with_capacity(inputs.len());
        for (input, output) in computed {
            next.insert(input, output);
        }
        for input in inputs {
            if !next.contains_key(input) {
                if let Some((key, output)) = self.entries.remove_entry(input) {
                    next.insert(key, output);
                }
            }
        }
        stats.removed = self.entries.len();
        self.entries = next;

        let outputs = inputs
            .iter()
            .filter_map(|input| self.entries.get(input).cloned())
            .collect();

        debug!(
            stage = stats.name,
            cached = stats.cached,
            computed = stats.computed,
            removed = stats.removed,
            "Stage complete"
        );
        Ok((outputs, stats))
    }
}

impl<I, O> fmt::Debug for Stage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn run(stage: &mut Stage<String, usize>, inputs: &[&str], calls: &AtomicUsize) -> (Vec<usize>, StageStats) {
        let inputs: Vec<String> = inputs.iter().map(|s| (*s).to_string()).collect();
        stage
            .run(&inputs, &CancellationToken::new(), |input| {
                calls.fetch_add(1, Ordering::SeqCst);
                input.len()
            })
            .unwrap()
    }

    #[test]
    fn test_hits_reuse_outputs() {
        let mut stage = Stage::new("length");
        let calls = AtomicUsize::new(0);

        let (outputs, stats) = run(&mut stage, &["a", "bb", "ccc"], &calls);
        assert_eq!(outputs, vec![1, 2, 3]);
        assert_eq!((stats.cached, stats.computed, stats.removed), (0, 3, 0));

        let (outputs, stats) = run(&mut stage, &["a", "bb", "ccc"], &calls);
        assert_eq!(outputs, vec![1, 2, 3]);
        assert_eq!((stats.cached, stats.computed, stats.removed), (3, 0, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_changed_input_recomputes_and_evicts() {
        let mut stage = Stage::new("length");
        let calls = AtomicUsize::new(0);
        run(&mut stage, &["a", "bb"], &calls);

        let (outputs, stats) = run(&mut stage, &["a", "dddd"], &calls);
        assert_eq!(outputs, vec![1, 4]);
        assert_eq!((stats.cached, stats.computed, stats.removed), (1, 1, 1));
        assert_eq!(stage.len(), 2);
        assert_eq!(stats.to_string(), "length: 1 cached, 1 computed, 1 removed");
    }

    #[test]
    fn test_duplicate_inputs_compute_once() {
        let mut stage = Stage::new("length");
        let calls = AtomicUsize::new(0);

        let (outputs, stats) = run(&mut stage, &["a", "a"], &calls);
        assert_eq!(outputs, vec![1, 1]);
        assert_eq!((stats.cached, stats.computed, stats.removed), (0, 1, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (_, stats) = run(&mut stage, &["a", "a", "bb"], &calls);
        assert_eq!((stats.cached, stats.computed, stats.removed), (2, 1, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_run_keeps_previous_entries() {
        let mut stage: Stage<String, usize> = Stage::new("length");
        let calls = AtomicUsize::new(0);
        run(&mut stage, &["a"], &calls);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = stage.run(&["zz".to_string()], &cancel, String::len);
        assert!(matches!(result, Err(GeneratorError::Cancelled)));
        assert_eq!(stage.len(), 1);

        stage.clear();
        assert!(stage.is_empty());
    }
}
