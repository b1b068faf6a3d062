//! Budgeted, resumable priming of template nodes.
//!
//! Building an action's template node is expensive enough that doing it for a
//! whole catalog at once would stall the editor. The primer spreads that work
//! over frames: each [`IncrementalPrimer::tick`] primes actions until a
//! fraction of the frame time is used up, remembers where it stopped and
//! continues there on the next tick.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{Action, ActionEnv, ActionKey};

/// Source of elapsed time.
pub trait Clock {
    /// Time since some fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Per-tick budget configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimerConfig {
    /// Share of the frame delta spent priming.
    pub budget_fraction: f64,
    /// Upper bound on the per-tick budget.
    pub max_budget: Duration,
}

impl Default for PrimerConfig {
    fn default() -> Self {
        Self {
            budget_fraction: 0.01,
            max_budget: Duration::from_millis(3),
        }
    }
}

impl PrimerConfig {
    /// Budget for a frame that took `delta`.
    pub fn budget(&self, delta: Duration) -> Duration {
        delta.mul_f64(self.budget_fraction.max(0.0)).min(self.max_budget)
    }
}

/// Queue of catalog entries whose actions still need priming.
pub struct IncrementalPrimer {
    config: PrimerConfig,
    clock: Box<dyn Clock>,
    queue: VecDeque<ActionKey>,
    /// Index of the next action to prime, per queued key.
    resume: FxHashMap<ActionKey, usize>,
}

impl IncrementalPrimer {
    pub fn new(config: PrimerConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }

    pub fn with_clock(config: PrimerConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            queue: VecDeque::new(),
            resume: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &PrimerConfig {
        &self.config
    }

    /// Queue `key`, restarting from its first action if already queued.
    pub fn enqueue(&mut self, key: ActionKey) {
        if self.resume.insert(key, 0).is_none() {
            self.queue.push_back(key);
        }
    }

    /// Stop priming `key`.
    pub fn remove(&mut self, key: ActionKey) {
        if self.resume.remove(&key).is_some() {
            self.queue.retain(|k| *k != key);
        }
    }

    /// Drop all pending work.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.resume.clear();
    }

    /// Number of queued entries.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Prime queued actions until the budget for `delta` is spent.
    ///
    /// The budget is checked before each action. An entry that could not be
    /// finished goes to the back of the queue and resumes where it stopped;
    /// entries no longer in `entries` are dropped. Returns the number of
    /// actions primed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tick(
        &mut self,
        env: &ActionEnv<'_>,
        entries: &FxHashMap<ActionKey, Vec<Action>>,
        delta: Duration,
    ) -> usize {
        let budget = self.config.budget(delta);
        let start = self.clock.now();
        let mut primed = 0;

        while let Some(key) = self.queue.pop_front() {
            let Some(actions) = entries.get(&key) else {
                self.resume.remove(&key);
                continue;
            };

            let mut index = self.resume.get(&key).copied().unwrap_or(0);
            let mut exhausted = false;
            while index < actions.len() {
                if self.clock.now().saturating_sub(start) >= budget {
                    exhausted = true;
                    break;
                }
                let action = &actions[index];
                if !action.is_primed() {
                    action.prime(env);
                    primed += 1;
                }
                index += 1;
            }

            if index < actions.len() {
                self.resume.insert(key, index);
                self.queue.push_back(key);
            } else {
                self.resume.remove(&key);
            }
            if exhausted {
                break;
            }
        }

        debug!(primed, pending = self.queue.len(), "primer tick");
        primed
    }
}

impl Default for IncrementalPrimer {
    fn default() -> Self {
        Self::new(PrimerConfig::default())
    }
}

impl std::fmt::Debug for IncrementalPrimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalPrimer")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("resume", &self.resume)
            .finish()
    }
}
