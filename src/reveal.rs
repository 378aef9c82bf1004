//! Timed word-by-word reveal of a finished answer.
//!
//! Each reveal runs as its own tokio task keyed by [`ExchangeId`]. A tick
//! checks its cancellation flag before touching the caller's callbacks, so a
//! cancel between ticks suppresses every later step and the completion.

use crate::types::ExchangeId;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shown in place of an empty answer.
pub const NO_ANSWER: &str = "(no answer)";

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealSettings {
    pub interval: Duration,
    /// Tokens added per tick.
    pub stride: NonZeroUsize,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            stride: NonZeroUsize::MIN,
        }
    }
}

/// Whitespace tokens of `text`, or the placeholder token when there are none.
pub fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        vec![NO_ANSWER.to_string()]
    } else {
        words
    }
}

/// The text a reveal completes with: the answer verbatim, or the placeholder.
pub fn completed_text(text: &str) -> String {
    if text.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        text.to_string()
    }
}

/// Prefix lengths shown on successive ticks: `ceil(total / stride)` entries,
/// the last one always equal to `total`.
pub fn step_plan(total: usize, stride: NonZeroUsize) -> Vec<usize> {
    let stride = stride.get();
    (1..=total.div_ceil(stride))
        .map(|tick| (tick * stride).min(total))
        .collect()
}

struct ActiveReveal {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ActiveReveal {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }
}

#[derive(Default)]
struct Registry {
    generation: AtomicU64,
    active: Mutex<HashMap<ExchangeId, ActiveReveal>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<ExchangeId, ActiveReveal>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn retire(&self, exchange: ExchangeId, generation: u64) {
        let mut active = self.lock();
        if active
            .get(&exchange)
            .is_some_and(|entry| entry.generation == generation)
        {
            active.remove(&exchange);
        }
    }
}

/// Drives reveals for any number of exchanges. Clones share the same timers.
#[derive(Clone, Default)]
pub struct RevealScheduler {
    settings: RevealSettings,
    registry: Arc<Registry>,
}

impl RevealScheduler {
    pub fn new(settings: RevealSettings) -> Self {
        Self {
            settings,
            registry: Arc::default(),
        }
    }

    pub fn settings(&self) -> RevealSettings {
        self.settings
    }

    /// Start revealing `full_text` for `exchange`, replacing any reveal already
    /// running for it. `on_step` receives growing prefixes; `on_complete` runs
    /// once, after the full prefix was emitted. Must be called inside a tokio
    /// runtime.
    pub fn start<S, C>(&self, exchange: ExchangeId, full_text: &str, mut on_step: S, on_complete: C)
    where
        S: FnMut(&[String]) + Send + 'static,
        C: FnOnce(String) + Send + 'static,
    {
        let words = tokenize(full_text);
        let text = completed_text(full_text);
        let plan = step_plan(words.len(), self.settings.stride);
        let generation = self.registry.generation.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));

        let previous = self.registry.lock().insert(
            exchange,
            ActiveReveal {
                generation,
                cancelled: Arc::clone(&cancelled),
                abort: None,
            },
        );
        if let Some(previous) = previous {
            tracing::trace!(%exchange, "replacing running reveal");
            previous.cancel();
        }

        tracing::trace!(%exchange, words = words.len(), ticks = plan.len(), "reveal started");
        let registry = Arc::clone(&self.registry);
        let period = self.settings.interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for shown in plan {
                ticker.tick().await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                on_step(&words[..shown]);
            }
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            registry.retire(exchange, generation);
            on_complete(text);
        });

        if let Some(entry) = self.registry.lock().get_mut(&exchange) {
            if entry.generation == generation {
                entry.abort = Some(task.abort_handle());
            }
        }
    }

    /// Stop the reveal for `exchange`. Cancelling an unknown or finished
    /// reveal does nothing.
    pub fn cancel(&self, exchange: ExchangeId) {
        if let Some(entry) = self.registry.lock().remove(&exchange) {
            tracing::trace!(%exchange, "reveal cancelled");
            entry.cancel();
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<ActiveReveal> = self.registry.lock().drain().map(|(_, e)| e).collect();
        if !drained.is_empty() {
            tracing::trace!(count = drained.len(), "cancelling all reveals");
        }
        for entry in drained {
            entry.cancel();
        }
    }

    pub fn is_active(&self, exchange: ExchangeId) -> bool {
        self.registry.lock().contains_key(&exchange)
    }

    pub fn active_count(&self) -> usize {
        self.registry.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Steps = Arc<Mutex<Vec<Vec<String>>>>;
    type Completions = Arc<Mutex<Vec<String>>>;

    fn recorder() -> (Steps, Completions) {
        (Arc::default(), Arc::default())
    }

    fn stride(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn start_recorded(
        scheduler: &RevealScheduler,
        exchange: ExchangeId,
        text: &str,
        steps: &Steps,
        done: &Completions,
    ) {
        let steps = Arc::clone(steps);
        let done = Arc::clone(done);
        scheduler.start(
            exchange,
            text,
            move |prefix| steps.lock().unwrap().push(prefix.to_vec()),
            move |full| done.lock().unwrap().push(full),
        );
    }

    #[test]
    fn step_plan_tick_counts() {
        for total in 1..=12 {
            for s in 1..=4 {
                let plan = step_plan(total, stride(s));
                assert_eq!(plan.len(), total.div_ceil(s), "n={total} s={s}");
                assert_eq!(plan.last().copied(), Some(total));
                assert_eq!(plan.iter().filter(|&&k| k == total).count(), 1);
                assert!(plan.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn empty_answer_uses_placeholder() {
        assert_eq!(tokenize("   \n"), vec![NO_ANSWER.to_string()]);
        assert_eq!(completed_text(""), NO_ANSWER);
        assert_eq!(tokenize("a  b\tc"), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_every_step_then_one_completion() {
        let scheduler = RevealScheduler::new(RevealSettings {
            interval: Duration::from_millis(100),
            stride: stride(2),
        });
        let (steps, done) = recorder();
        let text = "one two three four five";
        start_recorded(&scheduler, ExchangeId(1), text, &steps, &done);
        assert!(scheduler.is_active(ExchangeId(1)));

        time::sleep(Duration::from_secs(2)).await;

        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], vec!["one", "two"]);
        assert_eq!(steps[2], tokenize(text));
        assert_eq!(*done.lock().unwrap(), vec![text.to_string()]);
        assert!(!scheduler.is_active(ExchangeId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn no_step_fires_before_first_interval() {
        let scheduler = RevealScheduler::default();
        let (steps, done) = recorder();
        start_recorded(&scheduler, ExchangeId(1), "a b", &steps, &done);

        time::sleep(DEFAULT_INTERVAL / 2).await;
        assert!(steps.lock().unwrap().is_empty());

        time::sleep(DEFAULT_INTERVAL).await;
        assert_eq!(steps.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_later_ticks() {
        let scheduler = RevealScheduler::default();
        let (steps, done) = recorder();
        start_recorded(&scheduler, ExchangeId(7), "a b c d", &steps, &done);

        time::sleep(DEFAULT_INTERVAL + Duration::from_millis(10)).await;
        scheduler.cancel(ExchangeId(7));
        scheduler.cancel(ExchangeId(7));
        time::sleep(Duration::from_secs(2)).await;

        assert_eq!(steps.lock().unwrap().len(), 1);
        assert!(done.lock().unwrap().is_empty());
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_previous_reveal() {
        let scheduler = RevealScheduler::default();
        let (first_steps, first_done) = recorder();
        let (second_steps, second_done) = recorder();
        start_recorded(&scheduler, ExchangeId(3), "old old old", &first_steps, &first_done);
        start_recorded(&scheduler, ExchangeId(3), "new", &second_steps, &second_done);
        assert_eq!(scheduler.active_count(), 1);

        time::sleep(Duration::from_secs(2)).await;

        assert!(first_steps.lock().unwrap().is_empty());
        assert!(first_done.lock().unwrap().is_empty());
        assert_eq!(*second_done.lock().unwrap(), vec!["new".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_finish_is_a_no_op() {
        let scheduler = RevealScheduler::default();
        let (steps, done) = recorder();
        start_recorded(&scheduler, ExchangeId(2), "", &steps, &done);
        time::sleep(Duration::from_secs(1)).await;

        scheduler.cancel(ExchangeId(2));
        assert_eq!(*steps.lock().unwrap(), vec![vec![NO_ANSWER.to_string()]]);
        assert_eq!(*done.lock().unwrap(), vec![NO_ANSWER.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_every_reveal() {
        let scheduler = RevealScheduler::default();
        let (steps, done) = recorder();
        start_recorded(&scheduler, ExchangeId(1), "a b c", &steps, &done);
        start_recorded(&scheduler, ExchangeId(2), "d e f", &steps, &done);
        assert_eq!(scheduler.active_count(), 2);

        scheduler.cancel_all();
        time::sleep(Duration::from_secs(2)).await;

        assert!(steps.lock().unwrap().is_empty());
        assert!(done.lock().unwrap().is_empty());
    }
}
