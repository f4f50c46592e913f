// Trailing-edge debouncer with a hard maximum wait
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_WAIT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    /// Quiet period after the last call before the task fires.
    pub wait: Duration,
    /// Upper bound between the first call of a burst and the task firing.
    pub max_wait: Duration,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            wait: DEFAULT_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl DebouncePolicy {
    pub fn new(wait: Duration, max_wait: Duration) -> Self {
        Self {
            wait,
            max_wait: max_wait.max(wait),
        }
    }
}

#[derive(Debug, Default)]
struct TimerState {
    /// Bumped on every schedule/cancel; a timer only fires if it still holds
    /// the current generation.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    burst_started: Option<Instant>,
    last_scheduled: Option<Instant>,
}

/// Single pending timer. Each `schedule` replaces the queued task and pushes
/// the deadline out by `wait`, but never past `burst_started + max_wait`.
///
/// Once a timer fires it detaches from the debouncer, so a task that is
/// already running is never aborted by later calls.
#[derive(Debug)]
pub struct Debouncer {
    policy: DebouncePolicy,
    state: Arc<Mutex<TimerState>>,
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Debouncer {
    pub fn new(policy: DebouncePolicy) -> Self {
        Self {
            policy,
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    /// Queue `task` to run at the end of the current burst. Outside a Tokio
    /// runtime there is no timer to drive it, so the task is dropped with a
    /// warning and any queued task stays as it was. Returns whether `task`
    /// was queued.
    pub fn schedule(&self, task: BoxFuture<'static, ()>) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No Tokio runtime available, dropping debounced task");
            return false;
        };
        let now = Instant::now();
        let mut state = lock(&self.state);

        let burst_started = *state.burst_started.get_or_insert(now);
        state.last_scheduled = Some(now);
        let deadline = (now + self.policy.wait).min(burst_started + self.policy.max_wait);

        state.generation += 1;
        let generation = state.generation;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let shared = Arc::clone(&self.state);
        state.timer = Some(runtime.spawn(async move {
            sleep_until(deadline).await;
            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                state.timer = None;
                state.burst_started = None;
            }
            task.await;
        }));
        true
    }

    /// Drop the queued task, if any, without running it.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.burst_started = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    pub fn is_scheduled(&self) -> bool {
        lock(&self.state).timer.is_some()
    }

    pub fn last_scheduled(&self) -> Option<Instant> {
        lock(&self.state).last_scheduled
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn recorder() -> (Arc<Mutex<Vec<(u32, Instant)>>>, impl Fn(u32) -> BoxFuture<'static, ()>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let task = move |value: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push((value, Instant::now()));
            }
            .boxed()
        };
        (fired, task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_with_last_task() {
        let debouncer = Debouncer::new(DebouncePolicy::default());
        let (fired, task) = recorder();

        for value in 0..5 {
            debouncer.schedule(task(value));
            sleep(ms(100)).await;
        }
        assert!(debouncer.is_scheduled());
        sleep(ms(600)).await;

        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 4);
        assert!(!debouncer.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_forces_a_fire() {
        let debouncer = Debouncer::new(DebouncePolicy::default());
        let (fired, task) = recorder();
        let start = Instant::now();

        for value in 0..15 {
            debouncer.schedule(task(value));
            sleep(ms(300)).await;
        }
        sleep(ms(1000)).await;

        let fired = fired.lock().unwrap();
        assert!(fired.len() >= 2);
        assert!(fired[0].1 - start <= ms(2000));
        // A new burst opens with the first call after a fire.
        for pair in fired.windows(2) {
            assert!(pair[1].1 - pair[0].1 <= ms(2000) + ms(300));
        }
        assert_eq!(fired.last().unwrap().0, 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_queued_task() {
        let debouncer = Debouncer::new(DebouncePolicy::new(ms(50), ms(200)));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        debouncer.schedule(
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed(),
        );
        debouncer.cancel();
        sleep(ms(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_task_survives_new_schedule() {
        let debouncer = Debouncer::new(DebouncePolicy::new(ms(50), ms(200)));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        debouncer.schedule(
            async move {
                sleep(ms(100)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed(),
        );
        sleep(ms(60)).await;
        debouncer.schedule(async {}.boxed());
        debouncer.cancel();
        sleep(ms(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_schedule_without_runtime_drops_task() {
        let debouncer = Debouncer::new(DebouncePolicy::default());
        let (fired, task) = recorder();

        assert!(!debouncer.schedule(task(1)));
        assert!(!debouncer.is_scheduled());
        assert_eq!(debouncer.last_scheduled(), None);
        assert!(fired.lock().unwrap().is_empty());
    }

    #[test]
    fn test_policy_clamps_max_wait() {
        let policy = DebouncePolicy::new(ms(500), ms(100));
        assert_eq!(policy.max_wait, ms(500));
    }
}
