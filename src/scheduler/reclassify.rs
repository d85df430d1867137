//! The re-classification scheduler state machine.
//!
//! A single actor task owns the state and is driven by an event channel and
//! timers, so there is exactly one writer and a work queue of size one: at
//! most one scheduled deadline, at most one in-flight run.
//!
//! States: `Idle`, `Scheduled(deadline)`, `Processing`.
//!
//! - A geometry change while `Idle`/`Scheduled` restarts the debounce timer.
//! - A geometry change while `Processing` (or during the post-run quiet
//!   period) only marks a pending flag; it is reconciled once, after the
//!   quiet period, and only if it happened recently enough.
//! - Loading a new image bumps the generation, cancels whatever is scheduled
//!   or in flight, and clears all flags.

use crate::constants::scheduler as timing;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

/// Identity of a loaded image. Bumped on every image load; results from a
/// superseded generation must be discarded by the consumer.
pub type Generation = u64;

/// Scheduler timing constants.
///
/// The defaults were tuned empirically against real gesture streams and are
/// part of the behavior contract; treat them as configuration, not as values
/// to re-derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Debounce window after the last geometry change before a run starts.
    pub debounce: Duration,
    /// A change younger than `debounce - reschedule_margin` at deadline time
    /// forces a reschedule instead of a run.
    pub reschedule_margin: Duration,
    /// Post-run hold absorbing transform jitter from the viewer settling.
    pub quiet_period: Duration,
    /// Maximum age of a pending change acted on after the quiet period.
    pub reconcile_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(timing::DEBOUNCE_MS),
            reschedule_margin: Duration::from_millis(timing::RESCHEDULE_MARGIN_MS),
            quiet_period: Duration::from_millis(timing::QUIET_PERIOD_MS),
            reconcile_window: Duration::from_millis(timing::RECONCILE_WINDOW_MS),
        }
    }
}

#[derive(Debug)]
enum Event {
    GeometryChanged,
    ImageLoaded(Generation),
    Cancel,
}

/// Handle to the scheduler actor.
///
/// All methods are non-blocking and safe to call from any thread. Dropping
/// the handle shuts the actor down, cancelling anything scheduled or in
/// flight.
pub struct ReclassificationScheduler {
    events: mpsc::UnboundedSender<Event>,
    generation: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl ReclassificationScheduler {
    /// Spawn the scheduler actor.
    ///
    /// `runner` is invoked for each classification run with the generation
    /// the run belongs to. The future it returns is driven inside the actor
    /// and may be dropped mid-flight when the image changes; it must not
    /// hold exclusive resources across that cancellation point.
    pub fn spawn<F, Fut>(config: SchedulerConfig, runner: F) -> Self
    where
        F: FnMut(Generation) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (events, receiver) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(drive(config, receiver, runner));
        Self {
            events,
            generation,
            task,
        }
    }

    /// Notify the scheduler of a pan/zoom geometry change.
    pub fn geometry_changed(&self) {
        let _ = self.events.send(Event::GeometryChanged);
    }

    /// Notify the scheduler that a new image was loaded.
    ///
    /// Returns the new generation. Anything scheduled or in flight for the
    /// previous image is cancelled.
    pub fn image_loaded(&self) -> Generation {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(Event::ImageLoaded(generation));
        generation
    }

    /// Generation of the most recently loaded image.
    pub fn current_generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancel any scheduled run and clear the pending flag.
    ///
    /// The image identity is unchanged; use [`Self::image_loaded`] when the
    /// image itself is replaced.
    pub fn cancel(&self) {
        let _ = self.events.send(Event::Cancel);
    }
}

impl Drop for ReclassificationScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Mutable state shared across the actor's phases.
struct DriveState {
    generation: Generation,
    pending_change_during_processing: bool,
    last_change: Option<Instant>,
}

enum Phase {
    Idle,
    Scheduled(Instant),
    Processing,
}

async fn drive<F, Fut>(
    config: SchedulerConfig,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut runner: F,
) where
    F: FnMut(Generation) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut state = DriveState {
        generation: 0,
        pending_change_during_processing: false,
        last_change: None,
    };
    let mut phase = Phase::Idle;

    loop {
        let next = match phase {
            Phase::Idle => idle(&mut events, &mut state, &config).await,
            Phase::Scheduled(deadline) => {
                scheduled(deadline, &mut events, &mut state, &config).await
            }
            Phase::Processing => processing(&mut events, &mut state, &config, &mut runner).await,
        };
        match next {
            Some(p) => phase = p,
            // Channel closed: the handle was dropped, shut down.
            None => return,
        }
    }
}

async fn idle(
    events: &mut mpsc::UnboundedReceiver<Event>,
    state: &mut DriveState,
    config: &SchedulerConfig,
) -> Option<Phase> {
    let event = events.recv().await?;
    Some(match event {
        Event::GeometryChanged => {
            let now = Instant::now();
            state.last_change = Some(now);
            trace!("geometry change, debounce started");
            Phase::Scheduled(now + config.debounce)
        }
        Event::ImageLoaded(generation) => {
            reset_for_image(state, generation);
            Phase::Idle
        }
        Event::Cancel => {
            state.pending_change_during_processing = false;
            Phase::Idle
        }
    })
}

async fn scheduled(
    deadline: Instant,
    events: &mut mpsc::UnboundedReceiver<Event>,
    state: &mut DriveState,
    config: &SchedulerConfig,
) -> Option<Phase> {
    tokio::select! {
        // Drain queued events before deciding the deadline has truly passed.
        biased;
        event = events.recv() => {
            let event = event?;
            Some(match event {
                Event::GeometryChanged => {
                    let now = Instant::now();
                    state.last_change = Some(now);
                    Phase::Scheduled(now + config.debounce)
                }
                Event::ImageLoaded(generation) => {
                    reset_for_image(state, generation);
                    Phase::Idle
                }
                Event::Cancel => {
                    state.pending_change_during_processing = false;
                    Phase::Idle
                }
            })
        }
        () = sleep_until(deadline) => {
            // A change that slipped in just before the deadline means the
            // burst has not quiesced; coalesce it into a fresh window.
            let changed_recently = state
                .last_change
                .is_some_and(|t| t.elapsed() + config.reschedule_margin < config.debounce);
            if changed_recently {
                trace!("recent change at deadline, rescheduling");
                Some(Phase::Scheduled(Instant::now() + config.debounce))
            } else {
                Some(Phase::Processing)
            }
        }
    }
}

async fn processing<F, Fut>(
    events: &mut mpsc::UnboundedReceiver<Event>,
    state: &mut DriveState,
    config: &SchedulerConfig,
    runner: &mut F,
) -> Option<Phase>
where
    F: FnMut(Generation) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    debug!(generation = state.generation, "classification run starting");
    state.pending_change_during_processing = false;

    let run = runner(state.generation);
    tokio::pin!(run);

    // Drive the run while still observing events. A geometry change only
    // marks the pending flag; an image load or cancel drops the run.
    loop {
        tokio::select! {
            biased;
            event = events.recv() => {
                match event? {
                    Event::GeometryChanged => {
                        state.pending_change_during_processing = true;
                        state.last_change = Some(Instant::now());
                    }
                    Event::ImageLoaded(generation) => {
                        debug!(generation, "image replaced, run cancelled");
                        reset_for_image(state, generation);
                        return Some(Phase::Idle);
                    }
                    Event::Cancel => {
                        state.pending_change_during_processing = false;
                        return Some(Phase::Idle);
                    }
                }
            }
            () = &mut run => break,
        }
    }

    // Quiet period: the viewer's settle animation can emit spurious
    // transform changes right after results land; absorb them as pending.
    let quiet_deadline = Instant::now() + config.quiet_period;
    loop {
        tokio::select! {
            biased;
            event = events.recv() => {
                match event? {
                    Event::GeometryChanged => {
                        state.pending_change_during_processing = true;
                        state.last_change = Some(Instant::now());
                    }
                    Event::ImageLoaded(generation) => {
                        reset_for_image(state, generation);
                        return Some(Phase::Idle);
                    }
                    Event::Cancel => {
                        state.pending_change_during_processing = false;
                        return Some(Phase::Idle);
                    }
                }
            }
            () = sleep_until(quiet_deadline) => break,
        }
    }

    // Reconcile exactly once: only a change recent enough to still matter
    // restarts the debounce cycle.
    let follow_up = state.pending_change_during_processing
        && state
            .last_change
            .is_some_and(|t| t.elapsed() < config.reconcile_window);
    state.pending_change_during_processing = false;

    if follow_up {
        debug!("pending change during run, rescheduling");
        Some(Phase::Scheduled(Instant::now() + config.debounce))
    } else {
        Some(Phase::Idle)
    }
}

fn reset_for_image(state: &mut DriveState, generation: Generation) {
    state.generation = generation;
    state.pending_change_during_processing = false;
    state.last_change = None;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{advance, sleep};

    fn counting_runner(
        counter: Arc<AtomicUsize>,
        run_duration: Duration,
    ) -> impl FnMut(Generation) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
        move |_generation| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                sleep(run_duration).await;
                counter.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    async fn settle(ms: u64) {
        // Advance paused time in small steps so timers and the actor task
        // get scheduled in between.
        for _ in 0..ms {
            advance(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_change_runs_once_after_debounce() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(10)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();

        settle(499).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        settle(20).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_one_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(10)),
        );

        scheduler.image_loaded();
        // Gesture events every 100 ms for 2 seconds.
        for _ in 0..20 {
            scheduler.geometry_changed();
            settle(100).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        // One run, roughly debounce after the last event (100 ms already
        // elapsed inside the loop).
        settle(450).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // And nothing further.
        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_during_processing_defers_single_follow_up() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(100)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();
        settle(520).await; // run is now in flight

        // Several changes while processing: only the pending flag is set.
        scheduler.geometry_changed();
        settle(30).await;
        scheduler.geometry_changed();
        settle(60).await; // run finishes around here
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Quiet period passes, then exactly one follow-up run.
        settle(800).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_pending_change_is_not_acted_on() {
        let runs = Arc::new(AtomicUsize::new(0));
        // A run long enough that a change early in it is stale by quiet end.
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(600)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();
        settle(520).await; // in flight
        scheduler.geometry_changed(); // pending, but 800 ms before quiet end
        settle(600 + 210).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Pending change was older than the reconciliation window: no
        // follow-up run.
        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_load_cancels_scheduled_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(10)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();
        settle(300).await;
        scheduler.image_loaded(); // cancels the scheduled run

        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_load_drops_in_flight_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(500)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();
        settle(600).await; // in flight
        scheduler.image_loaded(); // drops the run before it completes

        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_scheduled_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(10)),
        );

        scheduler.image_loaded();
        scheduler.geometry_changed();
        settle(200).await;
        scheduler.cancel();

        settle(2000).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        // The scheduler still works afterwards.
        scheduler.geometry_changed();
        settle(600).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_increments_per_image() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = ReclassificationScheduler::spawn(
            SchedulerConfig::default(),
            counting_runner(Arc::clone(&runs), Duration::from_millis(1)),
        );

        assert_eq!(scheduler.current_generation(), 0);
        let first = scheduler.image_loaded();
        let second = scheduler.image_loaded();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(scheduler.current_generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_never_overlap() {
        // A runner that asserts exclusivity with a busy flag.
        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let runner = {
            let active = Arc::clone(&active);
            let overlaps = Arc::clone(&overlaps);
            let runs = Arc::clone(&runs);
            move |_generation| {
                let active = Arc::clone(&active);
                let overlaps = Arc::clone(&overlaps);
                let runs = Arc::clone(&runs);
                Box::pin(async move {
                    if active.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    sleep(Duration::from_millis(150)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    runs.fetch_add(1, Ordering::SeqCst);
                }) as std::pin::Pin<Box<dyn Future<Output = ()> + Send>>
            }
        };

        let scheduler = ReclassificationScheduler::spawn(SchedulerConfig::default(), runner);
        scheduler.image_loaded();

        // Keep poking at varied cadence across several run/quiet cycles.
        for _ in 0..40 {
            scheduler.geometry_changed();
            settle(90).await;
        }
        settle(3000).await;

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(runs.load(Ordering::SeqCst) >= 1);
    }
}
