//! A classification session over one image at a time.
//!
//! Glues the scheduler to the pipeline: the caller feeds in images and
//! geometry updates; ranked results come back on a watch channel, stamped
//! with the generation of the image they belong to.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::inference::BirdClassifier;
use crate::pipeline::processor::{RegionClassification, classify_region};
use crate::scheduler::{Generation, ReclassificationScheduler, SchedulerConfig};
use image::RgbImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Session behavior knobs, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Number of ranked predictions per run.
    pub top_k: usize,
    /// Confidence threshold for an acceptable top prediction.
    pub confidence_threshold: f32,
    /// Accept the top prediction regardless of confidence.
    pub expert_mode: bool,
    /// Scheduler timing.
    pub scheduler: SchedulerConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionOptions {
    /// Build options from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.classify.top_k,
            confidence_threshold: config.classify.confidence_threshold,
            expert_mode: config.classify.expert_mode,
            scheduler: (&config.scheduler).into(),
        }
    }
}

/// One delivered run outcome.
#[derive(Debug)]
pub struct RunUpdate {
    /// Image generation the run belongs to.
    pub generation: Generation,
    /// The run's result, or the error that ended it.
    pub outcome: Result<RegionClassification>,
}

struct ViewState {
    bitmap: Option<Arc<RgbImage>>,
    focus: Option<Rect>,
    display: Option<Rect>,
}

struct SessionShared {
    classifier: Arc<BirdClassifier>,
    view: Mutex<ViewState>,
    generation: AtomicU64,
    results: watch::Sender<Option<RunUpdate>>,
    top_k: usize,
}

/// A live classification session.
///
/// Owns the source bitmap, the current focus and display rectangles, and
/// the re-classification scheduler. The watch channel always reflects the
/// latest prediction for the *current* image: `None` until the first run of
/// an image completes, and again immediately after a new image is loaded.
pub struct ClassificationSession {
    shared: Arc<SessionShared>,
    scheduler: ReclassificationScheduler,
    options: SessionOptions,
}

impl ClassificationSession {
    /// Start a session around a built classifier.
    pub fn new(classifier: Arc<BirdClassifier>, options: SessionOptions) -> Self {
        let (results, _) = watch::channel(None);
        let shared = Arc::new(SessionShared {
            classifier,
            view: Mutex::new(ViewState {
                bitmap: None,
                focus: None,
                display: None,
            }),
            generation: AtomicU64::new(0),
            results,
            top_k: options.top_k,
        });

        let runner = {
            let shared = Arc::clone(&shared);
            move |generation: Generation| {
                let shared = Arc::clone(&shared);
                async move {
                    run_once(&shared, generation).await;
                }
            }
        };
        let scheduler = ReclassificationScheduler::spawn(options.scheduler, runner);

        Self {
            shared,
            scheduler,
            options,
        }
    }

    /// Load a new image into the session.
    ///
    /// Cancels anything scheduled or in flight for the previous image and
    /// clears the published prediction before any run of the new image can
    /// complete. Returns the new generation.
    pub fn load_image(&self, bitmap: RgbImage) -> Generation {
        let generation = self.scheduler.image_loaded();
        self.shared.generation.store(generation, Ordering::SeqCst);

        if let Ok(mut view) = self.shared.view.lock() {
            view.bitmap = Some(Arc::new(bitmap));
        }
        // The generation store above happens before this clear, so a run
        // publishing concurrently either sees the new generation and
        // suppresses itself, or its stale value is overwritten here. Both
        // mutations serialize on the channel.
        self.shared.results.send_replace(None);

        debug!(generation, "image loaded, session reset");
        generation
    }

    /// Update the focus box (for example after layout) and schedule a
    /// re-classification.
    pub fn set_focus_rect(&self, focus: Rect) {
        if let Ok(mut view) = self.shared.view.lock() {
            view.focus = Some(focus);
        }
        self.scheduler.geometry_changed();
    }

    /// Update the display rectangle after a pan/zoom transform change and
    /// schedule a re-classification.
    pub fn set_display_rect(&self, display: Rect) {
        if let Ok(mut view) = self.shared.view.lock() {
            view.display = Some(display);
        }
        self.scheduler.geometry_changed();
    }

    /// Cancel any scheduled run without touching the loaded image.
    pub fn cancel_pending(&self) {
        self.scheduler.cancel();
    }

    /// Subscribe to run outcomes.
    pub fn subscribe(&self) -> watch::Receiver<Option<RunUpdate>> {
        self.shared.results.subscribe()
    }

    /// Generation of the currently loaded image.
    pub fn current_generation(&self) -> Generation {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// The options this session runs with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

/// Execute one pipeline run and publish the outcome if it is still current.
async fn run_once(shared: &Arc<SessionShared>, generation: Generation) {
    let outcome = run_classification(shared).await;

    if let Err(ref e) = outcome {
        warn!("classification run failed: {e}");
    }

    // The generation check must happen under the channel's lock so a
    // concurrent image load cannot interleave between check and publish.
    let mut update = Some(RunUpdate {
        generation,
        outcome,
    });
    shared.results.send_modify(|slot| {
        if shared.generation.load(Ordering::SeqCst) == generation {
            *slot = update.take();
        } else {
            debug!(generation, "discarding result for superseded image");
        }
    });
}

async fn run_classification(shared: &Arc<SessionShared>) -> Result<RegionClassification> {
    let (bitmap, focus, display) = {
        let view = shared.view.lock().map_err(|_| Error::Internal {
            message: "view state lock poisoned".to_string(),
        })?;
        (
            view.bitmap.clone().ok_or(Error::NoImageLoaded)?,
            view.focus.ok_or(Error::FocusNotSet)?,
            view.display.ok_or(Error::DisplayNotSet)?,
        )
    };

    let classifier = Arc::clone(&shared.classifier);
    let top_k = shared.top_k;

    // The crop/preprocess/infer sequence is CPU-bound; run it off the
    // scheduler's task. The source bitmap is shared read-only, the crop is
    // owned by this run.
    tokio::task::spawn_blocking(move || {
        classify_region(&classifier, &bitmap, &focus, &display, top_k)
    })
    .await
    .map_err(|e| Error::Internal {
        message: format!("classification task failed: {e}"),
    })?
}
