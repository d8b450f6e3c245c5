//! Timer-driven advancement for a mounted carousel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};
use vitrine_api_types::{AdImage, AdLayout};

use crate::util::lock::{LockSite, RecoverMutex};

use super::controller::CarouselController;

const SOURCE: &str = "carousel::autoplay";

const DEFAULT_INTERVAL_MS: u64 = 6_000;
const DEFAULT_TRANSITION_MS: u64 = 500;

/// Controller shared between the view and the autoplay task.
pub type SharedCarousel = Arc<Mutex<CarouselController>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayConfig {
    /// Time between automatic advances.
    pub interval: Duration,
    /// Duration of the animated move; completion fires this long after a tick.
    pub transition: Duration,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            transition: Duration::from_millis(DEFAULT_TRANSITION_MS),
        }
    }
}

impl From<&crate::config::CarouselSettings> for AutoplayConfig {
    fn from(settings: &crate::config::CarouselSettings) -> Self {
        Self {
            interval: settings.autoplay_interval,
            transition: settings.transition,
        }
    }
}

/// Running autoplay timer. Dropping it stops the timer; no tick fires after.
#[derive(Debug)]
pub struct Autoplay {
    handle: JoinHandle<()>,
}

impl Autoplay {
    /// Start advancing `carousel` every `config.interval`. Returns `None` when
    /// the carousel has at most one page.
    pub fn start(carousel: SharedCarousel, config: AutoplayConfig) -> Option<Self> {
        let pages = carousel
            .lock_recovered(LockSite::new(SOURCE, "start"))
            .page_count();
        if pages <= 1 {
            trace!(pages, "Autoplay not started");
            return None;
        }

        debug!(
            pages,
            interval_ms = config.interval.as_millis() as u64,
            "Autoplay started"
        );
        let first_tick = time::Instant::now() + config.interval;
        let handle = tokio::spawn(run(carousel, config, first_tick));
        Some(Self { handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {}
}

impl Drop for Autoplay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(carousel: SharedCarousel, config: AutoplayConfig, first_tick: time::Instant) {
    let mut ticker = time::interval_at(first_tick, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let transition = carousel.lock_recovered(LockSite::new(SOURCE, "tick")).tick();
        let Some(id) = transition else {
            continue;
        };

        time::sleep(config.transition).await;
        carousel
            .lock_recovered(LockSite::new(SOURCE, "complete"))
            .complete_if(id);
    }
}

/// A carousel as the page holds it while on screen: the shared controller
/// plus its autoplay timer. Dropping it is the unmount.
#[derive(Debug)]
pub struct MountedCarousel {
    carousel: SharedCarousel,
    autoplay: Option<Autoplay>,
}

impl MountedCarousel {
    /// Must be called from within a tokio runtime when autoplay can start.
    pub fn mount(images: &[AdImage], layout: AdLayout, config: AutoplayConfig) -> Self {
        let carousel = Arc::new(Mutex::new(CarouselController::new(images, layout)));
        let autoplay = Autoplay::start(Arc::clone(&carousel), config);
        Self { carousel, autoplay }
    }

    pub fn carousel(&self) -> SharedCarousel {
        Arc::clone(&self.carousel)
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay.as_ref().is_some_and(Autoplay::is_running)
    }

    /// Run `f` against the controller, e.g. to forward a user gesture.
    pub fn with<R>(&self, f: impl FnOnce(&mut CarouselController) -> R) -> R {
        let mut controller = self
            .carousel
            .lock_recovered(LockSite::new(SOURCE, "with"));
        f(&mut controller)
    }
}
