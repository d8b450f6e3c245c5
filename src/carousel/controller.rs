//! Two-phase carousel state machine.
//!
//! `Settled(i)` → (`advance` | `retreat` | `tick` | `jump_to_page`) →
//! `Transitioning { to }` → completion event → `Settled(corrected)`.
//! Completion is the only place the clone positions are corrected, and any
//! new step first completes the pending transition, so a correction can never
//! interleave with a following move.

use serde::Serialize;
use tracing::{debug, trace};
use vitrine_api_types::{AdImage, AdLayout};

use super::normalize::{NormalizedImage, normalize_images};

/// Horizontal distance, in pixels, a swipe must cover to change page.
const SWIPE_THRESHOLD_PX: f32 = 50.0;

/// One carousel page. Always `group_size` slots long; a short last page is
/// padded with `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub slots: Vec<Option<NormalizedImage>>,
}

impl Page {
    pub fn images(&self) -> impl Iterator<Item = &NormalizedImage> {
        self.slots.iter().flatten()
    }

    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Identifies one started transition so a completion event can be matched
/// to the move that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Settled(usize),
    Transitioning {
        id: TransitionId,
        from: usize,
        to: usize,
    },
}

/// What the view should draw: the extended-sequence index and whether moving
/// there is animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub animate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    User,
    Timer,
}

#[derive(Debug, Clone)]
pub struct CarouselController {
    layout: AdLayout,
    items: Vec<NormalizedImage>,
    pages: Vec<Page>,
    extended: Vec<Page>,
    phase: Phase,
    animate: bool,
    next_transition: u64,
}

impl CarouselController {
    pub fn new(raw_items: &[AdImage], layout: AdLayout) -> Self {
        Self::from_normalized(normalize_images(raw_items), layout)
    }

    pub fn from_normalized(items: Vec<NormalizedImage>, layout: AdLayout) -> Self {
        let pages = group_pages(&items, layout.group_size());
        let extended = extend_pages(&pages);
        let start = if extended.is_empty() { 0 } else { 1 };

        Self {
            layout,
            items,
            pages,
            extended,
            phase: Phase::Settled(start),
            animate: false,
            next_transition: 0,
        }
    }

    pub fn layout(&self) -> AdLayout {
        self.layout
    }

    pub fn group_size(&self) -> usize {
        self.layout.group_size()
    }

    pub fn items(&self) -> &[NormalizedImage] {
        &self.items
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn extended(&self) -> &[Page] {
        &self.extended
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// No renderable images: the view shows its informational empty state.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Autoplay only makes sense with somewhere to go.
    pub fn should_autoplay(&self) -> bool {
        self.pages.len() > 1
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Target index in the extended sequence.
    pub fn index(&self) -> usize {
        match self.phase {
            Phase::Settled(index) => index,
            Phase::Transitioning { to, .. } => to,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            index: self.index(),
            animate: self.animate,
        }
    }

    pub fn visible_page(&self) -> Option<&Page> {
        self.extended.get(self.index())
    }

    /// 1-based real page number for pagination dots; 0 when empty.
    pub fn current_display_index(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let last = self.extended.len() - 1;
        match self.index() {
            0 => self.pages.len(),
            index if index == last => 1,
            index => index,
        }
    }

    pub fn advance(&mut self) -> Option<TransitionId> {
        self.step(1, Origin::User)
    }

    pub fn retreat(&mut self) -> Option<TransitionId> {
        self.step(-1, Origin::User)
    }

    /// Autoplay step; shares the update path with manual moves.
    pub fn tick(&mut self) -> Option<TransitionId> {
        self.step(1, Origin::Timer)
    }

    /// Map a finished horizontal swipe to a move. Negative `dx` (finger moved
    /// left) advances.
    pub fn swipe_end(&mut self, dx: f32) -> Option<TransitionId> {
        if dx <= -SWIPE_THRESHOLD_PX {
            self.advance()
        } else if dx >= SWIPE_THRESHOLD_PX {
            self.retreat()
        } else {
            None
        }
    }

    /// Dot navigation to real page `page` (0-based). Never lands on a clone,
    /// so completion needs no correction. Out-of-range pages are ignored.
    pub fn jump_to_page(&mut self, page: usize) -> Option<TransitionId> {
        if page >= self.pages.len() {
            return None;
        }
        self.complete_transition();
        let from = self.index();
        let to = page + 1;
        if from == to {
            return None;
        }
        Some(self.begin(from, to))
    }

    /// Completion event for whatever transition is pending. Landing on a
    /// clone snaps to the real page without animation. Returns the settled
    /// index when a transition was pending.
    pub fn complete_transition(&mut self) -> Option<usize> {
        let Phase::Transitioning { to, .. } = self.phase else {
            return None;
        };

        let last = self.extended.len() - 1;
        let corrected = if to == 0 {
            last - 1
        } else if to == last {
            1
        } else {
            to
        };

        if corrected != to {
            trace!(from_clone = to, corrected, "Carousel snapped off clone");
            self.animate = false;
        }
        self.phase = Phase::Settled(corrected);
        Some(corrected)
    }

    /// Complete only if `id` is still the pending transition. Timer-driven
    /// completions use this so they never cut short a newer manual move.
    pub fn complete_if(&mut self, id: TransitionId) -> Option<usize> {
        match self.phase {
            Phase::Transitioning { id: pending, .. } if pending == id => {
                self.complete_transition()
            }
            _ => None,
        }
    }

    fn step(&mut self, delta: isize, origin: Origin) -> Option<TransitionId> {
        if !self.should_autoplay() {
            return None;
        }

        self.complete_transition();
        let from = self.index();
        // Settled indices lie in 1..=len-2, so ±1 stays within the extended sequence.
        let to = from.checked_add_signed(delta)?;

        let id = self.begin(from, to);
        if origin == Origin::Timer {
            trace!(from, to, "Carousel autoplay tick");
        } else {
            debug!(from, to, "Carousel moved");
        }
        Some(id)
    }

    fn begin(&mut self, from: usize, to: usize) -> TransitionId {
        self.next_transition += 1;
        let id = TransitionId(self.next_transition);
        self.phase = Phase::Transitioning { id, from, to };
        self.animate = true;
        id
    }
}

fn group_pages(items: &[NormalizedImage], group_size: usize) -> Vec<Page> {
    items
        .chunks(group_size.max(1))
        .map(|chunk| {
            let mut slots: Vec<_> = chunk.iter().cloned().map(Some).collect();
            slots.resize(group_size.max(1), None);
            Page { slots }
        })
        .collect()
}

fn extend_pages(pages: &[Page]) -> Vec<Page> {
    let (Some(first), Some(last)) = (pages.first(), pages.last()) else {
        return Vec::new();
    };
    let mut extended = Vec::with_capacity(pages.len() + 2);
    extended.push(last.clone());
    extended.extend(pages.iter().cloned());
    extended.push(first.clone());
    extended
}
