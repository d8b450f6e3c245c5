//! Circular ad carousel.
//!
//! Every ad rail pages through its images in groups of one, two or three.
//! The page list is padded with a clone of the last page in front and of the
//! first page at the back, so moving forward from the last page (or back from
//! the first) always animates to a neighbour; once that transition completes
//! the index is snapped, without animation, onto the real page the clone
//! stands for.

mod autoplay;
mod controller;
mod normalize;

pub use autoplay::{Autoplay, AutoplayConfig, MountedCarousel, SharedCarousel};
pub use controller::{CarouselController, Frame, Page, Phase, TransitionId};
pub use normalize::{NormalizedImage, decode_ad_images, normalize_images, secure_url};
