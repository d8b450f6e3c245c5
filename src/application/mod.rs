pub mod error;
pub mod storefront;

pub use error::AppError;
pub use storefront::{CarouselState, KeyFailure, RenderPlan, Storefront};
