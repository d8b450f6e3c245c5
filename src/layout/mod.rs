//! Layout composition: server-supplied descriptors resolved into a render plan.

mod composer;
mod derive;
mod kind;
mod props;
mod window;

pub use composer::{LayoutComposer, LayoutConfig, default_layout, layout_descriptors, required_keys};
pub use kind::UnitKind;
pub use props::{Card, Diagnostic, RenderUnit, ResolvedProps, decode_cards};
pub use window::ProductWindow;
