pub mod debounce;
pub(crate) mod lock;

pub use debounce::Debouncer;
