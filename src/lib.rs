//! Runtime core for configuration-driven storefronts.

pub mod actions;
pub mod application;
pub mod cache;
pub mod carousel;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod layout;
pub mod notify;
pub mod session;
pub mod util;
