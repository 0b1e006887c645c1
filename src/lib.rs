//! Declarative widget creators on top of `perch-core`.
//!
//! The [`Host`] connects a root creator to a window and runs work deferred to the next turn of
//! the run loop; [`widgets`] has the built-in creators.

mod config;
mod host;
pub mod widgets;

pub use config::HostConfig;
pub use host::{Dispatcher, Host};
pub use perch_core::*;
