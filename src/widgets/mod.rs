//! Built-in creators.

mod button;
mod for_each;
mod label;
mod stack;

pub use button::button;
pub use for_each::for_each;
pub use label::{bound_label, label};
pub use stack::{hstack, stack, vstack, Axis};
