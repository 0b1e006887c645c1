//! Widget lifecycle core.
//!
//! # Conceptual overview
//! Perch describes user interfaces declaratively. Code builds a tree of *creators*, cheap values
//! that say what a widget should be, and the library turns them into *widgets* (the retained,
//! native-side objects) only when they are needed.
//!
//! ## Creators and widgets
//! A creator builds its widget lazily, exactly once, either with a construction closure given via
//! [`Creator::load_view`] or with a default maker for its [`CreatorKind`]. Until the widget is
//! released into a hierarchy, the creator owns it. Releasing it with
//! [`Creator::release_ui_view`] inverts that: the widget now keeps its creator alive, and the
//! creator only holds a weak reference back. Dropping a creator that was never released therefore
//! also drops its widget, while a released widget lives as long as its superview holds it.
//!
//! Composite creators implement [`Body`] and describe their content as other creators. They build
//! a container widget and insert the body into it once the container is empty.
//!
//! ## Render state
//! Every widget moves through three phases as it is attached: it is about to get a superview
//! ([`RenderState::NotRendered`]), it has one ([`RenderState::Rendered`]), and it is in a window
//! ([`RenderState::InTheScene`]). Creators register one-shot handlers for each phase. Handlers
//! run in phase order, each exactly once, and only when the widget actually reaches the phase;
//! handlers registered later for the same phase run first. Appear, disappear and layout handlers
//! are persistent and run every time their event happens.
//!
//! ## Replacement
//! When a new creator tree is declared in place of an old one, a [`ReplacementTree`] pass reuses
//! the old widgets for new creators of the same kind and swaps ownership over to the new
//! creators, so widget state survives redeclaration. Old children without a counterpart are torn
//! down; new children without one are reported so the caller can attach them.
//!
//! ## Relays
//! A [`Value`] is an observable cell. Its [`Relay`]s are read-only (and possibly mapped)
//! projections that can be bound to widget properties with [`Creator::bind`].
//!
//! ## Coordinate system
//! Frames are in the superview's coordinate space, with the origin at the top left corner and
//! positive y pointing down.

mod creator;
mod error;
mod handler;
mod rect;
mod relay;
mod render;
mod replacement;
mod tree;
mod widget;

pub use creator::{Body, Creator, CreatorId, CreatorKind, OwnershipState, WeakCreator};
pub use error::{CreatorError, HierarchyError};
pub use rect::Rect;
pub use relay::{ReactiveCenter, Relay, RelayId, Subscription, Value};
pub use render::RenderState;
pub use replacement::ReplacementTree;
pub use widget::{NativeType, Prop, WeakWidget, WidgetId, Widget};

pub use cgmath;
