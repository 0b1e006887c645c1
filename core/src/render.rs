//! Render state.
//!
//! The host reports hierarchy changes per widget; this module turns them into ordered, one-shot
//! phase notifications for the widget's creator and the widgets it watches.
//!
//! A phase is only delivered when its precondition holds (a superview for `NotRendered` and
//! `Rendered`, a window for `InTheScene`). Otherwise the handlers stay queued until a later
//! attachment.

use crate::widget::Widget;

/// Lifecycle stage of a widget relative to hierarchy attachment.
///
/// Strictly ordered: `NotRendered < Rendered < InTheScene`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderState {
    /// The widget is about to be attached to a superview.
    NotRendered,
    /// The widget has a superview.
    Rendered,
    /// The widget is in a window.
    InTheScene,
}

impl RenderState {
    /// All states, in order.
    pub const ALL: [RenderState; 3] = [
        RenderState::NotRendered,
        RenderState::Rendered,
        RenderState::InTheScene,
    ];
}

/// Per-widget render bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct RenderManager {
    /// Highest phase delivered so far.
    fired: Option<RenderState>,
    appeared: bool,
}

impl RenderManager {
    pub(crate) fn fired(&self) -> Option<RenderState> {
        self.fired
    }

    /// Marks `phase` as delivered; returns false if it already was.
    fn advance(&mut self, phase: RenderState) -> bool {
        if self.fired.map_or(false, |fired| fired >= phase) {
            false
        } else {
            self.fired = Some(phase);
            true
        }
    }

    fn set_appeared(&mut self, appeared: bool) -> bool {
        if self.appeared == appeared {
            false
        } else {
            self.appeared = appeared;
            true
        }
    }
}

pub(crate) fn will_move_to_superview(widget: &Widget, new_superview: Option<&Widget>) {
    if new_superview.is_some() {
        deliver(widget, RenderState::NotRendered);
    }
}

pub(crate) fn did_move_to_superview(widget: &Widget) {
    if widget.superview().is_some() {
        deliver(widget, RenderState::Rendered);
    }
}

pub(crate) fn did_move_to_window(widget: &Widget) {
    if widget.window().is_some() {
        deliver(widget, RenderState::InTheScene);
        set_appeared(widget, true);
    } else {
        set_appeared(widget, false);
    }
}

/// Runs layout handlers for the widget and all of its descendants, stopping at self-managed
/// widgets (the host lays those out on its own).
///
/// Unlike render phases, layout reaches every subview of a stack, arranged or not.
pub(crate) fn layout_subviews(widget: &Widget) {
    if let Some(creator) = widget.creator() {
        for handler in creator.layout_handlers() {
            handler(widget);
        }
    }
    for child in widget.subviews() {
        if !child.is_self_managed() {
            layout_subviews(&child);
        }
    }
}

/// Re-runs every phase the widget's attachment allows against its current creator.
///
/// Without a superview the widget goes back to not having any phase delivered, so the next
/// attachment runs the queues.
pub(crate) fn replay(widget: &Widget) {
    let reachable = if widget.window().is_some() {
        Some(RenderState::InTheScene)
    } else if widget.superview().is_some() {
        Some(RenderState::Rendered)
    } else {
        None
    };
    widget.with_render(|render| render.fired = None);
    if let Some(target) = reachable {
        deliver(widget, target);
    }
}

/// Delivers every phase up to `target` that has not been delivered yet, in order.
fn deliver(widget: &Widget, target: RenderState) {
    for phase in RenderState::ALL.iter().copied().filter(|phase| *phase <= target) {
        if !widget.with_render(|render| render.advance(phase)) {
            continue;
        }
        log::trace!(
            "{} {}: {:?}",
            widget.native_type().name(),
            widget.id(),
            phase
        );

        if let Some(creator) = widget.creator() {
            for handler in creator.take_phase_handlers(phase) {
                handler(widget);
            }
        }
        for child in widget.watched() {
            deliver(&child, phase);
        }
    }
}

fn set_appeared(widget: &Widget, appeared: bool) {
    if !widget.with_render(|render| render.set_appeared(appeared)) {
        return;
    }
    if let Some(creator) = widget.creator() {
        let handlers = if appeared {
            creator.appear_handlers()
        } else {
            creator.disappear_handlers()
        };
        for handler in handlers {
            handler(widget);
        }
    }
    for child in widget.watched() {
        set_appeared(&child, appeared);
    }
}
