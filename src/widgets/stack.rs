use cgmath::{Point2, Vector2};
use perch_core::{Creator, NativeType, Rect, Widget};

/// Stacking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Top to bottom.
    Vertical,
    /// Left to right.
    Horizontal,
}

/// A stack arranging `children` along `axis`, `spacing` apart.
///
/// Every child gets an equal share of the stack's length and its full breadth.
pub fn stack(axis: Axis, spacing: f64, children: Vec<Creator>) -> Creator {
    let creator = Creator::native(NativeType::Stack);
    for child in &children {
        creator.append(child);
    }

    creator
        .load_view(move || {
            let widget = Widget::new(NativeType::Stack);
            for child in &children {
                if let Err(err) = widget.add_arranged_subview(&child.release_ui_view()) {
                    log::warn!("Stack: skipping {} {}: {}", child.kind().name(), child.id(), err);
                }
            }
            widget
        })
        .on_layout(move |widget| arrange(widget, axis, spacing))
}

pub fn vstack(children: Vec<Creator>) -> Creator {
    stack(Axis::Vertical, 0., children)
}

pub fn hstack(children: Vec<Creator>) -> Creator {
    stack(Axis::Horizontal, 0., children)
}

fn arrange(widget: &Widget, axis: Axis, spacing: f64) {
    let arranged = widget.arranged_subviews();
    if arranged.is_empty() {
        return;
    }
    let bounds = widget.frame().bounds();
    let count = arranged.len() as f64;
    let length = match axis {
        Axis::Vertical => bounds.height(),
        Axis::Horizontal => bounds.width(),
    };
    let share = ((length - spacing * (count - 1.)) / count).max(0.);

    for (index, subview) in arranged.iter().enumerate() {
        let offset = index as f64 * (share + spacing);
        let frame = match axis {
            Axis::Vertical => Rect::new(
                Point2::new(0., offset),
                Vector2::new(bounds.width(), share),
            ),
            Axis::Horizontal => Rect::new(
                Point2::new(offset, 0.),
                Vector2::new(share, bounds.height()),
            ),
        };
        subview.set_frame(frame);
    }
}
