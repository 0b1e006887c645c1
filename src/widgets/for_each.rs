use super::stack::{stack, Axis};
use crate::host::Dispatcher;
use parking_lot::Mutex;
use perch_core::{Creator, Relay, ReplacementTree, Widget};
use std::sync::Arc;

/// A vertical stack with one child per item.
///
/// Children are made from the items the relay holds when this is called. Later changes are
/// applied on the next turn of the run loop: children at the same position are reconciled with
/// their replacements, and the stack grows or shrinks at the end.
pub fn for_each<T, F>(items: Relay<Vec<T>>, dispatcher: Dispatcher, make: F) -> Creator
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn(&T) -> Creator + Send + Sync + 'static,
{
    let declared = items.get();
    let children = declared.iter().map(&make).collect();
    let creator = stack(Axis::Vertical, 0., children);

    let (owner, owner_id) = (creator.downgrade(), creator.id());
    let make = Arc::new(make);
    let applied = Arc::new(Mutex::new(declared));
    creator.on_not_rendered(move |widget| {
        let weak = widget.downgrade();
        let subscription = items.sync(move |items| {
            {
                let mut applied = applied.lock();
                if *applied == items {
                    return;
                }
                *applied = items.clone();
            }

            let (weak, owner, make) = (weak.clone(), owner.clone(), Arc::clone(&make));
            dispatcher.dispatch(move || {
                let widget = match weak.upgrade() {
                    Some(widget) => widget,
                    None => {
                        log::warn!("ForEach: stack is gone, skipping update");
                        return;
                    }
                };
                let creator = match widget.creator() {
                    Some(creator) if owner.is(&creator) => creator,
                    _ => return,
                };
                update(&widget, &creator, &items, &*make);
            });
        });
        widget.retain_for(owner_id, subscription);
    })
}

fn update<T, F>(widget: &Widget, owner: &Creator, items: &[T], make: &F)
where
    F: Fn(&T) -> Creator,
{
    let old = owner.leaves();
    for (index, item) in items.iter().enumerate() {
        let new = make(item);
        match old.get(index) {
            Some(old_child) => {
                let mut replacement = ReplacementTree::new(old_child);
                if replacement.replace(&new) {
                    if let Err(err) = replacement.attach_pending() {
                        log::warn!("ForEach: could not attach new children: {}", err);
                    }
                } else {
                    rebuild(widget, owner, old_child, &new);
                }
            }
            None => {
                owner.append(&new);
                if let Err(err) = widget.add_arranged_subview(&new.release_ui_view()) {
                    log::warn!("ForEach: could not append item {}: {}", index, err);
                }
            }
        }
    }

    for old_child in old.iter().skip(items.len()) {
        if let Some(child) = old_child.widget() {
            child.remove_from_superview();
        }
        owner.remove(old_child);
    }
    log::debug!("ForEach {}: {} items", owner.id(), items.len());
}

/// Swaps `old` for a freshly built `new` at the same position.
fn rebuild(widget: &Widget, owner: &Creator, old: &Creator, new: &Creator) {
    if let Some(index) = owner.index_of_leaf(old) {
        owner.insert(new, index);
        owner.remove(old);
    }

    let arranged = widget.arranged_subviews();
    let old_widget = old.widget();
    let index = old_widget
        .as_ref()
        .and_then(|old_widget| arranged.iter().position(|w| w.ptr_eq(old_widget)))
        .unwrap_or(arranged.len());
    if let Err(err) = widget.insert_arranged_subview(&new.release_ui_view(), index) {
        log::warn!("ForEach: could not rebuild item {}: {}", index, err);
    }
    if let Some(old_widget) = old_widget {
        old_widget.remove_from_superview();
    }
}
