//! Reconciliation of a redeclared creator against the widgets its predecessor built.

use crate::creator::{Creator, CreatorKind, Ownership};
use crate::error::HierarchyError;
use crate::render;
use crate::widget::{CreatorLink, NativeType, Widget};

/// Moves the widget subtree built by one creator over to a freshly declared creator of the same
/// kind, reusing every descendant widget whose creator kind still matches.
///
/// One replacement per instance: construct it from the old creator, then call
/// [`replace`](ReplacementTree::replace).
pub struct ReplacementTree {
    old: Creator,
    pending: Vec<Creator>,
}

impl ReplacementTree {
    pub fn new(old: &Creator) -> ReplacementTree {
        ReplacementTree {
            old: old.clone(),
            pending: Vec::new(),
        }
    }

    /// Reconciles `new` against the old creator.
    ///
    /// Returns false (and changes nothing) if the kinds differ or the old creator has no live
    /// widget; the caller should build `new` from scratch in that case.
    pub fn replace(&mut self, new: &Creator) -> bool {
        let old = self.old.clone();
        if old.ptr_eq(new) {
            return true;
        }
        if old.kind() != new.kind() {
            log::debug!(
                "not reusing {} {}: redeclared as {}",
                old.kind().name(),
                old.id(),
                new.kind().name()
            );
            return false;
        }
        if old.widget().is_none() {
            log::debug!("not reusing {} {}: no live widget", old.kind().name(), old.id());
            return false;
        }

        if let Some(parent) = old.parent() {
            if let Some(previous) = new.parent() {
                previous.remove(new);
            }
            if let Some(index) = parent.index_of_leaf(&old) {
                parent.insert(new, index);
                parent.remove(&old);
            }
        }

        self.pending.clear();
        reconcile(&old, new, &mut self.pending);
        self.pending.retain(|creator| creator.widget().is_none());
        true
    }

    /// New leaves that had no counterpart in the old tree and still have no widget.
    ///
    /// Strong handles: the caller decides whether to build and attach them.
    pub fn pending_additions(&self) -> &[Creator] {
        &self.pending
    }

    /// Builds the pending additions and inserts their widgets after their reused siblings.
    ///
    /// Additions whose parent has no widget are dropped. Returns how many were attached.
    pub fn attach_pending(&mut self) -> Result<usize, HierarchyError> {
        let mut attached = 0;
        for creator in core::mem::take(&mut self.pending) {
            let parent = match creator.parent() {
                Some(parent) => parent,
                None => continue,
            };
            let host = match parent.widget() {
                Some(host) => host,
                None => {
                    log::debug!(
                        "dropping {} {}: parent has no widget",
                        creator.kind().name(),
                        creator.id()
                    );
                    continue;
                }
            };

            let index = parent
                .leaves()
                .iter()
                .take_while(|leaf| !leaf.ptr_eq(&creator))
                .filter(|leaf| leaf.widget().is_some())
                .count();
            let widget = creator.release_ui_view();
            if host.native_type() == NativeType::Stack {
                let index = index.min(host.arranged_subviews().len());
                host.insert_arranged_subview(&widget, index)?;
            } else {
                let index = index.min(host.subviews().len());
                host.insert_subview(&widget, index)?;
            }
            attached += 1;
        }
        Ok(attached)
    }
}

/// Hands `old`'s widget to `new` and recurses into the leaves. Returns false if nothing could be
/// reused.
fn reconcile(old: &Creator, new: &Creator, pending: &mut Vec<Creator>) -> bool {
    if old.kind() != new.kind() {
        return false;
    }
    let widget = match old.widget() {
        Some(widget) => widget,
        None => return false,
    };

    swap(old, new, &widget);

    if new.kind() == CreatorKind::Adaptor {
        // the erased payload can change type freely; never reuse it
        for child in old.leaves() {
            tear_down(old, &child);
        }
        new.stage_body();
    } else {
        new.stage_body();
        reconcile_leaves(old, new, pending);
    }

    commit(new, &widget);
    retire(old);
    log::trace!("{} {} reused widget {}", new.kind().name(), new.id(), widget.id());
    true
}

fn swap(old: &Creator, new: &Creator, widget: &Widget) {
    match old.take_ownership() {
        Ownership::Attached(weak) => {
            new.set_ownership(Ownership::Attached(weak));
            widget.set_creator_link(CreatorLink::Strong(new.clone()));
        }
        Ownership::Owned(owned) => {
            new.set_ownership(Ownership::Owned(owned));
            widget.set_creator_link(CreatorLink::Weak(new.downgrade().0));
        }
        Ownership::Unset => {}
    }
}

/// Matches each old leaf with the first unused new leaf of the same kind.
fn reconcile_leaves(old: &Creator, new: &Creator, pending: &mut Vec<Creator>) {
    let mut candidates: Vec<Option<Creator>> = new.leaves().into_iter().map(Some).collect();

    for old_child in old.leaves() {
        let matched = candidates
            .iter_mut()
            .find(|candidate| {
                candidate
                    .as_ref()
                    .map_or(false, |candidate| candidate.kind() == old_child.kind())
            })
            .and_then(Option::take);

        match matched {
            Some(new_child) => {
                if !reconcile(&old_child, &new_child, pending) {
                    tear_down(old, &old_child);
                    pending.push(new_child);
                }
            }
            None => tear_down(old, &old_child),
        }
    }

    pending.extend(candidates.into_iter().flatten());
}

fn tear_down(parent: &Creator, child: &Creator) {
    if let Some(widget) = child.widget() {
        widget.remove_from_superview();
    }
    parent.remove(child);
    log::trace!("tore down {} {}", child.kind().name(), child.id());
}

/// Runs the new creator's handlers against the reused widget.
fn commit(new: &Creator, widget: &Widget) {
    render::replay(widget);
    new.view_changed(widget);
    new.discard_maker();
}

fn retire(old: &Creator) {
    for leaf in old.leaves() {
        old.remove(&leaf);
    }
    old.discard_maker();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::{Body, OwnershipState};
    use crate::rect::Rect;
    use crate::render::RenderState;
    use crate::widget::NativeType;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn label(text: &'static str) -> Creator {
        Creator::native(NativeType::Label).on_not_rendered(move |w| w.set_text(text))
    }

    fn stack(children: Vec<Creator>) -> Creator {
        let creator = Creator::native(NativeType::Stack);
        for child in &children {
            creator.append(child);
        }
        creator.load_view(move || {
            let widget = Widget::new(NativeType::Stack);
            for child in &children {
                widget.add_arranged_subview(&child.release_ui_view()).unwrap();
            }
            widget
        })
    }

    fn window_with(creator: &Creator) -> Widget {
        let window = Widget::new_window(Rect::from_size(100., 100.));
        window.add_subview(&creator.release_ui_view()).unwrap();
        window
    }

    #[test]
    fn test_same_kind_keeps_widget() {
        let old = label("a");
        let _window = window_with(&old);
        let widget = old.widget().unwrap();
        assert_eq!(widget.text().as_deref(), Some("a"));

        let new = label("b");
        assert!(ReplacementTree::new(&old).replace(&new));

        let reused = new.widget().unwrap();
        assert!(reused.ptr_eq(&widget), "widget identity should be preserved");
        assert_eq!(reused.text().as_deref(), Some("b"));
        assert!(reused.creator().unwrap().ptr_eq(&new));
        assert_eq!(new.ownership_state(), OwnershipState::Attached);
        assert_eq!(old.ownership_state(), OwnershipState::Unset);
        assert_eq!(reused.render_state(), Some(RenderState::InTheScene));
    }

    #[test]
    fn test_different_kind_changes_nothing() {
        let old = stack(vec![label("a")]);
        let _window = window_with(&old);
        let widget = old.widget().unwrap();

        let new = label("b");
        assert!(!ReplacementTree::new(&old).replace(&new));
        assert!(old.widget().unwrap().ptr_eq(&widget));
        assert!(widget.creator().unwrap().ptr_eq(&old));
        assert_eq!(old.leaves().len(), 1);
        assert_eq!(old.ownership_state(), OwnershipState::Attached);
        assert!(new.widget().is_none());
    }

    #[test]
    fn test_unbuilt_old_is_not_reusable() {
        let old = label("a");
        assert!(!ReplacementTree::new(&old).replace(&label("b")));
    }

    #[test]
    fn test_owned_widget_stays_owned() {
        let old = label("a");
        let widget = old.load_view_if_needed();
        let new = label("b");
        assert!(ReplacementTree::new(&old).replace(&new));
        assert_eq!(new.ownership_state(), OwnershipState::Owned);
        assert!(new.widget().unwrap().ptr_eq(&widget));
        assert_eq!(widget.text(), None, "detached widget: handlers wait for attachment");

        Widget::new(NativeType::View).add_subview(&widget).unwrap();
        assert_eq!(widget.text().as_deref(), Some("b"));
    }

    #[test]
    fn test_children_reused_and_torn_down() {
        let old_label = label("a");
        let old_button = Creator::native(NativeType::Button);
        let old = stack(vec![old_label.clone(), old_button.clone()]);
        let _window = window_with(&old);

        let stack_widget = old.widget().unwrap();
        let label_widget = old_label.widget().unwrap();
        let button_widget = old_button.widget().unwrap();

        let new_label = label("b");
        let new = stack(vec![new_label.clone()]);
        let mut replacement = ReplacementTree::new(&old);
        assert!(replacement.replace(&new));
        assert!(replacement.pending_additions().is_empty());

        assert!(new.widget().unwrap().ptr_eq(&stack_widget));
        assert!(new_label.widget().unwrap().ptr_eq(&label_widget));
        assert_eq!(label_widget.text().as_deref(), Some("b"));

        assert!(button_widget.superview().is_none(), "button should be detached");
        assert_eq!(stack_widget.subviews().len(), 1);
        assert!(old.leaves().is_empty());
        assert_eq!(new.leaves().len(), 1);
        assert!(new.leaves()[0].ptr_eq(&new_label));
    }

    #[test]
    fn test_unmatched_new_children_are_pending() {
        let old = stack(vec![label("a")]);
        let _window = window_with(&old);

        let extra = Creator::native(NativeType::Image);
        let new = stack(vec![label("b"), extra.clone()]);
        let mut replacement = ReplacementTree::new(&old);
        assert!(replacement.replace(&new));

        let pending = replacement.pending_additions();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].ptr_eq(&extra));
        assert!(extra.widget().is_none());
        assert_eq!(new.widget().unwrap().subviews().len(), 1);

        assert_eq!(replacement.attach_pending(), Ok(1));
        assert!(replacement.pending_additions().is_empty());
        let arranged = new.widget().unwrap().arranged_subviews();
        assert_eq!(arranged.len(), 2);
        assert!(arranged[1].ptr_eq(&extra.widget().unwrap()));
        assert_eq!(arranged[1].render_state(), Some(RenderState::InTheScene));
    }

    #[test]
    fn test_new_takes_old_position_in_parent() {
        let parent = Creator::native(NativeType::View);
        let (first, old, last) = (label("1"), label("2"), label("3"));
        parent.append(&first);
        parent.append(&old);
        parent.append(&last);
        let _widget = old.release_ui_view();

        let new = label("x");
        assert!(ReplacementTree::new(&old).replace(&new));
        assert_eq!(parent.index_of_leaf(&new), Some(1));
        assert!(!parent.contains_leaf(&old));
        assert!(old.parent().is_none());
    }

    struct Toggle(bool);

    impl Body for Toggle {
        fn body(&self) -> Creator {
            if self.0 {
                label("on")
            } else {
                Creator::native(NativeType::Button)
            }
        }
    }

    #[test]
    fn test_composite_body_changes_type() {
        let old = Creator::from_body(Toggle(true));
        let _window = window_with(&old);
        let container = old.widget().unwrap();
        let old_body = container.subviews()[0].clone();

        let new = Creator::from_body(Toggle(false));
        let mut replacement = ReplacementTree::new(&old);
        assert!(replacement.replace(&new));
        assert!(
            replacement.pending_additions().is_empty(),
            "the container attaches its new body itself"
        );

        assert!(new.widget().unwrap().ptr_eq(&container));
        assert!(old_body.superview().is_none());
        let subviews = container.subviews();
        assert_eq!(subviews.len(), 1);
        assert_eq!(subviews[0].native_type(), NativeType::Button);
        assert_eq!(subviews[0].render_state(), Some(RenderState::InTheScene));
    }

    #[test]
    fn test_composite_body_same_type_is_reused() {
        let old = Creator::from_body(Toggle(true));
        let _window = window_with(&old);
        let body_widget = old.widget().unwrap().subviews()[0].clone();

        let new = Creator::from_body(Toggle(true));
        assert!(ReplacementTree::new(&old).replace(&new));
        let container = new.widget().unwrap();
        assert_eq!(container.subviews().len(), 1);
        assert!(container.subviews()[0].ptr_eq(&body_widget));
    }

    #[test]
    fn test_adaptor_always_rebuilds_payload() {
        let builds = Arc::new(Mutex::new(0));
        let adaptor = |builds: &Arc<Mutex<i32>>| {
            let builds = Arc::clone(builds);
            Creator::adaptor(move || {
                *builds.lock() += 1;
                label("payload")
            })
        };

        let old = adaptor(&builds);
        let _window = window_with(&old);
        let container = old.widget().unwrap();
        let old_payload = container.subviews()[0].clone();

        let new = adaptor(&builds);
        assert!(ReplacementTree::new(&old).replace(&new));
        assert_eq!(*builds.lock(), 2);

        let subviews = container.subviews();
        assert_eq!(subviews.len(), 1);
        assert!(!subviews[0].ptr_eq(&old_payload), "payload should be rebuilt");
        assert!(old_payload.superview().is_none());
        assert_eq!(subviews[0].text().as_deref(), Some("payload"));
        assert_eq!(new.leaves().len(), 1);
    }
}
