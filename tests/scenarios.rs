use parking_lot::Mutex;
use perch::widgets::{button, label, vstack};
use perch::{
    Creator, Host, HostConfig, NativeType, OwnershipState, Rect, RenderState, ReplacementTree,
    Widget,
};
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, entry: &str) -> impl Fn(&Widget) + Send + Sync + 'static {
    let (log, entry) = (Arc::clone(log), entry.to_string());
    move |_| log.lock().push(entry.clone())
}

#[test]
fn materialization_is_idempotent() {
    let creator = label("x");
    let first = creator.load_view_if_needed();
    let second = creator.load_view_if_needed();
    assert!(first.ptr_eq(&second));
    assert_eq!(creator.ownership_state(), OwnershipState::Owned);
}

#[test]
fn phases_run_in_order_once() {
    let log = Log::default();
    let (a, b, c) = (
        record(&log, "not_rendered"),
        record(&log, "rendered"),
        record(&log, "in_the_scene"),
    );
    let creator = Creator::native(NativeType::View)
        .on_not_rendered(move |w| a(w))
        .on_rendered(move |w| b(w))
        .on_in_the_scene(move |w| c(w));

    let host = Host::new(creator, HostConfig::default()).unwrap();
    assert_eq!(*log.lock(), vec!["not_rendered", "rendered", "in_the_scene"]);

    // moving within the window does not run one-shot handlers again
    let widget = host.root().widget().unwrap();
    host.window().insert_subview(&widget, 0).unwrap();
    assert_eq!(log.lock().len(), 3);
}

#[test]
fn later_handlers_for_a_phase_run_first() {
    let log = Log::default();
    let (first, second) = (record(&log, "first"), record(&log, "second"));
    let creator = Creator::native(NativeType::View)
        .on_rendered(move |w| first(w))
        .on_rendered(move |w| second(w));
    let parent = Widget::new(NativeType::View);
    parent.add_subview(&creator.release_ui_view()).unwrap();
    assert_eq!(*log.lock(), vec!["second", "first"]);
}

#[test]
fn text_is_applied_before_rendered_handlers() {
    let seen = Arc::new(Mutex::new(None));
    let s = Arc::clone(&seen);
    let creator = label("x").on_rendered(move |widget| *s.lock() = widget.text());

    let widget = creator.release_ui_view();
    let parent = Widget::new(NativeType::View);
    parent.add_subview(&widget).unwrap();
    assert_eq!(seen.lock().as_deref(), Some("x"));
}

#[test]
fn reconciling_reuses_label_and_removes_button() {
    let (old_label, old_button) = (label("a"), button("go"));
    let old = vstack(vec![old_label.clone(), old_button.clone()]);
    let host = Host::new(old.clone(), HostConfig::default()).unwrap();
    let label_widget = old_label.widget().unwrap();
    let button_widget = old_button.widget().unwrap();

    let new_label = label("b");
    let new = vstack(vec![new_label.clone()]);
    assert!(ReplacementTree::new(&old).replace(&new));

    assert!(new_label.widget().unwrap().ptr_eq(&label_widget));
    assert_eq!(label_widget.text().as_deref(), Some("b"));
    assert_eq!(label_widget.render_state(), Some(RenderState::InTheScene));
    assert!(button_widget.superview().is_none());
    assert!(!old.contains_leaf(&old_button));
    let stack = new.widget().unwrap();
    assert!(stack.superview().unwrap().ptr_eq(host.window()));
    assert_eq!(old.ownership_state(), OwnershipState::Unset);
}

#[test]
fn mismatched_kinds_leave_everything_alone() {
    let old = label("a");
    let host = Host::new(old.clone(), HostConfig::default()).unwrap();
    let widget = old.widget().unwrap();

    assert!(!ReplacementTree::new(&old).replace(&button("b")));
    assert!(widget.creator().unwrap().ptr_eq(&old));
    assert_eq!(widget.text().as_deref(), Some("a"));
    assert!(widget.superview().unwrap().ptr_eq(host.window()));
}

#[test]
#[should_panic]
fn removing_a_removed_leaf_is_fatal() {
    let parent = vstack(Vec::new());
    let leaf = label("a");
    parent.append(&leaf);
    parent.remove(&leaf);
    parent.remove(&leaf);
}

#[test]
fn appear_and_layout_follow_the_host() {
    let log = Log::default();
    let (appear, disappear, layout) = (
        record(&log, "appear"),
        record(&log, "disappear"),
        record(&log, "layout"),
    );
    let root = vstack(vec![label("a")])
        .on_appear(appear)
        .on_disappear(disappear)
        .on_layout(layout);

    let config = HostConfig {
        frame: Rect::from_size(100., 40.),
        ..HostConfig::default()
    };
    let mut host = Host::new(root, config).unwrap();
    host.poll();
    host.poll();
    let child = host.root().leaves()[0].widget().unwrap();
    assert_eq!(child.frame(), Rect::from_size(100., 40.));

    drop(host);
    assert_eq!(*log.lock(), vec!["appear", "layout", "layout", "disappear"]);
}
