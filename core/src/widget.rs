//! The retained host widget hierarchy.
//!
//! Widgets are the concrete objects a creator eventually builds. They form a tree of their own
//! (superview, ordered subviews, a window at the root) that is independent of the creator tree.
//! Every mutation of that tree emits the hierarchy callbacks (will move to superview, did move to
//! superview, did move to window) into the render manager.

use crate::creator::{Creator, CreatorId, CreatorInner};
use crate::error::HierarchyError;
use crate::rect::Rect;
use crate::render::{self, RenderManager, RenderState};
use core::any::Any;
use core::fmt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A unique identifier for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(Uuid);

impl WidgetId {
    pub(crate) fn new() -> WidgetId {
        WidgetId(Uuid::new_v4())
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Types of native widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// A plain view.
    View,
    Label,
    Button,
    TextField,
    Image,
    /// Lays out its arranged subviews; only those are watched for render phases.
    Stack,
    /// Hosts the body of a composite creator. Receives layout callbacks from the host itself.
    Container,
    /// The root of a hierarchy. Must be created with [`Widget::new_window`].
    Window,
}

impl NativeType {
    pub fn name(self) -> &'static str {
        match self {
            NativeType::View => "View",
            NativeType::Label => "Label",
            NativeType::Button => "Button",
            NativeType::TextField => "TextField",
            NativeType::Image => "Image",
            NativeType::Stack => "Stack",
            NativeType::Container => "Container",
            NativeType::Window => "Window",
        }
    }

    /// Self-managed widgets get `layout_subviews` from the host; all others are laid out by their
    /// closest self-managed ancestor.
    fn is_self_managed(self) -> bool {
        match self {
            NativeType::Container | NativeType::Window => true,
            _ => false,
        }
    }
}

/// A native widget property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Text(String),
    Bool(bool),
    Number(f64),
}

/// Back-reference from a widget to the creator describing it.
pub(crate) enum CreatorLink {
    /// The creator anchors the widget.
    Weak(Weak<CreatorInner>),
    /// The widget was released into a hierarchy and anchors the creator.
    Strong(Creator),
}

impl CreatorLink {
    fn get(&self) -> Option<Creator> {
        match self {
            CreatorLink::Weak(weak) => weak.upgrade().map(Creator),
            CreatorLink::Strong(creator) => Some(creator.clone()),
        }
    }

    fn points_at(&self, creator: &Creator) -> bool {
        match self {
            CreatorLink::Weak(weak) => core::ptr::eq(weak.as_ptr(), Arc::as_ptr(&creator.0)),
            CreatorLink::Strong(linked) => linked.ptr_eq(creator),
        }
    }
}

struct WidgetState {
    superview: Weak<WidgetInner>,
    subviews: Vec<Widget>,
    /// Subset of `subviews` that a stack arranges.
    arranged: Vec<WidgetId>,
    frame: Rect,
    props: BTreeMap<&'static str, Prop>,
    creator: Option<CreatorLink>,
    render: RenderManager,
    /// Objects that live as long as the widget (e.g. relay subscriptions).
    retained: Vec<Box<dyn Any + Send>>,
    /// Objects that live until the widget is handed to a different creator.
    bindings: Vec<(CreatorId, Box<dyn Any + Send>)>,
}

pub(crate) struct WidgetInner {
    id: WidgetId,
    native_type: NativeType,
    state: Mutex<WidgetState>,
}

/// A strong handle to a native widget.
///
/// Cloning the handle does not clone the widget.
#[derive(Clone)]
pub struct Widget(Arc<WidgetInner>);

/// A weak handle to a native widget.
#[derive(Clone, Default)]
pub struct WeakWidget(Weak<WidgetInner>);

impl WeakWidget {
    pub fn upgrade(&self) -> Option<Widget> {
        self.0.upgrade().map(Widget)
    }
}

impl Widget {
    /// Creates a detached widget.
    ///
    /// # Panics
    /// - if `native_type` is [`NativeType::Window`]; windows are created with [`Widget::new_window`]
    pub fn new(native_type: NativeType) -> Widget {
        if native_type == NativeType::Window {
            panic!("Widget::new: windows must be created with Widget::new_window");
        }
        Widget::with_type(native_type, Rect::zero())
    }

    /// Creates a window: the root of a widget hierarchy.
    pub fn new_window(frame: Rect) -> Widget {
        Widget::with_type(NativeType::Window, frame)
    }

    fn with_type(native_type: NativeType, frame: Rect) -> Widget {
        Widget(Arc::new(WidgetInner {
            id: WidgetId::new(),
            native_type,
            state: Mutex::new(WidgetState {
                superview: Weak::new(),
                subviews: Vec::new(),
                arranged: Vec::new(),
                frame,
                props: BTreeMap::new(),
                creator: None,
                render: RenderManager::default(),
                retained: Vec::new(),
                bindings: Vec::new(),
            }),
        }))
    }

    pub fn id(&self) -> WidgetId {
        self.0.id
    }

    pub fn native_type(&self) -> NativeType {
        self.0.native_type
    }

    /// Returns true if both handles refer to the same widget.
    pub fn ptr_eq(&self, other: &Widget) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakWidget {
        WeakWidget(Arc::downgrade(&self.0))
    }

    pub fn superview(&self) -> Option<Widget> {
        self.0.state.lock().superview.upgrade().map(Widget)
    }

    pub fn subviews(&self) -> Vec<Widget> {
        self.0.state.lock().subviews.clone()
    }

    /// The subviews a stack arranges, in subview order.
    pub fn arranged_subviews(&self) -> Vec<Widget> {
        let state = self.0.state.lock();
        state
            .subviews
            .iter()
            .filter(|subview| state.arranged.contains(&subview.id()))
            .cloned()
            .collect()
    }

    /// The window at the root of this widget's hierarchy, if any.
    pub fn window(&self) -> Option<Widget> {
        let mut current = self.clone();
        loop {
            if current.native_type() == NativeType::Window {
                return Some(current);
            }
            current = current.superview()?;
        }
    }

    /// Returns true if `ancestor` is a (transitive) superview of this widget.
    pub fn is_descendant_of(&self, ancestor: &Widget) -> bool {
        let mut current = self.superview();
        while let Some(widget) = current {
            if widget.ptr_eq(ancestor) {
                return true;
            }
            current = widget.superview();
        }
        false
    }

    pub fn frame(&self) -> Rect {
        self.0.state.lock().frame
    }

    pub fn set_frame(&self, frame: Rect) {
        self.0.state.lock().frame = frame;
    }

    pub fn prop(&self, key: &str) -> Option<Prop> {
        self.0.state.lock().props.get(key).cloned()
    }

    pub fn set_prop(&self, key: &'static str, value: Prop) {
        self.0.state.lock().props.insert(key, value);
    }

    /// The `text` property, if it is set to text.
    pub fn text(&self) -> Option<String> {
        match self.prop("text") {
            Some(Prop::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.set_prop("text", Prop::Text(text.into()));
    }

    /// Keeps `object` alive for as long as the widget lives.
    pub fn retain(&self, object: impl Any + Send) {
        self.0.state.lock().retained.push(Box::new(object));
    }

    /// Keeps `object` alive while the widget is described by the creator `owner`.
    ///
    /// It is dropped as soon as another creator takes the widget over, e.g. in a replacement pass.
    pub fn retain_for(&self, owner: CreatorId, object: impl Any + Send) {
        self.0.state.lock().bindings.push((owner, Box::new(object)));
    }

    /// Number of objects held with [`retain_for`](Widget::retain_for).
    pub fn binding_count(&self) -> usize {
        self.0.state.lock().bindings.len()
    }

    /// The highest render phase delivered to this widget.
    pub fn render_state(&self) -> Option<RenderState> {
        self.0.state.lock().render.fired()
    }

    /// The creator currently describing this widget.
    pub fn creator(&self) -> Option<Creator> {
        self.0.state.lock().creator.as_ref().and_then(CreatorLink::get)
    }

    pub(crate) fn creator_is(&self, creator: &Creator) -> bool {
        self.0
            .state
            .lock()
            .creator
            .as_ref()
            .map_or(false, |link| link.points_at(creator))
    }

    pub(crate) fn has_creator_link(&self) -> bool {
        self.0
            .state
            .lock()
            .creator
            .as_ref()
            .map_or(false, |link| link.get().is_some())
    }

    pub(crate) fn set_creator_link(&self, link: CreatorLink) {
        let owner = link.get().map(|creator| creator.id());
        // the previous link may be the last strong reference to a creator; drop it unlocked
        let (previous, stale) = {
            let mut state = self.0.state.lock();
            let stale: Vec<_> = match owner {
                Some(owner) => {
                    let (kept, stale) = state.bindings.drain(..).partition(|(id, _)| *id == owner);
                    state.bindings = kept;
                    stale
                }
                None => state.bindings.drain(..).collect(),
            };
            (state.creator.replace(link), stale)
        };
        drop((previous, stale));
    }

    pub(crate) fn with_render<R>(&self, f: impl FnOnce(&mut RenderManager) -> R) -> R {
        f(&mut self.0.state.lock().render)
    }

    pub(crate) fn is_self_managed(&self) -> bool {
        self.native_type().is_self_managed()
    }

    /// The widgets that receive render phases together with this one.
    pub(crate) fn watched(&self) -> Vec<Widget> {
        if self.native_type() == NativeType::Stack {
            self.arranged_subviews()
        } else {
            self.subviews()
        }
    }

    /// Appends a subview.
    pub fn add_subview(&self, subview: &Widget) -> Result<(), HierarchyError> {
        let len = self.0.state.lock().subviews.len();
        self.insert(subview, len, false)
    }

    /// Inserts a subview at the given position, moving it out of its current superview first.
    pub fn insert_subview(&self, subview: &Widget, index: usize) -> Result<(), HierarchyError> {
        self.insert(subview, index, false)
    }

    /// Appends a subview that this stack arranges.
    pub fn add_arranged_subview(&self, subview: &Widget) -> Result<(), HierarchyError> {
        let len = self.0.state.lock().subviews.len();
        self.insert(subview, len, true)
    }

    /// Inserts an arranged subview; `index` is a position among the arranged subviews.
    ///
    /// When `subview` is already in this widget, `index` counts the arranged subviews without it.
    pub fn insert_arranged_subview(
        &self,
        subview: &Widget,
        index: usize,
    ) -> Result<(), HierarchyError> {
        let others = |widgets: Vec<Widget>| -> Vec<Widget> {
            widgets.into_iter().filter(|w| !w.ptr_eq(subview)).collect()
        };
        let arranged = others(self.arranged_subviews());
        if index > arranged.len() {
            return Err(HierarchyError::IndexOutOfBounds {
                index,
                len: arranged.len(),
            });
        }
        let subviews = others(self.subviews());
        let subview_index = match arranged.get(index) {
            Some(next) => subviews
                .iter()
                .position(|widget| widget.ptr_eq(next))
                .unwrap_or(0),
            None => subviews.len(),
        };
        self.insert(subview, subview_index, true)
    }

    fn insert(&self, subview: &Widget, index: usize, arranged: bool) -> Result<(), HierarchyError> {
        if self.ptr_eq(subview) {
            return Err(HierarchyError::SelfInsertion(subview.id()));
        }
        if self.is_descendant_of(subview) {
            return Err(HierarchyError::Cycle(subview.id()));
        }

        let old_superview = subview.superview();
        let is_move_within = old_superview
            .as_ref()
            .map_or(false, |superview| superview.ptr_eq(self));
        let len = self.0.state.lock().subviews.len() - if is_move_within { 1 } else { 0 };
        if index > len {
            return Err(HierarchyError::IndexOutOfBounds { index, len });
        }
        let old_window = subview.window();

        render::will_move_to_superview(subview, Some(self));

        if let Some(old_superview) = &old_superview {
            old_superview.detach(subview);
        }
        {
            let mut state = self.0.state.lock();
            // handlers may have changed the subview list in the meantime
            let index = index.min(state.subviews.len());
            state.subviews.insert(index, subview.clone());
            if arranged {
                state.arranged.push(subview.id());
            }
        }
        subview.0.state.lock().superview = Arc::downgrade(&self.0);

        render::did_move_to_superview(subview);

        let new_window = subview.window();
        let window_changed = match (&old_window, &new_window) {
            (Some(a), Some(b)) => !a.ptr_eq(b),
            (None, None) => false,
            _ => true,
        };
        if window_changed {
            subview.notify_window_change();
        }
        Ok(())
    }

    /// Removes this widget from its superview. Does nothing if it has none.
    pub fn remove_from_superview(&self) {
        let superview = match self.superview() {
            Some(superview) => superview,
            None => return,
        };
        let had_window = self.window().is_some();

        render::will_move_to_superview(self, None);
        superview.detach(self);
        self.0.state.lock().superview = Weak::new();
        render::did_move_to_superview(self);

        if had_window {
            self.notify_window_change();
        }
    }

    /// Removes a subview from the lists without emitting callbacks.
    fn detach(&self, subview: &Widget) {
        let removed = {
            let mut state = self.0.state.lock();
            state.arranged.retain(|id| *id != subview.id());
            let position = state.subviews.iter().position(|w| w.ptr_eq(subview));
            position.map(|position| state.subviews.remove(position))
        };
        // dropped outside the lock
        drop(removed);
    }

    /// Sends `did_move_to_window` to this widget and all of its descendants, top-down.
    fn notify_window_change(&self) {
        render::did_move_to_window(self);
        for subview in self.subviews() {
            subview.notify_window_change();
        }
    }

    /// Runs a layout pass rooted at this widget.
    ///
    /// This widget is always laid out; below it, the host only calls `layout_subviews` on
    /// self-managed widgets and leaves the rest to the render manager.
    pub fn layout_if_needed(&self) {
        render::layout_subviews(self);
        self.layout_self_managed_descendants();
    }

    fn layout_self_managed_descendants(&self) {
        for subview in self.subviews() {
            if subview.is_self_managed() {
                render::layout_subviews(&subview);
            }
            subview.layout_self_managed_descendants();
        }
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("Widget")
            .field("id", &self.0.id)
            .field("native_type", &self.0.native_type)
            .field("frame", &state.frame)
            .field("props", &state.props)
            .field("subviews", &state.subviews.len())
            .field("render", &state.render.fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_hierarchy() {
        let window = Widget::new_window(Rect::from_size(100., 100.));
        let a = Widget::new(NativeType::View);
        let b = Widget::new(NativeType::Label);

        a.add_subview(&b).unwrap();
        assert!(b.superview().unwrap().ptr_eq(&a));
        assert!(b.window().is_none(), "detached hierarchy has no window");

        window.add_subview(&a).unwrap();
        assert!(b.window().unwrap().ptr_eq(&window));
        assert!(b.is_descendant_of(&window));

        assert_eq!(
            a.add_subview(&a),
            Err(HierarchyError::SelfInsertion(a.id()))
        );
        assert_eq!(b.add_subview(&a), Err(HierarchyError::Cycle(a.id())));
        assert_eq!(
            a.insert_subview(&Widget::new(NativeType::View), 5),
            Err(HierarchyError::IndexOutOfBounds { index: 5, len: 1 })
        );

        b.remove_from_superview();
        assert!(b.superview().is_none());
        assert!(a.subviews().is_empty());
    }

    #[test]
    fn test_move_between_superviews() {
        let a = Widget::new(NativeType::View);
        let b = Widget::new(NativeType::View);
        let child = Widget::new(NativeType::Label);

        a.add_subview(&child).unwrap();
        b.add_subview(&child).unwrap();
        assert!(a.subviews().is_empty(), "moving should remove from the old superview");
        assert_eq!(b.subviews().len(), 1);

        // moving within the same superview
        let other = Widget::new(NativeType::Label);
        b.add_subview(&other).unwrap();
        b.insert_subview(&other, 0).unwrap();
        let order: Vec<_> = b.subviews().iter().map(Widget::id).collect();
        assert_eq!(order, vec![other.id(), child.id()]);
    }

    #[test]
    fn test_arranged_subviews() {
        let stack = Widget::new(NativeType::Stack);
        let decoration = Widget::new(NativeType::View);
        let a = Widget::new(NativeType::Label);
        let b = Widget::new(NativeType::Label);

        stack.add_arranged_subview(&a).unwrap();
        stack.add_subview(&decoration).unwrap();
        stack.insert_arranged_subview(&b, 0).unwrap();

        let arranged: Vec<_> = stack.arranged_subviews().iter().map(Widget::id).collect();
        assert_eq!(arranged, vec![b.id(), a.id()]);
        assert_eq!(stack.watched().len(), 2, "stacks only watch arranged subviews");
        assert_eq!(stack.subviews().len(), 3);

        a.remove_from_superview();
        assert_eq!(stack.arranged_subviews().len(), 1);
    }

    #[test]
    fn test_move_arranged_subview_within_stack() {
        let stack = Widget::new(NativeType::Stack);
        let (a, b, c) = (
            Widget::new(NativeType::Label),
            Widget::new(NativeType::Label),
            Widget::new(NativeType::Label),
        );
        for widget in [&a, &b, &c] {
            stack.add_arranged_subview(widget).unwrap();
        }

        stack.insert_arranged_subview(&a, 2).unwrap();
        let order: Vec<_> = stack.arranged_subviews().iter().map(Widget::id).collect();
        assert_eq!(order, vec![b.id(), c.id(), a.id()]);

        stack.insert_arranged_subview(&a, 0).unwrap();
        let order: Vec<_> = stack.arranged_subviews().iter().map(Widget::id).collect();
        assert_eq!(order, vec![a.id(), b.id(), c.id()]);
        assert_eq!(stack.subviews().len(), 3);

        assert_eq!(
            stack.insert_arranged_subview(&a, 3),
            Err(HierarchyError::IndexOutOfBounds { index: 3, len: 2 })
        );
    }

    #[test]
    #[should_panic]
    fn test_window_requires_factory() {
        Widget::new(NativeType::Window);
    }

    #[test]
    fn test_props() {
        let label = Widget::new(NativeType::Label);
        assert_eq!(label.text(), None);
        label.set_text("hello");
        assert_eq!(label.text().as_deref(), Some("hello"));
        label.set_prop("enabled", Prop::Bool(false));
        assert_eq!(label.prop("enabled"), Some(Prop::Bool(false)));
    }
}
