//! Creators: declarative descriptions of widgets.
//!
//! A creator is cheap to make and does not build anything on its own. Its widget is built lazily,
//! exactly once, the first time it is needed. Until the widget is released into a hierarchy the
//! creator owns it; afterwards the widget owns the creator and the creator only refers to the
//! widget weakly (see [`OwnershipState`]).

use crate::error::CreatorError;
use crate::handler::{Handler, HandlerList, HandlerQueue, PhaseHandler};
use crate::render::RenderState;
use crate::tree::TreeNode;
use crate::widget::{CreatorLink, NativeType, WeakWidget, Widget};
use core::any::{type_name, TypeId};
use core::fmt;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A unique identifier for a creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreatorId(Uuid);

impl CreatorId {
    fn new() -> CreatorId {
        CreatorId(Uuid::new_v4())
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a creator builds.
///
/// Reconciliation only reuses a widget for a new creator of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatorKind {
    /// A native widget of the given type.
    Native(NativeType),
    /// A container hosting the body of a [`Body`] implementor.
    Composite {
        type_id: TypeId,
        name: &'static str,
    },
    /// A container hosting a type-erased child, rebuilt on every replacement.
    Adaptor,
    /// Anything else; must be given a construction closure with [`Creator::load_view`].
    Custom(&'static str),
}

impl CreatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            CreatorKind::Native(native_type) => native_type.name(),
            CreatorKind::Composite { name, .. } => name,
            CreatorKind::Adaptor => "Adaptor",
            CreatorKind::Custom(name) => name,
        }
    }

    /// The fallback used when no construction closure was set.
    fn default_widget(&self) -> Option<Widget> {
        match self {
            CreatorKind::Native(NativeType::Window) => None,
            CreatorKind::Native(native_type) => Some(Widget::new(*native_type)),
            CreatorKind::Composite { .. } | CreatorKind::Adaptor => {
                Some(Widget::new(NativeType::Container))
            }
            CreatorKind::Custom(_) => None,
        }
    }
}

/// Composite creators describe their content as a body made of other creators.
///
/// `body` should be cheap and free of side effects: it may be called again whenever the creator
/// is redeclared.
pub trait Body: Send + Sync + 'static {
    fn body(&self) -> Creator;
}

/// Adaptor payload.
struct ErasedBody<F>(F);

impl<F> Body for ErasedBody<F>
where
    F: Fn() -> Creator + Send + Sync + 'static,
{
    fn body(&self) -> Creator {
        (self.0)()
    }
}

type Maker = Box<dyn FnOnce() -> Widget + Send>;

/// Who anchors the widget's lifetime.
pub(crate) enum Ownership {
    /// No widget yet (or the creator was retired by a replacement).
    Unset,
    /// Not yet released: the creator owns the widget.
    Owned(Widget),
    /// Released into a hierarchy: the widget owns the creator.
    Attached(WeakWidget),
}

impl Ownership {
    fn widget(&self) -> Option<Widget> {
        match self {
            Ownership::Unset => None,
            Ownership::Owned(widget) => Some(widget.clone()),
            Ownership::Attached(widget) => widget.upgrade(),
        }
    }
}

/// Public view of [`Ownership`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipState {
    Unset,
    Owned,
    Attached,
}

pub(crate) struct Store {
    ownership: Ownership,
    maker: Option<Maker>,
    body: Option<Arc<dyn Body>>,
    /// Body creator built ahead of attachment; kept alive until its widget is in the container.
    staged_body: Option<Creator>,
    not_rendered: HandlerQueue,
    rendered: HandlerQueue,
    in_the_scene: HandlerQueue,
    appear: HandlerList,
    disappear: HandlerList,
    layout: HandlerList,
}

pub(crate) struct CreatorInner {
    id: CreatorId,
    kind: CreatorKind,
    store: Mutex<Store>,
    pub(crate) tree: Mutex<TreeNode>,
}

/// A handle to a creator. Clones share identity.
#[derive(Clone)]
pub struct Creator(pub(crate) Arc<CreatorInner>);

/// A weak handle to a creator.
#[derive(Clone, Default)]
pub struct WeakCreator(pub(crate) Weak<CreatorInner>);

impl WeakCreator {
    pub fn upgrade(&self) -> Option<Creator> {
        self.0.upgrade().map(Creator)
    }

    /// Returns true if this refers to `creator`.
    pub fn is(&self, creator: &Creator) -> bool {
        core::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&creator.0))
    }
}

impl Creator {
    pub fn new(kind: CreatorKind) -> Creator {
        Creator::with_body(kind, None)
    }

    /// A creator for a native widget.
    pub fn native(native_type: NativeType) -> Creator {
        Creator::new(CreatorKind::Native(native_type))
    }

    /// A composite creator; its body is inserted into a container the first time the container is
    /// empty.
    pub fn from_body<B: Body>(body: B) -> Creator {
        let kind = CreatorKind::Composite {
            type_id: TypeId::of::<B>(),
            name: type_name::<B>(),
        };
        Creator::with_body(kind, Some(Arc::new(body)))
    }

    /// An adaptor hosting whatever `make` returns.
    pub fn adaptor<F>(make: F) -> Creator
    where
        F: Fn() -> Creator + Send + Sync + 'static,
    {
        Creator::with_body(CreatorKind::Adaptor, Some(Arc::new(ErasedBody(make))))
    }

    fn with_body(kind: CreatorKind, body: Option<Arc<dyn Body>>) -> Creator {
        Creator(Arc::new(CreatorInner {
            id: CreatorId::new(),
            kind,
            store: Mutex::new(Store {
                ownership: Ownership::Unset,
                maker: None,
                body,
                staged_body: None,
                not_rendered: HandlerQueue::default(),
                rendered: HandlerQueue::default(),
                in_the_scene: HandlerQueue::default(),
                appear: HandlerList::default(),
                disappear: HandlerList::default(),
                layout: HandlerList::default(),
            }),
            tree: Mutex::new(TreeNode::default()),
        }))
    }

    pub fn id(&self) -> CreatorId {
        self.0.id
    }

    pub fn kind(&self) -> CreatorKind {
        self.0.kind
    }

    /// Returns true if both handles refer to the same creator.
    pub fn ptr_eq(&self, other: &Creator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakCreator {
        WeakCreator(Arc::downgrade(&self.0))
    }

    /// Sets the closure that builds the widget. The last one set wins.
    pub fn load_view<F>(self, make: F) -> Self
    where
        F: FnOnce() -> Widget + Send + 'static,
    {
        self.0.store.lock().maker = Some(Box::new(make));
        self
    }

    /// Runs once, right before the widget is attached to a superview.
    pub fn on_not_rendered<F>(self, handler: F) -> Self
    where
        F: FnOnce(&Widget) + Send + 'static,
    {
        self.push_phase_handler(RenderState::NotRendered, Box::new(handler));
        self
    }

    /// Runs once, after the widget is attached to a superview.
    pub fn on_rendered<F>(self, handler: F) -> Self
    where
        F: FnOnce(&Widget) + Send + 'static,
    {
        self.push_phase_handler(RenderState::Rendered, Box::new(handler));
        self
    }

    /// Runs once, after the widget is in a window.
    pub fn on_in_the_scene<F>(self, handler: F) -> Self
    where
        F: FnOnce(&Widget) + Send + 'static,
    {
        self.push_phase_handler(RenderState::InTheScene, Box::new(handler));
        self
    }

    /// Runs every time the widget enters a window.
    pub fn on_appear<F>(self, handler: F) -> Self
    where
        F: Fn(&Widget) + Send + Sync + 'static,
    {
        self.0.store.lock().appear.push(Arc::new(handler));
        self
    }

    /// Runs every time the widget leaves a window.
    pub fn on_disappear<F>(self, handler: F) -> Self
    where
        F: Fn(&Widget) + Send + Sync + 'static,
    {
        self.0.store.lock().disappear.push(Arc::new(handler));
        self
    }

    /// Runs on every layout pass.
    pub fn on_layout<F>(self, handler: F) -> Self
    where
        F: Fn(&Widget) + Send + Sync + 'static,
    {
        self.0.store.lock().layout.push(Arc::new(handler));
        self
    }

    fn push_phase_handler(&self, phase: RenderState, handler: PhaseHandler) {
        let mut store = self.0.store.lock();
        match phase {
            RenderState::NotRendered => store.not_rendered.push(handler),
            RenderState::Rendered => store.rendered.push(handler),
            RenderState::InTheScene => store.in_the_scene.push(handler),
        }
    }

    pub(crate) fn take_phase_handlers(&self, phase: RenderState) -> Vec<PhaseHandler> {
        let mut store = self.0.store.lock();
        match phase {
            RenderState::NotRendered => store.not_rendered.take(),
            RenderState::Rendered => store.rendered.take(),
            RenderState::InTheScene => store.in_the_scene.take(),
        }
    }

    /// Number of one-shot handlers still waiting for `phase`.
    pub fn pending_handlers(&self, phase: RenderState) -> usize {
        let store = self.0.store.lock();
        match phase {
            RenderState::NotRendered => store.not_rendered.len(),
            RenderState::Rendered => store.rendered.len(),
            RenderState::InTheScene => store.in_the_scene.len(),
        }
    }

    pub(crate) fn appear_handlers(&self) -> Vec<Handler> {
        self.0.store.lock().appear.snapshot()
    }

    pub(crate) fn disappear_handlers(&self) -> Vec<Handler> {
        self.0.store.lock().disappear.snapshot()
    }

    pub(crate) fn layout_handlers(&self) -> Vec<Handler> {
        self.0.store.lock().layout.snapshot()
    }

    /// The widget, if it has been built and is still alive. Never builds it.
    pub fn widget(&self) -> Option<Widget> {
        self.0.store.lock().ownership.widget()
    }

    pub fn ownership_state(&self) -> OwnershipState {
        match self.0.store.lock().ownership {
            Ownership::Unset => OwnershipState::Unset,
            Ownership::Owned(_) => OwnershipState::Owned,
            Ownership::Attached(_) => OwnershipState::Attached,
        }
    }

    /// The render state of the widget, if it has been built.
    pub fn render_state(&self) -> Option<RenderState> {
        self.widget().and_then(|widget| widget.render_state())
    }

    /// Returns the widget, building it if needed.
    ///
    /// The construction closure runs at most once; without one, the kind's default maker is used.
    pub fn try_load_view(&self) -> Result<Widget, CreatorError> {
        let maker = {
            let mut store = self.0.store.lock();
            if let Some(widget) = store.ownership.widget() {
                return Ok(widget);
            }
            store.maker.take()
        };

        let widget = match maker {
            Some(make) => make(),
            None => match self.0.kind.default_widget() {
                Some(widget) => widget,
                None => {
                    return Err(CreatorError::NoConstructionStrategy {
                        id: self.id(),
                        kind: self.kind().name().to_string(),
                    })
                }
            },
        };

        if !widget.has_creator_link() {
            widget.set_creator_link(CreatorLink::Weak(self.downgrade().0));
        }
        self.0.store.lock().ownership = Ownership::Owned(widget.clone());
        log::trace!("{} {}: built widget {}", self.kind().name(), self.id(), widget.id());

        self.view_changed(&widget);
        Ok(widget)
    }

    /// Returns the widget, building it if needed.
    ///
    /// # Panics
    /// - if the creator has neither a construction closure nor a default maker
    pub fn load_view_if_needed(&self) -> Widget {
        match self.try_load_view() {
            Ok(widget) => widget,
            Err(err) => panic!("Creator::load_view_if_needed: {}", err),
        }
    }

    /// Builds the widget if needed and hands it out for insertion into a hierarchy.
    ///
    /// If the widget still describes this creator, ownership inverts: the widget keeps the
    /// creator alive and the creator only refers to the widget weakly.
    pub fn release_ui_view(&self) -> Widget {
        let widget = self.load_view_if_needed();
        if widget.creator_is(self) {
            widget.set_creator_link(CreatorLink::Strong(self.clone()));
            self.0.store.lock().ownership = Ownership::Attached(widget.downgrade());
        }
        widget
    }

    /// Inserts the body into the container widget the first time it is empty.
    pub(crate) fn view_changed(&self, widget: &Widget) {
        if self.0.store.lock().body.is_none() {
            return;
        }
        if !widget.subviews().is_empty() {
            let staged = self.0.store.lock().staged_body.take();
            drop(staged);
            return;
        }

        let child = match self.stage_body() {
            Some(child) => child,
            None => return,
        };
        let result = widget.add_subview(&child.release_ui_view());
        let staged = self.0.store.lock().staged_body.take();
        drop(staged);
        if let Err(err) = result {
            log::warn!("{} {}: could not insert body: {}", self.kind().name(), self.id(), err);
        }
    }

    /// Builds the body creator (without its widget) and makes it a leaf, unless that already
    /// happened.
    pub(crate) fn stage_body(&self) -> Option<Creator> {
        let body = {
            let store = self.0.store.lock();
            if let Some(staged) = &store.staged_body {
                return Some(staged.clone());
            }
            store.body.clone()?
        };
        let child = body.body();
        self.append(&child);
        self.0.store.lock().staged_body = Some(child.clone());
        Some(child)
    }

    pub(crate) fn take_ownership(&self) -> Ownership {
        core::mem::replace(&mut self.0.store.lock().ownership, Ownership::Unset)
    }

    pub(crate) fn set_ownership(&self, ownership: Ownership) {
        let previous = core::mem::replace(&mut self.0.store.lock().ownership, ownership);
        drop(previous);
    }

    /// Drops the construction closure and anything staged; used once the widget exists.
    pub(crate) fn discard_maker(&self) {
        let (maker, staged) = {
            let mut store = self.0.store.lock();
            (store.maker.take(), store.staged_body.take())
        };
        drop((maker, staged));
    }
}

impl fmt::Debug for Creator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Creator")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind.name())
            .field("ownership", &self.ownership_state())
            .finish()
    }
}
