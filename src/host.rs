use crate::HostConfig;
use crossbeam::channel::{self, Receiver, Sender};
use perch_core::{Creator, HierarchyError, ReplacementTree, Widget};

type Task = Box<dyn FnOnce() + Send>;

/// Defers work to the next [`Host::poll`].
///
/// Can be cloned and sent to other threads; the tasks still run on the thread polling the host.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Sender<Task>,
}

impl Dispatcher {
    /// Queues `task` to run on the next turn of the run loop.
    pub fn dispatch<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(task)).is_err() {
            log::warn!("Dispatcher: host is gone, dropping task");
        }
    }
}

/// Connects a root creator to a window and runs deferred work.
pub struct Host {
    window: Widget,
    root: Creator,
    config: HostConfig,
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl Host {
    /// Creates a new Host.
    ///
    /// The root creator's widget is built and put into the window right away, so its render
    /// phases run before this returns. Nothing is laid out until you call [`poll`](Host::poll) or
    /// [`layout`](Host::layout).
    pub fn new(root: Creator, config: HostConfig) -> Result<Host, HierarchyError> {
        Host::build(config, |_| root)
    }

    /// Like [`new`](Host::new), for roots that need to dispatch work to this host.
    pub fn build<F>(config: HostConfig, make_root: F) -> Result<Host, HierarchyError>
    where
        F: FnOnce(Dispatcher) -> Creator,
    {
        let (sender, receiver) = channel::unbounded();
        let root = make_root(Dispatcher {
            sender: sender.clone(),
        });
        let window = Widget::new_window(config.frame);
        window.add_subview(&root.release_ui_view())?;
        log::debug!("Host: attached {} {}", root.kind().name(), root.id());

        Ok(Host {
            window,
            root,
            config,
            sender,
            receiver,
        })
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            sender: self.sender.clone(),
        }
    }

    pub fn window(&self) -> &Widget {
        &self.window
    }

    pub fn root(&self) -> &Creator {
        &self.root
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Runs all work dispatched before this call, then lays out if configured to.
    ///
    /// Work dispatched by the tasks themselves waits for the next poll.
    pub fn poll(&mut self) {
        let pending = self.receiver.len();
        for task in self.receiver.try_iter().take(pending) {
            task();
        }
        if self.config.layout_after_poll {
            self.layout();
        }
    }

    /// Sizes the root widget to the window and runs a layout pass.
    pub fn layout(&self) {
        if let Some(root) = self.root.widget() {
            root.set_frame(self.window.frame().bounds());
        }
        self.window.layout_if_needed();
    }

    /// Declares a new root.
    ///
    /// If it is of the same kind as the current root, the existing widgets are reused and `true`
    /// is returned. Otherwise the old root is torn down and the new one is attached in its place.
    pub fn update_root(&mut self, root: Creator) -> Result<bool, HierarchyError> {
        let mut replacement = ReplacementTree::new(&self.root);
        if replacement.replace(&root) {
            let attached = replacement.attach_pending()?;
            log::debug!("Host: reused root, {} new widgets", attached);
            self.root = root;
            return Ok(true);
        }

        log::debug!(
            "Host: rebuilding root ({} -> {})",
            self.root.kind().name(),
            root.kind().name()
        );
        let widget = root.release_ui_view();
        self.window.add_subview(&widget)?;
        if let Some(old) = self.root.widget() {
            old.remove_from_superview();
        }
        self.root = root;
        Ok(false)
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if let Some(root) = self.root.widget() {
            root.remove_from_superview();
        }
    }
}
