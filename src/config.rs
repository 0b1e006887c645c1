use perch_core::Rect;

/// Host settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostConfig {
    /// Frame of the host window.
    pub frame: Rect,

    /// Whether [`Host::poll`](crate::Host::poll) runs a layout pass after the dispatched work.
    pub layout_after_poll: bool,
}

impl Default for HostConfig {
    fn default() -> HostConfig {
        HostConfig {
            frame: Rect::from_size(320., 480.),
            layout_after_poll: true,
        }
    }
}
