//! On-screen notifications: lifecycle scheduling and rendering.

pub mod renderer;
pub mod scheduler;
pub mod types;

use std::time::Duration;

pub use renderer::{NotificationRenderer, RenderError, TracingRenderer};
pub use scheduler::{NotificationScheduler, SchedulerConfig};
pub use types::{NotificationId, NotificationState, NotificationStyle};

/// Where the dispatcher sends notification requests.
pub trait NotificationSink {
    fn enqueue(&mut self, title: &str, message: &str, style: NotificationStyle) -> NotificationId;
    fn enqueue_delayed(
        &mut self,
        delay: Duration,
        title: &str,
        message: &str,
        style: NotificationStyle,
    );
}
