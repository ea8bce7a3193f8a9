//! desk-relay agent: polls a Telegram bot for commands, authorizes and
//! dispatches them, and shows short-lived desktop notifications.

pub mod background;
pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod event_loop;
pub mod fetcher;
pub mod inbox;
pub mod notification;
pub mod outbox;
pub mod power;
pub mod shutdown;
pub mod system_info;

pub use bootstrap::init_foundation;
