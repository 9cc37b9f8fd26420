//! Best-effort delivery of deal alerts.

pub mod format;
pub mod model;
pub mod sink;
pub mod telegram;

pub use format::{escape_markdown, render};
pub use model::{Audience, DealNotification};
pub use sink::{DealNotifier, DisabledSink, NotificationSink};
pub use telegram::TelegramSink;
