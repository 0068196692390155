//! Notification shapes handed to the platform presenter.

/// How intrusive the channel is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Min,
    Low,
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Min,
    Low,
    Default,
    High,
}

/// Lock-screen visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Secret,
    Private,
    Public,
}

/// Registration data for the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub lights: bool,
    pub vibration: bool,
}

/// A fully built notification, ready to be posted.
///
/// Every post carries the whole notification; presenters never receive partial updates.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub channel_id: String,
    pub notification_id: i32,
    pub category: &'static str,
    pub priority: Priority,
    pub visibility: Visibility,
    pub ongoing: bool,
    pub show_when: bool,
    pub only_alert_once: bool,
    pub small_icon: String,
    /// Background color; `Some` turns on the colorized style.
    pub color: Option<String>,
    pub tap_action: String,
    pub turn_icon: Option<&'static str>,
    pub distance_text: String,
    pub street_text: String,
}
