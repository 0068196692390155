use wayline_core::config::NotificationConfig;
use wayline_core::{
    ChannelSpec, Importance, NotificationContent, Priority, RouteFollowingInfo, Visibility,
};

const CATEGORY_NAVIGATION: &str = "navigation";

/// Fixed channel and styling for the navigation notification.
///
/// Built once when the service is created. Only the content fields change
/// afterwards; the channel identity never does.
#[derive(Debug, Clone)]
pub struct NotificationTemplate {
    channel: ChannelSpec,
    notification_id: i32,
    small_icon: String,
    color: Option<String>,
    tap_action: String,
    turn_icon: Option<&'static str>,
    distance_text: String,
    street_text: String,
}

impl NotificationTemplate {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            channel: ChannelSpec {
                id: config.channel_id.clone(),
                name: config.channel_name.clone(),
                importance: Importance::Low,
                lights: false,
                vibration: false,
            },
            notification_id: config.notification_id,
            small_icon: config.small_icon.clone(),
            color: config.color.clone(),
            tap_action: config.tap_action.clone(),
            turn_icon: None,
            distance_text: String::new(),
            street_text: String::new(),
        }
    }

    pub fn channel(&self) -> &ChannelSpec {
        &self.channel
    }

    /// Overwrite every content field from a fresh snapshot.
    pub fn apply(&mut self, info: &RouteFollowingInfo) {
        self.turn_icon = Some(info.car_direction.icon_id());
        self.distance_text = info.dist_to_turn.to_string();
        self.street_text = info.next_street.clone();
    }

    /// Build a complete notification from the template and its current content.
    pub fn build(&self) -> NotificationContent {
        NotificationContent {
            channel_id: self.channel.id.clone(),
            notification_id: self.notification_id,
            category: CATEGORY_NAVIGATION,
            priority: Priority::Low,
            visibility: Visibility::Public,
            ongoing: true,
            show_when: false,
            only_alert_once: true,
            small_icon: self.small_icon.clone(),
            color: self.color.clone(),
            tap_action: self.tap_action.clone(),
            turn_icon: self.turn_icon,
            distance_text: self.distance_text.clone(),
            street_text: self.street_text.clone(),
        }
    }
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}
