//! Desktop stand-ins for the platform collaborators, driven by a script.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use wayline_core::{
    ChannelSpec, Location, LocationListener, LocationSource, NavigationStateProbe,
    NotificationContent, NotificationPermission, NotificationPresenter, RouteFollowingInfo,
    RoutingQuery, SubscriptionId, WaylineResult,
};
use wayline_voice::{CancelToken, SpeechEngine};

use crate::script::ScriptTick;

/// Routing engine, navigation probe, and permission check answering from the
/// script tick currently being replayed.
#[derive(Default)]
pub struct ScriptedRoute {
    current: Mutex<Option<ScriptTick>>,
}

impl ScriptedRoute {
    pub fn set_tick(&self, tick: &ScriptTick) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(tick.clone());
    }

    fn with_tick<T>(&self, f: impl FnOnce(&ScriptTick) -> T) -> Option<T> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl RoutingQuery for ScriptedRoute {
    fn current_following_info(&self) -> Option<RouteFollowingInfo> {
        self.with_tick(ScriptTick::following_info).flatten()
    }

    fn pending_voice_notifications(&self) -> Option<Vec<String>> {
        self.with_tick(|t| t.prompts.clone())
    }
}

impl NavigationStateProbe for ScriptedRoute {
    fn is_navigating(&self) -> bool {
        self.with_tick(|t| t.navigating).unwrap_or(false)
    }
}

impl NotificationPermission for ScriptedRoute {
    fn can_post_notifications(&self) -> bool {
        self.with_tick(|t| t.notifications_allowed).unwrap_or(true)
    }
}

/// Location source fed by the replay loop.
#[derive(Default)]
pub struct ScriptedLocationSource {
    listeners: Mutex<HashMap<SubscriptionId, Arc<dyn LocationListener>>>,
    next_id: AtomicU64,
}

impl ScriptedLocationSource {
    pub fn deliver(&self, location: &Location) {
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener.on_location_updated(location);
        }
    }
}

impl LocationSource for ScriptedLocationSource {
    fn subscribe(&self, listener: Arc<dyn LocationListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        tracing::debug!("Location listener {id:?} added");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        tracing::debug!("Location listener {id:?} removed");
    }
}

/// Prints notifications to stdout, one line per post.
#[derive(Default)]
pub struct ConsolePresenter;

impl ConsolePresenter {
    pub fn render(content: &NotificationContent) -> String {
        let icon = content.turn_icon.unwrap_or("-");
        if content.street_text.is_empty() {
            format!("[{icon}] {}", content.distance_text)
        } else {
            format!("[{icon}] {} · {}", content.distance_text, content.street_text)
        }
    }
}

impl NotificationPresenter for ConsolePresenter {
    fn create_channel(&self, channel: &ChannelSpec) {
        tracing::info!("Notification channel {} ({}) created", channel.id, channel.name);
    }

    fn post_or_update(&self, content: &NotificationContent) {
        println!("{}", Self::render(content));
    }

    fn cancel_all(&self) {
        tracing::info!("Notifications cancelled");
    }

    fn delete_channel(&self, channel_id: &str) {
        tracing::info!("Notification channel {channel_id} deleted");
    }

    fn acquire_execution_guarantee(&self, content: &NotificationContent) -> WaylineResult<()> {
        tracing::info!(
            "Foreground notification {} posted on {}",
            content.notification_id,
            content.channel_id
        );
        Ok(())
    }

    fn release_execution_guarantee(&self) {
        tracing::info!("Foreground released");
    }
}

/// Speech engine that prints instead of speaking, used when voice is disabled.
pub struct ConsoleSpeech;

impl SpeechEngine for ConsoleSpeech {
    fn speak(&self, text: &str, _cancel: &CancelToken) -> anyhow::Result<()> {
        println!("say: {text}");
        Ok(())
    }
}
