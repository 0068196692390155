//! Contracts between the navigation service and its platform collaborators.
//!
//! The routing engine, location provider, speech engine, and OS notification
//! layer all live outside this workspace. The service only sees these traits,
//! so tests and the replay binary can plug in their own implementations.

use std::sync::Arc;

use crate::error::WaylineResult;
use crate::notification::{ChannelSpec, NotificationContent};
use crate::route::{Location, RouteFollowingInfo};

/// Pull queries against the routing engine. Both are synchronous and must not
/// block indefinitely.
pub trait RoutingQuery: Send + Sync {
    /// Snapshot of the next maneuver, `None` between route recalculations.
    fn current_following_info(&self) -> Option<RouteFollowingInfo>;

    /// Announcements due right now, `None` or empty when there is nothing to say.
    fn pending_voice_notifications(&self) -> Option<Vec<String>>;
}

/// Reports whether a route is actively being followed.
pub trait NavigationStateProbe: Send + Sync {
    fn is_navigating(&self) -> bool;
}

/// Receives location fixes from a [`LocationSource`].
pub trait LocationListener: Send + Sync {
    fn on_location_updated(&self, location: &Location);
}

/// Handle returned by [`LocationSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Subscription-based stream of location fixes.
pub trait LocationSource: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn LocationListener>) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Plays announcement batches without making the caller wait.
pub trait AnnouncementSink: Send + Sync {
    fn play(&self, prompts: Vec<String>);

    /// Cancel the current utterance and drop anything queued. Idempotent.
    fn stop(&self);
}

/// Platform notification layer plus the long-running execution guarantee.
pub trait NotificationPresenter: Send + Sync {
    fn create_channel(&self, channel: &ChannelSpec);
    fn post_or_update(&self, content: &NotificationContent);
    fn cancel_all(&self);
    fn delete_channel(&self, channel_id: &str);

    /// Promote the process to a foreground, keep-alive state showing `content`.
    fn acquire_execution_guarantee(&self, content: &NotificationContent) -> WaylineResult<()>;
    fn release_execution_guarantee(&self);
}

/// Whether visible notifications may be posted right now. Can change at runtime.
pub trait NotificationPermission: Send + Sync {
    fn can_post_notifications(&self) -> bool;
}

/// Everything the navigation service talks to, bundled for injection.
#[derive(Clone)]
pub struct Collaborators {
    pub routing: Arc<dyn RoutingQuery>,
    pub navigation: Arc<dyn NavigationStateProbe>,
    pub location: Arc<dyn LocationSource>,
    pub announcer: Arc<dyn AnnouncementSink>,
    pub presenter: Arc<dyn NotificationPresenter>,
    pub permission: Arc<dyn NotificationPermission>,
}
