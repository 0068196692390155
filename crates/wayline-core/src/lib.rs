pub mod config;
pub mod error;
pub mod interfaces;
pub mod lifecycle;
pub mod notification;
pub mod route;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::AppConfig;
pub use error::{WaylineError, WaylineResult};
pub use interfaces::{
    AnnouncementSink, Collaborators, LocationListener, LocationSource, NavigationStateProbe,
    NotificationPermission, NotificationPresenter, RoutingQuery, SubscriptionId,
};
pub use notification::{ChannelSpec, Importance, NotificationContent, Priority, Visibility};
pub use route::{CarDirection, Distance, DistanceUnits, Location, RouteFollowingInfo};
