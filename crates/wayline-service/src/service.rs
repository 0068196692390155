use std::sync::Arc;

use wayline_core::{Collaborators, Location, LocationListener, SubscriptionId};

use crate::template::NotificationTemplate;

/// Lifecycle of one navigation service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifecycleState {
    /// Channel and template prepared, nothing subscribed yet.
    Created,
    /// Execution guarantee requested and location updates flowing.
    Running,
    /// Terminal. Every resource has been released.
    Stopped,
}

/// How a single tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The service is not running; the fix was stale.
    Inactive,
    NotNavigating,
    NotificationsBlocked,
    NoRouteData,
    Posted,
}

/// The navigation update loop.
///
/// Reacts to each location fix by voicing pending announcements and
/// rebuilding the persistent notification, and owns the foreground lifecycle
/// around it. All methods take `&mut self`; callers serialize access, which
/// is what [`crate::ServiceHandle`] does with its dedicated thread.
pub struct NavigationService {
    deps: Collaborators,
    listener: Arc<dyn LocationListener>,
    template: NotificationTemplate,
    state: ServiceLifecycleState,
    subscription: Option<SubscriptionId>,
    guarantee_held: bool,
}

impl NavigationService {
    /// Register the notification channel and return a service in `Created`.
    ///
    /// `listener` is what gets subscribed to the location source on start.
    pub fn create(
        deps: Collaborators,
        template: NotificationTemplate,
        listener: Arc<dyn LocationListener>,
    ) -> Self {
        tracing::info!("Creating navigation service");
        deps.presenter.create_channel(template.channel());
        Self {
            deps,
            listener,
            template,
            state: ServiceLifecycleState::Created,
            subscription: None,
            guarantee_held: false,
        }
    }

    pub fn state(&self) -> ServiceLifecycleState {
        self.state
    }

    pub fn holds_execution_guarantee(&self) -> bool {
        self.guarantee_held
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Enter `Running`. Safe to call any number of times.
    ///
    /// A denied execution guarantee is logged and swallowed; the next start
    /// asks again.
    pub fn start(&mut self) {
        if self.state == ServiceLifecycleState::Stopped {
            tracing::warn!("Ignoring start request: navigation service already stopped");
            return;
        }

        if !self.guarantee_held {
            tracing::info!("Starting foreground");
            match self
                .deps
                .presenter
                .acquire_execution_guarantee(&self.template.build())
            {
                Ok(()) => self.guarantee_held = true,
                Err(e) => tracing::error!("Foreground service is not allowed: {e}"),
            }
        }

        if self.subscription.is_none() {
            let id = self.deps.location.subscribe(self.listener.clone());
            tracing::debug!("Subscribed to location updates ({id:?})");
            self.subscription = Some(id);
        }

        if self.state != ServiceLifecycleState::Running {
            tracing::info!("Navigation service running");
            self.state = ServiceLifecycleState::Running;
        }
    }

    /// Tear everything down and enter `Stopped`. No-op once stopped.
    pub fn stop(&mut self) {
        if self.state == ServiceLifecycleState::Stopped {
            return;
        }
        tracing::info!("Stopping navigation service from {:?}", self.state);

        if let Some(id) = self.subscription.take() {
            self.deps.location.unsubscribe(id);
        }
        self.deps.announcer.stop();

        self.deps.presenter.cancel_all();
        if self.guarantee_held {
            self.deps.presenter.release_execution_guarantee();
            self.guarantee_held = false;
        }
        self.deps.presenter.delete_channel(&self.template.channel().id);

        self.state = ServiceLifecycleState::Stopped;
    }

    /// React to one location fix.
    pub fn on_location_updated(&mut self, location: &Location) -> TickOutcome {
        if self.state != ServiceLifecycleState::Running {
            tracing::trace!("Dropping fix at {} while {:?}", location.timestamp, self.state);
            return TickOutcome::Inactive;
        }

        // Ignore pending notifications while navigation is being torn down.
        if !self.deps.navigation.is_navigating() {
            return TickOutcome::NotNavigating;
        }

        // Voice the turn first.
        if let Some(prompts) = self.deps.routing.pending_voice_notifications() {
            if !prompts.is_empty() {
                tracing::debug!("Announcing {} prompt(s)", prompts.len());
                self.deps.announcer.play(prompts);
            }
        }

        if !self.deps.permission.can_post_notifications() {
            tracing::debug!("Notifications not permitted, skipping refresh");
            return TickOutcome::NotificationsBlocked;
        }

        let Some(info) = self.deps.routing.current_following_info() else {
            tracing::trace!("No route following info for this fix");
            return TickOutcome::NoRouteData;
        };

        self.template.apply(&info);
        // The notification is rebuilt from scratch for every update.
        self.deps.presenter.post_or_update(&self.template.build());
        TickOutcome::Posted
    }

    pub fn on_low_memory(&self) {
        tracing::debug!("Low memory signal received while {:?}", self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wayline_core::mock::{Call, MockPlatform};
    use wayline_core::{CarDirection, Distance, DistanceUnits, RouteFollowingInfo};

    struct NullListener;

    impl LocationListener for NullListener {
        fn on_location_updated(&self, _location: &Location) {}
    }

    fn service(platform: &MockPlatform) -> NavigationService {
        NavigationService::create(
            platform.collaborators(),
            NotificationTemplate::default(),
            Arc::new(NullListener),
        )
    }

    fn fix() -> Location {
        Location::new(52.5200, 13.4050, Utc::now())
    }

    fn main_st() -> RouteFollowingInfo {
        RouteFollowingInfo {
            car_direction: CarDirection::TurnRight,
            dist_to_turn: Distance::new(200.0, DistanceUnits::Meters),
            next_street: "Main St".into(),
        }
    }

    fn navigating_with_data(platform: &MockPlatform) {
        platform.navigation.set_navigating(true);
        platform.routing.set_prompts(Some(vec!["Turn right in 200m".into()]));
        platform.routing.set_info(Some(main_st()));
    }

    #[test]
    fn create_registers_channel_only() {
        let platform = MockPlatform::new();
        let svc = service(&platform);
        assert_eq!(svc.state(), ServiceLifecycleState::Created);
        assert_eq!(
            platform.log.calls(),
            vec![Call::CreateChannel("LOCATION_CHANNEL".into())]
        );
        assert_eq!(platform.location.subscriber_count(), 0);
    }

    #[test]
    fn repeated_start_is_idempotent() {
        let platform = MockPlatform::new();
        let mut svc = service(&platform);
        for _ in 0..5 {
            svc.start();
        }
        assert_eq!(svc.state(), ServiceLifecycleState::Running);
        assert_eq!(platform.location.subscriber_count(), 1);
        assert_eq!(platform.presenter.guarantees_held(), 1);
        assert_eq!(platform.log.count(|c| matches!(c, Call::Subscribe(_))), 1);
        assert_eq!(platform.log.count(|c| *c == Call::AcquireGuarantee), 1);
    }

    #[test]
    fn denied_guarantee_is_retried_on_next_start() {
        let platform = MockPlatform::new();
        platform.presenter.set_deny_guarantee(true);
        let mut svc = service(&platform);

        svc.start();
        assert_eq!(svc.state(), ServiceLifecycleState::Running);
        assert!(!svc.holds_execution_guarantee());
        assert!(svc.is_subscribed());

        platform.presenter.set_deny_guarantee(false);
        svc.start();
        assert!(svc.holds_execution_guarantee());
        assert_eq!(platform.location.subscriber_count(), 1);
    }

    #[test]
    fn denied_guarantee_still_voices_prompts() {
        let platform = MockPlatform::new();
        platform.presenter.set_deny_guarantee(true);
        navigating_with_data(&platform);
        let mut svc = service(&platform);
        svc.start();

        svc.on_location_updated(&fix());
        assert!(platform
            .log
            .calls()
            .contains(&Call::Play(vec!["Turn right in 200m".into()])));
    }

    #[test]
    fn voice_then_notification_for_navigating_fix() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        let outcome = svc.on_location_updated(&fix());
        assert_eq!(outcome, TickOutcome::Posted);

        let calls = platform.log.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Play(vec!["Turn right in 200m".into()]));
        let Call::Post(content) = &calls[1] else {
            panic!("expected a post, got {:?}", calls[1]);
        };
        assert_eq!(content.turn_icon, Some("ic_turn_right"));
        assert_eq!(content.distance_text, "200 m");
        assert_eq!(content.street_text, "Main St");
    }

    #[test]
    fn not_navigating_has_no_side_effects() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        platform.navigation.set_navigating(false);
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        assert_eq!(svc.on_location_updated(&fix()), TickOutcome::NotNavigating);
        assert!(platform.log.calls().is_empty());
        assert_eq!(platform.routing.info_queries(), 0);
    }

    #[test]
    fn permission_gate_skips_rebuild_but_not_voice() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        platform.permission.set_allowed(false);
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        assert_eq!(
            svc.on_location_updated(&fix()),
            TickOutcome::NotificationsBlocked
        );
        assert_eq!(
            platform.log.output_calls(),
            vec![Call::Play(vec!["Turn right in 200m".into()])]
        );
        assert_eq!(platform.routing.info_queries(), 0);

        // Permission granted again at runtime.
        platform.permission.set_allowed(true);
        assert_eq!(svc.on_location_updated(&fix()), TickOutcome::Posted);
    }

    #[test]
    fn missing_route_data_skips_tick() {
        let platform = MockPlatform::new();
        platform.navigation.set_navigating(true);
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        assert_eq!(svc.on_location_updated(&fix()), TickOutcome::NoRouteData);
        assert!(platform.log.calls().is_empty());
    }

    #[test]
    fn empty_prompt_batch_is_not_played() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        platform.routing.set_prompts(Some(Vec::new()));
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        svc.on_location_updated(&fix());
        assert_eq!(platform.log.count(|c| matches!(c, Call::Play(_))), 0);
        assert_eq!(platform.log.count(|c| matches!(c, Call::Post(_))), 1);
    }

    #[test]
    fn every_tick_reposts_full_notification() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        platform.routing.set_prompts(None);
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        svc.on_location_updated(&fix());
        svc.on_location_updated(&fix());
        let posts: Vec<_> = platform
            .log
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Post(content) => Some(content),
                _ => None,
            })
            .collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0], posts[1]);
    }

    #[test]
    fn fix_before_start_is_dropped() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        let mut svc = service(&platform);
        platform.log.clear();

        assert_eq!(svc.on_location_updated(&fix()), TickOutcome::Inactive);
        assert!(platform.log.calls().is_empty());
    }

    #[test]
    fn stop_tears_down_in_order() {
        let platform = MockPlatform::new();
        let mut svc = service(&platform);
        svc.start();
        platform.log.clear();

        svc.stop();
        let calls = platform.log.calls();
        assert!(matches!(calls[0], Call::Unsubscribe(_)));
        assert_eq!(
            calls[1..],
            [
                Call::StopSpeech,
                Call::CancelAll,
                Call::ReleaseGuarantee,
                Call::DeleteChannel("LOCATION_CHANNEL".into()),
            ]
        );
        assert_eq!(svc.state(), ServiceLifecycleState::Stopped);
        assert_eq!(platform.location.subscriber_count(), 0);
        assert_eq!(platform.presenter.guarantees_held(), 0);
    }

    #[test]
    fn stop_from_created_still_cleans_channel() {
        let platform = MockPlatform::new();
        let mut svc = service(&platform);
        platform.log.clear();

        svc.stop();
        assert_eq!(
            platform.log.calls(),
            vec![
                Call::StopSpeech,
                Call::CancelAll,
                Call::DeleteChannel("LOCATION_CHANNEL".into()),
            ]
        );
    }

    #[test]
    fn stopped_is_terminal() {
        let platform = MockPlatform::new();
        navigating_with_data(&platform);
        let mut svc = service(&platform);
        svc.start();
        svc.stop();
        platform.log.clear();

        svc.stop();
        svc.start();
        assert_eq!(svc.on_location_updated(&fix()), TickOutcome::Inactive);
        assert_eq!(svc.state(), ServiceLifecycleState::Stopped);
        assert!(platform.log.calls().is_empty());
    }
}
