//! Recording collaborator implementations for testing.
//!
//! Every side-effecting call lands in one shared [`CallLog`], so tests can
//! assert on ordering across collaborators (voice before visual, teardown
//! order, and so on).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{WaylineError, WaylineResult};
use crate::interfaces::{
    AnnouncementSink, Collaborators, LocationListener, LocationSource, NavigationStateProbe,
    NotificationPermission, NotificationPresenter, RoutingQuery, SubscriptionId,
};
use crate::notification::{ChannelSpec, NotificationContent};
use crate::route::{Location, RouteFollowingInfo};

/// A side effect observed by one of the mocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play(Vec<String>),
    StopSpeech,
    CreateChannel(String),
    Post(NotificationContent),
    CancelAll,
    DeleteChannel(String),
    AcquireGuarantee,
    ReleaseGuarantee,
    Subscribe(SubscriptionId),
    Unsubscribe(SubscriptionId),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Only the calls that reach the announcer or the presenter's notification surface.
    pub fn output_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Play(_) | Call::Post(_)))
            .collect()
    }
}

#[derive(Default)]
pub struct MockRouting {
    info: Mutex<Option<RouteFollowingInfo>>,
    prompts: Mutex<Option<Vec<String>>>,
    info_queries: AtomicUsize,
}

impl MockRouting {
    pub fn set_info(&self, info: Option<RouteFollowingInfo>) {
        *self.info.lock().unwrap() = info;
    }

    pub fn set_prompts(&self, prompts: Option<Vec<String>>) {
        *self.prompts.lock().unwrap() = prompts;
    }

    pub fn info_queries(&self) -> usize {
        self.info_queries.load(Ordering::SeqCst)
    }
}

impl RoutingQuery for MockRouting {
    fn current_following_info(&self) -> Option<RouteFollowingInfo> {
        self.info_queries.fetch_add(1, Ordering::SeqCst);
        self.info.lock().unwrap().clone()
    }

    fn pending_voice_notifications(&self) -> Option<Vec<String>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MockNavigation {
    navigating: AtomicBool,
}

impl MockNavigation {
    pub fn set_navigating(&self, navigating: bool) {
        self.navigating.store(navigating, Ordering::SeqCst);
    }
}

impl NavigationStateProbe for MockNavigation {
    fn is_navigating(&self) -> bool {
        self.navigating.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockPermission {
    denied: AtomicBool,
}

impl MockPermission {
    pub fn set_allowed(&self, allowed: bool) {
        self.denied.store(!allowed, Ordering::SeqCst);
    }
}

impl NotificationPermission for MockPermission {
    fn can_post_notifications(&self) -> bool {
        !self.denied.load(Ordering::SeqCst)
    }
}

/// Location source whose fixes are pushed by the test.
pub struct MockLocationSource {
    log: CallLog,
    listeners: Mutex<HashMap<SubscriptionId, Arc<dyn LocationListener>>>,
    ever_subscribed: Mutex<Vec<Arc<dyn LocationListener>>>,
    next_id: AtomicU64,
}

impl MockLocationSource {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            listeners: Mutex::new(HashMap::new()),
            ever_subscribed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Deliver a fix to every current subscriber.
    pub fn deliver(&self, location: &Location) {
        let listeners: Vec<_> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener.on_location_updated(location);
        }
    }

    /// Deliver a fix to every listener that was ever subscribed, including
    /// removed ones, as a platform racing an unsubscribe might.
    pub fn deliver_stale(&self, location: &Location) {
        let listeners: Vec<_> = self.ever_subscribed.lock().unwrap().clone();
        for listener in listeners {
            listener.on_location_updated(location);
        }
    }
}

impl LocationSource for MockLocationSource {
    fn subscribe(&self, listener: Arc<dyn LocationListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.ever_subscribed.lock().unwrap().push(listener.clone());
        self.listeners.lock().unwrap().insert(id, listener);
        self.log.push(Call::Subscribe(id));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().remove(&id);
        self.log.push(Call::Unsubscribe(id));
    }
}

pub struct MockAnnouncer {
    log: CallLog,
}

impl MockAnnouncer {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl AnnouncementSink for MockAnnouncer {
    fn play(&self, prompts: Vec<String>) {
        self.log.push(Call::Play(prompts));
    }

    fn stop(&self) {
        self.log.push(Call::StopSpeech);
    }
}

pub struct MockPresenter {
    log: CallLog,
    deny_guarantee: AtomicBool,
    guarantees_held: AtomicUsize,
}

impl MockPresenter {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            deny_guarantee: AtomicBool::new(false),
            guarantees_held: AtomicUsize::new(0),
        }
    }

    /// Make subsequent guarantee requests fail, as a platform policy would.
    pub fn set_deny_guarantee(&self, deny: bool) {
        self.deny_guarantee.store(deny, Ordering::SeqCst);
    }

    pub fn guarantees_held(&self) -> usize {
        self.guarantees_held.load(Ordering::SeqCst)
    }
}

impl NotificationPresenter for MockPresenter {
    fn create_channel(&self, channel: &ChannelSpec) {
        self.log.push(Call::CreateChannel(channel.id.clone()));
    }

    fn post_or_update(&self, content: &NotificationContent) {
        self.log.push(Call::Post(content.clone()));
    }

    fn cancel_all(&self) {
        self.log.push(Call::CancelAll);
    }

    fn delete_channel(&self, channel_id: &str) {
        self.log.push(Call::DeleteChannel(channel_id.to_string()));
    }

    fn acquire_execution_guarantee(&self, _content: &NotificationContent) -> WaylineResult<()> {
        if self.deny_guarantee.load(Ordering::SeqCst) {
            return Err(WaylineError::ExecutionGuaranteeDenied(
                "foreground start not allowed".into(),
            ));
        }
        self.guarantees_held.fetch_add(1, Ordering::SeqCst);
        self.log.push(Call::AcquireGuarantee);
        Ok(())
    }

    fn release_execution_guarantee(&self) {
        let _ = self
            .guarantees_held
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.log.push(Call::ReleaseGuarantee);
    }
}

/// One of every mock, sharing a single call log.
pub struct MockPlatform {
    pub log: CallLog,
    pub routing: Arc<MockRouting>,
    pub navigation: Arc<MockNavigation>,
    pub location: Arc<MockLocationSource>,
    pub announcer: Arc<MockAnnouncer>,
    pub presenter: Arc<MockPresenter>,
    pub permission: Arc<MockPermission>,
}

impl MockPlatform {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            routing: Arc::new(MockRouting::default()),
            navigation: Arc::new(MockNavigation::default()),
            location: Arc::new(MockLocationSource::new(log.clone())),
            announcer: Arc::new(MockAnnouncer::new(log.clone())),
            presenter: Arc::new(MockPresenter::new(log.clone())),
            permission: Arc::new(MockPermission::default()),
            log,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            routing: self.routing.clone(),
            navigation: self.navigation.clone(),
            location: self.location.clone(),
            announcer: self.announcer.clone(),
            presenter: self.presenter.clone(),
            permission: self.permission.clone(),
        }
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}
