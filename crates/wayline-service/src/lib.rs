pub mod runtime;
pub mod service;
pub mod template;

pub use runtime::{ServiceCommand, ServiceHandle};
pub use service::{NavigationService, ServiceLifecycleState, TickOutcome};
pub use template::NotificationTemplate;
