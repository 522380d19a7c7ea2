use std::sync::Arc;

use crate::core::{SupervisorConfig, supervisor::Supervisor};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers registered before any transition can happen.
    ///
    /// More can be added later with [`Supervisor::subscribe`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the supervisor.
    ///
    /// Subscriber workers are spawned here, so with subscribers this must run
    /// inside a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let subs = SubscriberSet::new(self.subscribers);
        Arc::new(Supervisor::new_internal(self.cfg, subs))
    }
}
