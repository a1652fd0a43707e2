pub mod memory;
pub mod system;
pub mod traits;

pub use memory::{MemoryAdapter, MemoryObservability};
pub use system::{SystemClock, UuidGenerator};
pub use traits::{
    Clock, IdGenerator, ObservabilityAdapter, OrganizationMembershipRepository,
    OrganizationRepository, PersistenceAdapter, RepositoryBundle, UserRepository,
};

use std::sync::Arc;

use crate::logger::{default_logger, Logger};

/// The services every use case is built on: the persistence adapter plus
/// the clock, id generator, optional observability sink, and logger.
///
/// Construct one per toolkit instance and share it; use cases capture the
/// pieces they need at construction. `new` wires system defaults for
/// everything except persistence, and the `with_*` builders swap
/// individual services, which tests use to pin time and ids.
pub struct Adapters<P: PersistenceAdapter> {
    pub persistence: Arc<P>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub observability: Option<Arc<dyn ObservabilityAdapter>>,
    pub logger: Arc<dyn Logger>,
}

impl<P: PersistenceAdapter> Adapters<P> {
    pub fn new(persistence: P) -> Self {
        Self {
            persistence: Arc::new(persistence),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            observability: None,
            logger: default_logger(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_observability(mut self, observability: Arc<dyn ObservabilityAdapter>) -> Self {
        self.observability = Some(observability);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }
}

// Manual impl: `P` itself is behind an `Arc`, so no `P: Clone` bound.
impl<P: PersistenceAdapter> Clone for Adapters<P> {
    fn clone(&self) -> Self {
        Self {
            persistence: self.persistence.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            observability: self.observability.clone(),
            logger: self.logger.clone(),
        }
    }
}
