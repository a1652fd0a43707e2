//! Shared harness for the end-to-end suites: pinned clock, sequential ids,
//! seed helpers, and a hook bundle that records every stage it sees.

// Each integration binary compiles its own copy; not all of them use
// every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tenantkit_core::{
    Actor, Adapters, Clock, DomainError, DomainResult, HookContext, HookRegistry, IdGenerator,
    MemoryAdapter, OperationContext, OrganizationMembership, RepositoryBundle, UseCaseHooks, User,
};
use tenantkit_usecases::Toolkit;

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub const NOW: i64 = 1_000;

pub fn test_adapters() -> Adapters<MemoryAdapter> {
    Adapters::new(MemoryAdapter::new())
        .with_clock(Arc::new(FixedClock(at(NOW))))
        .with_ids(Arc::new(SequentialIds(AtomicU64::new(0))))
}

pub fn toolkit_with(hooks: HookRegistry) -> (Toolkit<MemoryAdapter>, Adapters<MemoryAdapter>) {
    let adapters = test_adapters();
    (Toolkit::new(adapters.clone(), hooks), adapters)
}

pub fn toolkit() -> (Toolkit<MemoryAdapter>, Adapters<MemoryAdapter>) {
    toolkit_with(HookRegistry::new())
}

pub fn ctx_external(external_id: &str) -> OperationContext {
    OperationContext::new("req-test", Actor::external(external_id))
}

pub fn ctx_user(user_id: &str) -> OperationContext {
    OperationContext::new("req-test", Actor::user(user_id))
}

pub async fn seed_user(adapters: &Adapters<MemoryAdapter>, id: &str, username: &str) -> User {
    let user = User {
        id: id.to_string(),
        external_id: format!("ext-{}", id),
        username: username.to_string(),
        created_at: at(0),
        updated_at: at(0),
        deleted_at: None,
        custom_fields: None,
    };
    adapters
        .persistence
        .users()
        .insert(user)
        .await
        .expect("seed user")
}

pub async fn membership_by_id(
    adapters: &Adapters<MemoryAdapter>,
    id: &str,
) -> Option<OrganizationMembership> {
    adapters
        .persistence
        .memberships()
        .find_by_id(id)
        .await
        .expect("membership lookup")
}

/// Hook bundle that appends each stage it runs through to a shared log.
/// Optionally aborts from `on_start`.
pub struct RecordingHooks {
    pub stages: Arc<Mutex<Vec<String>>>,
    pub abort_on_start: Option<String>,
}

impl RecordingHooks {
    pub fn new() -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let hooks = Arc::new(Self {
            stages: stages.clone(),
            abort_on_start: None,
        });
        (hooks, stages)
    }

    pub fn aborting(reason: &str) -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let hooks = Arc::new(Self {
            stages: stages.clone(),
            abort_on_start: Some(reason.to_string()),
        });
        (hooks, stages)
    }

    fn record(&self, stage: &str) {
        self.stages.lock().unwrap().push(stage.to_string());
    }
}

#[async_trait]
impl UseCaseHooks for RecordingHooks {
    async fn on_start(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        self.record("onStart");
        if let Some(reason) = &self.abort_on_start {
            ctx.abort(reason.clone());
        }
        Ok(())
    }

    async fn after_validation(&self, _ctx: &mut HookContext<'_>) -> DomainResult<()> {
        self.record("afterValidation");
        Ok(())
    }

    async fn before_execution(&self, _ctx: &mut HookContext<'_>) -> DomainResult<()> {
        self.record("beforeExecution");
        Ok(())
    }

    async fn after_execution(&self, _ctx: &mut HookContext<'_>) -> DomainResult<()> {
        self.record("afterExecution");
        Ok(())
    }

    async fn on_success(&self, _ctx: &mut HookContext<'_>) -> DomainResult<()> {
        self.record("onSuccess");
        Ok(())
    }

    async fn on_error(
        &self,
        _ctx: &mut HookContext<'_>,
        _error: &DomainError,
    ) -> DomainResult<()> {
        self.record("onError");
        Ok(())
    }

    async fn on_abort(&self, _ctx: &mut HookContext<'_>, _reason: &str) -> DomainResult<()> {
        self.record("onAbort");
        Ok(())
    }

    async fn on_finally(
        &self,
        _ctx: &mut HookContext<'_>,
        _outcome: Result<&Value, &DomainError>,
    ) -> DomainResult<()> {
        self.record("onFinally");
        Ok(())
    }
}
