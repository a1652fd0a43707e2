use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::frame::HookContext;
use crate::pipeline::UseCaseName;

/// Lifecycle hooks for intercepting use-case executions.
///
/// All methods have default no-op implementations. Override only the hooks
/// you need. The first four run while the result is still open; returning
/// `Err` from any of them fails the execution. `on_success`, `on_abort` and
/// `on_finally` run after the result is settled, so their failures are
/// logged and swallowed. A failing `on_error` replaces the final error with
/// one that carries both failures, as described on
/// [`Pipeline`](crate::pipeline::Pipeline).
///
/// Every hook receives a [`HookContext`] scoped to the current execution:
/// it exposes the raw input snapshot, the step record, the shared bag, and
/// [`HookContext::abort`] for requesting a cooperative abort.
#[async_trait]
pub trait UseCaseHooks: Send + Sync {
    /// Runs first, before input validation.
    async fn on_start(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs once the input passed validation.
    async fn after_validation(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs after authorization, right before the business step.
    async fn before_execution(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs once the business step produced an output, before the output is
    /// validated and returned.
    async fn after_execution(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs when the execution settled successfully.
    async fn on_success(&self, ctx: &mut HookContext<'_>) -> DomainResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs when the execution settled with an error other than an abort.
    async fn on_error(
        &self,
        ctx: &mut HookContext<'_>,
        error: &DomainError,
    ) -> DomainResult<()> {
        let _ = (ctx, error);
        Ok(())
    }

    /// Runs when the execution was aborted cooperatively.
    async fn on_abort(&self, ctx: &mut HookContext<'_>, reason: &str) -> DomainResult<()> {
        let _ = (ctx, reason);
        Ok(())
    }

    /// Always runs last, whatever the outcome.
    async fn on_finally(
        &self,
        ctx: &mut HookContext<'_>,
        outcome: Result<&Value, &DomainError>,
    ) -> DomainResult<()> {
        let _ = (ctx, outcome);
        Ok(())
    }
}

/// Hook bundle with every callback left at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl UseCaseHooks for NoopHooks {}

/// Registry mapping each use case to its hook bundle.
///
/// Use cases resolve their bundle once, at construction. An unregistered
/// name resolves to the no-op bundle, so registration is always optional.
#[derive(Clone, Default)]
pub struct HookRegistry {
    bundles: HashMap<UseCaseName, Arc<dyn UseCaseHooks>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, use_case: UseCaseName, hooks: Arc<dyn UseCaseHooks>) {
        self.bundles.insert(use_case, hooks);
    }

    pub fn with(mut self, use_case: UseCaseName, hooks: Arc<dyn UseCaseHooks>) -> Self {
        self.register(use_case, hooks);
        self
    }

    pub fn resolve(&self, use_case: UseCaseName) -> Arc<dyn UseCaseHooks> {
        self.bundles
            .get(&use_case)
            .cloned()
            .unwrap_or_else(|| Arc::new(NoopHooks))
    }
}

/// Pipeline stage at which a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookStage {
    OnStart,
    AfterValidation,
    BeforeExecution,
    AfterExecution,
    OnSuccess,
    OnError,
    OnAbort,
    OnFinally,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::OnStart => "onStart",
            HookStage::AfterValidation => "afterValidation",
            HookStage::BeforeExecution => "beforeExecution",
            HookStage::AfterExecution => "afterExecution",
            HookStage::OnSuccess => "onSuccess",
            HookStage::OnError => "onError",
            HookStage::OnAbort => "onAbort",
            HookStage::OnFinally => "onFinally",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single hook invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum HookOutcome {
    Completed,
    Failed(String),
    AbortRequested(String),
}

/// One hook invocation, as reported to the observability sink.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookExecution {
    pub execution_id: String,
    pub use_case: UseCaseName,
    pub stage: HookStage,
    pub outcome: HookOutcome,
    pub at: DateTime<Utc>,
}
