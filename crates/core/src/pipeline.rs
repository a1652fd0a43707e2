//! The use-case execution pipeline.
//!
//! Every use case runs through the same fixed stage sequence:
//!
//! 1. mint a fresh execution id and [`ExecutionFrame`]
//! 2. `onStart` hook
//! 3. input validation
//! 4. `afterValidation` hook
//! 5. authorization
//! 6. `beforeExecution` hook
//! 7. the business step ([`UseCase::perform`])
//! 8. `afterExecution` hook
//! 9. output validation
//! 10. `onSuccess` / `onError` / `onAbort` hook, per the settled result
//! 11. `onFinally` hook
//!
//! A failure at any of stages 2 through 9 skips the remaining open stages
//! and jumps to settlement. Unexpected infrastructure errors escaping
//! authorization or the business step are normalized into a validation
//! error carrying the use case's stable failure message, so callers see
//! one failure shape per use case.
//!
//! Hooks cooperate with the pipeline through their [`HookContext`]: any
//! hook may request an abort, which the pipeline honors after the hook
//! returns by settling the execution with an `ABORTED` error. A hook error
//! in stages 2 through 8 fails the execution with a validation error
//! naming the stage; `on_success`, `on_abort` and `on_finally` failures
//! are logged and swallowed; a failing `on_error` replaces the settled
//! error with one that embeds both it and the original.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::adapters::{Adapters, Clock, IdGenerator, ObservabilityAdapter, PersistenceAdapter};
use crate::context::OperationContext;
use crate::error::{DomainError, DomainResult};
use crate::frame::ExecutionFrame;
use crate::hooks::{HookExecution, HookOutcome, HookRegistry, HookStage, UseCaseHooks};
use crate::logger::Logger;
use crate::tasks::fire_and_forget;
use crate::validation::{first_violation_error, AlwaysValid, SchemaValidator, Validator};

/// Identifier of a concrete use case: a stable kebab-case constant owned
/// by the use case itself. Keys the hook registry and tags hook-execution
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UseCaseName(&'static str);

impl UseCaseName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for UseCaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Contract implemented by every concrete use case.
///
/// A use case declares its input and output contracts, owns its name and
/// failure message, and supplies the authorization predicate and business
/// step. The [`Pipeline`] drives all of it through the fixed stage
/// sequence; callers go through [`UseCase::execute`].
#[async_trait]
pub trait UseCase: Send + Sync {
    type Input: validator::Validate + Serialize + Send + Sync;
    type Output: Serialize + Send + Sync;

    const NAME: UseCaseName;

    /// The engine carrying this use case's resolved hook bundle and
    /// services.
    fn pipeline(&self) -> &Pipeline;

    /// Stable message used when an unexpected failure is normalized at
    /// the pipeline boundary.
    fn failure_message(&self) -> &'static str;

    /// Input contract. Defaults to the derive rules on `Self::Input`.
    fn input_validator(&self) -> &dyn Validator<Self::Input> {
        &SchemaValidator
    }

    /// Output contract. Defaults to accepting whatever `perform` built.
    fn output_validator(&self) -> &dyn Validator<Self::Output> {
        &AlwaysValid
    }

    /// Authorization predicate, run before the business step and outside
    /// any transaction. Defaults to allowing everyone.
    async fn authorize(&self, input: &Self::Input, ctx: &OperationContext) -> DomainResult<()> {
        let _ = (input, ctx);
        Ok(())
    }

    /// The business step, typically wrapping one persistence transaction.
    async fn perform(&self, input: Self::Input, ctx: &OperationContext)
        -> DomainResult<Self::Output>;

    /// Run this use case through the execution pipeline.
    async fn execute(&self, input: Self::Input, ctx: &OperationContext) -> DomainResult<Self::Output>
    where
        Self: Sized,
    {
        self.pipeline().run(self, input, ctx).await
    }
}

/// Per-use-case execution engine: the hook bundle resolved from the
/// registry at construction, plus the services every execution needs.
pub struct Pipeline {
    name: UseCaseName,
    hooks: Arc<dyn UseCaseHooks>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    observability: Option<Arc<dyn ObservabilityAdapter>>,
    logger: Arc<dyn Logger>,
}

impl Pipeline {
    /// Build the engine for one use case, resolving its hook bundle once.
    pub fn new<P: PersistenceAdapter>(
        name: UseCaseName,
        adapters: &Adapters<P>,
        hooks: &HookRegistry,
    ) -> Self {
        Self {
            name,
            hooks: hooks.resolve(name),
            clock: adapters.clock.clone(),
            ids: adapters.ids.clone(),
            observability: adapters.observability.clone(),
            logger: adapters.logger.clone(),
        }
    }

    pub fn name(&self) -> UseCaseName {
        self.name
    }

    /// Drive one execution through the full stage sequence.
    pub async fn run<U: UseCase>(
        &self,
        use_case: &U,
        input: U::Input,
        ctx: &OperationContext,
    ) -> DomainResult<U::Output> {
        let mut frame = ExecutionFrame::new(self.ids.generate(), self.clock.now());
        let input_snapshot = serde_json::to_value(&input).unwrap_or(Value::Null);

        let result = self
            .advance(use_case, input, &input_snapshot, ctx, &mut frame)
            .await;
        self.settle(&input_snapshot, ctx, &mut frame, result).await
    }

    /// Stages 2 through 9: everything that can still change the outcome.
    async fn advance<U: UseCase>(
        &self,
        use_case: &U,
        input: U::Input,
        input_snapshot: &Value,
        ctx: &OperationContext,
        frame: &mut ExecutionFrame,
    ) -> DomainResult<U::Output> {
        self.invoke(HookStage::OnStart, frame, input_snapshot, ctx)
            .await?;

        use_case
            .input_validator()
            .validate(&input)
            .map_err(first_violation_error)?;
        frame.steps.validated_input = Some(input_snapshot.clone());

        self.invoke(HookStage::AfterValidation, frame, input_snapshot, ctx)
            .await?;

        use_case
            .authorize(&input, ctx)
            .await
            .map_err(|err| self.normalize(use_case, err))?;
        frame.steps.authorized = true;

        self.invoke(HookStage::BeforeExecution, frame, input_snapshot, ctx)
            .await?;

        let output = use_case
            .perform(input, ctx)
            .await
            .map_err(|err| self.normalize(use_case, err))?;
        frame.steps.output = serde_json::to_value(&output).ok();

        self.invoke(HookStage::AfterExecution, frame, input_snapshot, ctx)
            .await?;

        use_case
            .output_validator()
            .validate(&output)
            .map_err(first_violation_error)?;

        Ok(output)
    }

    /// Stages 10 and 11: settlement hooks. The result is already decided;
    /// only a failing `on_error` may still replace it.
    async fn settle<T>(
        &self,
        input_snapshot: &Value,
        ctx: &OperationContext,
        frame: &mut ExecutionFrame,
        result: DomainResult<T>,
    ) -> DomainResult<T> {
        let result = match result {
            Ok(output) => {
                let hook_result = {
                    let mut hook_ctx = frame.hook_context(self.name, input_snapshot, ctx);
                    self.hooks.on_success(&mut hook_ctx).await
                };
                self.report(HookStage::OnSuccess, frame, &hook_result);
                frame.abort_reason = None;
                if let Err(err) = hook_result {
                    self.logger.warn(&format!(
                        "{}: onSuccess hook failed (ignored): {}",
                        self.name, err
                    ));
                }
                Ok(output)
            }
            Err(err) if err.is_aborted() => {
                let reason = err.abort_reason().unwrap_or_default().to_string();
                let hook_result = {
                    let mut hook_ctx = frame.hook_context(self.name, input_snapshot, ctx);
                    self.hooks.on_abort(&mut hook_ctx, &reason).await
                };
                self.report(HookStage::OnAbort, frame, &hook_result);
                frame.abort_reason = None;
                if let Err(hook_err) = hook_result {
                    self.logger.warn(&format!(
                        "{}: onAbort hook failed (ignored): {}",
                        self.name, hook_err
                    ));
                }
                Err(err)
            }
            Err(err) => {
                let hook_result = {
                    let mut hook_ctx = frame.hook_context(self.name, input_snapshot, ctx);
                    self.hooks.on_error(&mut hook_ctx, &err).await
                };
                self.report(HookStage::OnError, frame, &hook_result);
                frame.abort_reason = None;
                match hook_result {
                    Ok(()) => Err(err),
                    // The replacement keeps both failures visible: the hook
                    // failure in the message, the original as the source.
                    Err(hook_err) => Err(DomainError::failure(
                        format!("onError hook failed: {}", hook_err),
                        err,
                    )),
                }
            }
        };

        let output_snapshot = frame.steps.output.clone();
        let outcome = match &result {
            Ok(_) => Ok(output_snapshot.as_ref().unwrap_or(&Value::Null)),
            Err(err) => Err(err),
        };
        let hook_result = {
            let mut hook_ctx = frame.hook_context(self.name, input_snapshot, ctx);
            self.hooks.on_finally(&mut hook_ctx, outcome).await
        };
        self.report(HookStage::OnFinally, frame, &hook_result);
        if let Err(err) = hook_result {
            self.logger.warn(&format!(
                "{}: onFinally hook failed (ignored): {}",
                self.name, err
            ));
        }

        result
    }

    /// Run one open-stage hook, report it, then apply the hook-error and
    /// abort checks in that order.
    async fn invoke(
        &self,
        stage: HookStage,
        frame: &mut ExecutionFrame,
        input_snapshot: &Value,
        ctx: &OperationContext,
    ) -> DomainResult<()> {
        let hook_result = {
            let mut hook_ctx = frame.hook_context(self.name, input_snapshot, ctx);
            match stage {
                HookStage::OnStart => self.hooks.on_start(&mut hook_ctx).await,
                HookStage::AfterValidation => self.hooks.after_validation(&mut hook_ctx).await,
                HookStage::BeforeExecution => self.hooks.before_execution(&mut hook_ctx).await,
                HookStage::AfterExecution => self.hooks.after_execution(&mut hook_ctx).await,
                _ => Ok(()),
            }
        };

        self.report(stage, frame, &hook_result);

        if let Err(err) = hook_result {
            return Err(DomainError::failure(format!("Hook {} failed", stage), err));
        }
        if let Some(reason) = frame.abort_reason.take() {
            return Err(DomainError::aborted(reason));
        }
        Ok(())
    }

    fn normalize<U: UseCase>(&self, use_case: &U, err: DomainError) -> DomainError {
        match err {
            infra @ DomainError::Infrastructure { .. } => {
                self.logger.error(&format!("{}: {}", self.name, infra));
                DomainError::failure(use_case.failure_message(), infra)
            }
            other => other,
        }
    }

    /// Emit a hook-execution event to the observability sink, off the
    /// execution's critical path.
    fn report(&self, stage: HookStage, frame: &ExecutionFrame, result: &DomainResult<()>) {
        let Some(observability) = &self.observability else {
            return;
        };
        let outcome = match result {
            Ok(()) => match &frame.abort_reason {
                Some(reason) => HookOutcome::AbortRequested(reason.clone()),
                None => HookOutcome::Completed,
            },
            Err(err) => HookOutcome::Failed(err.to_string()),
        };
        let event = HookExecution {
            execution_id: frame.execution_id.clone(),
            use_case: self.name,
            stage,
            outcome,
            at: self.clock.now(),
        };
        let observability = observability.clone();
        fire_and_forget("log-hook-execution", async move {
            observability.log_hook_execution(event).await
        });
    }
}
