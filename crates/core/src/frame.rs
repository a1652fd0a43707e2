use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::context::OperationContext;
use crate::pipeline::UseCaseName;

/// Snapshots accumulated while the pipeline advances.
#[derive(Debug, Clone, Default)]
pub struct StepRecord {
    pub validated_input: Option<Value>,
    pub authorized: bool,
    pub output: Option<Value>,
}

/// Per-call execution state.
///
/// Created at the top of every `execute` call and threaded by reference
/// through the stages and hook invocations. It is never stored on the use
/// case, so one use-case value is safe for concurrent reentrant execution.
#[derive(Debug)]
pub struct ExecutionFrame {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    /// Free-form bag visible read/write to every hook of this execution.
    pub shared: HashMap<String, Value>,
    pub steps: StepRecord,
    pub(crate) abort_reason: Option<String>,
}

impl ExecutionFrame {
    pub fn new(execution_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            execution_id,
            started_at,
            shared: HashMap::new(),
            steps: StepRecord::default(),
            abort_reason: None,
        }
    }

    pub fn abort_requested(&self) -> bool {
        self.abort_reason.is_some()
    }

    /// Borrow the frame as the view handed to one hook invocation.
    pub(crate) fn hook_context<'a>(
        &'a mut self,
        use_case: UseCaseName,
        input: &'a Value,
        operation: &'a OperationContext,
    ) -> HookContext<'a> {
        HookContext {
            execution_id: self.execution_id.as_str(),
            use_case,
            input,
            steps: &self.steps,
            shared: &mut self.shared,
            operation,
            abort_reason: &mut self.abort_reason,
        }
    }
}

/// View of the execution handed to every hook invocation.
pub struct HookContext<'a> {
    pub execution_id: &'a str,
    pub use_case: UseCaseName,
    /// Snapshot of the raw input, taken before validation.
    pub input: &'a Value,
    pub steps: &'a StepRecord,
    pub shared: &'a mut HashMap<String, Value>,
    pub operation: &'a OperationContext,
    abort_reason: &'a mut Option<String>,
}

impl HookContext<'_> {
    /// Request a cooperative abort. The current hook still runs to
    /// completion; the pipeline checks the flag after it returns.
    pub fn abort(&mut self, reason: impl Into<String>) {
        *self.abort_reason = Some(reason.into());
    }

    pub fn abort_requested(&self) -> bool {
        self.abort_reason.is_some()
    }
}
