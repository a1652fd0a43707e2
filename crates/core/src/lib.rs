//! # TenantKit Core
//!
//! Core abstractions for the TenantKit multi-tenant toolkit: the use-case
//! execution pipeline, lifecycle hooks, domain types, error taxonomy, and
//! the adapter ports with their in-memory implementations.

pub mod adapters;
pub mod context;
pub mod error;
pub mod frame;
pub mod hooks;
pub mod logger;
pub mod pipeline;
pub mod tasks;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use adapters::{
    Adapters, Clock, IdGenerator, MemoryAdapter, MemoryObservability, ObservabilityAdapter,
    OrganizationMembershipRepository, OrganizationRepository, PersistenceAdapter,
    RepositoryBundle, SystemClock, UserRepository, UuidGenerator,
};
pub use context::{Actor, AuditContext, OperationContext};
pub use error::{DomainError, DomainResult, RepoResult, RepositoryError};
pub use frame::{ExecutionFrame, HookContext, StepRecord};
pub use hooks::{
    HookExecution, HookOutcome, HookRegistry, HookStage, NoopHooks, UseCaseHooks,
};
pub use logger::{default_logger, Logger, TracingLogger};
pub use pipeline::{Pipeline, UseCase, UseCaseName};
pub use tasks::fire_and_forget;
pub use types::{
    MembershipRole, Organization, OrganizationFilter, OrganizationMembership, User,
};
pub use validation::{
    first_violation_error, AlwaysValid, FieldViolation, RuleSet, SchemaValidator, Validator,
    ValidatorChain,
};
