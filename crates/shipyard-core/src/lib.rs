//! Shipyard Core - Core types for the release orchestrator
//!
//! This crate provides the foundational types used throughout Shipyard:
//! - `RawInput`: Loosely-typed inputs as they arrive from the runner
//! - `InputResolver`: Turns declared inputs and deployment overrides into a `ReleaseRequest`
//! - `ReleaseRequest`: The typed, immutable description of one release operation
//! - `identity`: Deterministic release naming from application name and track
//! - `TemplateContext`: Data exposed to value-file templates

pub mod context;
pub mod error;
pub mod event;
pub mod input;
pub mod release;
pub mod request;
pub mod resolver;

pub use context::TemplateContext;
pub use error::{CoreError, Result};
pub use event::DeploymentEvent;
pub use input::{RawInput, is_truthy};
pub use release::{
    CANARY_TRACK, PREVIEW_MARKER, STABLE_TRACK, canary_release, chart_reference, identity,
};
pub use request::{
    ClusterTarget, DEFAULT_TTL_SERVICE_ACCOUNT, Engine, EngineVersion, ReleaseRequest, Secrets,
    Task, Ttl,
};
pub use resolver::{DeclaredInputs, InputResolver};
