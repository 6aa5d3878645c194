//! Remote sandbox execution.
//!
//! [`SandboxProvider`] is the seam to the remote execution service;
//! [`SandboxOrchestrator`] drives one session per analyzed file.

mod daytona;
#[cfg(test)]
pub(crate) mod mock;
mod orchestrator;
mod provider;
mod provisioning;
pub mod resources;
pub mod script;

pub use daytona::DaytonaProvider;
pub use orchestrator::{
    parse_sentinel, performance_profile, processing_type, sanitize_file_name, PerformanceProfile,
    SandboxOrchestrator,
};
pub use provider::{ExecOutput, SandboxProvider, SandboxSession, SessionRequest};
pub use provisioning::ProvisionRetry;
