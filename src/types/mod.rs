//! Core value types shared across the engine.
//!
//! Newtypes here reject invalid states at construction so workers can share
//! them without further checks.

mod credential;
mod port;
mod run_id;
mod target;

pub use credential::{Credential, CredentialSource};
pub use port::{Port, PortError, PortRange, PortSpec};
pub use run_id::RunId;
pub use target::{Target, TargetError, TargetSpec};
