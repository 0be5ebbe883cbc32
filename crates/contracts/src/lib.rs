//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! - `ServiceMeshMetric`: one observed remote call, as reported by a mesh sidecar
//! - `Source`: the domain events fanned out from a metric
//! - Collaborator traits (`SourceReceiver`, `IdentityEncoder`, `EndpointNameFormatter`,
//!   `TimeBucketer`, `LatencyTimer`) describe everything outside the analysis core
//!
//! ## Time Model
//! - Metric start times are epoch milliseconds
//! - Every source carries a minute time bucket (`yyyyMMddHHmm`)

mod blueprint;
mod collaborators;
mod error;
mod metric;
mod receiver;
mod source;
mod timer;

pub use blueprint::*;
pub use collaborators::*;
pub use error::*;
pub use metric::*;
pub use receiver::SourceReceiver;
pub use source::*;
pub use timer::{LatencyTimer, TimerGuard, TimerStart};
