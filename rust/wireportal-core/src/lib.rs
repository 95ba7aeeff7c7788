pub mod activation;
pub mod config;
pub mod destination;
pub mod direction;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod scheduler;
pub mod trace;
pub mod world;

pub use config::PortalConfig;
pub use direction::{Direction, DIRECTION_ORDER};
pub use error::ConfigError;
pub use orchestrator::{AbortReason, ActivationOutcome, CommitOutcome, InteractAction, Portal, Rejection};
pub use scheduler::{PendingCommit, Scheduler, TickScheduler};
pub use trace::{TraceOutcome, TraceResult, Tracer};
pub use world::{Block, BlockPos, BlockView, GameMode, Host, Location, Material, PlayerId, PlayerState, PlayerView, WorldId};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
