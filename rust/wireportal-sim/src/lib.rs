pub mod replay;
pub mod scene;

pub use replay::{replay, Report};
pub use scene::Scene;
