pub mod building;
pub mod environment;

pub use building::{BuildBudgets, BuildOrchestrator};
pub use environment::BuildEnvironment;
