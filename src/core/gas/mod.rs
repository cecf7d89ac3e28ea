pub mod estimator;
pub mod opcodes;

pub use estimator::GasEstimator;
