pub mod diagnostics;
pub mod domain;
pub mod gas;
pub mod pipeline;
pub mod traits;
