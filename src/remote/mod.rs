//! Degraded compilation through a remote Rust sandbox.

pub mod fallback;
pub mod playground;

pub use fallback::FallbackCompiler;
pub use playground::HttpSandbox;
