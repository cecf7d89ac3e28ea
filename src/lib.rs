pub mod config;
pub mod constants;
pub mod core;
pub mod native;
pub mod remote;
pub mod stubs;

#[cfg(feature = "grpc")]
pub mod grpc;
