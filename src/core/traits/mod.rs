pub mod sandbox;
pub mod toolchain;
