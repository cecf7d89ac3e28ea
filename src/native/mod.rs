/// Native module contains implementations of core traits that
/// drive the locally installed toolchain as child processes.
pub mod toolchain;
