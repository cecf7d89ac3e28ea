use std::time::Duration;

pub const CHECK_BUDGET: Duration = Duration::from_secs(60);
pub const BUILD_BUDGET: Duration = Duration::from_secs(120);
pub const EXPORT_ABI_BUDGET: Duration = Duration::from_secs(60);
pub const ESTIMATE_GAS_BUDGET: Duration = Duration::from_secs(60);
pub const PROBE_BUDGET: Duration = Duration::from_secs(10);

pub const WASM_TARGET: &str = "wasm32-unknown-unknown";
pub const ARTIFACT_RELATIVE_PATH: &str = "target/wasm32-unknown-unknown/release/contract.wasm";
pub const SOURCE_RELATIVE_PATH: &str = "src/lib.rs";

pub const INSTALL_HINT: &str = "Install the Rust toolchain from https://rustup.rs, then run \
    `rustup target add wasm32-unknown-unknown` and `cargo install --force cargo-stylus`.";

pub const DEFAULT_SANDBOX_URL: &str = "https://play.rust-lang.org/execute";
pub const DEFAULT_SANDBOX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ADDR: &str = "[::1]:50051";

pub const PROGRESS_CHANNEL_SIZE: usize = 16;
