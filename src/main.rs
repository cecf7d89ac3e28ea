use std::panic;
use std::sync::Arc;
use std::time::Duration;

use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

use contract_builder::{
    config::BuilderConfig,
    core::{pipeline::BuildOrchestrator, traits::toolchain::Toolchain},
    grpc::{models::contract_builder_server::ContractBuilderServer, services::ContractBuilderImpl},
    native::toolchain::NativeToolchain,
    remote::{FallbackCompiler, HttpSandbox},
    stubs::toolchain::ToolchainStub,
};

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = BuilderConfig::from_env()?;
    tracing::debug!("Configuration: {:?}", config);

    let toolchain: Arc<dyn Toolchain> = if config.offline {
        tracing::warn!("Offline mode: builds use the stub toolchain");
        Arc::new(ToolchainStub::new(Duration::ZERO))
    } else {
        Arc::new(NativeToolchain::new(&config.cargo_path))
    };
    let orchestrator = BuildOrchestrator::new(toolchain, &config.build_root);

    let fallback = match &config.sandbox_url {
        Some(url) => {
            let sandbox = HttpSandbox::new(url, config.sandbox_timeout)?;
            Some(FallbackCompiler::new(Arc::new(sandbox)))
        }
        None => None,
    };

    match orchestrator.toolchain_version().await {
        Some(version) => tracing::info!("Using toolchain: {}", version),
        None => tracing::warn!(
            "Toolchain not found, remote fallback {}",
            if fallback.is_some() { "enabled" } else { "disabled" }
        ),
    }

    let addr = config.addr.parse()?;
    let service = ContractBuilderServer::new(ContractBuilderImpl::new(orchestrator, fallback));

    tracing::info!("gRPC server listening on {}", addr);
    Server::builder().add_service(service).serve(addr).await?;

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
