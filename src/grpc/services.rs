use std::sync::Arc;

use tokio::sync::mpsc::{Sender, channel};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use crate::{
    constants::{INSTALL_HINT, PROGRESS_CHANNEL_SIZE},
    core::{
        domain::{self, BuildResult, BuildStage, FailureKind},
        gas::GasEstimator,
        pipeline::BuildOrchestrator,
    },
    grpc::mappers::ConversionError,
    grpc::models::{
        BuildUpdate, CompileRequest, Empty, EstimateGasRequest, GasProfile, SyntaxCheckResponse,
        ToolchainStatusResponse, ValidateSyntaxRequest, contract_builder_server::ContractBuilder,
    },
    remote::FallbackCompiler,
};

type UpdateSender = Sender<Result<BuildUpdate, Status>>;

#[derive(Clone, Debug)]
pub struct ContractBuilderImpl {
    orchestrator: BuildOrchestrator,
    fallback: Option<FallbackCompiler>,
    estimator: Arc<GasEstimator>,
}

#[tonic::async_trait]
impl ContractBuilder for ContractBuilderImpl {
    type CompileStream = ReceiverStream<Result<BuildUpdate, Status>>;

    #[tracing::instrument(skip(request))]
    async fn compile(
        &self,
        request: Request<CompileRequest>,
    ) -> Result<Response<Self::CompileStream>, Status> {
        let build_request: domain::BuildRequest = request
            .into_inner()
            .try_into()
            .map_err(|e: ConversionError| Status::invalid_argument(e.to_string()))?;
        tracing::info!("Received build for project {:?}", build_request.project_name);

        let (stream_tx, stream_rx) = channel::<Result<BuildUpdate, Status>>(PROGRESS_CHANNEL_SIZE);

        let service = self.clone();
        tokio::spawn(async move {
            let result = service.build(&build_request, &stream_tx).await;
            tracing::debug!(
                "Build metadata: {:?}",
                result.metadata(&build_request.project_name)
            );
            if stream_tx.send(Ok(result.into())).await.is_err() {
                tracing::debug!("Client went away before the build result was sent");
            }
        });

        Ok(Response::new(ReceiverStream::new(stream_rx)))
    }

    #[tracing::instrument(skip(request))]
    async fn validate_syntax(
        &self,
        request: Request<ValidateSyntaxRequest>,
    ) -> Result<Response<SyntaxCheckResponse>, Status> {
        let source = request.into_inner().source;

        let check = match &self.fallback {
            Some(fallback) if !self.orchestrator.is_toolchain_available().await => {
                fallback.validate_syntax(&source).await
            }
            _ => self.orchestrator.validate_syntax_only(&source).await,
        };

        Ok(Response::new(check.into()))
    }

    #[tracing::instrument(skip(_request))]
    async fn toolchain_status(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ToolchainStatusResponse>, Status> {
        let version = self.orchestrator.toolchain_version().await;

        Ok(Response::new(ToolchainStatusResponse {
            available: version.is_some(),
            version,
            install_hint: INSTALL_HINT.to_string(),
            fallback_enabled: self.fallback.is_some(),
        }))
    }

    #[tracing::instrument(skip(request))]
    async fn estimate_gas(
        &self,
        request: Request<EstimateGasRequest>,
    ) -> Result<Response<GasProfile>, Status> {
        let artifact = request.into_inner().artifact;
        if artifact.is_empty() {
            return Err(Status::invalid_argument("Missing required field: artifact"));
        }

        Ok(Response::new(self.estimator.estimate(&artifact).into()))
    }
}

impl ContractBuilderImpl {
    pub fn new(orchestrator: BuildOrchestrator, fallback: Option<FallbackCompiler>) -> Self {
        Self {
            orchestrator,
            fallback,
            estimator: Arc::new(GasEstimator::new()),
        }
    }

    /// Native build with stage updates forwarded to the client. Falls back to
    /// the remote sandbox only when the toolchain is missing.
    async fn build(&self, request: &domain::BuildRequest, stream_tx: &UpdateSender) -> BuildResult {
        let (stage_tx, mut stage_rx) = channel::<BuildStage>(PROGRESS_CHANNEL_SIZE);

        let forward_tx = stream_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(stage) = stage_rx.recv().await {
                tracing::debug!("Build stage: {:?}", stage);
                if forward_tx.send(Ok(stage.into())).await.is_err() {
                    break;
                }
            }
        });

        let result = self
            .orchestrator
            .compile_with_progress(request, Some(&stage_tx))
            .await;
        drop(stage_tx);
        if let Err(e) = forwarder.await {
            tracing::warn!("Stage forwarder failed: {}", e);
        }

        match (&result, &self.fallback) {
            (
                BuildResult::Failure {
                    kind: FailureKind::ToolchainUnavailable { .. },
                    ..
                },
                Some(fallback),
            ) => {
                tracing::info!("Toolchain unavailable, using the remote sandbox");
                fallback.compile(&request.source_text).await
            }
            _ => result,
        }
    }
}
