//! Ingestion runner
//!
//! Has no loop of its own: it calls the bound input's `run` and returns
//! when that does. Returning does not stop the pipeline; `finished` lets
//! the owner decide.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::PipelineContext;
use crate::plugin::Input;
use crate::runner::{StageState, StageStatus};

pub(crate) async fn run_input(
    input: Arc<dyn Input>,
    ctx: PipelineContext,
    status: StageStatus,
    finished: CancellationToken,
) {
    status.set(StageState::Running);

    match input.run(&ctx).instrument(ctx.span().clone()).await {
        Ok(()) if ctx.is_cancelled() => {
            tracing::debug!(parent: ctx.span(), "input stopped");
        }
        Ok(()) => {
            tracing::info!(parent: ctx.span(), "input finished, pipeline keeps running");
        }
        Err(e) => {
            tracing::error!(parent: ctx.span(), error = %e, "input failed");
        }
    }

    status.set(StageState::Stopped);
    finished.cancel();
}
