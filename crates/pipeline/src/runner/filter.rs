//! Filter runner
//!
//! Purely reactive: waits for an ingest item or cancellation, applies the
//! filter and forwards the result. Rejected items are dropped.

use std::sync::Arc;

use crate::context::PipelineContext;
use crate::plugin::Filter;
use crate::runner::{StageState, StageStatus};

pub(crate) async fn run_filter(filter: Arc<dyn Filter>, ctx: PipelineContext, status: StageStatus) {
    status.set(StageState::Running);
    let ingest = ctx.ingest();
    let egress = ctx.egress();

    loop {
        let item = tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            item = ingest.recv() => match item {
                Ok(item) => item,
                Err(_) => break,
            },
        };

        match filter.apply(item) {
            Ok(filtered) => {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => break,
                    res = egress.send(filtered) => {
                        if res.is_err() {
                            break;
                        }
                        ctx.metrics().record_filtered();
                    }
                }
            }
            Err(e) => {
                ctx.metrics().record_rejected();
                tracing::debug!(parent: ctx.span(), error = %e, "item dropped by filter");
            }
        }
    }

    status.set(StageState::Stopped);
    tracing::debug!(parent: ctx.span(), "filter runner stopped");
}
