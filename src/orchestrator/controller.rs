//! Request lifecycle controller.
//!
//! Runs on the Tokio runtime, performs the requests the UI thread asks for and emits
//! their completions back. The UI thread owns all view state.

use crate::api::{ApiError, Backend};
use crate::model::{ModeCatalog, SubmissionResult};
use crate::ui_controller::{Submission, Ticket};
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug)]
pub(crate) enum UiCommand {
    Submit(Submission),
    Quit,
}

/// Completions sent back to UI layers.
#[derive(Debug)]
pub(crate) enum UiEvent {
    CatalogLoaded(Result<ModeCatalog, ApiError>),
    SubmissionFinished {
        ticket: Ticket,
        outcome: Result<SubmissionResult, ApiError>,
    },
}

type InFlight = BoxFuture<'static, UiEvent>;

fn fetch_catalog<B: Backend + 'static>(backend: Arc<B>) -> InFlight {
    async move { UiEvent::CatalogLoaded(backend.fetch_modes().await) }.boxed()
}

/// Wrap a submission so it always resolves to a completion, even if the request panics.
fn start_submission<B: Backend + 'static>(backend: Arc<B>, submission: Submission) -> InFlight {
    let Submission { ticket, request } = submission;
    async move {
        let outcome = AssertUnwindSafe(async { request.send(backend.as_ref()).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ApiError::Transport("request task panicked".into())));
        UiEvent::SubmissionFinished { ticket, outcome }
    }
    .boxed()
}

/// Fetch the catalog, then serve submit commands until the UI quits.
///
/// Requests run concurrently; a save and an ask-ai may complete in either order.
pub(crate) async fn run_controller<B: Backend + 'static>(
    backend: Arc<B>,
    event_tx: UnboundedSender<UiEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();
    in_flight.push(fetch_catalog(backend.clone()));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(submission)) => {
                        let action = submission.ticket.action();
                        in_flight.push(start_submission(backend.clone(), submission));
                        tracing::debug!(?action, in_flight = in_flight.len(), "request started");
                    }
                    // Quitting drops whatever is still in flight.
                    Some(UiCommand::Quit) | None => {
                        if !in_flight.is_empty() {
                            tracing::info!(dropped = in_flight.len(), "quitting with requests in flight");
                        }
                        break Ok(());
                    }
                }
            }
            Some(ev) = in_flight.next(), if !in_flight.is_empty() => {
                if event_tx.send(ev).is_err() {
                    // UI is gone; nothing left to report to.
                    break Ok(());
                }
            }
        }
    }
}
