// Per-row ETA fetches.
//
// One task per row, fired once per session. A task only ever touches its own
// row (by id) and only holds the session weakly, so a reload or shutdown while
// a request is in flight turns the late answer into a no-op.

use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

use crate::board::Session;
use crate::distance_matrix::{
    DistanceMatrixProvider, DistanceMatrixRequest, DistanceMatrixResponse, TrafficModel,
    TravelMode,
};
use crate::traffic_models::RouteDescriptor;

/// What happened to a row once its fetch finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Row now shows a real-time duration.
    Updated,
    /// Provider answered without a usable duration; row left as is.
    Unchanged,
    /// Request failed; row left as is.
    Failed,
    /// Route has no destination to ask about.
    NoDestination,
    /// The session was replaced or dropped before the answer came back.
    SessionGone,
}

/// Query settings shared by every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub mode: TravelMode,
    pub traffic_model: TrafficModel,
}

/// Apply one provider answer to row `id`.
///
/// Only a first element with status OK and a traffic duration changes the row.
pub fn apply_response(
    session: &Session,
    id: u32,
    response: Option<&DistanceMatrixResponse>,
) -> FetchOutcome {
    let Some(text) = response.and_then(DistanceMatrixResponse::traffic_duration_text) else {
        return FetchOutcome::Unchanged;
    };

    if session.update(id, text) {
        FetchOutcome::Updated
    } else {
        FetchOutcome::Unchanged
    }
}

async fn fetch_row(
    session: Weak<Session>,
    descriptor: RouteDescriptor,
    provider: Arc<dyn DistanceMatrixProvider>,
    options: QueryOptions,
) -> FetchOutcome {
    if !descriptor.has_destination() {
        tracing::warn!(
            route = %descriptor.label,
            "no destination for route, leaving it on Checking"
        );
        return FetchOutcome::NoDestination;
    }

    let request = DistanceMatrixRequest::single(
        &descriptor.origin,
        &descriptor.destination,
        options.mode,
        options.traffic_model,
    );
    let result = provider.query(&request).await;

    let Some(session) = session.upgrade() else {
        tracing::debug!(route = %descriptor.label, "session gone, dropping ETA");
        return FetchOutcome::SessionGone;
    };

    match result {
        Ok(response) => {
            let outcome = apply_response(&session, descriptor.id, Some(&response));
            match outcome {
                FetchOutcome::Updated => tracing::info!(
                    route = %descriptor.label,
                    generation = session.generation(),
                    "real-time ETA received"
                ),
                _ => tracing::warn!(
                    route = %descriptor.label,
                    element_status = response
                        .first_element()
                        .map(|e| e.status.as_str())
                        .unwrap_or("missing"),
                    "no traffic duration in response"
                ),
            }
            outcome
        }
        Err(e) => {
            tracing::warn!(route = %descriptor.label, error = %e, "ETA request failed");
            FetchOutcome::Failed
        }
    }
}

/// Fire one fetch per route against `session`.
///
/// Callers that don't care about completion can drop the handles.
pub fn spawn_fetches(
    session: &Arc<Session>,
    descriptors: &[RouteDescriptor],
    provider: Arc<dyn DistanceMatrixProvider>,
    options: QueryOptions,
) -> Vec<JoinHandle<FetchOutcome>> {
    tracing::debug!(
        generation = session.generation(),
        routes = descriptors.len(),
        "spawning ETA fetches"
    );

    descriptors
        .iter()
        .map(|descriptor| {
            tokio::spawn(fetch_row(
                Arc::downgrade(session),
                descriptor.clone(),
                Arc::clone(&provider),
                options,
            ))
        })
        .collect()
}
