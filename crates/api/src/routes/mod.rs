pub mod health;
pub mod internal;
pub mod node;
pub mod workspace;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /workspaces                                        create (auth)
/// /workspaces/{id}/tree                              whole workspace tree
/// /workspaces/{id}/statistics                        per-priority progress
///
/// /nodes                                             create child
/// /nodes/{id}                                        get, delete (subtree)
/// /nodes/{id}/detail                                 partial update (PATCH)
/// /nodes/{id}/parent                                 relocate subtree (PUT)
/// /nodes/{id}/root                                   workspace root of a node
/// /nodes/{id}/tree                                   subtree from a node
/// /nodes/{id}/candidates                             list, bulk create
/// /nodes/{id}/candidates/{cid}                       accept (POST, auth), delete
/// /nodes/{id}/candidates/{cid}/selection             select/unselect (PUT, auth)
///
/// /internal/workspaces/{id}/nodes/positions          queue position batch (PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/workspaces", workspace::router())
        .nest("/nodes", node::router())
        .nest("/internal", internal::router())
}
