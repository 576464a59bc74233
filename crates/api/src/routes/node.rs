//! Route definitions for the `/nodes` resource.
//!
//! Also nests candidate routes under `/nodes/{node_id}/candidates`.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{candidate, node};
use crate::state::AppState;

/// Routes mounted at `/nodes`.
///
/// ```text
/// POST   /                                     -> create
/// GET    /{id}                                 -> get_by_id
/// DELETE /{id}                                 -> delete
/// PATCH  /{id}/detail                          -> update_detail
/// PUT    /{id}/parent                          -> relocate
/// GET    /{id}/root                            -> root
/// GET    /{id}/tree                            -> subtree
///
/// GET    /{node_id}/candidates                 -> list
/// POST   /{node_id}/candidates                 -> create
/// POST   /{node_id}/candidates/{id}            -> accept
/// DELETE /{node_id}/candidates/{id}            -> delete
/// PUT    /{node_id}/candidates/{id}/selection  -> select
/// ```
pub fn router() -> Router<AppState> {
    let candidate_routes = Router::new()
        .route("/", get(candidate::list).post(candidate::create))
        .route("/{id}", post(candidate::accept).delete(candidate::delete))
        .route("/{id}/selection", put(candidate::select));

    Router::new()
        .route("/", post(node::create))
        .route("/{id}", get(node::get_by_id).delete(node::delete))
        .route("/{id}/detail", patch(node::update_detail))
        .route("/{id}/parent", put(node::relocate))
        .route("/{id}/root", get(node::root))
        .route("/{id}/tree", get(node::subtree))
        .nest("/{node_id}/candidates", candidate_routes)
}
