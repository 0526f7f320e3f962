//! Control API for route mappings.
//!
//! `GET /routes` lists the current table, `POST /routes` registers a
//! mapping, `DELETE /routes` removes one, and `POST /routes/reload`
//! resyncs the table from the durable store.

use crate::errors::RoutesError;
use crate::manager::RouteManager;
use axum::{
    Json, Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddRoutePayload {
    pub domain_name: String,
    pub port: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRoutePayload {
    pub domain_name: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct RoutesResponse {
    message: String,
    data: HashMap<String, String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

// A payload that does not deserialize is the caller's mistake, not a
// server failure; axum's default rejection status (422) is overridden.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<RoutesError> for ApiError {
    fn from(err: RoutesError) -> Self {
        let status = match err {
            RoutesError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RoutesError::EmptyDomain | RoutesError::InvalidPort(_) => StatusCode::BAD_REQUEST,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

pub fn router(manager: RouteManager) -> Router {
    Router::new()
        .route(
            "/routes",
            get(list_routes).post(add_route).delete(remove_route),
        )
        .route("/routes/reload", post(reload_routes))
        .with_state(manager)
}

async fn list_routes(State(manager): State<RouteManager>) -> Response {
    (
        StatusCode::OK,
        Json(RoutesResponse {
            message: "routes fetched successfully".into(),
            data: manager.list_routes(),
        }),
    )
        .into_response()
}

async fn add_route(
    State(manager): State<RouteManager>,
    payload: Result<Json<AddRoutePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    manager
        .add_route(&payload.domain_name, &payload.port)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "route added successfully".into(),
        }),
    )
        .into_response())
}

async fn remove_route(
    State(manager): State<RouteManager>,
    payload: Result<Json<RemoveRoutePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    manager.remove_route(&payload.domain_name).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "route removed successfully".into(),
        }),
    )
        .into_response())
}

async fn reload_routes(State(manager): State<RouteManager>) -> Result<Response, ApiError> {
    let data = manager.reload().await?;
    Ok((
        StatusCode::OK,
        Json(RoutesResponse {
            message: "routes reloaded successfully".into(),
            data,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemoryRouteStore;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use std::sync::Arc;

    fn test_manager() -> (Arc<InMemoryRouteStore>, RouteManager) {
        let store = Arc::new(InMemoryRouteStore::new());
        let manager = RouteManager::new(store.clone() as Arc<dyn crate::store::RouteStore>);
        (store, manager)
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let (_store, manager) = test_manager();

        let response = add_route(
            State(manager.clone()),
            Ok(Json(AddRoutePayload {
                domain_name: "svc.test".into(),
                port: "9000".into(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = list_routes(State(manager)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_invalid_port_is_bad_request() {
        let (_store, manager) = test_manager();

        let err = add_route(
            State(manager),
            Ok(Json(AddRoutePayload {
                domain_name: "svc.test".into(),
                port: "not-a-port".into(),
            })),
        )
        .await
        .err()
        .expect("invalid port must be rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_request() {
        let (_store, manager) = test_manager();

        // Well-formed JSON missing a required field.
        let request = axum::http::Request::builder()
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"domainName": "svc.test"}"#))
            .unwrap();
        let rejection = Json::<AddRoutePayload>::from_request(request, &())
            .await
            .expect_err("payload without a port must not deserialize");

        let err = add_route(State(manager), Err(rejection))
            .await
            .err()
            .expect("rejected payload must surface as an error");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (store, manager) = test_manager();
        store.fail_next();

        let err = add_route(
            State(manager),
            Ok(Json(AddRoutePayload {
                domain_name: "svc.test".into(),
                port: "9000".into(),
            })),
        )
        .await
        .err()
        .expect("store failure must surface");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_remove_and_reload() {
        let (store, manager) = test_manager();
        manager.add_route("svc.test", "9000").await.unwrap();

        let response = remove_route(
            State(manager.clone()),
            Ok(Json(RemoveRoutePayload {
                domain_name: "svc.test".into(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.entries().is_empty());

        let response = reload_routes(State(manager.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(manager.list_routes().is_empty());
    }
}
