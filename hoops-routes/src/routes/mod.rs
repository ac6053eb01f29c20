use crate::error::{EndpointError, HoopServiceError};
use crate::metrics;
use crate::service::HoopService;
use crate::state::HoopAppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use const_format::formatcp;
use hoops_core::HoopEngine;
use requests::HoopForm;
use responses::{HoopError, HoopResponse};
use tracing::{debug, info, instrument};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod requests;
mod responses;

const API_ROOT_PATH: &str = "/api/0.1";
pub const HOOPS_PATH: &str = formatcp!("{API_ROOT_PATH}/hoops/");
const METRICS_PATH: &str = "/metrics";
const SWAGGER_UI_PATH: &str = formatcp!("{API_ROOT_PATH}/swagger-ui");
const OPENAPI_PATH: &str = formatcp!("{API_ROOT_PATH}/api-docs/openapi.json");

/// Largest request body accepted, photos included.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(paths(create_hoop))]
struct ApiDoc;

pub fn build<T: HoopEngine>(app_state: HoopAppState<T>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes(app_state))
        .split_for_parts();

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_PATH, api))
}

fn routes<S, T: HoopEngine>(app_state: HoopAppState<T>) -> OpenApiRouter<S> {
    let main_router = OpenApiRouter::new().route(HOOPS_PATH, post(create_hoop::<T>));

    let router = if let Some(handle) = app_state.metrics.clone() {
        info!("metrics enabled, setting up metrics handler");
        main_router
            .route(METRICS_PATH, get(|| async move { handle.render() }))
            .route_layer(middleware::from_fn(metrics::track_http))
    } else {
        info!("metrics not enabled, setting up service unavailable metrics handler");
        main_router.route(
            METRICS_PATH,
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Metrics endpoint is disabled. Metrics must be enabled and the service restarted",
                )
            }),
        )
    };

    router.with_state(app_state)
}

/// Submit a new hoop. Every field is optional and values that cannot be read are dropped.
#[utoipa::path(
    post,
    path = HOOPS_PATH,
    responses(
        (status = OK, description = "The hoop was saved", body = HoopResponse),
        (status = BAD_REQUEST, description = "The request was not multipart/form-data"),
        (status = INTERNAL_SERVER_ERROR, description = "The hoop could not be saved"),
    ),
    request_body(content = HoopForm, content_type = "multipart/form-data")
)]
#[instrument(skip_all, err(Debug))]
async fn create_hoop<T>(
    State(service): State<HoopService<T>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, EndpointError<HoopServiceError>>
where
    T: HoopEngine,
{
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("rejecting submission: {rejection}");
            return Ok(HoopError::not_multipart().into_response());
        }
    };

    let submission = match requests::read_submission(multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            debug!("unreadable multipart body: {e}");
            return Ok(HoopError::unreadable_body(&e).into_response());
        }
    };

    let hoop = service.create(submission).await?;
    Ok(HoopResponse::ok(hoop).into_response())
}
