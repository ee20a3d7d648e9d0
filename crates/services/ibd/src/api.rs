use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use ib_config::IbServerConfig;
use tokio::task::JoinHandle;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::models::{LoginResponse, StatusResponse};
use crate::prelude::*;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const FORM_MULTIPART: &str = "multipart/form-data";

pub fn router(backend: Backend, max_form_bytes: usize) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/blockdevices", get(block_devices))
        .route("/install", post(install))
        .route("/status", get(status))
        .route("/log", get(download_log))
        .route("/clear", post(clear))
        .layer(DefaultBodyLimit::max(max_form_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(backend)
}

pub async fn setup_api(
    backend: Backend,
    config: &IbServerConfig,
) -> Result<JoinHandle<Result<()>>> {
    let app = router(backend, config.max_form_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on {}", listener.local_addr()?);
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    });

    Ok(handle)
}

async fn login(State(backend): State<Backend>) -> Result<Json<LoginResponse>> {
    let probe = Arc::clone(&backend.probe);
    let facts = tokio::task::spawn_blocking(move || ib_hardware::detect(probe.as_ref())).await?;
    Ok(Json(LoginResponse {
        facts,
        running: backend.installer.has_job().await,
        environ: backend.installer.parameters().await,
    }))
}

async fn block_devices(State(backend): State<Backend>) -> Result<impl IntoResponse> {
    let probe = Arc::clone(&backend.probe);
    let devices =
        tokio::task::spawn_blocking(move || ib_hardware::block_devices(probe.as_ref())).await??;
    Ok(([(CONTENT_TYPE, "application/json")], devices))
}

async fn install(State(backend): State<Backend>, request: Request) -> Result<StatusCode> {
    if backend.installer.is_running().await {
        error!("already running");
        return Err(ib_job::error::Error::AlreadyRunning.into());
    }

    let form = read_form(request).await?;
    backend
        .policy
        .check_all(form.iter().map(|(name, value)| (name.as_str(), value.as_str())))?;

    debug!("Install button pressed");
    for (name, value) in &form {
        debug!(" form value {name}={value}");
    }
    backend.installer.merge_parameters(form).await;
    backend.installer.start().await?;
    Ok(StatusCode::OK)
}

async fn status(State(backend): State<Backend>) -> Result<Json<StatusResponse>> {
    let status = backend.installer.status().await?;
    Ok(Json(StatusResponse::from(status)))
}

async fn download_log(State(backend): State<Backend>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/plain;charset=UTF-8"),
            (CONTENT_DISPOSITION, "attachment;filename=installer.log"),
        ],
        backend.installer.output().await,
    )
}

async fn clear(State(backend): State<Backend>) -> Result<StatusCode> {
    backend.installer.cancel().await?;
    Ok(StatusCode::OK)
}

/// Submitted fields, first value per name, from an urlencoded or multipart body.
async fn read_form(request: Request) -> Result<Vec<(String, String)>> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let fields = if content_type.starts_with(FORM_URLENCODED) {
        let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(|err| Error::InvalidForm(err.body_text()))?;
        fields
    } else if content_type.starts_with(FORM_MULTIPART) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|err| Error::InvalidForm(err.body_text()))?;
        read_multipart(multipart).await?
    } else {
        return Err(Error::UnsupportedContentType(content_type));
    };

    let mut seen = HashSet::new();
    Ok(fields
        .into_iter()
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect())
}

async fn read_multipart(mut multipart: Multipart) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| Error::InvalidForm(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            debug!("Ignoring uploaded file {name}");
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|err| Error::InvalidForm(err.body_text()))?;
        fields.push((name, value));
    }
    Ok(fields)
}
