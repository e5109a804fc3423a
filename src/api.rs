use std::any::Any;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info};

use crate::{
    app_state::AppState,
    config::ResponseFormat,
    error::{GenerateError, GENERIC_SERVER_ERROR},
    pipeline,
};

// --- Payload e risposte dell'API ---

#[derive(Serialize)]
pub struct GenerateResponse {
    mermaid_code: String,
}

/// Il PDF ricevuto nel campo `file`.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

// --- Router ---

/// Applicazione completa: API, front-end statico e CORS.
pub fn create_app(app_state: AppState) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    Router::new()
        .merge(create_router(app_state))
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
}

pub fn create_router(app_state: AppState) -> Router {
    let generate = match app_state.config.response_format {
        ResponseFormat::Json => post(generate_json_handler),
        ResponseFormat::Png => post(generate_png_handler),
    };

    Router::new()
        .route("/api/generate", generate)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(app_state)
}

// --- Handler ---

#[axum::debug_handler]
async fn generate_json_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, GenerateError> {
    let upload = read_upload(multipart).await?;
    let mermaid_code = mermaid_from_upload(&state, upload).await?;
    Ok(Json(GenerateResponse { mermaid_code }))
}

#[axum::debug_handler]
async fn generate_png_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, GenerateError> {
    let upload = read_upload(multipart).await?;
    let mermaid_code = mermaid_from_upload(&state, upload).await?;
    let png = state.renderer.render(&mermaid_code).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// Estrazione del testo + ciclo di generazione: la parte comune alle due varianti.
async fn mermaid_from_upload(state: &AppState, upload: Upload) -> Result<String, GenerateError> {
    info!(
        "Richiesta di generazione per '{}' ({} byte).",
        upload.filename,
        upload.bytes.len()
    );

    let extractor = state.extractor.clone();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&upload.bytes))
        .await
        .map_err(anyhow::Error::from)?;
    if text.is_empty() {
        error!("Nessun testo estratto da '{}'.", upload.filename);
        return Err(GenerateError::Extraction);
    }

    match pipeline::generate_with_retries(&state.generator, &text, state.config.retry).await {
        Some(code) => Ok(code),
        None => {
            error!(
                "Il modello {} non ha prodotto codice valido dopo {} tentativi.",
                state.generator.model_name(),
                state.config.retry.attempts
            );
            Err(GenerateError::GenerationExhausted)
        }
    }
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, GenerateError> {
    let mut multipart = multipart.map_err(|e| GenerateError::InvalidUpload(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        // Un campo "file" senza nome di file non è un upload.
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if filename.is_empty() {
            return Err(GenerateError::EmptyFilename);
        }
        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(GenerateError::MissingFile)
}

fn upload_error(err: axum::extract::multipart::MultipartError) -> GenerateError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GenerateError::PayloadTooLarge
    } else {
        GenerateError::InvalidUpload(err.body_text())
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("panic senza messaggio");
    error!("Panic durante la gestione della richiesta: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": GENERIC_SERVER_ERROR })),
    )
        .into_response()
}
