//! Tipi di errore del servizio.
//!
//! Ogni componente restituisce un proprio errore tipizzato; la conversione in
//! codice HTTP avviene solo in [`GenerateError::into_response`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Messaggio generico mostrato al client per gli errori imprevisti.
pub const GENERIC_SERVER_ERROR: &str = "Si è verificato un errore imprevisto sul server.";

/// Errore della chiamata al modello generativo.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Errore del servizio di rendering (Kroki).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("richiesta a Kroki fallita: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Kroki ha risposto con stato {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Esito negativo di una richiesta a `/api/generate`.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("nessun campo 'file' nella richiesta")]
    MissingFile,

    #[error("file caricato con nome vuoto")]
    EmptyFilename,

    #[error("upload multipart non valido: {0}")]
    InvalidUpload(String),

    #[error("file oltre il limite di dimensione consentito")]
    PayloadTooLarge,

    #[error("estrazione del testo dal PDF fallita")]
    Extraction,

    #[error("il modello non ha prodotto codice Mermaid valido")]
    GenerationExhausted,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GenerateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::EmptyFilename | Self::InvalidUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Messaggio restituito al client. Non contiene mai dettagli interni.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MissingFile | Self::InvalidUpload(_) => "Nessun file fornito.",
            Self::EmptyFilename => "File non selezionato.",
            Self::PayloadTooLarge => "Il file caricato è troppo grande.",
            Self::Extraction => "Impossibile estrarre il testo dal PDF.",
            Self::GenerationExhausted => {
                "Il modello AI non è riuscito a generare un codice valido."
            }
            Self::Render(_) | Self::Internal(_) => GENERIC_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Render(_) | Self::Internal(_)) {
            tracing::error!("Errore critico durante il processo: {}", self);
        }
        (
            self.status(),
            Json(json!({ "error": self.client_message() })),
        )
            .into_response()
    }
}
