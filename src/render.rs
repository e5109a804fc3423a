//! Rendering del codice Mermaid in PNG tramite l'API di Kroki.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use crate::{config::KrokiConfig, error::RenderError};

/// Trasforma codice Mermaid in un'immagine.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render(&self, mermaid_code: &str) -> Result<Vec<u8>, RenderError>;
}

#[derive(Serialize)]
struct KrokiRequest<'a> {
    diagram_source: &'a str,
    diagram_options: KrokiOptions<'a>,
}

#[derive(Serialize)]
struct KrokiOptions<'a> {
    theme: &'a str,
}

/// Client HTTP per `POST <url>` di Kroki.
#[derive(Debug, Clone)]
pub struct KrokiRenderer {
    client: reqwest::Client,
    url: String,
    theme: String,
}

impl KrokiRenderer {
    pub fn from_config(cfg: &KrokiConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            url: cfg.url.clone(),
            theme: cfg.theme.clone(),
        })
    }
}

#[async_trait]
impl DiagramRenderer for KrokiRenderer {
    async fn render(&self, mermaid_code: &str) -> Result<Vec<u8>, RenderError> {
        info!("Avvio generazione PNG tramite Kroki ({}).", self.url);
        let payload = KrokiRequest {
            diagram_source: mermaid_code,
            diagram_options: KrokiOptions { theme: &self.theme },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Errore durante la chiamata a Kroki: {}", e);
                RenderError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Dettaglio errore da Kroki ({}): {}", status, body);
            return Err(RenderError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        info!("Immagine PNG ricevuta da Kroki ({} byte).", bytes.len());
        Ok(bytes.to_vec())
    }
}
