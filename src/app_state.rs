use std::sync::Arc;

use anyhow::Result;

use crate::{
    config::AppConfig,
    extract::{PdfTextExtractor, TextExtractor},
    llm::{GeminiModel, LanguageModel},
    mermaid::DiagramGenerator,
    render::{DiagramRenderer, KrokiRenderer},
};

/// Stato condiviso, in sola lettura, fra tutte le richieste.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub extractor: Arc<dyn TextExtractor>,
    pub generator: DiagramGenerator,
    pub renderer: Arc<dyn DiagramRenderer>,
}

impl AppState {
    /// Costruisce i componenti reali (pdf-extract, Gemini, Kroki).
    pub fn from_config(config: AppConfig) -> Result<Self> {
        // Senza chiave il generatore restituisce sempre il diagramma di errore.
        let model: Option<Arc<dyn LanguageModel>> = config
            .google_api_key
            .as_deref()
            .map(|key| Arc::new(GeminiModel::new(key)) as Arc<dyn LanguageModel>);
        let generator = DiagramGenerator::new(model, config.llm_chat_model.clone());
        let renderer = KrokiRenderer::from_config(&config.kroki)?;

        Ok(Self {
            config: Arc::new(config),
            extractor: Arc::new(PdfTextExtractor),
            generator,
            renderer: Arc::new(renderer),
        })
    }
}
