//! Astrazione sopra Rig per parlare con il modello generativo.
//! Per ora è implementato solo Gemini, l'unico provider usato dal servizio.

use async_trait::async_trait;
use rig::completion::Prompt;

use crate::error::ModelError;

/// Un modello di completamento testuale: riceve nome del modello e prompt,
/// restituisce il testo generato.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ModelError>;
}

/// Client Gemini di Rig.
pub struct GeminiModel {
    client: rig::providers::gemini::Client,
}

impl GeminiModel {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: rig::providers::gemini::Client::new(api_key),
        }
    }
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel").finish_non_exhaustive()
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        // Trait per client.agent(...)
        use rig::client::CompletionClient as _;

        let agent = self.client.agent(model).build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| ModelError(e.to_string()))
    }
}
