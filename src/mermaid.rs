//! Generazione del codice Mermaid: prompt, pulizia dell'output del modello,
//! diagrammi sentinella di errore e controllo di accettabilità.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::LanguageModel;

/// Prefisso con cui deve iniziare ogni diagramma accettato.
pub const DIAGRAM_PREFIX: &str = "graph TD";

/// Marcatore contenuto in tutti i diagrammi sentinella.
pub const ERROR_MARKER: &str = "Errore";

const PROMPT_HEADER: &str = r#"
Crea una mappa concettuale di RIEPILOGO e ad alto livello. La mappa deve essere chiara e contenere solo i concetti più importanti, ignorando i dettagli minuti.

Istruzioni:
1.  Identifica i **5-7 macro-argomenti** principali del testo. Questi saranno i concetti di primo livello.
2.  Per ogni macro-argomento, estrai solo i **3-5 concetti secondari più cruciali**.
3.  Ignora completamente i dettagli specifici, le liste lunghe di esempi, le singole funzioni o le proprietà minori. L'obiettivo è la chiarezza, non la completezza.
4.  Organizza la mappa con `graph TD` e usa `subgraph` per raggruppare i macro-argomenti.
5.  Usa forme di nodo diverse per distinguere le categorie di informazioni seguendo la corretta sintassi Mermaid. Ad esempio:
    - Nodi rettangolari `[ ]` per i concetti principali.
    - Nodi a forma di stadio `([ ])` per gli eventi.
    - Nodi a rombo `{ }` per le decisioni.
    - Nodi circolari `(( ))` per i risultati.

    Regola Fondamentale per il Testo dei Nodi: Per evitare errori di sintassi, il testo di un nodo NON DEVE contenere caratteri speciali come `()` o '||' o '&&' o `{} ecc. MA SOLO LETTERE E NUMERI`.
    - ❌ **Esempio SBAGLIATO:** `A[Nodo con [parentesi]]`
    - ❌ **Esempio SBAGLIATO:** `A[Nodo con (parentesi)]`
    - ❌ **Esempio SBAGLIATO:** `A[Caratteri speciali!! & ||]`
    - ✅ **Esempio CORRETTO:** `A[Parole o numeri]`

6.  Collega i nodi con frecce etichettate per descrivere la natura della relazione (es. `-->|causa|`, `-->|include|`).
7.  **Output richiesto**: Restituisci SOLO ed UNICAMENTE il blocco di codice Mermaid che rispetti la sintassi. L'output deve iniziare con `graph TD` e terminare con l'ultima riga di sintassi Mermaid.

Testo da analizzare:
    ---
"#;

/// Costruisce il prompt completo con il testo incorporato alla lettera.
pub fn build_prompt(text: &str) -> String {
    format!("{PROMPT_HEADER}    {text}\n    ---\n    ")
}

/// Rimuove i recinti markdown (```` ```mermaid ```` e ```` ``` ````) e gli spazi esterni.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```mermaid", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn missing_credential_diagram() -> String {
    "graph TD\n  A[Errore Configurazione] --> B(La chiave API di Google non è configurata sul server.)"
        .to_string()
}

pub fn api_error_diagram(detail: &str) -> String {
    format!("graph TD\n  A[Errore API] --> B(Si è verificato un problema: {detail})")
}

/// Un diagramma è accettato se non contiene il marcatore di errore e,
/// una volta ripulito dagli spazi, inizia con `graph TD`.
pub fn is_acceptable(code: &str) -> bool {
    !code.contains(ERROR_MARKER) && code.trim().starts_with(DIAGRAM_PREFIX)
}

/// Chiede al modello di trasformare un testo in una mappa concettuale Mermaid.
#[derive(Clone)]
pub struct DiagramGenerator {
    model: Option<Arc<dyn LanguageModel>>,
    model_name: String,
}

impl DiagramGenerator {
    /// `model` è `None` quando la credenziale non è configurata.
    pub fn new(model: Option<Arc<dyn LanguageModel>>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Non fallisce mai: gli errori diventano diagrammi sentinella che
    /// contengono [`ERROR_MARKER`].
    pub async fn generate(&self, text: &str) -> String {
        let Some(model) = self.model.as_ref() else {
            warn!("Generazione richiesta senza GOOGLE_API_KEY configurata.");
            return missing_credential_diagram();
        };

        let prompt = build_prompt(text);
        match model.complete(&self.model_name, &prompt).await {
            Ok(raw) => {
                info!("Risposta ricevuta dal modello {} ({} caratteri).", self.model_name, raw.len());
                strip_code_fences(&raw)
            }
            Err(e) => {
                warn!("Errore nella chiamata al modello {}: {}", self.model_name, e);
                api_error_diagram(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        reply: Result<String, String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl RecordingModel {
        fn new(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            self.reply.clone().map_err(ModelError)
        }
    }

    #[test]
    fn prompt_embeds_text_verbatim() {
        let prompt = build_prompt("La fotosintesi (clorofilla) & luce");
        assert!(prompt.contains("La fotosintesi (clorofilla) & luce"));
        assert!(prompt.contains("5-7 macro-argomenti"));
        assert!(prompt.contains("3-5 concetti secondari"));
        assert!(prompt.contains("`graph TD`"));
    }

    #[test]
    fn prompt_keeps_node_text_rule_verbatim() {
        let prompt = build_prompt("x");
        assert!(prompt.contains(
            "il testo di un nodo NON DEVE contenere caratteri speciali come `()` o '||' o '&&' o `{} ecc. MA SOLO LETTERE E NUMERI`."
        ));
        assert!(prompt.contains("Nodi a rombo `{ }` per le decisioni."));
        assert!(prompt.ends_with("Testo da analizzare:\n    ---\n    x\n    ---\n    "));
    }

    #[test]
    fn strips_mermaid_fences() {
        let raw = "```mermaid\ngraph TD\n  A --> B\n```\n";
        assert_eq!(strip_code_fences(raw), "graph TD\n  A --> B");
        assert_eq!(strip_code_fences("  graph TD\n A-->B  "), "graph TD\n A-->B");
    }

    #[test]
    fn sentinels_are_never_acceptable() {
        assert!(!is_acceptable(&missing_credential_diagram()));
        assert!(!is_acceptable(&api_error_diagram("timeout")));
        assert!(missing_credential_diagram().starts_with(DIAGRAM_PREFIX));
    }

    #[test]
    fn acceptability_is_a_textual_check() {
        assert!(is_acceptable("graph TD\n A-->B"));
        assert!(is_acceptable("\n  graph TD\n A-->B"));
        assert!(!is_acceptable("graph LR\n A-->B"));
        assert!(!is_acceptable("Ecco la mappa:\ngraph TD\n A-->B"));
        assert!(!is_acceptable("graph TD\n A[Errore di sintassi]-->B"));
    }

    #[tokio::test]
    async fn missing_credential_returns_sentinel() {
        let generator = DiagramGenerator::new(None, "gemini-1.5-flash");
        let code = generator.generate("testo").await;
        assert!(code.contains(ERROR_MARKER));
        assert_eq!(code, missing_credential_diagram());
    }

    #[tokio::test]
    async fn successful_reply_is_cleaned() {
        let model = RecordingModel::new(Ok("```mermaid\ngraph TD\n A-->B\n```"));
        let generator = DiagramGenerator::new(Some(model.clone()), "gemini-1.5-flash");

        let code = generator.generate("appunti di biologia").await;

        assert_eq!(code, "graph TD\n A-->B");
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, "gemini-1.5-flash");
        assert!(prompts[0].1.contains("appunti di biologia"));
    }

    #[tokio::test]
    async fn model_failure_becomes_api_error_sentinel() {
        let model = RecordingModel::new(Err("quota esaurita"));
        let generator = DiagramGenerator::new(Some(model), "gemini-1.5-flash");

        let code = generator.generate("testo").await;

        assert!(code.contains(ERROR_MARKER));
        assert!(code.contains("quota esaurita"));
    }
}
