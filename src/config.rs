//! Caricamento e gestione della configurazione dell'applicazione
//! (credenziale Google, modello, tentativi di generazione e Kroki).

use std::{env, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use tracing::warn;

/// Formato della risposta di `/api/generate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `{"mermaid_code": "..."}`
    Json,
    /// Immagine PNG renderizzata da Kroki.
    Png,
}

impl FromStr for ResponseFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "png" | "image" => Ok(Self::Png),
            other => Err(anyhow!("Formato di risposta non supportato: {other}")),
        }
    }
}

/// Politica dei tentativi per la generazione del codice Mermaid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Parametri del servizio di rendering Kroki.
#[derive(Clone, Debug)]
pub struct KrokiConfig {
    pub url: String,
    pub theme: String,
    pub timeout: Duration,
}

impl Default for KrokiConfig {
    fn default() -> Self {
        Self {
            url: "https://kroki.io/mermaid/png".to_string(),
            theme: "forest".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configurazione completa dell'applicazione.
///
/// Viene costruita una sola volta all'avvio e poi condivisa in sola lettura.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub static_dir: String,
    pub response_format: ResponseFormat,
    pub max_upload_bytes: usize,

    pub google_api_key: Option<String>,
    pub llm_chat_model: String,
    pub retry: RetryPolicy,

    pub kroki: KrokiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3322".to_string(),
            static_dir: "static".to_string(),
            response_format: ResponseFormat::Json,
            max_upload_bytes: 10 * 1024 * 1024,
            google_api_key: None,
            llm_chat_model: "gemini-1.5-flash".to_string(),
            retry: RetryPolicy::default(),
            kroki: KrokiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Carica la configurazione dalle variabili d'ambiente (usando .env se esiste).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Come [`AppConfig::from_env`], ma con una sorgente di variabili arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let google_api_key = lookup("GOOGLE_API_KEY").filter(|key| !key.trim().is_empty());
        if google_api_key.is_none() {
            warn!("ATTENZIONE: la variabile d'ambiente GOOGLE_API_KEY non è stata trovata.");
        }

        let response_format = match lookup("RESPONSE_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.response_format,
        };

        let attempts: u32 = parse_or(&lookup, "GENERATION_ATTEMPTS", defaults.retry.attempts)?;
        if attempts == 0 {
            return Err(anyhow!("GENERATION_ATTEMPTS deve essere almeno 1"));
        }
        let delay_ms: u64 = parse_or(
            &lookup,
            "GENERATION_RETRY_DELAY_MS",
            defaults.retry.delay.as_millis() as u64,
        )?;
        let timeout_secs: u64 = parse_or(
            &lookup,
            "KROKI_TIMEOUT_SECS",
            defaults.kroki.timeout.as_secs(),
        )?;

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or(defaults.server_addr),
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
            response_format,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            google_api_key,
            llm_chat_model: lookup("LLM_CHAT_MODEL").unwrap_or(defaults.llm_chat_model),
            retry: RetryPolicy {
                attempts,
                delay: Duration::from_millis(delay_ms),
            },
            kroki: KrokiConfig {
                url: lookup("KROKI_URL").unwrap_or(defaults.kroki.url),
                theme: lookup("KROKI_THEME").unwrap_or(defaults.kroki.theme),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valore non valido per {key} ({raw}): {e}")),
        None => Ok(default),
    }
}
