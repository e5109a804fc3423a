//! Ciclo di tentativi multipli attorno a [`DiagramGenerator`].

use tracing::{info, warn};

use crate::{
    config::RetryPolicy,
    mermaid::{is_acceptable, DiagramGenerator},
};

/// Chiama il generatore al massimo `policy.attempts` volte e restituisce il
/// primo codice accettabile, oppure `None` se tutti i tentativi falliscono.
pub async fn generate_with_retries(
    generator: &DiagramGenerator,
    text: &str,
    policy: RetryPolicy,
) -> Option<String> {
    for attempt in 1..=policy.attempts {
        let code = generator.generate(text).await;
        if is_acceptable(&code) {
            info!("Codice Mermaid valido ottenuto al tentativo {}/{}.", attempt, policy.attempts);
            return Some(code);
        }

        warn!(
            "Tentativo {}/{} scartato: codice Mermaid non valido.",
            attempt, policy.attempts
        );
        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }
    None
}
