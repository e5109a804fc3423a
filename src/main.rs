use anyhow::{Context, Result};
use mappa_concettuale::{api, app_state::AppState, config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Caricare .env e inizializzare il logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Caricare la configurazione
    let cfg = config::AppConfig::from_env().context("Errore nel caricamento della configurazione")?;
    info!(
        "Modello: {}, formato di risposta: {:?}, tentativi: {}",
        cfg.llm_chat_model, cfg.response_format, cfg.retry.attempts
    );

    // 3. Stato condiviso dell'applicazione
    let app_state = AppState::from_config(cfg).context("Errore nell'inizializzazione dei servizi")?;
    let server_addr = app_state.config.server_addr.clone();

    // 4. Router dell'API e file statici del front-end
    let app = api::create_app(app_state);

    // 5. Avvio del server
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Impossibile ascoltare su {server_addr}"))?;
    info!("🚀 Server in ascolto su http://{}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Segnale di arresto ricevuto, chiusura del server.");
        })
        .await
        .context("Errore del server HTTP")?;

    info!("✅ Server chiuso correttamente.");
    Ok(())
}
