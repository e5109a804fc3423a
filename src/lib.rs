//! Servizio web che trasforma un PDF in una mappa concettuale Mermaid.
//!
//! Flusso: byte del PDF → [`extract`] → testo → [`pipeline`] (con
//! [`mermaid::DiagramGenerator`]) → codice Mermaid → opzionalmente [`render`]
//! → risposta HTTP ([`api`]).

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mermaid;
pub mod pipeline;
pub mod render;
