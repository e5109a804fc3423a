//! Estrazione del testo da un PDF caricato via web.

use std::panic::{self, UnwindSafe};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
enum ExtractError {
    #[error("PDF non leggibile: {0}")]
    Pdf(String),

    #[error("il parser PDF è andato in panic")]
    Panic,
}

/// Estrae il testo semplice da un documento paginato.
///
/// Non propaga errori: un risultato vuoto significa che l'estrazione è fallita.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> String;
}

/// Estrattore basato su `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> String {
        match extract_pages(bytes) {
            Ok(pages) => join_pages(pages),
            Err(e) => {
                warn!("Errore durante l'estrazione del testo dal PDF: {}", e);
                String::new()
            }
        }
    }
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    // pdf-extract può andare in panic su file malformati.
    guarded(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
}

fn guarded<F>(parse: F) -> Result<Vec<String>, ExtractError>
where
    F: FnOnce() -> Result<Vec<String>, pdf_extract::OutputError> + UnwindSafe,
{
    panic::catch_unwind(parse)
        .map_err(|_| ExtractError::Panic)?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Concatena i testi delle pagine nell'ordine originale, senza separatori.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages.into_iter().fold(String::new(), |mut acc, page| {
        acc.push_str(page.as_ref());
        acc
    })
}
