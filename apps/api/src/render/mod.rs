//! PDF resumes: template HTML + resume aggregate -> HTML -> PDF.

pub mod engine;
pub mod handlers;
pub mod html;
pub mod saved;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template file '{0}' does not exist")]
    TemplateMissing(String),

    #[error("Template path '{0}' escapes the templates directory")]
    UnsafePath(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("PDF engine failed: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTML in, PDF bytes out.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn html_to_pdf(&self, html: &str) -> Result<Bytes, RenderError>;
}

/// Joins a catalog `template_path` onto the templates root. Only plain
/// relative paths are accepted.
pub fn resolve_template_path(root: &Path, relative: &str) -> Result<PathBuf, RenderError> {
    let rel = Path::new(relative);
    let plain = !relative.is_empty()
        && rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !plain {
        return Err(RenderError::UnsafePath(relative.to_string()));
    }
    Ok(root.join(rel))
}

pub async fn load_template_html(root: &Path, relative: &str) -> Result<String, RenderError> {
    let path = resolve_template_path(root, relative)?;
    match tokio::fs::read_to_string(&path).await {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(RenderError::TemplateMissing(relative.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
