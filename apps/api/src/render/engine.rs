use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, error};

use crate::render::{PdfRenderer, RenderError};

/// Runs an external HTML-to-PDF converter as `<bin> <input.html> <output.pdf>`
/// inside a scratch directory that is removed afterwards.
pub struct ProcessPdfRenderer {
    bin: String,
}

impl ProcessPdfRenderer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl PdfRenderer for ProcessPdfRenderer {
    async fn html_to_pdf(&self, html: &str) -> Result<Bytes, RenderError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("resume.html");
        let output = workdir.path().join("resume.pdf");
        tokio::fs::write(&input, html).await?;

        debug!("Running {} on {}", self.bin, input.display());
        let result = Command::new(&self.bin)
            .arg(&input)
            .arg(&output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RenderError::Engine(format!("could not start '{}': {e}", self.bin)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("PDF engine exited with {}: {}", result.status, stderr.trim());
            return Err(RenderError::Engine(format!(
                "'{}' exited with {}",
                self.bin, result.status
            )));
        }

        let pdf = tokio::fs::read(&output).await?;
        if pdf.is_empty() {
            return Err(RenderError::Engine("engine produced an empty file".to_string()));
        }
        Ok(Bytes::from(pdf))
    }
}
