//! `multipart/form-data` bodies: text fields plus at most one file per name.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::errors::AppError;
use crate::files::Upload;

#[derive(Debug, Default)]
pub struct Form {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl Form {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

/// Drains the multipart stream. Parts with a file name are files; the rest
/// are UTF-8 text. Any single part above `max_bytes` is rejected.
pub async fn read_form(mut multipart: Multipart, max_bytes: usize) -> Result<Form, AppError> {
    let mut form = Form::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {}", e.body_text())))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read '{name}': {}", e.body_text())))?;

        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "'{name}' exceeds the {max_bytes} byte upload limit"
            )));
        }

        match file_name {
            Some(file_name) => {
                form.files.insert(
                    name,
                    Upload {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            }
            None => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::Validation(format!("'{name}' must be UTF-8 text")))?;
                form.fields.insert(name, text);
            }
        }
    }

    Ok(form)
}
