use std::{collections::BTreeMap, path::PathBuf};

use crate::validation::FormFields;

/// Parsed request body attached to the request by the form middleware.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub fields: FormFields,
    pub files: BTreeMap<String, UploadedFile>,
}

impl FormData {
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub original_name: String,
    /// Server-generated name inside the upload directory.
    pub stored_name: String,
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
    pub sha256: String,
}
