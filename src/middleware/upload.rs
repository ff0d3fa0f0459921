use std::path::Path;

use axum::extract::multipart::Field;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{
    config::UploadConfig,
    error::{AppError, Result},
    models::UploadedFile,
};

pub fn is_image(content_type: &str) -> bool {
    content_type.contains("image")
}

/// `upload_<32 hex chars>` plus the client's extension, when it has a sane one.
pub fn stored_file_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("upload_{}.{}", Uuid::new_v4().simple(), ext),
        None => format!("upload_{}", Uuid::new_v4().simple()),
    }
}

/// Streams one file part to disk, enforcing the per-file size cap.
///
/// The partial file is removed when the cap is exceeded or the stream fails.
pub(super) async fn save_field(
    mut field: Field<'_>,
    name: String,
    original_name: String,
    content_type: String,
    config: &UploadConfig,
) -> Result<UploadedFile> {
    fs::create_dir_all(&config.dir).await?;

    let stored_name = stored_file_name(&original_name);
    let path = config.dir.join(&stored_name);
    let mut file = fs::File::create(&path).await?;
    let mut hasher = Sha256::new();
    let mut size: usize = 0;

    let written: Result<()> = async {
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::UploadError(e.body_text()))?
        {
            size += chunk.len();
            if size > config.max_file_size {
                return Err(AppError::UploadError(format!(
                    "maxFileSize exceeded: {} bytes allowed for {}",
                    config.max_file_size, name
                )));
            }
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = fs::remove_file(&path).await {
            tracing::warn!("Failed to remove partial upload {:?}: {}", path, remove_err);
        }
        return Err(e);
    }

    let sha256 = hex::encode(hasher.finalize());

    tracing::info!(
        field = %name,
        original_name = %original_name,
        stored_name = %stored_name,
        size = size,
        sha256 = %sha256,
        "Image upload stored"
    );

    Ok(UploadedFile {
        field: name,
        original_name,
        stored_name,
        path,
        content_type,
        size: size as u64,
        sha256,
    })
}
