// src/utils/upload.rs

use std::path::Path;

use uuid::Uuid;

use crate::{config::MAX_UPLOAD_BYTES, error::AppError};

/// File types accepted for post attachments and profile pictures.
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "pdf"];

/// Whether the filename carries an allowed extension.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip path components and keep only a-zA-Z0-9 . _ -
/// so client-supplied names cannot traverse out of the upload dir.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();
    let base = Path::new(name)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy();
    base.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

/// Persist an uploaded file under `upload_dir`.
///
/// The stored name is the sanitized original prefixed with a random UUID,
/// so concurrent uploads of the same filename never collide.
/// Returns the stored filename.
pub async fn save_upload(
    upload_dir: &str,
    original_name: &str,
    data: &[u8],
) -> Result<String, AppError> {
    if !allowed_file(original_name) {
        return Err(AppError::BadRequest("File type not allowed".to_string()));
    }

    if data.is_empty() {
        return Err(AppError::BadRequest("Empty file".to_string()));
    }

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("File too large".to_string()));
    }

    let unique_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let target = Path::new(upload_dir).join(&unique_name);
    tokio::fs::write(&target, data)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(unique_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions() {
        assert!(allowed_file("cv.pdf"));
        assert!(allowed_file("photo.JPG"));
        assert!(allowed_file("pic.jpeg"));
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(!allowed_file("script.sh"));
        assert!(!allowed_file("archive.tar.gz"));
        assert!(!allowed_file("noextension"));
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir/photo.png"), "photo.png");
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_filename("my cv (final).pdf"), "my_cv__final_.pdf");
    }
}
