use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::settings::Setting;

/// Body of `POST /admin/api/upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    /// Base64 payload, optionally as a `data:` URL.
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub url_prefix: String,
    pub max_mb: i64,
    pub allowed_types: Vec<String>,
}

impl UploadConfig {
    pub fn from_settings(pool: &DbPool) -> Self {
        UploadConfig {
            dir: PathBuf::from(Setting::get_or(pool, "uploads_path", "website/uploads/")),
            url_prefix: Setting::get_or(pool, "uploads_url_prefix", "/uploads/"),
            max_mb: Setting::get_i64_or(pool, "uploads_max_mb", 5).max(1),
            allowed_types: Setting::get_or(
                pool,
                "uploads_allowed_types",
                "image/jpeg,image/png,image/gif,image/webp",
            )
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        }
    }

    fn max_bytes(&self) -> usize {
        (self.max_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// Decode, validate and store an image, returning its public URL.
pub fn save_upload(config: &UploadConfig, req: &UploadRequest) -> Result<String, ApiError> {
    let content_type = req.content_type.trim().to_ascii_lowercase();
    if !config.allowed_types.contains(&content_type) {
        return Err(ApiError::bad_request(format!(
            "File type '{}' is not allowed",
            req.content_type
        )));
    }

    let bytes = decode_payload(&req.data)?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if bytes.len() > config.max_bytes() {
        return Err(ApiError::PayloadTooLarge(config.max_mb));
    }
    match sniff(&bytes) {
        Some(actual) if actual == content_type => {}
        _ => {
            return Err(ApiError::bad_request(
                "File contents do not match the declared type",
            ))
        }
    }

    let ext = extension_for(&content_type, &req.file_name);
    let unique_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);

    fs::create_dir_all(&config.dir).map_err(|e| ApiError::Storage(e.to_string()))?;
    fs::write(config.dir.join(&unique_name), &bytes).map_err(|e| ApiError::Storage(e.to_string()))?;

    log::info!("Stored upload {} ({} bytes) as {}", req.file_name, bytes.len(), unique_name);
    Ok(format!("{}/{}", config.url_prefix.trim_end_matches('/'), unique_name))
}

fn decode_payload(data: &str) -> Result<Vec<u8>, ApiError> {
    let data = data.trim();
    // data:image/png;base64,....
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or(""),
        None => data,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::bad_request("Upload data is not valid base64"))
}

/// Content type from the file signature.
fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn extension_for(content_type: &str, file_name: &str) -> String {
    match content_type {
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        _ => Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
            .to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn config(dir: &Path) -> UploadConfig {
        UploadConfig {
            dir: dir.to_path_buf(),
            url_prefix: "/uploads/".to_string(),
            max_mb: 1,
            allowed_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
        }
    }

    fn request(content_type: &str, bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            file_name: "chart.png".to_string(),
            content_type: content_type.to_string(),
            data: format!("data:{};base64,{}", content_type, STANDARD.encode(bytes)),
        }
    }

    #[test]
    fn stores_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = save_upload(&config(dir.path()), &request("image/png", PNG_HEADER)).unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));
        let name = url.trim_start_matches("/uploads/");
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), PNG_HEADER);
    }

    #[test]
    fn rejects_disallowed_and_mismatched_types() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let err = save_upload(&cfg, &request("image/svg+xml", b"<svg/>")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = save_upload(&cfg, &request("image/jpeg", PNG_HEADER)).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_oversized_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut big = PNG_HEADER.to_vec();
        big.resize(1024 * 1024 + 1, 0);
        let err = save_upload(&config(dir.path()), &request("image/png", &big)).unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(1)));
    }

    #[test]
    fn accepts_bare_base64() {
        assert_eq!(decode_payload("aGk=").unwrap(), b"hi");
        assert!(decode_payload("not base64!").is_err());
    }
}
