//! Local image upload and retrieval.

use crate::error::ApiError;
use crate::response::{ok, ApiResponse};
use crate::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const FIELD_NAME: &str = "image";
const ALLOWED_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub url: String,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Both the file extension and the declared MIME type must name an image
/// format we accept.
fn is_allowed_image(original_name: &str, mime: &str) -> bool {
    let ext_ok = extension_of(original_name)
        .is_some_and(|ext| ALLOWED_TYPES.iter().any(|t| ext.contains(t)));
    let mime = mime.to_ascii_lowercase();
    let mime_ok = ALLOWED_TYPES.iter().any(|t| mime.contains(t));
    ext_ok && mime_ok
}

fn stored_name(original_name: &str) -> String {
    let suffix = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    match extension_of(original_name) {
        Some(ext) => format!("{FIELD_NAME}-{}-{suffix}.{ext}", Utc::now().timestamp_millis()),
        None => format!("{FIELD_NAME}-{}-{suffix}", Utc::now().timestamp_millis()),
    }
}

fn human_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    let scaled = |unit: usize, suffix: &str| {
        if bytes % unit == 0 {
            format!("{}{suffix}", bytes / unit)
        } else {
            format!("{:.1}{suffix}", bytes as f64 / unit as f64)
        }
    };
    match bytes {
        b if b >= MB => scaled(MB, "MB"),
        b if b >= KB => scaled(KB, "KB"),
        b => format!("{b} bytes"),
    }
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::Rejected(format!(
        "File size too large. Maximum size is {}.",
        human_size(max_bytes)
    ))
}

async fn drain(field: &mut Field) -> Result<(), ApiError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| ApiError::Rejected(e.to_string()))?;
    }
    Ok(())
}

async fn write_field(field: &mut Field, path: &Path, max_bytes: usize) -> Result<usize, ApiError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::Rejected(e.to_string()))?;
        size += chunk.len();
        if size > max_bytes {
            return Err(too_large(max_bytes));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

#[post("/image")]
pub async fn upload_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let settings = &state.uploads;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::Rejected(e.to_string()))?;
        if field.name() != Some(FIELD_NAME) {
            drain(&mut field).await?;
            continue;
        }

        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned)
            .unwrap_or_default();
        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_owned())
            .unwrap_or_default();

        if !is_allowed_image(&original_name, &mime) {
            drain(&mut field).await?;
            return Err(ApiError::Rejected("Only image files are allowed!".into()));
        }

        tokio::fs::create_dir_all(&settings.dir).await?;
        let filename = stored_name(&original_name);
        let path = settings.dir.join(&filename);

        let size = match write_field(&mut field, &path, settings.max_bytes).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %rm, "failed to remove partial upload");
                }
                return Err(e);
            }
        };

        let conn = req.connection_info();
        let url = format!("{}://{}/uploads/{}", conn.scheme(), conn.host(), filename);
        info!(%filename, size, "image uploaded");

        return Ok(ok(ApiResponse::with_message(
            "Image uploaded successfully",
            UploadedImage {
                filename,
                original_name,
                size,
                url,
            },
        )));
    }

    Err(ApiError::Rejected("No image file provided".into()))
}

fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[get("/uploads/{filename}")]
pub async fn serve_upload(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let name = filename.into_inner();
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ApiError::not_found("File"));
    }

    let bytes = match tokio::fs::read(state.uploads.dir.join(&name)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("File"))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .body(bytes))
}
