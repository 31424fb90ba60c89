//! Request handlers for `/api/images/*`.
//!
//! Handlers validate request values, then hand the image work to a
//! blocking worker thread (`spawn_blocking`) since every codec call is
//! CPU-bound and synchronous.

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::compress::{CompressError, compress_to_target};
use crate::imaging::{self, RustBackend, calculations::size_kb};
use crate::naming::{Operation, derived_name};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::stream::{self, StreamExt};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

/// Multipart field carrying the uploaded image.
const UPLOAD_FIELD: &str = "image";

/// An integer request value, sent either as a JSON number or a numeric
/// string (`300` or `"300"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntParam {
    Int(i64),
    Float(f64),
    Text(String),
}

impl IntParam {
    /// Parse to an integer. Fractional numbers are truncated.
    pub fn parse(&self, name: &str) -> ApiResult<i64> {
        let invalid = || ApiError::BadRequest(format!("{} must be an integer", name));
        match self {
            IntParam::Int(v) => Ok(*v),
            IntParam::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            IntParam::Float(_) => Err(invalid()),
            IntParam::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        }
    }
}

fn required(name: &str, value: &Option<IntParam>) -> ApiResult<i64> {
    value
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))?
        .parse(name)
}

fn required_filename(filename: Option<String>) -> ApiResult<String> {
    filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("filename is required".to_string()))
}

/// Run CPU-bound image work off the async runtime.
async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub message: &'static str,
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub message: &'static str,
    pub filename: String,
    #[serde(rename = "sizeKB")]
    pub size_kb: u64,
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_met: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passes: Option<usize>,
}

// ============================================================================
// Upload / download
// ============================================================================

/// `POST /upload`: store the `image` multipart field under a new name.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<FileResponse>> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;
        upload = Some((original, data));
        break;
    }

    let (original, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let store = state.store.clone();
    let size = data.len();
    let filename = run_blocking(move || Ok(store.save_upload(&original, &data)?)).await?;

    info!(%filename, bytes = size, "file uploaded");
    Ok(Json(FileResponse {
        message: "File uploaded",
        filename,
    }))
}

/// `GET /download/{filename}`: stream the file as an attachment, then
/// delete it once the whole body has been read.
pub async fn download_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state.store.existing(&filename)?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("Error downloading file: {}", e)))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Error downloading file: {}", e)))?
        .len();

    let store = state.store.clone();
    let name = filename.clone();
    let cleanup = stream::once(async move {
        let target = name.clone();
        let removed = run_blocking(move || Ok(store.remove(&target)?)).await;
        match removed {
            Ok(()) => debug!(filename = %name, "removed downloaded file"),
            Err(e) => error!(filename = %name, error = %e, "error deleting downloaded file"),
        }
        None::<std::io::Result<Bytes>>
    })
    .filter_map(|chunk| async move { chunk });
    let body = Body::from_stream(ReaderStream::new(file).chain(cleanup));

    let mime = ImageFormat::from_path(&path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| ApiError::BadRequest(format!("Invalid filename: {:?}", filename)))?;

    info!(%filename, bytes = len, "file download started");
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(mime)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        body,
    )
        .into_response())
}

// ============================================================================
// Transforms
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub filename: Option<String>,
    pub width: Option<IntParam>,
    pub height: Option<IntParam>,
}

/// `POST /resize`: write `resized-<filename>` at exactly width × height.
pub async fn resize_image(
    State(state): State<AppState>,
    Json(req): Json<ResizeRequest>,
) -> ApiResult<Json<FileResponse>> {
    let filename = required_filename(req.filename)?;
    let width = required("width", &req.width)?;
    let height = required("height", &req.height)?;
    let output_name = derived_name(Operation::Resize, &filename);

    let store = state.store.clone();
    let out = output_name.clone();
    let max_pixels = state.max_output_pixels;
    run_blocking(move || {
        let source = store.existing(&filename)?;
        let output = store.resolve(&out)?;
        imaging::resize_image(
            &RustBackend::new(),
            &source,
            &output,
            width,
            height,
            max_pixels,
        )?;
        Ok(())
    })
    .await?;

    info!(filename = %output_name, width, height, "image resized");
    Ok(Json(FileResponse {
        message: "Image resized",
        filename: output_name,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CompressRequest {
    pub filename: Option<String>,
    /// Size budget in kilobytes; selects the iterative compressor.
    #[serde(rename = "targetSizeKB", alias = "targetSizeKb", alias = "target_size_kb")]
    pub target_size_kb: Option<IntParam>,
    /// Single-pass quality (1-100); used when no target size is given.
    pub quality: Option<IntParam>,
}

/// `POST /compress`: write `compressed-<filename>`.
///
/// With `targetSizeKB`, runs the size-bounded loop and reports the
/// quality and dimensions it settled on. With only `quality`, re-encodes
/// once at natural size.
pub async fn compress_image(
    State(state): State<AppState>,
    Json(req): Json<CompressRequest>,
) -> ApiResult<Json<CompressResponse>> {
    let filename = required_filename(req.filename)?;
    let output_name = derived_name(Operation::Compress, &filename);
    let store = state.store.clone();
    let out = output_name.clone();

    if let Some(target) = &req.target_size_kb {
        let target_kb = target.parse("targetSizeKB")?;
        if target_kb <= 0 {
            return Err(CompressError::InvalidTarget(target_kb).into());
        }
        let settings = state.compression;
        let result = run_blocking(move || {
            let source = store.read(&filename)?;
            let result = compress_to_target(&RustBackend::new(), &source, target_kb, &settings)?;
            store.write(&out, &result.bytes)?;
            Ok(result)
        })
        .await?;

        info!(
            filename = %output_name,
            target_kb,
            size_kb = result.size_kb,
            quality = result.quality,
            passes = result.passes(),
            target_met = result.target_met,
            "image compressed to target"
        );
        return Ok(Json(CompressResponse {
            message: "Image compressed",
            filename: output_name,
            size_kb: result.size_kb,
            quality: result.quality,
            width: result.width,
            height: result.height,
            target_met: Some(result.target_met),
            passes: Some(result.passes()),
        }));
    }

    let quality = required("quality", &req.quality).map_err(|_| {
        ApiError::BadRequest("targetSizeKB or quality must be an integer".to_string())
    })?;
    let result = run_blocking(move || {
        let source = store.existing(&filename)?;
        let output = store.resolve(&out)?;
        Ok(imaging::compress_with_quality(
            &RustBackend::new(),
            &source,
            &output,
            quality,
        )?)
    })
    .await?;

    info!(
        filename = %output_name,
        quality = result.quality.value(),
        bytes = result.bytes,
        "image compressed"
    );
    Ok(Json(CompressResponse {
        message: "Image compressed",
        filename: output_name,
        size_kb: size_kb(result.bytes),
        quality: result.quality.value(),
        width: result.width,
        height: result.height,
        target_met: None,
        passes: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub filename: Option<String>,
    pub angle: Option<IntParam>,
}

/// `POST /rotate`: write `rotated-<filename>` turned by `angle` degrees.
pub async fn rotate_image(
    State(state): State<AppState>,
    Json(req): Json<RotateRequest>,
) -> ApiResult<Json<FileResponse>> {
    let filename = required_filename(req.filename)?;
    let angle = required("angle", &req.angle)?;
    let output_name = derived_name(Operation::Rotate, &filename);

    let store = state.store.clone();
    let out = output_name.clone();
    run_blocking(move || {
        let source = store.existing(&filename)?;
        let output = store.resolve(&out)?;
        imaging::rotate_image(&RustBackend::new(), &source, &output, angle)?;
        Ok(())
    })
    .await?;

    info!(filename = %output_name, angle, "image rotated");
    Ok(Json(FileResponse {
        message: "Image rotated",
        filename: output_name,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CropRequest {
    pub filename: Option<String>,
    pub width: Option<IntParam>,
    pub height: Option<IntParam>,
    pub left: Option<IntParam>,
    pub top: Option<IntParam>,
}

/// `POST /crop`: write `cropped-<filename>` for a rectangle inside the image.
pub async fn crop_image(
    State(state): State<AppState>,
    Json(req): Json<CropRequest>,
) -> ApiResult<Json<FileResponse>> {
    let filename = required_filename(req.filename)?;
    let width = required("width", &req.width)?;
    let height = required("height", &req.height)?;
    let left = required("left", &req.left)?;
    let top = required("top", &req.top)?;
    let output_name = derived_name(Operation::Crop, &filename);

    let store = state.store.clone();
    let out = output_name.clone();
    run_blocking(move || {
        let source = store.existing(&filename)?;
        let output = store.resolve(&out)?;
        imaging::crop_image(
            &RustBackend::new(),
            &source,
            &output,
            left,
            top,
            width,
            height,
        )?;
        Ok(())
    })
    .await?;

    info!(filename = %output_name, left, top, width, height, "image cropped");
    Ok(Json(FileResponse {
        message: "Image cropped",
        filename: output_name,
    }))
}
