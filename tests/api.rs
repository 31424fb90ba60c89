//! End-to-end tests for the HTTP API against a temporary upload directory.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
use imgpress::compress::CompressionSettings;
use imgpress::server::{AppState, router};
use imgpress::store::ImageStore;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

const MAX_UPLOAD: usize = 20 * 1024 * 1024;
const MAX_OUTPUT_PIXELS: u64 = 10_000_000;

/// Pseudo-random pixels so JPEG can't compress the image to nothing.
fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn setup() -> (TempDir, TestServer) {
    let tmp = TempDir::new().unwrap();
    let store = ImageStore::open(tmp.path().join("uploads")).unwrap();
    let state = AppState {
        store,
        compression: CompressionSettings::default(),
        max_output_pixels: MAX_OUTPUT_PIXELS,
    };
    let server = TestServer::new(router(state, MAX_UPLOAD)).unwrap();
    (tmp, server)
}

fn uploads(tmp: &TempDir) -> std::path::PathBuf {
    tmp.path().join("uploads")
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

async fn upload(server: &TestServer, name: &str, bytes: Vec<u8>) -> String {
    let part = Part::bytes(bytes).file_name(name).mime_type("image/jpeg");
    let response = server
        .post("/api/images/upload")
        .multipart(MultipartForm::new().add_part("image", part))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "File uploaded");
    body["filename"].as_str().unwrap().to_string()
}

// ============================================================================
// Upload / download
// ============================================================================

#[tokio::test]
async fn upload_stores_file_under_timestamp_name() {
    let (tmp, server) = setup();
    let bytes = noisy_jpeg(40, 30);
    let name = upload(&server, "photo.jpg", bytes.clone()).await;

    assert!(name.ends_with(".jpg"));
    assert!(name.trim_end_matches(".jpg").parse::<u128>().is_ok());
    assert_eq!(std::fs::read(uploads(&tmp).join(&name)).unwrap(), bytes);
}

#[tokio::test]
async fn upload_without_image_field_is_rejected() {
    let (_tmp, server) = setup();
    let response = server
        .post("/api/images/upload")
        .multipart(MultipartForm::new().add_text("caption", "no file here"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn download_returns_file_then_deletes_it() {
    let (tmp, server) = setup();
    let bytes = noisy_jpeg(40, 30);
    let name = upload(&server, "photo.jpg", bytes.clone()).await;

    let response = server.get(&format!("/api/images/download/{}", name)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), bytes.as_slice());
    assert_eq!(response.header("content-type"), "image/jpeg");
    let disposition = response.header("content-disposition");
    assert!(disposition.to_str().unwrap().starts_with("attachment"));

    assert!(!uploads(&tmp).join(&name).exists());
    server
        .get(&format!("/api/images/download/{}", name))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_missing_file_is_404() {
    let (_tmp, server) = setup();
    let response = server.get("/api/images/download/123.jpg").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn uploads_are_served_statically() {
    let (_tmp, server) = setup();
    let bytes = noisy_jpeg(20, 20);
    let name = upload(&server, "a.jpg", bytes.clone()).await;

    let response = server.get(&format!("/uploads/{}", name)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), bytes.as_slice());
}

// ============================================================================
// Compress
// ============================================================================

#[tokio::test]
async fn compress_with_generous_target_takes_one_pass() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(200, 150)).await;

    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": name, "targetSizeKB": 10_000 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["message"], "Image compressed");
    assert_eq!(body["filename"], format!("compressed-{}", name));
    assert_eq!(body["quality"], 90);
    assert_eq!(body["width"], 200);
    assert_eq!(body["height"], 150);
    assert_eq!(body["targetMet"], true);
    assert_eq!(body["passes"], 1);

    let output = uploads(&tmp).join(format!("compressed-{}", name));
    assert_eq!(dimensions(&output), (200, 150));
}

#[tokio::test]
async fn compress_with_tiny_target_returns_best_effort() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(200, 150)).await;

    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": name, "targetSizeKB": 1 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    let quality = body["quality"].as_u64().unwrap();
    let passes = body["passes"].as_u64().unwrap();
    assert!((5..90).contains(&quality));
    assert!((2..=18).contains(&passes));
    assert!(body["width"].as_u64().unwrap() < 200);

    let output = uploads(&tmp).join(format!("compressed-{}", name));
    let written = std::fs::metadata(&output).unwrap().len();
    assert_eq!(body["sizeKB"].as_u64().unwrap(), (written + 512) / 1024);
}

#[tokio::test]
async fn compress_accepts_numeric_string_target() {
    let (_tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(60, 40)).await;

    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": name, "targetSizeKB": "5000" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["passes"], 1);
}

#[tokio::test]
async fn compress_rejects_non_positive_target() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(60, 40)).await;

    for target in [json!(0), json!(-5)] {
        let response = server
            .post("/api/images/compress")
            .json(&json!({ "filename": name, "targetSizeKB": target }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
    assert!(!uploads(&tmp).join(format!("compressed-{}", name)).exists());
}

#[tokio::test]
async fn compress_rejects_non_numeric_target() {
    let (_tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(60, 40)).await;

    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": name, "targetSizeKB": "small" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("targetSizeKB"));
}

#[tokio::test]
async fn compress_with_quality_is_single_pass() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(80, 60)).await;

    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": name, "quality": 50 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["quality"], 50);
    assert_eq!(body["width"], 80);
    assert!(body.get("passes").is_none());
    let output = uploads(&tmp).join(format!("compressed-{}", name));
    assert_eq!(dimensions(&output), (80, 60));
}

#[tokio::test]
async fn compress_rejects_invalid_target_before_reading_file() {
    let (_tmp, server) = setup();
    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": "missing.jpg", "targetSizeKB": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("got 0"));
}

#[tokio::test]
async fn compress_missing_file_is_404() {
    let (_tmp, server) = setup();
    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": "404.jpg", "targetSizeKB": 100 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compress_rejects_path_traversal() {
    let (_tmp, server) = setup();
    let response = server
        .post("/api/images/compress")
        .json(&json!({ "filename": "../secret.jpg", "targetSizeKB": 100 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Resize / rotate / crop
// ============================================================================

#[tokio::test]
async fn resize_writes_prefixed_output() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(100, 80)).await;

    let response = server
        .post("/api/images/resize")
        .json(&json!({ "filename": name, "width": 64, "height": "48" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Image resized");
    assert_eq!(body["filename"], format!("resized-{}", name));

    let output = uploads(&tmp).join(format!("resized-{}", name));
    assert_eq!(dimensions(&output), (64, 48));
}

#[tokio::test]
async fn resize_over_pixel_limit_is_rejected() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(8, 8)).await;

    let response = server
        .post("/api/images/resize")
        .json(&json!({ "filename": name, "width": 40_000, "height": 40_000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("limit"));
    assert!(!uploads(&tmp).join(format!("resized-{}", name)).exists());

    // The server keeps answering after the rejected request.
    server
        .post("/api/images/resize")
        .json(&json!({ "filename": name, "width": 16, "height": 16 }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn resize_rejects_zero_width() {
    let (_tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(20, 20)).await;

    let response = server
        .post("/api/images/resize")
        .json(&json!({ "filename": name, "width": 0, "height": 10 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resize_requires_dimensions() {
    let (_tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(20, 20)).await;

    let response = server
        .post("/api/images/resize")
        .json(&json!({ "filename": name, "width": 10 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "height is required");
}

#[tokio::test]
async fn rotate_quarter_turn_swaps_dimensions() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(100, 80)).await;

    let response = server
        .post("/api/images/rotate")
        .json(&json!({ "filename": name, "angle": 90 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Image rotated");

    let output = uploads(&tmp).join(format!("rotated-{}", name));
    assert_eq!(dimensions(&output), (80, 100));
}

#[tokio::test]
async fn rotate_rejects_odd_angles() {
    let (_tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(20, 20)).await;

    let response = server
        .post("/api/images/rotate")
        .json(&json!({ "filename": name, "angle": 45 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn crop_writes_requested_rectangle() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(100, 80)).await;

    let response = server
        .post("/api/images/crop")
        .json(&json!({ "filename": name, "width": 50, "height": 40, "left": 10, "top": 20 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Image cropped");

    let output = uploads(&tmp).join(format!("cropped-{}", name));
    assert_eq!(dimensions(&output), (50, 40));
}

#[tokio::test]
async fn crop_outside_image_is_rejected() {
    let (tmp, server) = setup();
    let name = upload(&server, "photo.jpg", noisy_jpeg(100, 80)).await;

    let response = server
        .post("/api/images/crop")
        .json(&json!({ "filename": name, "width": 50, "height": 40, "left": 60, "top": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!uploads(&tmp).join(format!("cropped-{}", name)).exists());
}
