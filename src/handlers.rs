use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path as UrlPath, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::error::FileServerError;
use crate::listing::list_directory;
use crate::render::Page;
use crate::resolve::{resolve, ResolvedPath};
use crate::AppState;

/// Multipart field carrying the uploaded file
const UPLOAD_FIELD: &str = "file";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

mod icons {
    pub const DIR: &[u8] = include_bytes!("../assets/images/dir.png");
    pub const FILE: &[u8] = include_bytes!("../assets/images/file.png");
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_name: String,
    pub destination: PathBuf,
}

// ============================================================================
// Helper functions
// ============================================================================

/// Reduce a client-supplied filename to its last path component, without
/// control characters. Returns None if nothing usable is left.
fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let sanitized: String = base.chars().filter(|c| !c.is_control()).collect();

    match sanitized.as_str() {
        "" | "." | ".." => None,
        _ => Some(sanitized),
    }
}

/// Destination for an upload: `<upload_dir>/<nanos>_<name>`.
///
/// The timestamp prefix only makes collisions unlikely; two uploads of the
/// same name within one clock tick end up at the same path.
fn upload_destination(upload_dir: &Path, original_name: &str) -> UploadedFile {
    let prefix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    UploadedFile {
        original_name: original_name.to_string(),
        destination: upload_dir.join(format!("{}_{}", prefix, original_name)),
    }
}

/// `Content-Disposition` value forcing a download under `name`.
///
/// Quotes and control characters cannot appear in the quoted filename, so
/// they are replaced.
fn attachment_disposition(name: &str) -> String {
    let safe_filename: String = name
        .chars()
        .map(|c| match c {
            '"' => '\'',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe_filename)
}

/// Open a file and wrap it in a streaming body.
async fn file_body(path: &Path) -> Result<Body, FileServerError> {
    let file = fs::File::open(path).await?;
    Ok(Body::from_stream(ReaderStream::new(file)))
}

async fn render_listing(
    state: &AppState,
    resolved: ResolvedPath,
) -> Result<Response, FileServerError> {
    let title = resolved.absolute.display().to_string();

    let entries = tokio::task::spawn_blocking(move || list_directory(&resolved))
        .await
        .map_err(|err| FileServerError::Io(std::io::Error::other(err.to_string())))??;

    let html = state.renderer.render(&Page::Directory {
        title: &title,
        entries: &entries,
    })?;

    Ok(([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /local/{*subpath} - Browse the base directory
///
/// Directories render as a listing page, files are streamed as-is.
pub async fn browse(State(state): State<AppState>, uri: Uri) -> Result<Response, FileServerError> {
    let resolved = resolve(&state.config.base_dir, uri.path(), "/local").await?;

    if resolved.is_dir {
        debug!("Listing directory: {}", resolved.absolute.display());
        return render_listing(&state, resolved).await;
    }

    let mime = mime_guess::from_path(&resolved.absolute)
        .first_or_octet_stream()
        .to_string();
    let body = file_body(&resolved.absolute).await?;

    info!("client view: {}", resolved.absolute.display());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, resolved.size.to_string()),
        ],
        body,
    )
        .into_response())
}

/// GET /download/{*subpath} - Download a single file as an attachment
///
/// Directories cannot be downloaded; the client gets a short text notice
/// with status 200 instead of an error.
pub async fn download(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, FileServerError> {
    let resolved = resolve(&state.config.base_dir, uri.path(), "/download").await?;

    if resolved.is_dir {
        warn!("Download requested for directory: {}", resolved.absolute.display());
        return Ok("cannot download dir".into_response());
    }

    let body = file_body(&resolved.absolute).await?;

    info!("client download: {}", resolved.absolute.display());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, resolved.size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&resolved.name),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /upload/ - Upload form
pub async fn upload_form(State(state): State<AppState>) -> Result<Response, FileServerError> {
    let html = state.renderer.render(&Page::Upload)?;
    debug!("write upload content to client");
    Ok(([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response())
}

/// POST /upload/ - Store the `file` field of a multipart form in the upload
/// directory
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, FileServerError> {
    let mut multipart = multipart.map_err(|e| FileServerError::Upload(e.body_text()))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| FileServerError::Upload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let raw_filename = field.file_name().unwrap_or("upload").to_string();
        let file_name = sanitize_filename(&raw_filename).ok_or_else(|| {
            FileServerError::InvalidPath(format!("Invalid filename: {}", raw_filename))
        })?;

        let uploaded = upload_destination(&state.config.upload_dir, &file_name);

        // A failed copy leaves the partial file behind
        let mut file = fs::File::create(&uploaded.destination).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| FileServerError::Upload(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(
            "write file to {} ({} bytes, original name {})",
            uploaded.destination.display(),
            written,
            uploaded.original_name
        );

        return Ok("upload success...".into_response());
    }

    Err(FileServerError::MissingUploadField(UPLOAD_FIELD))
}

/// GET /images/{name} - Listing icons
pub async fn image(UrlPath(name): UrlPath<String>) -> Result<Response, FileServerError> {
    let bytes = match name.as_str() {
        "dir.png" => icons::DIR,
        "file.png" => icons::FILE,
        _ => return Err(FileServerError::NotFound(format!("/images/{}", name))),
    };

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
