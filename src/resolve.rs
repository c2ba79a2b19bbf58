//! Mapping of request paths onto the served directory tree.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FileServerError;

/// A request path resolved against the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Decoded subpath, always starting with `/`
    pub relative: String,
    /// Location on disk
    pub absolute: PathBuf,
    pub is_dir: bool,
    /// Size in bytes as reported by `stat`
    pub size: u64,
    /// Final component of the path (the base directory's own name for `/`)
    pub name: String,
}

/// Strip `prefix` from the raw request path, decode it and stat the result
/// under `base_dir`.
pub async fn resolve(
    base_dir: &Path,
    request_path: &str,
    prefix: &str,
) -> Result<ResolvedPath, FileServerError> {
    debug!("request path = {}", request_path);

    let subpath = request_path.strip_prefix(prefix).unwrap_or(request_path);
    let subpath = if subpath.is_empty() { "/" } else { subpath };
    let relative = decode_subpath(subpath)?;

    let absolute = join_subpath(base_dir, &relative)?;
    let metadata = tokio::fs::metadata(&absolute).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => FileServerError::NotFound(relative.clone()),
        _ => FileServerError::Io(e),
    })?;

    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(ResolvedPath {
        relative,
        absolute,
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        name,
    })
}

/// Percent-decode a subpath. Malformed escapes and non UTF-8 results are
/// rejected rather than passed through.
fn decode_subpath(subpath: &str) -> Result<String, FileServerError> {
    let bytes = subpath.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(FileServerError::InvalidPath(subpath.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let decoded = urlencoding::decode(subpath)
        .map_err(|_| FileServerError::InvalidPath(subpath.to_string()))?;

    if decoded.starts_with('/') {
        Ok(decoded.into_owned())
    } else {
        Ok(format!("/{}", decoded))
    }
}

/// Append the components of `relative` to `base_dir` without touching the
/// filesystem. Parent references are refused.
fn join_subpath(base_dir: &Path, relative: &str) -> Result<PathBuf, FileServerError> {
    if relative.contains('\0') {
        warn!("Path contains null byte: {:?}", relative);
        return Err(FileServerError::InvalidPath(relative.replace('\0', "\\0")));
    }

    let mut result = base_dir.to_path_buf();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(name) => result.push(name),
            Component::CurDir => continue,
            Component::ParentDir => {
                warn!("Path traversal attempt detected: {}", relative);
                return Err(FileServerError::PathTraversal);
            }
            Component::RootDir | Component::Prefix(_) => {
                warn!("Absolute path component in {}", relative);
                return Err(FileServerError::PathTraversal);
            }
        }
    }

    Ok(result)
}
