//! Directory listing model.

use crate::error::FileServerError;
use crate::resolve::ResolvedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Directory,
    File,
}

impl IconKind {
    /// URL of the icon asset shown next to the entry
    pub fn image_path(self) -> &'static str {
        match self {
            IconKind::Directory => "/images/dir.png",
            IconKind::File => "/images/file.png",
        }
    }
}

/// One row of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub icon: IconKind,
    /// Subpath of the entry, relative to the base directory
    pub link_path: String,
    pub display_name: String,
    /// Plain files only
    pub downloadable: bool,
}

/// List the immediate children of a resolved directory.
///
/// The first entry always points to the parent directory. Hidden entries
/// (leading `.`) are skipped; the rest are ordered directories first, then by
/// name.
pub fn list_directory(resolved: &ResolvedPath) -> Result<Vec<DirectoryEntry>, FileServerError> {
    let mut children = Vec::new();

    for entry in std::fs::read_dir(&resolved.absolute)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();

        // Skip hidden files
        if file_name.starts_with('.') {
            continue;
        }

        // Follow symlinks so a link to a directory is browsable
        let is_dir = entry.path().is_dir();

        children.push(DirectoryEntry {
            icon: if is_dir {
                IconKind::Directory
            } else {
                IconKind::File
            },
            link_path: child_link(&resolved.relative, &file_name),
            display_name: file_name,
            downloadable: !is_dir,
        });
    }

    children.sort_by(|a, b| match (a.icon, b.icon) {
        (IconKind::Directory, IconKind::File) => std::cmp::Ordering::Less,
        (IconKind::File, IconKind::Directory) => std::cmp::Ordering::Greater,
        _ => a
            .display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase()),
    });

    let mut entries = Vec::with_capacity(children.len() + 1);
    entries.push(DirectoryEntry {
        icon: IconKind::Directory,
        link_path: parent_link(&resolved.relative),
        display_name: "..".to_string(),
        downloadable: false,
    });
    entries.extend(children);

    Ok(entries)
}

/// Parent of a subpath; the root is its own parent.
fn parent_link(subpath: &str) -> String {
    let trimmed = subpath.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}

fn child_link(subpath: &str, name: &str) -> String {
    let trimmed = subpath.trim_end_matches('/');
    format!("{}/{}", trimmed, name)
}
