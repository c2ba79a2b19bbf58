//! HTML page rendering.
//!
//! Handlers only build the page model; turning it into bytes goes through
//! [`PageRenderer`], so the markup can be swapped without touching them.

use crate::error::FileServerError;
use crate::listing::DirectoryEntry;

/// Embedded templates (compiled into binary).
mod embedded {
    pub const DIR: &str = include_str!("../templates/dir.html");
    pub const UPLOAD: &str = include_str!("../templates/upload.html");
}

/// Pages the server can render.
#[derive(Debug, Clone, Copy)]
pub enum Page<'a> {
    /// Listing of a directory under the base directory
    Directory {
        title: &'a str,
        entries: &'a [DirectoryEntry],
    },
    /// Upload form
    Upload,
}

impl Page<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Directory { .. } => "dir",
            Page::Upload => "upload",
        }
    }
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &Page<'_>) -> Result<Vec<u8>, FileServerError>;
}

/// Renderer backed by the templates in `templates/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl PageRenderer for HtmlRenderer {
    fn render(&self, page: &Page<'_>) -> Result<Vec<u8>, FileServerError> {
        let html = match page {
            Page::Directory { title, entries } => {
                let title = escape_html(title);
                let rows: String = entries.iter().map(render_row).collect();
                fill(
                    embedded::DIR,
                    &[("title", title.as_str()), ("rows", rows.as_str())],
                )?
            }
            Page::Upload => embedded::UPLOAD.to_string(),
        };
        Ok(html.into_bytes())
    }
}

fn render_row(entry: &DirectoryEntry) -> String {
    let href = encode_link(&entry.link_path);
    let name = escape_html(&entry.display_name);
    let download = if entry.downloadable {
        format!("<a href=\"/download{}\">download</a>", href)
    } else {
        String::new()
    };

    format!(
        "<tr><td><img src=\"{}\" alt=\"\"></td><td><a href=\"/local{}\">{}</a></td><td>{}</td></tr>\n",
        entry.icon.image_path(),
        href,
        name,
        download
    )
}

/// Replace `{{key}}` placeholders in one pass over the template. Inserted
/// values are never scanned again. Every key must occur in the template.
fn fill(template: &str, values: &[(&str, &str)]) -> Result<String, FileServerError> {
    let mut out = String::with_capacity(template.len());
    let mut used = vec![false; values.len()];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len + 2;
        let key = &rest[start + 2..start + 2 + len];

        out.push_str(&rest[..start]);
        match values.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                out.push_str(values[idx].1);
                used[idx] = true;
            }
            None => out.push_str(&rest[start..end]),
        }
        rest = &rest[end..];
    }
    out.push_str(rest);

    if let Some(idx) = used.iter().position(|u| !u) {
        return Err(FileServerError::Render(format!(
            "template has no {{{{{}}}}} placeholder",
            values[idx].0
        )));
    }
    Ok(out)
}

/// Percent-encode each segment of a link path, keeping the separators.
fn encode_link(link: &str) -> String {
    link.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
