//! Test utilities and common setup.

use axum::Router;
use local_file_server::{routes, AppState, ServerConfig};
use tempfile::TempDir;

/// A router serving a temporary tree.
///
/// Layout: `docs/report.pdf` (1024 bytes), `docs/.secret`, `docs/archive/`,
/// `hello.txt`, with uploads going to `uploads/` inside the base directory.
pub struct TestServer {
    pub app: Router,
    pub base: TempDir,
}

impl TestServer {
    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.base.path().join("uploads")
    }
}

/// Create a test application over a freshly populated base directory.
pub fn test_app() -> TestServer {
    test_app_with("")
}

/// Like [`test_app`], with extra TOML lines appended to the config.
pub fn test_app_with(extra_config: &str) -> TestServer {
    let base = TempDir::new().unwrap();
    std::fs::create_dir_all(base.path().join("docs/archive")).unwrap();
    std::fs::write(base.path().join("docs/report.pdf"), report_bytes()).unwrap();
    std::fs::write(base.path().join("docs/.secret"), "hidden").unwrap();
    std::fs::write(base.path().join("hello.txt"), "hello world").unwrap();

    let content = format!(
        "basedir = {:?}\nuploaddir = {:?}\nport = 9090\n{}",
        base.path(),
        base.path().join("uploads"),
        extra_config
    );
    let config = ServerConfig::from_toml(&content, std::path::Path::new("test.toml")).unwrap();

    TestServer {
        app: routes::app(AppState::new(config)),
        base,
    }
}

/// Contents of `docs/report.pdf`.
pub fn report_bytes() -> Vec<u8> {
    (0..1024u32).map(|i| (i % 251) as u8).collect()
}
