//! Minimal HTTP responder for the report endpoint and frontend assets.
//!
//! Serves `GET /scan-cache` as JSON and everything else from the
//! configured asset directory. Only plain `GET` over HTTP/1.1 with
//! `Connection: close` semantics — enough for the frontend and for
//! curl, nothing more.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ReportError;
use crate::scan::ScanReporter;

/// Maximum accepted request head size.
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// Report server configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory of static frontend assets; `None` disables asset serving.
    pub asset_dir: Option<PathBuf>,
}

/// HTTP listener exposing the cache-validation endpoint and assets.
pub struct ReportServer {
    config: ReportConfig,
    reporter: ScanReporter,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ReportServer {
    pub fn new(config: ReportConfig, reporter: ScanReporter) -> Arc<Self> {
        Arc::new(Self {
            config,
            reporter,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ReportError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("report server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("report server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream).await {
                                    tracing::debug!(%peer_addr, "report connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection(self: &Arc<Self>, mut stream: TcpStream) -> Result<(), ReportError> {
        let request = match read_request_head(&mut stream).await? {
            Some(r) => r,
            None => {
                write_response(&mut stream, "400 Bad Request", "text/plain", b"bad request")
                    .await?;
                return Ok(());
            }
        };

        if request.method != "GET" {
            write_response(
                &mut stream,
                "405 Method Not Allowed",
                "text/plain",
                b"method not allowed",
            )
            .await?;
            return Ok(());
        }

        if request.path == "/scan-cache" {
            let report = self.reporter.scan().await;
            let body = serde_json::to_vec(&report).unwrap_or_else(|_| b"{}".to_vec());
            write_response(&mut stream, "200 OK", "application/json", &body).await?;
            return Ok(());
        }

        self.serve_asset(&mut stream, &request.path).await
    }

    async fn serve_asset(&self, stream: &mut TcpStream, path: &str) -> Result<(), ReportError> {
        let Some(asset_dir) = &self.config.asset_dir else {
            write_response(stream, "404 Not Found", "text/plain", b"not found").await?;
            return Ok(());
        };

        let Some(relative) = sanitize_asset_path(path) else {
            write_response(stream, "404 Not Found", "text/plain", b"not found").await?;
            return Ok(());
        };

        let full_path = asset_dir.join(&relative);
        match tokio::fs::read(&full_path).await {
            Ok(body) => {
                write_response(stream, "200 OK", content_type(&full_path), &body).await?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                write_response(stream, "404 Not Found", "text/plain", b"not found").await?;
            }
            Err(e) => {
                tracing::error!(path = %full_path.display(), "asset read failed: {e}");
                write_response(
                    stream,
                    "500 Internal Server Error",
                    "text/plain",
                    b"internal error",
                )
                .await?;
            }
        }
        Ok(())
    }
}

struct RequestHead {
    method: String,
    path: String,
}

/// Reads and parses the request line; returns `None` on garbage input.
async fn read_request_head(stream: &mut TcpStream) -> Result<Option<RequestHead>, ReportError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        if buf.len() > MAX_REQUEST_HEAD {
            return Ok(None);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = match head.lines().next() {
        Some(l) => l,
        None => return Ok(None),
    };

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };

    // Strip any query string; the endpoints take no parameters.
    let path = target.split('?').next().unwrap_or(target);

    Ok(Some(RequestHead {
        method: method.to_string(),
        path: path.to_string(),
    }))
}

/// Maps a request path to a relative asset path, rejecting anything
/// that would escape the asset directory.
fn sanitize_asset_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let relative = if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{trimmed}index.html")
    } else {
        trimmed.to_string()
    };

    let candidate = Path::new(&relative);
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }
    Some(candidate.to_path_buf())
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> Result<(), ReportError> {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn spawn_report_server(
        asset_dir: Option<PathBuf>,
        command: &str,
    ) -> (Arc<ReportServer>, tokio::task::JoinHandle<()>) {
        let reporter = ScanReporter::new("/tmp").with_command(command);
        let server = ReportServer::new(ReportConfig { port: 0, asset_dir }, reporter);
        let server2 = Arc::clone(&server);
        let handle = tokio::spawn(async move {
            server2.run().await.unwrap();
        });
        for _ in 0..50 {
            if server.port().await != 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        (server, handle)
    }

    async fn get(port: u16, path: &str) -> String {
        request(port, &format!("GET {path} HTTP/1.1\r\nHost: test\r\n\r\n")).await
    }

    async fn request(port: u16, raw: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn scan_cache_endpoint_returns_json() {
        let (server, handle) = spawn_report_server(None, "echo").await;

        let response = get(server.port().await, "/scan-cache").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("application/json"));
        assert!(response.contains(r#""status":"success""#));

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn serves_index_for_root_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hubstream</h1>").unwrap();
        let (server, handle) = spawn_report_server(Some(dir.path().to_path_buf()), "echo").await;

        let response = get(server.port().await, "/").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/html"));
        assert!(response.contains("<h1>hubstream</h1>"));

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn missing_asset_is_404() {
        let dir = TempDir::new().unwrap();
        let (server, handle) = spawn_report_server(Some(dir.path().to_path_buf()), "echo").await;

        let response = get(server.port().await, "/nope.js").await;
        assert!(response.starts_with("HTTP/1.1 404"));

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn post_is_rejected() {
        let (server, handle) = spawn_report_server(None, "echo").await;

        let response = request(
            server.port().await,
            "POST /scan-cache HTTP/1.1\r\nHost: test\r\nContent-Length: 0\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 405"));

        server.shutdown();
        handle.await.unwrap();
    }

    #[test]
    fn sanitize_rejects_traversal() {
        assert!(sanitize_asset_path("/../etc/passwd").is_none());
        assert!(sanitize_asset_path("/a/../../b").is_none());
    }

    #[test]
    fn sanitize_maps_root_to_index() {
        assert_eq!(sanitize_asset_path("/"), Some(PathBuf::from("index.html")));
        assert_eq!(
            sanitize_asset_path("/app/"),
            Some(PathBuf::from("app/index.html"))
        );
        assert_eq!(
            sanitize_asset_path("/main.css"),
            Some(PathBuf::from("main.css"))
        );
    }

    #[test]
    fn content_types_cover_common_assets() {
        assert_eq!(content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("a.js")), "application/javascript");
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
    }
}
