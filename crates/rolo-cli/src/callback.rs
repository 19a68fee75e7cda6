//! Loopback listener for the OAuth redirect.
//!
//! After `begin_login` sends the browser to the provider, the provider
//! redirects back to the registered `redirect_uri`. When that URI points at
//! localhost, this listener accepts the single redirect request, hands the
//! query string back to the caller and serves a tiny "you can close this tab"
//! page.

use anyhow::{Context, bail};
use rolo_auth::CallbackParams;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Default wait for the user to finish logging in.
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 300;

const SUCCESS_PAGE: &str = "<html><body><h3>Signed in.</h3>\
You can close this tab and return to the terminal.</body></html>";

/// Extract the loopback port from a redirect URI such as
/// `http://localhost:9876/callback`. Returns `None` for non-local or
/// portless URIs — those require the manual `callback` command instead.
#[must_use]
pub fn loopback_port(redirect_uri: &str) -> Option<u16> {
    let rest = redirect_uri
        .strip_prefix("http://localhost:")
        .or_else(|| redirect_uri.strip_prefix("http://127.0.0.1:"))?;
    let port_str = rest.split(['/', '?']).next()?;
    port_str.parse().ok()
}

/// Pull the query string out of an HTTP request line
/// (`GET /callback?code=… HTTP/1.1`).
fn query_from_request_line(line: &str) -> Option<&str> {
    let target = line.split_whitespace().nth(1)?;
    let (path, query) = target.split_once('?')?;
    path.ends_with("/callback").then_some(query)
}

/// Listen on the loopback port until the provider redirect arrives, then
/// return its parsed parameters.
pub async fn wait_for_callback(port: u16, timeout_secs: u64) -> anyhow::Result<CallbackParams> {
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind callback listener on {addr}"))?;
    tracing::info!(%addr, "waiting for the provider redirect");

    let wait = async {
        loop {
            let (stream, _) = listener.accept().await.context("accept failed")?;
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            let _ = reader
                .read_line(&mut request_line)
                .await
                .context("failed to read request")?;

            // Browsers also request /favicon.ico and the like; ignore those.
            let Some(query) = query_from_request_line(&request_line) else {
                let mut stream = reader.into_inner();
                let _ = stream
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                    .await;
                continue;
            };

            let params = CallbackParams::from_query(query);
            let mut stream = reader.into_inner();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
                SUCCESS_PAGE.len(),
                SUCCESS_PAGE
            );
            let _ = stream.write_all(response.as_bytes()).await;
            return Ok(params);
        }
    };

    match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), wait).await {
        Ok(result) => result,
        Err(_) => bail!("timed out after {timeout_secs}s waiting for the login redirect"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
