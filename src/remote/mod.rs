//! Read-only client for the remote todo list.
//!
//! The remote list is independent of the local store: nothing fetched here
//! is written to the database.

use crate::config::DEFAULT_API_URL;
use crate::error::{Error, Result};
use crate::model::RemoteTodo;

use std::time::Duration;
use tracing::debug;

/// Number of items requested from the remote list.
pub const FETCH_LIMIT: usize = 10;

/// HTTP client for `GET {base}/todos`.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Client for `base_url`; a trailing `/` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the list request.
    #[must_use]
    pub fn todos_url(&self) -> String {
        format!("{}/todos?_limit={FETCH_LIMIT}", self.base_url)
    }

    /// Fetch the first items of the remote list.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` if the request fails, the server answers with
    /// a non-success status, or the body is not a list of todos.
    pub async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>> {
        let url = self.todos_url();
        debug!(url = %url, "Fetching remote todos");

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("server error: {}", status.as_u16())));
        }

        let todos: Vec<RemoteTodo> = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("invalid response: {e}")))?;

        debug!(count = todos.len(), "Remote todos received");
        Ok(todos)
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0_u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_todos_url() {
        let client = RemoteClient::new("https://example.com/api/");
        assert_eq!(client.base_url(), "https://example.com/api");
        assert_eq!(client.todos_url(), "https://example.com/api/todos?_limit=10");
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(
            RemoteClient::default().todos_url(),
            "https://jsonplaceholder.typicode.com/todos?_limit=10"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_list() {
        let base = serve_once(
            "200 OK",
            r#"[{"userId":1,"id":1,"title":"delectus aut autem","completed":false},{"id":2,"title":"quis ut nam","completed":true}]"#,
        );

        let todos = RemoteClient::new(base).fetch_todos().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "delectus aut autem");
        assert!(todos[1].completed);
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_server_error() {
        let base = serve_once("503 Service Unavailable", "");

        let err = RemoteClient::new(base).fetch_todos().await.unwrap_err();
        match err {
            Error::Fetch(msg) => assert_eq!(msg, "server error: 503"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_body() {
        let base = serve_once("200 OK", r#"{"not":"a list"}"#);

        let err = RemoteClient::new(base).fetch_todos().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(msg) if msg.starts_with("invalid response")));
    }
}
