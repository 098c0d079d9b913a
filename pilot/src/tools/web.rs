use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::core::text::truncate_chars;
use crate::tools::{ParameterType, Tool, ToolArgs, ToolParameter, ToolResult, required_str};

const PARAMETERS: &[ToolParameter] = &[ToolParameter {
    name: "url",
    description: "The URL to fetch. Must use http or https scheme.",
    kind: ParameterType::String,
    required: true,
    enum_values: None,
}];

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_RESPONSE_CHARS: usize = 50_000;

/// Fetches a URL and returns the body as text.
#[derive(Default)]
pub struct WebTool {
    client: Option<Client>,
}

impl WebTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client instead of building one per request.
    pub fn with_client(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> reqwest::Result<Client> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => Client::builder().timeout(REQUEST_TIMEOUT).build(),
        }
    }
}

impl Tool for WebTool {
    fn name(&self) -> &str {
        "web"
    }

    fn description(&self) -> &str {
        "Fetch a URL and return its text content."
    }

    fn parameters(&self) -> &[ToolParameter] {
        PARAMETERS
    }

    #[instrument(skip_all)]
    fn execute(&self, args: &ToolArgs) -> ToolResult {
        let raw = match required_str(args, "url") {
            Ok(raw) => raw,
            Err(missing) => return missing,
        };
        let url = match validate_url(raw) {
            Ok(url) => url,
            Err(rejected) => return rejected,
        };

        let response = match self.client().and_then(|client| client.get(url.clone()).send()) {
            Ok(response) => response,
            Err(err) => return ToolResult::failure(format!("Failed to fetch URL: {err}")),
        };
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "fetched url");
        if !status.is_success() {
            return ToolResult::failure(format!("HTTP {}", status.as_u16()));
        }
        let body = match response.bytes() {
            Ok(body) => body,
            Err(err) => return ToolResult::failure(format!("Failed to fetch URL: {err}")),
        };
        let Ok(text) = String::from_utf8(body.to_vec()) else {
            return ToolResult::failure("Response body is not valid UTF-8 text.");
        };
        ToolResult::success(truncate_chars(
            &text,
            MAX_RESPONSE_CHARS,
            &format!("\n\n[Truncated: response exceeded {MAX_RESPONSE_CHARS} characters]"),
        ))
    }
}

/// Parse `raw` and accept only http and https URLs.
fn validate_url(raw: &str) -> Result<Url, ToolResult> {
    let url = Url::parse(raw.trim()).map_err(|_| ToolResult::failure(format!("Invalid URL: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ToolResult::failure(
            "Only http and https URLs are supported.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolValue;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn url_args(url: &str) -> ToolArgs {
        ToolArgs::from([("url".to_string(), ToolValue::String(url.to_string()))])
    }

    /// Serve exactly one HTTP response on a local port and return its base URL.
    fn serve_once(status: &'static str, body: Vec<u8>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).expect("write head");
            stream.write_all(&body).expect("write body");
        });
        (format!("http://{addr}/"), handle)
    }

    fn local_tool() -> WebTool {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client");
        WebTool::with_client(client)
    }

    #[test]
    fn non_http_schemes_are_rejected_before_network() {
        let tool = local_tool();
        for url in ["ftp://example.com/file", "file:///etc/passwd"] {
            assert_eq!(
                tool.execute(&url_args(url)),
                ToolResult::failure("Only http and https URLs are supported.")
            );
        }
    }

    #[test]
    fn unparseable_url_is_rejected() {
        let result = local_tool().execute(&url_args("not a url"));
        assert_eq!(result, ToolResult::failure("Invalid URL: not a url"));
    }

    #[test]
    fn missing_url_is_rejected() {
        let result = local_tool().execute(&ToolArgs::new());
        assert_eq!(result, ToolResult::failure("Missing required parameter: url"));
    }

    #[test]
    fn successful_fetch_returns_body() {
        let (url, server) = serve_once("200 OK", b"hello from the server".to_vec());
        let result = local_tool().execute(&url_args(&url));
        server.join().expect("server");
        assert_eq!(result, ToolResult::success("hello from the server"));
    }

    #[test]
    fn error_status_is_reported() {
        let (url, server) = serve_once("404 Not Found", b"missing".to_vec());
        let result = local_tool().execute(&url_args(&url));
        server.join().expect("server");
        assert_eq!(result, ToolResult::failure("HTTP 404"));
    }

    #[test]
    fn binary_body_is_rejected() {
        let (url, server) = serve_once("200 OK", vec![0xff, 0xfe, 0xfd]);
        let result = local_tool().execute(&url_args(&url));
        server.join().expect("server");
        assert_eq!(
            result,
            ToolResult::failure("Response body is not valid UTF-8 text.")
        );
    }

    #[test]
    fn long_body_is_truncated() {
        let (url, server) = serve_once("200 OK", "b".repeat(MAX_RESPONSE_CHARS + 5).into_bytes());
        let result = local_tool().execute(&url_args(&url));
        server.join().expect("server");
        assert!(!result.is_error);
        assert!(result.content.starts_with(&"b".repeat(MAX_RESPONSE_CHARS)));
        assert!(
            result
                .content
                .ends_with("[Truncated: response exceeded 50000 characters]")
        );
    }
}
