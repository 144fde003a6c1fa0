// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC client for the node's admin API.

use std::time::Duration;

use apm_core::{AdminNotifier, ApmError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

const ADMIN_PATH: &str = "/ext/admin";
const LOAD_VMS: &str = "admin.loadVMs";
const WHITELIST_SUBNET: &str = "admin.whitelistSubnet";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Talks to `http://<endpoint>/ext/admin`.
pub struct AdminClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    url: String,
}

impl AdminClient {
    /// `endpoint` is `host:port`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApmError> {
        let endpoint = endpoint.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApmError::Notifier {
                message: "cannot build http client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            url: format!("http://{endpoint}{ADMIN_PATH}"),
            client,
            endpoint,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, ApmError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        debug!(method, url = %self.url, "admin api call");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| self.classify(method, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApmError::Notifier {
                message: format!("{method} returned HTTP {status}"),
                source: None,
            });
        }
        let body: RpcResponse = response.json().map_err(|e| ApmError::Notifier {
            message: format!("{method} returned an unreadable response"),
            source: Some(Box::new(e)),
        })?;
        if let Some(err) = body.error {
            return Err(ApmError::Notifier {
                message: format!("{method} failed ({}): {}", err.code, err.message),
                source: None,
            });
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    fn classify(&self, method: &str, e: reqwest::Error) -> ApmError {
        if e.is_connect() {
            ApmError::NotifierUnavailable {
                endpoint: self.endpoint.clone(),
            }
        } else {
            ApmError::Notifier {
                message: format!("{method} request failed"),
                source: Some(Box::new(e)),
            }
        }
    }
}

impl AdminNotifier for AdminClient {
    fn reload_plugins(&self) -> Result<(), ApmError> {
        let result = self.call(LOAD_VMS, json!({}))?;
        info!(%result, "node reloaded plugins");
        Ok(())
    }

    fn register_subnet(&self, subnet_id: &str) -> Result<(), ApmError> {
        self.call(WHITELIST_SUBNET, json!({ "subnetID": subnet_id }))?;
        info!(subnet_id, "subnet whitelisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn client(endpoint: &str) -> AdminClient {
        AdminClient::new(endpoint, Duration::from_secs(2)).unwrap()
    }

    /// Serves one request with `body` and returns the raw request text.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = String::new();
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if let Some(split) = request.find("\r\n\r\n") {
                    let len = request[..split]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            request
        });
        (addr, handle)
    }

    #[test]
    fn url_targets_admin_extension() {
        assert_eq!(client("127.0.0.1:9650").url(), "http://127.0.0.1:9650/ext/admin");
    }

    #[test]
    fn connection_refused_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = client(&format!("127.0.0.1:{port}"))
            .reload_plugins()
            .unwrap_err();
        assert!(err.is_notifier_unavailable(), "{err}");
    }

    #[test]
    fn register_subnet_sends_subnet_id() {
        let (addr, handle) =
            serve_once("200 OK", r#"{"jsonrpc":"2.0","id":1,"result":{"success":true}}"#);
        client(&addr).register_subnet("subnet-123").unwrap();
        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /ext/admin"));
        assert!(request.contains(r#""method":"admin.whitelistSubnet""#));
        assert!(request.contains(r#""subnetID":"subnet-123""#));
    }

    #[test]
    fn rpc_error_is_a_notifier_error() {
        let (addr, handle) = serve_once(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"not allowed"}}"#,
        );
        let err = client(&addr).reload_plugins().unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, ApmError::Notifier { .. }));
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn http_error_status_is_a_notifier_error() {
        let (addr, handle) = serve_once("500 Internal Server Error", "{}");
        let err = client(&addr).reload_plugins().unwrap_err();
        handle.join().unwrap();
        assert!(!err.is_notifier_unavailable());
        assert!(err.to_string().contains("HTTP 500"));
    }
}
