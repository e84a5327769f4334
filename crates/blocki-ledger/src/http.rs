//! HTTP ledger client
//!
//! POSTs the commitment record as JSON and expects
//! `{ "transaction": "<reference>" }` back.

use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::ledger::{CommitmentRecord, Ledger, PublishError, TransactionRef};

#[derive(Debug, Deserialize)]
struct PublishResponse {
    transaction: String,
}

/// Ledger reached over HTTP
pub struct HttpLedger {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpLedger {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Ledger for HttpLedger {
    async fn publish_commitment(
        &self,
        record: &CommitmentRecord,
    ) -> Result<TransactionRef, PublishError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PublishError::Unavailable(format!(
                "{} answered {}",
                self.endpoint, status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(format!("{}: {}", status, body.trim())));
        }

        let body: PublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        if body.transaction.trim().is_empty() {
            return Err(PublishError::InvalidResponse(
                "empty transaction reference".into(),
            ));
        }

        Ok(TransactionRef(body.transaction))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocki_core::{Commitment, SubjectId};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response, returning the request body
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            // Read headers, then exactly Content-Length bytes of body
            let body_start = loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&request[..body_start]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);
            while request.len() < body_start + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request[body_start..]).to_string()
        });

        let url = Url::parse(&format!("http://{}/commitments", addr)).unwrap();
        (url, handle)
    }

    fn ledger(url: Url) -> HttpLedger {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpLedger::with_client(url, client)
    }

    fn record() -> CommitmentRecord {
        CommitmentRecord::new(Commitment([5; 32]), SubjectId::new("0xsubject"))
    }

    #[tokio::test]
    async fn test_publish_success() {
        let (url, server) = serve_once("200 OK", r#"{"transaction":"0xabc"}"#).await;
        let ledger = ledger(url);

        let tx = ledger.publish_commitment(&record()).await.unwrap();
        assert_eq!(tx.as_str(), "0xabc");

        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["subject"], "0xsubject");
        assert_eq!(sent["commitment"], Commitment([5; 32]).to_hex());
    }

    #[tokio::test]
    async fn test_server_error_is_retriable() {
        let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
        let err = ledger(url)
            .publish_commitment(&record())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Unavailable(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_rate_limit_is_retriable() {
        let (url, _server) = serve_once("429 Too Many Requests", "{}").await;
        let err = ledger(url)
            .publish_commitment(&record())
            .await
            .unwrap_err();
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let (url, _server) = serve_once("400 Bad Request", r#"{"error":"bad subject"}"#).await;
        let err = ledger(url)
            .publish_commitment(&record())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Rejected(ref m) if m.contains("bad subject")));
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/commitments", addr)).unwrap();
        let err = ledger(url)
            .publish_commitment(&record())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Unavailable(_)));
    }
}
