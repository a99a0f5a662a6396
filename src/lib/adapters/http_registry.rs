use std::path::PathBuf;

use alloy::primitives::B256;
use serde_json::value::RawValue;

use crate::domain::proof::parse_field;
use crate::ports::registry::{Registry, RegistryError};

/// Parse an `identityCommitments.json` document.
///
/// The document is a JSON array whose elements are decimal strings, `0x`
/// hex strings or integers of any size. Order is preserved.
pub fn parse_commitments(document: &str) -> Result<Vec<B256>, RegistryError> {
    let items: Vec<&RawValue> = serde_json::from_str(document)
        .map_err(|e| RegistryError::Malformed(format!("expected a JSON array: {e}")))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            // Numbers are read from their source text; 254-bit values overflow f64.
            let raw = item.get().trim();
            let word = match serde_json::from_str::<String>(raw) {
                Ok(text) => parse_field(&text).ok(),
                Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => parse_field(raw).ok(),
                Err(_) => None,
            };
            word.map(B256::from)
                .ok_or_else(|| RegistryError::Malformed(format!("element {i}: {raw}")))
        })
        .collect()
}

/// Registry served over HTTP, typically `<origin>/identityCommitments.json`.
#[derive(Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    url: String,
}

impl HttpRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Registry for HttpRegistry {
    async fn load_commitments(&self) -> Result<Vec<B256>, RegistryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let commitments = parse_commitments(&body)?;
        tracing::debug!(url = %self.url, members = commitments.len(), "registry loaded");
        Ok(commitments)
    }
}

/// The same document read from disk.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Registry for FileRegistry {
    async fn load_commitments(&self) -> Result<Vec<B256>, RegistryError> {
        let document = tokio::fs::read_to_string(&self.path).await?;
        parse_commitments(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use axum::{routing::get, Router};

    #[test]
    fn test_parse_mixed_encodings() {
        let parsed = parse_commitments(r#"["12", "0x0d", 14]"#).unwrap();
        let expected: Vec<B256> = [12u64, 13, 14]
            .iter()
            .map(|&v| B256::from(U256::from(v)))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_full_width_numbers() {
        let commitment = "14400213489960262428357024845513779960296226131546934839584618216398519802513";
        let document = format!(r#"[{commitment}, "{commitment}", 12345678901234567890123456789]"#);

        let parsed = parse_commitments(&document).unwrap();
        let expected: U256 = commitment.parse().unwrap();
        assert_eq!(parsed[0], B256::from(expected));
        assert_eq!(parsed[0], parsed[1]);
        assert_eq!(
            parsed[2],
            B256::from("12345678901234567890123456789".parse::<U256>().unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_fractional_number() {
        let err = parse_commitments("[1.5]").unwrap_err();
        assert!(err.to_string().contains("element 0: 1.5"));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_commitments(r#"{"a": 1}"#),
            Err(RegistryError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_element() {
        let err = parse_commitments(r#"["1", true]"#).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[tokio::test]
    async fn test_file_registry() {
        let path = std::env::temp_dir().join(format!("commitments-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"["1", "2"]"#).await.unwrap();

        let commitments = FileRegistry::new(&path).load_commitments().await.unwrap();
        assert_eq!(commitments.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_registry_missing_file() {
        let registry = FileRegistry::new("/nonexistent/identityCommitments.json");
        assert!(matches!(
            registry.load_commitments().await,
            Err(RegistryError::Io(_))
        ));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_registry() {
        let base = serve(Router::new().route(
            "/identityCommitments.json",
            get(|| async { r#"["7", "8", "9"]"# }),
        ))
        .await;

        let registry = HttpRegistry::new(format!("{base}/identityCommitments.json"));
        let commitments = registry.load_commitments().await.unwrap();
        assert_eq!(commitments[2], B256::from(U256::from(9u64)));
    }

    #[tokio::test]
    async fn test_http_registry_status_error() {
        let base = serve(Router::new()).await;

        let registry = HttpRegistry::new(format!("{base}/identityCommitments.json"));
        let err = registry.load_commitments().await.unwrap_err();
        assert!(matches!(err, RegistryError::Status { status: 404, .. }));
    }
}
