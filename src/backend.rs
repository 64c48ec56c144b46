use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

/// Fallback when neither the CLI flag, the proxy target env var, nor the
/// config file names a backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Retrieval threshold passed through to the backend filter. Fixed on the
/// client side, not exposed in the UI.
const MIN_SCORE: f64 = 0.01;

#[derive(Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
    min_score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub files_used: Vec<SourceRef>,
    /// The backend answers 200 with this set while it is still warming up or
    /// when its LLM call fails.
    #[serde(default)]
    pub error: Option<String>,
}

/// One retrieved chunk cited as evidence for an answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRef {
    pub file_path: String,
    pub score: f64,
}

/// One document known to the backend's ingestion store.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInfo {
    #[serde(alias = "file_name")]
    pub filename: String,
    // Kept as the raw manifest string; the backend writes naive local
    // timestamps that a strict RFC 3339 parse would reject.
    #[serde(default)]
    pub ingested_at: String,
    #[serde(default)]
    pub chunks_count: Option<u64>,
}

#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            question,
            min_score: MIN_SCORE,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "query request failed with status {}",
                response.status()
            ));
        }

        let query_response: QueryResponse = response.json().await?;
        Ok(query_response)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let url = format!("{}/documents", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "document listing failed with status {}",
                response.status()
            ));
        }

        let documents: Vec<DocumentInfo> = response.json().await?;
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn query_sends_fixed_min_score_and_parses_sources() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({
                "question": "what does the report say?",
                "min_score": 0.01
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "question": "what does the report say?",
                "answer": "X",
                "files_used": [{"file_path": "a/b.pdf", "score": 0.42}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let response = client.query("what does the report say?").await.unwrap();

        assert_eq!(response.answer, "X");
        assert_eq!(response.files_used.len(), 1);
        assert_eq!(response.files_used[0].file_path, "a/b.pdf");
        assert!((response.files_used[0].score - 0.42).abs() < 1e-9);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn query_tolerates_missing_answer_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": "Server is still starting up"})),
            )
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let response = client.query("anything").await.unwrap();

        assert!(response.answer.is_empty());
        assert!(response.files_used.is_empty());
        assert_eq!(response.error.as_deref(), Some("Server is still starting up"));
    }

    #[tokio::test]
    async fn query_maps_non_2xx_to_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        assert!(client.query("anything").await.is_err());
    }

    #[tokio::test]
    async fn list_documents_accepts_manifest_field_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "file_name": "report.pdf",
                    "file_path": "docs/report.pdf",
                    "ingested_at": "2026-08-05T14:03:22.123456",
                    "chunks_count": 12,
                    "hash": "abc123"
                },
                {
                    "filename": "notes.md",
                    "ingested_at": "2026-08-04T09:00:00"
                }
            ])))
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let documents = client.list_documents().await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].filename, "report.pdf");
        assert_eq!(documents[0].chunks_count, Some(12));
        assert_eq!(documents[1].filename, "notes.md");
        assert_eq!(documents[1].chunks_count, None);
    }

    #[tokio::test]
    async fn base_url_trailing_slash_is_normalized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = RagClient::new(&format!("{}/", server.uri()));
        let documents = client.list_documents().await.unwrap();
        assert!(documents.is_empty());
    }
}
