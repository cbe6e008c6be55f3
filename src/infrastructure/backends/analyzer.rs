#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;

use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatPrompt;
use crate::domain::models::ChatReply;
use crate::domain::models::QueryAnalysis;
use crate::domain::models::QueryExecution;
use crate::domain::models::QueryId;
use crate::domain::models::QueryReport;
use crate::domain::models::QuerySummary;
use crate::domain::models::UploadResult;

/// Removes `<think>...</think>` reasoning blocks some models emit. An unclosed
/// block is left untouched.
pub fn strip_think_tags(text: &str) -> String {
    let mut res = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("<think>") {
        res.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => {
                rest = &rest[start + end + "</think>".len()..];
            }
            None => {
                res.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    res.push_str(rest);

    return res;
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    reply: String,
    query_id: Option<QueryId>,
    query_text: Option<String>,
    graph_url: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QueryIdRequest {
    query_id: QueryId,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QueryListResponse {
    queries: Vec<QuerySummary>,
}

/// The service reports some failures as `{"error": "..."}` with a 200 status.
fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T> {
    if let Some(err) = body.get("error").and_then(|err| return err.as_str()) {
        tracing::error!(error = err, "Analysis service returned an error");
        bail!(err.to_string());
    }

    return Ok(serde_json::from_value::<T>(body)?);
}

/// Client for the query-analysis HTTP service.
pub struct Analyzer {
    url: String,
    timeout: String,
    request_timeout: String,
}

impl Default for Analyzer {
    fn default() -> Analyzer {
        return Analyzer {
            url: Config::get(ConfigKey::ApiURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
            request_timeout: Config::get(ConfigKey::RequestTimeout),
        };
    }
}

impl Analyzer {
    fn client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(self.request_timeout.parse::<u64>()?))
            .build()?;

        return Ok(client);
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        path: &str,
        res: reqwest::Response,
    ) -> Result<T> {
        if !res.status().is_success() {
            tracing::error!(
                path,
                status = res.status().as_u16(),
                "Request to the analysis service failed"
            );
            bail!(format!(
                "Analysis service answered {path} with status {}",
                res.status().as_u16()
            ));
        }

        let body = res.json::<serde_json::Value>().await?;
        tracing::debug!(path, body = ?body, "Analysis service response");

        return parse_body(body);
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self
            .client()?
            .get(format!("{url}{path}", url = self.url))
            .send()
            .await?;

        return self.read_response(path, res).await;
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let res = self
            .client()?
            .post(format!("{url}{path}", url = self.url))
            .json(body)
            .send()
            .await?;

        return self.read_response(path, res).await;
    }

    async fn file_part(path: &Path) -> Result<multipart::Part> {
        let bytes = fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_else(|| return "upload".to_string());

        return Ok(multipart::Part::bytes(bytes).file_name(file_name));
    }
}

#[async_trait]
impl Backend for Analyzer {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = match reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Analysis service is not running");
                bail!("Analysis service is not running");
            }
        };

        // The service has no root route, a 404 still proves it is up.
        if res.status().is_server_error() {
            tracing::error!(
                status = res.status().as_u16(),
                "Analysis service health check failed"
            );
            bail!("Analysis service health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn chat(&self, prompt: ChatPrompt) -> Result<ChatReply> {
        let req = ChatRequest {
            message: prompt.text,
        };
        let res: ChatResponse = self.post("/chat", &req).await?;

        return Ok(ChatReply {
            text: strip_think_tags(&res.reply).trim().to_string(),
            query_id: res.query_id,
            query_text: res.query_text,
            graph_ref: res.graph_url,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn execute_query(&self, query: &str) -> Result<QueryExecution> {
        let req = QueryRequest {
            query: query.to_string(),
        };

        return self.post("/execute", &req).await;
    }

    #[allow(clippy::implicit_return)]
    async fn analyze(&self, query: &str) -> Result<QueryAnalysis> {
        let req = QueryRequest {
            query: query.to_string(),
        };
        let mut res: QueryAnalysis = self.post("/analyze", &req).await?;
        res.analysis = strip_think_tags(&res.analysis);

        return Ok(res);
    }

    #[allow(clippy::implicit_return)]
    async fn analyze_query(&self, query_id: QueryId) -> Result<QueryReport> {
        let req = QueryIdRequest { query_id };
        let mut res: QueryReport = self.post("/analyze_query", &req).await?;
        res.ai_analysis = strip_think_tags(&res.ai_analysis);

        return Ok(res);
    }

    #[allow(clippy::implicit_return)]
    async fn list_queries(&self) -> Result<Vec<QuerySummary>> {
        let res: QueryListResponse = self.get("/available_queries").await?;

        return Ok(res.queries);
    }

    #[allow(clippy::implicit_return)]
    async fn upload(&self, dataset: &Path, log: &Path) -> Result<UploadResult> {
        let form = multipart::Form::new()
            .part("db_file", Analyzer::file_part(dataset).await?)
            .part("log_file", Analyzer::file_part(log).await?);

        let res = self
            .client()?
            .post(format!("{url}/upload", url = self.url))
            .multipart(form)
            .send()
            .await?;

        return self.read_response("/upload", res).await;
    }

    fn graph_url(&self, query_id: QueryId) -> String {
        return format!("{url}/query_graph/{query_id}", url = self.url);
    }
}
