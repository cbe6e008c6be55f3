#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::LogEntry;
use super::QueryId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatPrompt {
    pub text: String,
}

impl ChatPrompt {
    pub fn new(text: &str) -> ChatPrompt {
        return ChatPrompt {
            text: text.trim().to_string(),
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub query_id: Option<QueryId>,
    pub query_text: Option<String>,
    pub graph_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryExecution {
    pub query_id: QueryId,
    pub message: String,
    pub exec_time_ms: f64,
    pub row_count: i64,
}

/// Narrative analysis of an ad-hoc query, plus the log set including it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub analysis: String,
    #[serde(default)]
    pub updated_logs: Vec<LogEntry>,
}

/// Detailed analysis of a previously profiled query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub query_id: QueryId,
    pub query_text: String,
    pub exec_time_ms: f64,
    pub scanned_rows: Option<i64>,
    pub returned_rows: Option<i64>,
    pub bottleneck_operator: Option<String>,
    pub current_recommendation: Option<String>,
    pub ai_analysis: String,
    #[serde(default)]
    pub has_graph: bool,
    pub graph_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub query_id: QueryId,
    pub exec_time_ms: f64,
    pub bottleneck_operator: Option<String>,
    pub recommendation: Option<String>,
    #[serde(default)]
    pub has_graph: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub column_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub sample_values: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub schema: BTreeMap<String, TableSchema>,
    pub logs: Vec<LogEntry>,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the analysis service can be reached.
    async fn health_check(&self) -> Result<()>;

    /// Sends one conversation turn and waits for the assistant's reply.
    async fn chat(&self, prompt: ChatPrompt) -> Result<ChatReply>;

    /// Executes a query against the uploaded dataset.
    async fn execute_query(&self, query: &str) -> Result<QueryExecution>;

    /// Runs a query and asks the assistant to narrate its performance.
    async fn analyze(&self, query: &str) -> Result<QueryAnalysis>;

    /// Asks for a detailed narrative about a previously profiled query.
    async fn analyze_query(&self, query_id: QueryId) -> Result<QueryReport>;

    /// Lists profiled queries, slowest first.
    async fn list_queries(&self) -> Result<Vec<QuerySummary>>;

    /// Uploads a dataset and its execution log.
    async fn upload(&self, dataset: &Path, log: &Path) -> Result<UploadResult>;

    /// Where the rendered profile graph for a query lives.
    fn graph_url(&self, query_id: QueryId) -> String;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
