//! Boundary to the external AI query collaborator.
//!
//! The engine's job ends at producing a complete, snapshot-tagged request
//! (every projected row plus one validation scalar) and deciding whether a
//! reply still matches the data on screen. The model call itself lives behind
//! [`InsightClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::dashboard::Dashboard;
use crate::error::{DashResult, InsightError};
use crate::types::{AxisSelection, DerivedRow, SnapshotId};

/// Precomputed figure the caller can compare against the model's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationScalar {
    pub column: String,
    pub sum: f64,
}

/// Payload for one AI query, tagged with the snapshot it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRequest {
    pub snapshot: SnapshotId,
    pub query: String,
    pub columns: Vec<String>,
    pub rows: Vec<DerivedRow>,
    pub validation: Option<ValidationScalar>,
}

impl InsightRequest {
    /// Fails for a blank query or when there are no rows to analyse.
    pub fn build(
        snapshot: SnapshotId,
        query: &str,
        rows: &[DerivedRow],
        axes: &AxisSelection,
    ) -> Result<Self, InsightError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InsightError::EmptyQuery);
        }
        let first = rows.first().ok_or(InsightError::NoRows)?;

        let columns = first.to_record().keys().cloned().collect();
        let validation = axes.numeric.first().map(|column| ValidationScalar {
            column: column.clone(),
            sum: rows.iter().filter_map(|r| r.value(column)).sum(),
        });

        debug!(
            snapshot = snapshot.0,
            rows = rows.len(),
            "insight request built"
        );

        Ok(Self {
            snapshot,
            query: query.to_string(),
            columns,
            rows: rows.to_vec(),
            validation,
        })
    }

    /// Instruction text sent to the language model.
    pub fn prompt(&self) -> DashResult<String> {
        let data = serde_json::to_string_pretty(&self.rows)?;
        let mut prompt = format!(
            "Analyze this survey data and answer the question: \"{}\". Use only the provided data.\n\n\
             Data details:\n\
             - Columns: {}\n\
             - Data rows (all available): {}\n\n\
             Instructions:\n\
             - If the query involves calculating a sum, compute it accurately from the named column.\n\
             - Provide the exact numerical result and avoid approximations unless specified.\n\
             - Return the result in this format: \"The sum of <column> is [value].\" for sum queries, \
             or provide relevant insights for other queries.",
            self.query,
            self.columns.join(", "),
            data
        );
        if let Some(v) = &self.validation {
            prompt.push_str(&format!(
                "\n\nValidation: The precomputed sum of {} is {} for reference.",
                v.column, v.sum
            ));
        }
        Ok(prompt)
    }
}

/// Collaborator reply, echoing the snapshot of the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReply {
    pub snapshot: SnapshotId,
    pub text: String,
}

/// External language-model call. Failures surface once; there is no retry.
#[async_trait]
pub trait InsightClient: Send + Sync {
    async fn complete(&self, request: &InsightRequest) -> Result<String, InsightError>;
}

/// Run one tagged round trip. The dashboard lock is released while the
/// collaborator is working, so edits made meanwhile win over the late reply.
pub async fn ask(
    dashboard: &Mutex<Dashboard>,
    client: &dyn InsightClient,
    query: &str,
) -> DashResult<String> {
    let request = dashboard.lock().await.insight_request(query)?;
    info!(snapshot = request.snapshot.0, "sending insight query");

    let text = client.complete(&request).await?;

    let reply = InsightReply {
        snapshot: request.snapshot,
        text: text.clone(),
    };
    dashboard.lock().await.accept_insight(reply)?;
    Ok(text)
}
