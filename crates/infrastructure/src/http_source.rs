//! HTTP implementation of the upstream report source.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reportd_core::{ReportdError, ReportdResult};
use reportd_domain::ReportSource;
use tracing::debug;

/// Fetches raw report rows from the internal data gateway as JSON. The
/// request timeout is the explicit bound on the only blocking remote
/// call in the pipeline.
pub struct HttpReportSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportSource {
    pub fn new(base_url: &str, timeout: Duration) -> ReportdResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportdError::upstream_error(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn fetch(&self, report: &str) -> ReportdResult<serde_json::Value> {
        let url = format!("{}/reports/{report}", self.base_url);
        debug!(report, url = %url, "fetching report data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReportdError::upstream_error(format!("{report}: {e}")))?;

        if !response.status().is_success() {
            return Err(ReportdError::upstream_error(format!(
                "{report}: upstream returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ReportdError::upstream_error(format!("{report}: malformed body: {e}")))
    }

    fn transform(
        &self,
        report: &str,
        raw: serde_json::Value,
    ) -> ReportdResult<serde_json::Value> {
        // The gateway already returns rows in presentation shape; wrap
        // them with the envelope the read-side query interface expects.
        let rows = match &raw {
            serde_json::Value::Array(rows) => rows.len(),
            _ => {
                return Err(ReportdError::upstream_error(format!(
                    "{report}: expected a JSON array of rows"
                )))
            }
        };

        Ok(serde_json::json!({
            "report": report,
            "row_count": rows,
            "rows": raw,
            "fetched_at": Utc::now(),
        }))
    }
}
