use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one import cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRunReport {
    pub file: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_sec: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportRunReport {
    pub fn succeeded(
        file: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        total_rows: usize,
        inserted: usize,
    ) -> Self {
        Self {
            file: file.into(),
            started_at,
            finished_at,
            duration_sec: duration_sec(started_at, finished_at),
            success: true,
            total_rows: Some(total_rows),
            inserted: Some(inserted),
            error: None,
        }
    }

    pub fn failed(
        file: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            started_at,
            finished_at,
            duration_sec: duration_sec(started_at, finished_at),
            success: false,
            total_rows: None,
            inserted: None,
            error: Some(error.into()),
        }
    }

    /// `key=value` lines written to the marker file.
    pub fn marker_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("file={}", self.file),
            format!("success={}", self.success),
            format!("started_at={}", marker_timestamp(self.started_at)),
            format!("finished_at={}", marker_timestamp(self.finished_at)),
            format!("duration_sec={}", self.duration_sec),
        ];
        if self.success {
            lines.push(format!("total_rows={}", self.total_rows.unwrap_or(0)));
            lines.push(format!("inserted={}", self.inserted.unwrap_or(0)));
        } else {
            // keep the marker one key per line
            let error = self.error.as_deref().unwrap_or("").replace(['\r', '\n'], " ");
            lines.push(format!("error={}", error));
        }
        lines
    }
}

fn duration_sec(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> f64 {
    (finished_at - started_at)
        .to_std()
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn marker_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
