//! Report payload model, sentinel tables, and column-label derivation.
//!
//! The API returns `{rows: [{component|capability|test_name, columns: [...]}]}`
//! where each column object maps dimension names to values plus a numeric
//! `status`. Column headers are derived from the first row only; columns are
//! positionally aligned across rows and not re-validated per row.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// `component` value of the placeholder table shown before any fetch. Also
/// the value the normalizer treats as "empty result".
pub const EMPTY_SENTINEL: &str = "None";
/// `component` value substituted when a 200 response carried no rows.
pub const NO_DATA_SENTINEL: &str = "No Data found";
/// `component` value substituted when the request was aborted.
pub const CANCELLED_SENTINEL: &str = "Cancelled";

/// Terminal column labels; a table whose first label is one of these renders
/// as a no-data / retry state, never as report data.
pub const NO_COLUMN_LABEL: &str = "No column";
pub const NO_DATA_LABEL: &str = "No data";
pub const CANCELLED_LABEL: &str = "Cancelled";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Whether a 200 payload actually carried data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One comparison subject: a component, capability, or test depending on the
/// drill level. Exactly one of the identifying fields is set per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ReportColumn>>,
}

impl ReportRow {
    /// The identifying field, whichever the endpoint populated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.component
            .as_deref()
            .or(self.capability.as_deref())
            .or(self.test_name.as_deref())
    }
}

/// One cell's worth of dimension values plus the comparison status. Key order
/// is the backend's emission order and is significant for labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportColumn {
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ReportColumn {
    /// The numeric pass/fail/flake severity code, if present.
    #[must_use]
    pub fn status(&self) -> Option<i64> {
        self.values.get("status").and_then(Value::as_i64)
    }

    /// Column header: every value except `status`, space-joined in key order.
    #[must_use]
    pub fn label(&self) -> String {
        let mut label = String::new();
        for (key, value) in &self.values {
            if key == "status" {
                continue;
            }
            label.push(' ');
            match value {
                Value::String(s) => label.push_str(s),
                other => label.push_str(&other.to_string()),
            }
        }
        label.trim_start().to_string()
    }
}

fn sentinel_table(subject: &str) -> Report {
    let mut values = Map::new();
    values.insert("empty".to_string(), Value::String("None".to_string()));
    values.insert("status".to_string(), Value::from(3));
    Report {
        rows: vec![ReportRow {
            component: Some(subject.to_string()),
            columns: Some(vec![ReportColumn { values }]),
            ..ReportRow::default()
        }],
    }
}

/// Placeholder table rendered before the first fetch completes.
#[must_use]
pub fn initial_page_table() -> Report {
    sentinel_table(EMPTY_SENTINEL)
}

/// Substitute table for a 200 response with no rows.
#[must_use]
pub fn no_data_table() -> Report {
    sentinel_table(NO_DATA_SENTINEL)
}

/// Substitute table for an aborted request.
#[must_use]
pub fn cancelled_data_table() -> Report {
    sentinel_table(CANCELLED_SENTINEL)
}

/// Derive the ordered column labels for a payload.
///
/// Edge cases resolve in this order:
/// 1. no payload, no rows, or a first row with no identifying field →
///    `["No column"]`
/// 2. first row identifies as the cancelled sentinel → `["Cancelled"]`
/// 3. first row identifies as an empty sentinel, or has no `columns` →
///    `["No data"]`
/// 4. otherwise one label per column of the first row.
#[must_use]
pub fn column_labels(report: Option<&Report>) -> Vec<String> {
    let Some(report) = report else {
        debug!("no report payload, no way to generate columns");
        return vec![NO_COLUMN_LABEL.to_string()];
    };
    let Some(first) = report.rows.first() else {
        debug!("report has no rows, no way to generate columns");
        return vec![NO_COLUMN_LABEL.to_string()];
    };
    let Some(subject) = first.subject() else {
        debug!("first row has no identifying field, no way to generate columns");
        return vec![NO_COLUMN_LABEL.to_string()];
    };

    if subject == CANCELLED_SENTINEL {
        debug!("got cancelled table");
        return vec![CANCELLED_LABEL.to_string()];
    }
    if subject == EMPTY_SENTINEL || subject == NO_DATA_SENTINEL {
        debug!("got empty table");
        return vec![NO_DATA_LABEL.to_string()];
    }
    let Some(columns) = &first.columns else {
        return vec![NO_DATA_LABEL.to_string()];
    };
    columns.iter().map(ReportColumn::label).collect()
}

/// Whether a derived first label marks the table as unrenderable.
#[must_use]
pub fn is_terminal_label(label: &str) -> bool {
    matches!(label, NO_COLUMN_LABEL | NO_DATA_LABEL | CANCELLED_LABEL)
}

/// Outcome of one report fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    /// No fetch has completed yet.
    Loading,
    /// A 200 response with at least one row.
    Ready(Report),
    /// A 200 response with no rows.
    Empty,
    /// The request was aborted by the user.
    Cancelled,
    /// Non-200 status or transport/decode failure; the message carries the
    /// attempted URL.
    Failed(String),
}

impl ReportState {
    /// The table to render for this outcome, substituting the matching
    /// sentinel table where there is no real data.
    #[must_use]
    pub fn table(&self) -> Report {
        match self {
            Self::Loading => initial_page_table(),
            Self::Ready(report) => report.clone(),
            Self::Empty | Self::Failed(_) => no_data_table(),
            Self::Cancelled => cancelled_data_table(),
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
