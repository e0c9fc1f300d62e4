//! Terminal rendering for report tables.
//!
//! Status codes come from the backend's comparison of sample vs. base pass
//! rates; this layer only maps them to glyphs and labels. Unknown codes are
//! passed through numerically rather than dropped.

use std::fmt::Write as _;

use crate::report::{Report, ReportRow};

/// Short cell glyph for a status code.
#[must_use]
pub const fn status_glyph(status: i64) -> &'static str {
    match status {
        i64::MIN..=-3 => "XX",
        -2 => "x",
        -1 => "ns",
        0 => ".",
        1 => "nb",
        2 => "+",
        _ => "++",
    }
}

/// Human-readable meaning of a status code.
#[must_use]
pub const fn status_label(status: i64) -> &'static str {
    match status {
        i64::MIN..=-3 => "extreme regression",
        -2 => "significant regression",
        -1 => "missing sample",
        0 => "no significant difference",
        1 => "missing basis",
        2 => "improvement",
        _ => "significant improvement",
    }
}

/// One line per glyph, for printing under a table.
#[must_use]
pub fn legend() -> String {
    let mut out = String::new();
    for status in [3, 2, 1, 0, -1, -2, -3] {
        let _ = writeln!(
            out,
            "  {:<2}  {}",
            status_glyph(status),
            status_label(status)
        );
    }
    out
}

fn cell(row: &ReportRow, index: usize) -> String {
    row.columns
        .as_ref()
        .and_then(|columns| columns.get(index))
        .and_then(|column| column.status())
        .map_or_else(|| "?".to_string(), |status| status_glyph(status).to_string())
}

/// Format a report as an aligned text table: one row per subject, one column
/// per derived label, cells showing the status glyph.
#[must_use]
pub fn render_table(report: &Report, labels: &[String]) -> String {
    let subject_header = "name";
    let subject_width = report
        .rows
        .iter()
        .filter_map(ReportRow::subject)
        .map(str::len)
        .max()
        .unwrap_or(0)
        .max(subject_header.len());

    let mut widths: Vec<usize> = labels.iter().map(String::len).collect();
    for (index, width) in widths.iter_mut().enumerate() {
        for row in &report.rows {
            *width = (*width).max(cell(row, index).len());
        }
    }

    let mut out = String::new();
    let _ = write!(out, "{subject_header:<subject_width$}");
    for (label, width) in labels.iter().zip(&widths) {
        let _ = write!(out, "  {label:<width$}");
    }
    out.push('\n');

    for row in &report.rows {
        let subject = row.subject().unwrap_or("");
        let _ = write!(out, "{subject:<subject_width$}");
        for (index, width) in widths.iter().enumerate() {
            let glyph = cell(row, index);
            let _ = write!(out, "  {glyph:<width$}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::column_labels;
    use pretty_assertions::assert_eq;

    #[test]
    fn glyphs_cover_the_code_range() {
        assert_eq!(status_glyph(5), "++");
        assert_eq!(status_glyph(3), "++");
        assert_eq!(status_glyph(2), "+");
        assert_eq!(status_glyph(0), ".");
        assert_eq!(status_glyph(-2), "x");
        assert_eq!(status_glyph(-3), "XX");
        assert_eq!(status_glyph(-7), "XX");
    }

    #[test]
    fn labels_match_glyph_direction() {
        assert_eq!(status_label(-3), "extreme regression");
        assert_eq!(status_label(0), "no significant difference");
        assert_eq!(status_label(4), "significant improvement");
    }

    #[test]
    fn table_aligns_columns_to_headers() {
        let report: Report = serde_json::from_str(
            r#"{"rows": [
                {"component": "[sig-auth]", "columns": [
                    {"network": "ovn", "arch": "amd64", "status": 0},
                    {"network": "sdn", "arch": "amd64", "status": -2}]},
                {"component": "[sig-node]", "columns": [
                    {"network": "ovn", "arch": "amd64", "status": 3},
                    {"network": "sdn", "arch": "amd64", "status": -3}]}
            ]}"#,
        )
        .unwrap();
        let labels = column_labels(Some(&report));
        let rendered = render_table(&report, &labels);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name        ovn amd64  sdn amd64");
        assert_eq!(lines[1], "[sig-auth]  .          x        ");
        assert_eq!(lines[2], "[sig-node]  ++         XX       ");
    }

    #[test]
    fn missing_cells_render_as_unknown() {
        let report: Report = serde_json::from_str(
            r#"{"rows": [{"component": "[sig-etcd]", "columns": [{"arch": "amd64", "status": 0}]}]}"#,
        )
        .unwrap();
        let labels = vec!["amd64".to_string(), "arm64".to_string()];
        let rendered = render_table(&report, &labels);
        assert!(rendered.lines().nth(1).unwrap().contains('?'));
    }

    #[test]
    fn legend_lists_all_glyphs() {
        let legend = legend();
        assert!(legend.contains("extreme regression"));
        assert!(legend.contains("significant improvement"));
    }
}
