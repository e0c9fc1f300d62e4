//! Filter state and canonical query-string assembly.
//!
//! The backend caches report queries by their exact query string, so the
//! builder here is deliberately canonical: fixed parameter order, report
//! windows pinned to `00:00:00` / `23:59:59` second boundaries, exclusion
//! lists comma-joined under fixed names. The same query string doubles as the
//! shareable form of the filter state, so it also parses back.

use chrono::NaiveDate;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::dimensions::DimensionTable;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIDENCE: u32 = 95;
pub const DEFAULT_PITY: u32 = 5;
pub const DEFAULT_MIN_FAIL: u32 = 3;
pub const DEFAULT_IGNORE_DISRUPTION: bool = true;
pub const DEFAULT_IGNORE_MISSING: bool = false;

/// Report windows start at midnight and end on the last second of the day so
/// that repeated queries for the same dates hit the backend's query cache.
pub const START_TIME_SUFFIX: &str = "00:00:00";
pub const END_TIME_SUFFIX: &str = "23:59:59";

// Everything outside the URL-unreserved set gets percent-encoded. Component
// names contain brackets and spaces ("[sig-auth] ...") that must not survive
// raw in a query string.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a query-string value.
#[must_use]
pub fn safe_encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE).to_string()
}

/// Format a window start as `YYYY-MM-DD 00:00:00`.
#[must_use]
pub fn format_start_time(date: NaiveDate) -> String {
    format!("{} {START_TIME_SUFFIX}", date.format("%Y-%m-%d"))
}

/// Format a window end as `YYYY-MM-DD 23:59:59`.
#[must_use]
pub fn format_end_time(date: NaiveDate) -> String {
    format!("{} {END_TIME_SUFFIX}", date.format("%Y-%m-%d"))
}

/// The complete filter state behind one report: which releases to compare,
/// over which windows, what to exclude, and the statistical tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub base_release: String,
    pub base_start: NaiveDate,
    pub base_end: NaiveDate,
    pub sample_release: String,
    pub sample_start: NaiveDate,
    pub sample_end: NaiveDate,
    pub group_by: Vec<String>,
    pub exclude_clouds: Vec<String>,
    pub exclude_arches: Vec<String>,
    pub exclude_networks: Vec<String>,
    pub exclude_upgrades: Vec<String>,
    pub exclude_variants: Vec<String>,
    pub confidence: u32,
    pub pity: u32,
    pub min_fail: u32,
    pub ignore_disruption: bool,
    pub ignore_missing: bool,
}

impl ReportFilter {
    /// Filter over the given releases and windows with default tuning.
    #[must_use]
    pub fn new(
        base_release: impl Into<String>,
        base_start: NaiveDate,
        base_end: NaiveDate,
        sample_release: impl Into<String>,
        sample_start: NaiveDate,
        sample_end: NaiveDate,
    ) -> Self {
        Self {
            base_release: base_release.into(),
            base_start,
            base_end,
            sample_release: sample_release.into(),
            sample_start,
            sample_end,
            group_by: vec!["cloud".into(), "arch".into(), "network".into()],
            exclude_clouds: Vec::new(),
            exclude_arches: Vec::new(),
            exclude_networks: Vec::new(),
            exclude_upgrades: Vec::new(),
            exclude_variants: Vec::new(),
            confidence: DEFAULT_CONFIDENCE,
            pity: DEFAULT_PITY,
            min_fail: DEFAULT_MIN_FAIL,
            ignore_disruption: DEFAULT_IGNORE_DISRUPTION,
            ignore_missing: DEFAULT_IGNORE_MISSING,
        }
    }

    /// Render the canonical query string, `?` included.
    ///
    /// Scalar parameters come first in fixed order, then the comma-joined
    /// list parameters. List parameters are emitted even when empty so the
    /// string shape (and the backend cache key) stays stable.
    #[must_use]
    pub fn query_string(&self) -> String {
        let scalars: [(&str, String); 11] = [
            ("baseRelease", self.base_release.clone()),
            ("baseStartTime", format_start_time(self.base_start)),
            ("baseEndTime", format_end_time(self.base_end)),
            ("sampleRelease", self.sample_release.clone()),
            ("sampleStartTime", format_start_time(self.sample_start)),
            ("sampleEndTime", format_end_time(self.sample_end)),
            ("confidence", self.confidence.to_string()),
            ("pity", self.pity.to_string()),
            ("minFail", self.min_fail.to_string()),
            ("ignoreDisruption", self.ignore_disruption.to_string()),
            ("ignoreMissing", self.ignore_missing.to_string()),
        ];
        let lists: [(&str, &[String]); 6] = [
            ("exclude_clouds", &self.exclude_clouds),
            ("exclude_arches", &self.exclude_arches),
            ("exclude_networks", &self.exclude_networks),
            ("exclude_upgrades", &self.exclude_upgrades),
            ("exclude_variants", &self.exclude_variants),
            ("group_by", &self.group_by),
        ];

        let mut out = String::from("?");
        for (i, (key, value)) in scalars.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            let _ = write!(out, "{key}={}", safe_encode(value));
        }
        for (key, values) in lists {
            let _ = write!(out, "&{key}={}", values.join(","));
        }
        out
    }

    /// Parse filter state back out of a shared query string (leading `?`
    /// optional, times in either `YYYY-MM-DD HH:MM:SS` or RFC3339 form).
    /// Parameters beyond the filter state (`component`, `environment`, ...)
    /// are ignored.
    pub fn from_query_str(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filter = Self::new(
            String::new(),
            NaiveDate::MIN,
            NaiveDate::MIN,
            String::new(),
            NaiveDate::MIN,
            NaiveDate::MIN,
        );
        filter.group_by.clear();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "baseRelease" => filter.base_release = value,
                "baseStartTime" => filter.base_start = parse_window_date("baseStartTime", &value)?,
                "baseEndTime" => filter.base_end = parse_window_date("baseEndTime", &value)?,
                "sampleRelease" => filter.sample_release = value,
                "sampleStartTime" => {
                    filter.sample_start = parse_window_date("sampleStartTime", &value)?;
                }
                "sampleEndTime" => filter.sample_end = parse_window_date("sampleEndTime", &value)?,
                "confidence" => filter.confidence = parse_u32("confidence", &value)?,
                "pity" => filter.pity = parse_u32("pity", &value)?,
                "minFail" => filter.min_fail = parse_u32("minFail", &value)?,
                "ignoreDisruption" => {
                    filter.ignore_disruption = parse_bool("ignoreDisruption", &value)?;
                }
                "ignoreMissing" => filter.ignore_missing = parse_bool("ignoreMissing", &value)?,
                "exclude_clouds" => filter.exclude_clouds = parse_list(&value),
                "exclude_arches" => filter.exclude_arches = parse_list(&value),
                "exclude_networks" => filter.exclude_networks = parse_list(&value),
                "exclude_upgrades" => filter.exclude_upgrades = parse_list(&value),
                "exclude_variants" => filter.exclude_variants = parse_list(&value),
                "group_by" => filter.group_by = parse_list(&value),
                _ => {}
            }
        }

        if filter.base_release.is_empty() || filter.sample_release.is_empty() {
            return Err(Error::InvalidParam {
                field: "baseRelease/sampleRelease",
                value: query.to_string(),
            });
        }
        Ok(filter)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| Error::InvalidParam {
        field,
        value: value.to_string(),
    })
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidParam {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_window_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    // Both the cache-friendly form and the wire form carry the date in the
    // first ten characters.
    let date_part = value
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| Error::InvalidParam {
        field,
        value: value.to_string(),
    })
}

fn window_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2})\s(\d{2}:\d{2}:\d{2})").expect("valid window time regex")
    })
}

/// Rewrite date-picker style times into the RFC3339 form the API expects.
///
/// The whole string is percent-decoded first so encoded spaces and colons are
/// visible to the rewrite, then every `YYYY-MM-DD HH:MM:SS` occurrence gains
/// the `T` separator and `Z` suffix. A literal `&component=null` (an unset
/// drill-down parameter serialized by an upstream layer) would be taken as a
/// real component filter by the API, so it is stripped entirely.
#[must_use]
pub fn make_rfc3339_time(url_str: &str) -> String {
    let decoded = percent_decode_str(url_str).decode_utf8_lossy();
    let rewritten = window_time_regex().replace_all(&decoded, "${1}T${2}Z");
    rewritten.replace("&component=null", "")
}

/// Sort a URL's query parameters so equivalent filters share one URL.
#[must_use]
pub fn sort_query_params(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let mut params: Vec<&str> = query.split('&').collect();
    params.sort_unstable();
    format!("{path}?{}", params.join("&"))
}

/// API endpoint for component, capability, and test reports.
#[must_use]
pub fn api_url(api_base: &str) -> String {
    format!("{}/api/component_readiness", api_base.trim_end_matches('/'))
}

/// API endpoint for per-test detail reports.
#[must_use]
pub fn test_details_api_url(api_base: &str) -> String {
    format!("{}/test_details", api_url(api_base))
}

/// URL for the top-level component report.
#[must_use]
pub fn main_report_url(api_base: &str, filter: &ReportFilter) -> String {
    format!(
        "{}{}",
        api_url(api_base),
        make_rfc3339_time(&filter.query_string())
    )
}

/// URL for one component's capability report, optionally narrowed to an
/// environment column.
#[must_use]
pub fn capabilities_url(
    api_base: &str,
    filter: &ReportFilter,
    component: &str,
    environment: Option<&str>,
    table: &DimensionTable,
) -> String {
    format!(
        "{}{}&component={}{}",
        api_url(api_base),
        make_rfc3339_time(&filter.query_string()),
        safe_encode(component),
        environment.map_or_else(String::new, |env| table.expand_environment(env)),
    )
}

/// URL for the tests under one component capability.
#[must_use]
pub fn capability_tests_url(
    api_base: &str,
    filter: &ReportFilter,
    component: &str,
    capability: &str,
) -> String {
    format!(
        "{}{}&component={}&capability={}",
        api_url(api_base),
        make_rfc3339_time(&filter.query_string()),
        safe_encode(component),
        safe_encode(capability),
    )
}

/// URL for a single test's detail report.
#[must_use]
pub fn test_details_url(
    api_base: &str,
    filter: &ReportFilter,
    component: &str,
    capability: &str,
    test_id: &str,
    environment: Option<&str>,
    table: &DimensionTable,
) -> String {
    format!(
        "{}{}&component={}&capability={}&testId={}{}",
        test_details_api_url(api_base),
        make_rfc3339_time(&filter.query_string()),
        safe_encode(component),
        safe_encode(capability),
        safe_encode(test_id),
        environment.map_or_else(String::new, |env| table.expand_environment(env)),
    )
}

/// Shareable drill-down link for a report cell: the current filter plus the
/// cell's component and environment, parameters sorted for stability.
#[must_use]
pub fn env_capabilities_link(
    filter: &ReportFilter,
    component: &str,
    environment: &str,
    table: &DimensionTable,
) -> String {
    let url = format!(
        "/component_readiness/env_capabilities{}&component={}{}",
        filter.query_string(),
        safe_encode(component),
        table.expand_environment(environment),
    );
    sort_query_params(&url)
}
