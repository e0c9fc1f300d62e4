//! Command-line interface definitions.

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::Config;
use crate::query::{ReportFilter, DEFAULT_IGNORE_DISRUPTION, DEFAULT_IGNORE_MISSING};

#[derive(Debug, Parser)]
#[command(
    name = "sippy",
    version,
    about = "Client for Sippy component-readiness reports"
)]
pub struct Cli {
    /// API origin, e.g. http://sippy.example.com:8080
    #[arg(long, env = "SIPPY_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a component-readiness report and render it as a table
    Report(ReportArgs),
    /// Print the composed API URL without fetching it
    Url(ReportArgs),
    /// Expand an environment label into its query fragments
    Expand {
        /// Space-separated label, e.g. "ovn amd64 aws"
        environment: String,
    },
    /// Show settings paths and precedence
    Config,
}

/// Filter state plus drill-down selection for one report.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Historical release to compare against, e.g. 4.13
    #[arg(long)]
    pub base_release: String,
    /// First day of the base window (YYYY-MM-DD)
    #[arg(long)]
    pub base_start: NaiveDate,
    /// Last day of the base window (YYYY-MM-DD)
    #[arg(long)]
    pub base_end: NaiveDate,

    /// Release under evaluation, e.g. 4.14
    #[arg(long)]
    pub sample_release: String,
    /// First day of the sample window (YYYY-MM-DD)
    #[arg(long)]
    pub sample_start: NaiveDate,
    /// Last day of the sample window (YYYY-MM-DD)
    #[arg(long)]
    pub sample_end: NaiveDate,

    /// Dimensions to group columns by
    #[arg(long, value_delimiter = ',', default_value = "cloud,arch,network")]
    pub group_by: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub exclude_clouds: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude_arches: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude_networks: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude_upgrades: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude_variants: Vec<String>,

    /// Statistical confidence level (percent); falls back to the settings
    /// file, then 95
    #[arg(long)]
    pub confidence: Option<u32>,
    /// Pass-rate drop tolerated before a cell regresses (percent); falls
    /// back to the settings file, then 5
    #[arg(long)]
    pub pity: Option<u32>,
    /// Minimum failure count before a cell can regress; falls back to the
    /// settings file, then 3
    #[arg(long)]
    pub min_fail: Option<u32>,
    #[arg(long, action = ArgAction::Set, default_value_t = DEFAULT_IGNORE_DISRUPTION)]
    pub ignore_disruption: bool,
    #[arg(long, action = ArgAction::Set, default_value_t = DEFAULT_IGNORE_MISSING)]
    pub ignore_missing: bool,

    /// Drill down to one component's capabilities
    #[arg(long)]
    pub component: Option<String>,
    /// Drill down to one capability's tests
    #[arg(long, requires = "component")]
    pub capability: Option<String>,
    /// Drill down to one test's details
    #[arg(long, requires = "capability")]
    pub test_id: Option<String>,
    /// Narrow the drill-down to one environment column, e.g. "ovn amd64 aws"
    #[arg(long, requires = "component")]
    pub environment: Option<String>,
}

impl ReportArgs {
    /// Build the report filter. Tuning values resolve flag first, then the
    /// settings file, then the built-in defaults already on the filter.
    #[must_use]
    pub fn to_filter(&self, config: &Config) -> ReportFilter {
        let mut filter = ReportFilter::new(
            self.base_release.clone(),
            self.base_start,
            self.base_end,
            self.sample_release.clone(),
            self.sample_start,
            self.sample_end,
        );
        filter.group_by.clone_from(&self.group_by);
        filter.exclude_clouds.clone_from(&self.exclude_clouds);
        filter.exclude_arches.clone_from(&self.exclude_arches);
        filter.exclude_networks.clone_from(&self.exclude_networks);
        filter.exclude_upgrades.clone_from(&self.exclude_upgrades);
        filter.exclude_variants.clone_from(&self.exclude_variants);
        if let Some(confidence) = self.confidence.or(config.confidence) {
            filter.confidence = confidence;
        }
        if let Some(pity) = self.pity.or(config.pity) {
            filter.pity = pity;
        }
        if let Some(min_fail) = self.min_fail.or(config.min_fail) {
            filter.min_fail = min_fail;
        }
        filter.ignore_disruption = self.ignore_disruption;
        filter.ignore_missing = self.ignore_missing;
        filter
    }
}
