//! Environment dimensions and the value → dimension classification table.
//!
//! An "environment" is a space-separated label like `ovn amd64 aws`, one token
//! per dimension. Column headers use the joined form; drill-down queries need
//! each token re-attributed to its dimension (`network=ovn&arch=amd64&...`).
//! Classification is driven by one declarative table, validated at
//! construction so no value can belong to two dimensions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::query::safe_encode;

/// One axis of the environment breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Platform,
    Arch,
    Network,
    Upgrade,
    Variant,
}

impl Dimension {
    /// All dimensions, in the order they appear in query strings.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Platform,
            Self::Arch,
            Self::Network,
            Self::Upgrade,
            Self::Variant,
        ]
    }

    /// Query-parameter name for a single selected value of this dimension.
    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Arch => "arch",
            Self::Network => "network",
            Self::Upgrade => "upgrade",
            Self::Variant => "variant",
        }
    }

    /// Query-parameter name for this dimension's exclusion list.
    #[must_use]
    pub const fn exclude_param(self) -> &'static str {
        match self {
            Self::Platform => "exclude_clouds",
            Self::Arch => "exclude_arches",
            Self::Network => "exclude_networks",
            Self::Upgrade => "exclude_upgrades",
            Self::Variant => "exclude_variants",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.param())
    }
}

/// Known cloud platforms.
pub const CLOUDS: &[&str] = &[
    "alibaba",
    "aws",
    "azure",
    "gcp",
    "ibmcloud",
    "libvirt",
    "metal-assisted",
    "metal-ipi",
    "openstack",
    "ovirt",
    "unknown",
    "vsphere",
    "vsphere-upi",
];

/// Known CPU architectures.
pub const ARCHES: &[&str] = &["amd64", "arm64", "ppc64le", "s390x", "heterogeneous"];

/// Known network stacks.
pub const NETWORKS: &[&str] = &["ovn", "sdn"];

/// Known upgrade types.
pub const UPGRADES: &[&str] = &["no-upgrade", "none", "upgrade-micro", "upgrade-minor"];

/// Known job variants.
pub const VARIANTS: &[&str] = &[
    "assisted",
    "compact",
    "fips",
    "hypershift",
    "microshift",
    "osd",
    "proxy",
    "rt",
    "serial",
    "single-node",
    "standard",
    "techpreview",
];

/// Allowed `group_by` values.
pub const GROUP_BY: &[&str] = &["cloud", "arch", "network", "upgrade", "variants"];

/// Maps environment token values to their dimension.
#[derive(Debug, Clone)]
pub struct DimensionTable {
    by_value: HashMap<String, Dimension>,
}

impl DimensionTable {
    /// Build a table from the given vocabularies, rejecting any value that
    /// appears under more than one dimension.
    pub fn new(entries: &[(Dimension, &[&str])]) -> Result<Self> {
        let mut by_value = HashMap::new();
        for (dimension, values) in entries {
            for value in *values {
                if let Some(previous) = by_value.insert((*value).to_string(), *dimension) {
                    return Err(Error::Config(format!(
                        "dimension value {value:?} is ambiguous: listed under both {previous} and {dimension}"
                    )));
                }
            }
        }
        Ok(Self { by_value })
    }

    /// Table over the built-in vocabularies.
    pub fn builtin() -> Result<Self> {
        Self::new(&[
            (Dimension::Platform, CLOUDS),
            (Dimension::Arch, ARCHES),
            (Dimension::Network, NETWORKS),
            (Dimension::Upgrade, UPGRADES),
            (Dimension::Variant, VARIANTS),
        ])
    }

    #[must_use]
    pub fn classify(&self, token: &str) -> Option<Dimension> {
        self.by_value.get(token).copied()
    }

    /// Known values for one dimension, sorted.
    #[must_use]
    pub fn values(&self, dimension: Dimension) -> Vec<&str> {
        let mut values: Vec<&str> = self
            .by_value
            .iter()
            .filter(|(_, d)| **d == dimension)
            .map(|(v, _)| v.as_str())
            .collect();
        values.sort_unstable();
        values
    }

    /// Expand a space-separated environment label into query fragments.
    ///
    /// The label itself is kept under `environment` (columns downstream still
    /// display the joined form); each recognized token additionally becomes a
    /// single-value dimension parameter. Tokens found in no vocabulary are
    /// logged and dropped rather than failing the whole expansion, so a stale
    /// label still yields a usable (if less constrained) query.
    #[must_use]
    pub fn expand_environment(&self, environment: &str) -> String {
        if environment.is_empty() {
            return String::new();
        }

        // One slot per dimension; a repeated dimension keeps its first
        // position but takes the later value.
        let mut params: Vec<(Dimension, &str)> = Vec::new();
        for token in environment.split(' ') {
            match self.classify(token) {
                Some(dimension) => {
                    if let Some(slot) = params.iter_mut().find(|(d, _)| *d == dimension) {
                        slot.1 = token;
                    } else {
                        params.push((dimension, token));
                    }
                }
                None => {
                    warn!("environment token {token:?} not found in any dimension list");
                }
            }
        }

        let mut out = format!("&environment={}", safe_encode(environment));
        for (dimension, value) in params {
            out.push('&');
            out.push_str(dimension.param());
            out.push('=');
            out.push_str(&safe_encode(value));
        }
        out
    }
}
