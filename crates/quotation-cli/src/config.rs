//! YAML configuration for the quotation pipeline.
//!
//! Every field is optional; an absent file means all defaults.

use anyhow::{Context, Result};
use quotation_core::{electrical_class_names, DetectionFilter, PriceTable, StoreLoadPolicy};
use quotation_report::{validate_party, PartyField, ReportSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Looked up when neither `--config` nor `BLUEPRINT_QUOTE_CONFIG` is set
pub const DEFAULT_CONFIG_PATH: &str = "config/quotation.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuoteConfig {
    /// JSON file holding issuance counters
    pub store_path: PathBuf,
    pub store_policy: StoreLoadPolicy,
    /// Directory finalized documents are written to
    pub output_dir: PathBuf,
    /// Preview templates; the shipped ones when unset
    pub templates_path: Option<PathBuf>,
    /// Intake filter applied to detector output
    pub detections: DetectionFilter,
    /// Unit prices; the electrical catalog when unset
    pub pricing: Option<PriceTable>,
    pub class_names: Option<BTreeMap<u32, String>>,
    pub report: ReportSettings,
    pub issuer: Option<Vec<PartyField>>,
    pub recipient: Option<Vec<PartyField>>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/quotation_counts.json"),
            store_policy: StoreLoadPolicy::default(),
            output_dir: PathBuf::from("output"),
            templates_path: None,
            detections: DetectionFilter::default(),
            pricing: None,
            class_names: None,
            report: ReportSettings::default(),
            issuer: None,
            recipient: None,
        }
    }
}

impl QuoteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.report.validate()?;
        config.detections.validate()?;
        for (role, fields) in [("issuer", &config.issuer), ("recipient", &config.recipient)] {
            if let Some(fields) = fields {
                validate_party(role, fields)?;
            }
        }
        Ok(config)
    }

    /// An explicit path must exist; the default path is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    tracing::debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn prices(&self) -> PriceTable {
        self.pricing.clone().unwrap_or_else(PriceTable::electrical_defaults)
    }

    pub fn class_names(&self) -> BTreeMap<u32, String> {
        self.class_names.clone().unwrap_or_else(electrical_class_names)
    }
}
