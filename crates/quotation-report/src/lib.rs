//! Quotation Report: priced quotations to paginated PDF documents
//!
//! The renderer formats what the engine computed. Per-line prices come from
//! the quotation's own price snapshot; tax and discount are render-time
//! presentation parameters applied through [`quotation_core::Totals`].
//!
//! # Example
//!
//! ```ignore
//! use quotation_report::{ReportContext, ReportRenderer};
//!
//! let renderer = ReportRenderer::new("output/quotation_1.pdf").with_tax_rate(0.1);
//! let context = ReportContext::default()
//!     .with_class_names(quotation_core::electrical_class_names())
//!     .with_quotation_number(quotation.download_count);
//!
//! let document = renderer.render(&quotation, &context)?;
//! println!("{} pages, {} bytes", document.pages, document.bytes);
//! ```

pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod preview;
pub mod table;
pub mod templates;

pub use preview::{FinalizedData, PreviewData, PreviewRenderer};
pub use table::{ItemTable, NamedLine};
pub use templates::TemplatesFile;

use chrono::NaiveDate;
use layout::LayoutInput;
use quotation_core::atomic::write_atomic;
use quotation_core::Quotation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TITLE: &str = "Quotation Report";

pub const DEFAULT_TERMS: &str = "Terms and Conditions:
1. Payment due within 30 days.
2. Goods remain property of the seller until paid in full.
3. Warranty as per manufacturer terms.
4. Please contact us for any queries.";

const ISSUER_PLACEHOLDER: [&str; 5] = [
    "Your Company Name",
    "Address Line 1",
    "Address Line 2",
    "Phone: XXX-XXX-XXXX",
    "Email: info@company.com",
];

const RECIPIENT_PLACEHOLDER: [&str; 5] = [
    "Client Name",
    "Client Address Line 1",
    "Client Address Line 2",
    "Phone: XXX-XXX-XXXX",
    "Email: client@example.com",
];

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("RENDER/SETTINGS {0}")]
    Settings(String),
    #[error("RENDER/TEMPLATE {0}")]
    Template(String),
    #[error("RENDER/TEXT {0}")]
    Render(String),
    #[error("RENDER/ENCODE {0}")]
    Encode(String),
    #[error("RENDER/IO {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RENDER/STREAM {0}")]
    Stream(#[source] std::io::Error),
}

/// One labelled line of an address block, printed as `label: value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyField {
    pub label: String,
    pub value: String,
}

impl PartyField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Reject address blocks longer than [`layout::MAX_PARTY_LINES`].
pub fn validate_party(role: &str, fields: &[PartyField]) -> Result<(), RenderError> {
    if fields.len() > layout::MAX_PARTY_LINES {
        return Err(RenderError::Settings(format!(
            "{} has {} lines, at most {} fit above the table",
            role,
            fields.len(),
            layout::MAX_PARTY_LINES
        )));
    }
    Ok(())
}

fn party_lines(info: Option<&[PartyField]>, placeholder: &[&str]) -> Vec<String> {
    match info {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|f| format!("{}: {}", f.label, f.value))
            .collect(),
        _ => placeholder.iter().map(|line| line.to_string()).collect(),
    }
}

/// Rates and boilerplate fixed for a renderer's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Fraction, e.g. `0.1` for 10%
    pub tax_rate: f64,
    /// Fraction subtracted from the subtotal
    pub discount_rate: f64,
    pub terms: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            tax_rate: 0.1,
            discount_rate: 0.0,
            terms: DEFAULT_TERMS.to_string(),
        }
    }
}

impl ReportSettings {
    pub fn validate(&self) -> Result<(), RenderError> {
        for (name, rate) in [("tax_rate", self.tax_rate), ("discount_rate", self.discount_rate)] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(RenderError::Settings(format!("{} must be a non-negative fraction, got {}", name, rate)));
            }
        }
        Ok(())
    }
}

/// Per-document presentation inputs. Everything is optional.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub class_names: BTreeMap<u32, String>,
    pub issuer: Option<Vec<PartyField>>,
    pub recipient: Option<Vec<PartyField>>,
    pub quotation_number: Option<u64>,
    pub issued_on: Option<NaiveDate>,
}

impl ReportContext {
    pub fn with_class_names(mut self, class_names: BTreeMap<u32, String>) -> Self {
        self.class_names = class_names;
        self
    }

    pub fn with_issuer(mut self, issuer: Vec<PartyField>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn with_recipient(mut self, recipient: Vec<PartyField>) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_quotation_number(mut self, number: u64) -> Self {
        self.quotation_number = Some(number);
        self
    }

    pub fn with_issue_date(mut self, date: NaiveDate) -> Self {
        self.issued_on = Some(date);
        self
    }
}

/// Descriptor of a written document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    /// Destination, when written to a file sink
    pub path: Option<PathBuf>,
    pub bytes: usize,
    pub pages: usize,
}

/// Renders quotations to a fixed file sink.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    sink: PathBuf,
    settings: ReportSettings,
}

impl ReportRenderer {
    pub fn new(sink: impl Into<PathBuf>) -> Self {
        Self {
            sink: sink.into(),
            settings: ReportSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ReportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.settings.tax_rate = tax_rate;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.settings.discount_rate = discount_rate;
        self
    }

    pub fn with_terms(mut self, terms: impl Into<String>) -> Self {
        self.settings.terms = terms.into();
        self
    }

    pub fn sink(&self) -> &Path {
        &self.sink
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Table and totals exactly as the document will print them.
    pub fn table(&self, quotation: &Quotation, context: &ReportContext) -> ItemTable {
        ItemTable::from_quotation(
            quotation,
            &context.class_names,
            self.settings.tax_rate,
            self.settings.discount_rate,
        )
    }

    /// Render into the configured file sink.
    ///
    /// The document is written to a temporary sibling and renamed into place,
    /// so a failed render never leaves a partial file at the destination.
    pub fn render(&self, quotation: &Quotation, context: &ReportContext) -> Result<ReportDocument, RenderError> {
        let (bytes, pages) = self.render_to_bytes(quotation, context)?;
        write_atomic(&self.sink, &bytes).map_err(|source| RenderError::Io {
            path: self.sink.clone(),
            source,
        })?;

        tracing::info!(
            path = %self.sink.display(),
            pages,
            bytes = bytes.len(),
            hash = %quotation.quotation_hash,
            "wrote quotation document"
        );

        Ok(ReportDocument {
            path: Some(self.sink.clone()),
            bytes: bytes.len(),
            pages,
        })
    }

    /// Render into an arbitrary stream instead of the file sink.
    pub fn render_to_writer<W: Write>(
        &self,
        quotation: &Quotation,
        context: &ReportContext,
        writer: &mut W,
    ) -> Result<ReportDocument, RenderError> {
        let (bytes, pages) = self.render_to_bytes(quotation, context)?;
        writer.write_all(&bytes).map_err(RenderError::Stream)?;
        writer.flush().map_err(RenderError::Stream)?;

        Ok(ReportDocument {
            path: None,
            bytes: bytes.len(),
            pages,
        })
    }

    /// Encoded PDF bytes and page count.
    pub fn render_to_bytes(&self, quotation: &Quotation, context: &ReportContext) -> Result<(Vec<u8>, usize), RenderError> {
        self.settings.validate()?;
        if let Some(issuer) = &context.issuer {
            validate_party("issuer", issuer)?;
        }
        if let Some(recipient) = &context.recipient {
            validate_party("recipient", recipient)?;
        }

        let table = self.table(quotation, context);
        let input = LayoutInput {
            title: TITLE,
            quotation_number: context.quotation_number,
            meta_line: meta_line(quotation, context.issued_on),
            issuer_lines: party_lines(context.issuer.as_deref(), &ISSUER_PLACEHOLDER),
            recipient_lines: party_lines(context.recipient.as_deref(), &RECIPIENT_PLACEHOLDER),
            table: &table,
            terms: &self.settings.terms,
        };

        let pages = layout::layout(&input);
        let info = pdf::DocumentInfo {
            title: match context.quotation_number {
                Some(number) => format!("{} {}", TITLE, number),
                None => TITLE.to_string(),
            },
            subject: Some(format!("Quotation {}", quotation.quotation_hash)),
        };

        let bytes = pdf::encode(&pages, &info)?;
        Ok((bytes, pages.len()))
    }
}

fn meta_line(quotation: &Quotation, issued_on: Option<NaiveDate>) -> Option<String> {
    let reference = quotation.reference();
    match (issued_on, reference.is_empty()) {
        (Some(date), false) => Some(format!("Date: {}   Ref: {}", date.format("%Y-%m-%d"), reference)),
        (Some(date), true) => Some(format!("Date: {}", date.format("%Y-%m-%d"))),
        (None, false) => Some(format!("Ref: {}", reference)),
        (None, true) => None,
    }
}
