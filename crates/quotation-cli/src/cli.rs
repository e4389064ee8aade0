//! Command-line surface: preview, finalize and counter listing.

use crate::config::QuoteConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use quotation_core::data_model::REFERENCE_LEN;
use quotation_core::{
    fingerprint, parse_detector_output, CounterStore, Detection, JsonFileCounterStore, QuotationEngine,
};
use quotation_report::{
    FinalizedData, ItemTable, PreviewData, PreviewRenderer, ReportContext, ReportRenderer, ReportSettings,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "blueprint-quote")]
#[command(about = "Price blueprint detections and issue quotation documents", version)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "BLUEPRINT_QUOTE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Price detections without issuing a quotation
    Preview(PreviewArgs),
    /// Issue a quotation and write its PDF document
    Finalize(FinalizeArgs),
    /// List persisted issuance counters
    Counts(CountsArgs),
}

#[derive(Debug, Args)]
pub struct DetectionArgs {
    /// Detector output (JSON array, or object keyed by image)
    #[arg(short, long)]
    pub detections: PathBuf,

    /// Image to select from multi-image detector output
    #[arg(long)]
    pub image: Option<String>,

    /// Overrides the configured confidence threshold
    #[arg(long)]
    pub min_confidence: Option<f32>,
}

#[derive(Debug, Args)]
pub struct RateArgs {
    /// Tax rate in percent (10 means 10%)
    #[arg(long)]
    pub tax_percent: Option<f64>,

    /// Discount rate in percent
    #[arg(long)]
    pub discount_percent: Option<f64>,
}

impl RateArgs {
    fn apply(&self, mut settings: ReportSettings) -> Result<ReportSettings> {
        if let Some(percent) = self.tax_percent {
            settings.tax_rate = percent / 100.0;
        }
        if let Some(percent) = self.discount_percent {
            settings.discount_rate = percent / 100.0;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: DetectionArgs,

    #[command(flatten)]
    pub rates: RateArgs,
}

#[derive(Debug, Args)]
pub struct FinalizeArgs {
    #[command(flatten)]
    pub input: DetectionArgs,

    #[command(flatten)]
    pub rates: RateArgs,

    /// Overrides the configured output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Issue date printed on the document (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct CountsArgs {
    /// Only show hashes starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Run a parsed command and return what it prints on stdout.
pub fn execute(cli: Cli) -> Result<String> {
    let config = QuoteConfig::resolve(cli.config.as_deref())?;
    match cli.command {
        Commands::Preview(args) => preview(&config, &args),
        Commands::Finalize(args) => finalize(&config, &args),
        Commands::Counts(args) => counts(&config, &args),
    }
}

fn open_engine(config: &QuoteConfig) -> Result<QuotationEngine<JsonFileCounterStore>> {
    let store = JsonFileCounterStore::open(&config.store_path, config.store_policy)
        .with_context(|| format!("failed to open counter store {}", config.store_path.display()))?;
    Ok(QuotationEngine::new(config.prices(), store))
}

fn previews(config: &QuoteConfig) -> Result<PreviewRenderer<'static>> {
    let renderer = match &config.templates_path {
        Some(path) => PreviewRenderer::load(path)?,
        None => PreviewRenderer::builtin()?,
    };
    Ok(renderer)
}

fn read_detections(config: &QuoteConfig, args: &DetectionArgs) -> Result<Vec<Detection>> {
    let json = std::fs::read_to_string(&args.detections)
        .with_context(|| format!("failed to read detections {}", args.detections.display()))?;
    let detections = parse_detector_output(&json, args.image.as_deref())
        .with_context(|| format!("invalid detections in {}", args.detections.display()))?;

    let mut filter = config.detections.clone();
    if let Some(threshold) = args.min_confidence {
        filter = filter.with_min_confidence(threshold);
    }
    filter.validate().context("invalid --min-confidence")?;
    Ok(filter.apply(detections))
}

fn preview(config: &QuoteConfig, args: &PreviewArgs) -> Result<String> {
    let settings = args.rates.apply(config.report.clone())?;
    let detections = read_detections(config, &args.input)?;
    let engine = open_engine(config)?;

    let priced = engine.price(&detections);
    let issued_count = engine.issued_count(&priced)?;
    let hash = fingerprint(&priced.items, priced.total_cost)?;
    let table = ItemTable::from_priced(&priced, &config.class_names(), settings.tax_rate, settings.discount_rate);

    let output = previews(config)?.preview(&PreviewData {
        table: &table,
        reference: Some(short_reference(&hash)),
        issued_count,
    })?;
    Ok(output)
}

fn finalize(config: &QuoteConfig, args: &FinalizeArgs) -> Result<String> {
    let settings = args.rates.apply(config.report.clone())?;
    let detections = read_detections(config, &args.input)?;
    let engine = open_engine(config)?;
    let previews = previews(config)?;

    let quotation = engine.generate(&detections)?;

    let output_dir = args.output_dir.as_deref().unwrap_or(config.output_dir.as_path());
    let path = document_path(output_dir, &quotation.quotation_hash, quotation.download_count);
    let issued_on = args
        .issue_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut context = ReportContext::default()
        .with_class_names(config.class_names())
        .with_quotation_number(quotation.download_count)
        .with_issue_date(issued_on);
    context.issuer = config.issuer.clone();
    context.recipient = config.recipient.clone();

    let renderer = ReportRenderer::new(&path).with_settings(settings);
    let document = renderer
        .render(&quotation, &context)
        .with_context(|| format!("quotation {} was counted but its document failed", quotation.reference()))?;

    let table = renderer.table(&quotation, &context);
    let output = previews.finalized(&FinalizedData {
        table: &table,
        quotation_number: quotation.download_count,
        document: document.path.map(|p| p.display().to_string()),
    })?;
    Ok(output)
}

fn counts(config: &QuoteConfig, args: &CountsArgs) -> Result<String> {
    let store = JsonFileCounterStore::open(&config.store_path, config.store_policy)?;
    let entries = store.entries()?;

    let mut output = String::new();
    for (hash, count) in entries
        .iter()
        .filter(|(hash, _)| args.prefix.as_deref().map_or(true, |p| hash.starts_with(p)))
    {
        writeln!(output, "{}  {}", hash, count)?;
    }
    if output.is_empty() {
        output.push_str("No quotations issued.\n");
    }
    Ok(output)
}

fn short_reference(hash: &str) -> &str {
    hash.get(..REFERENCE_LEN).unwrap_or(hash)
}

/// `quotation_{ref}_{n}.pdf`, unique per content and issuance.
pub fn document_path(output_dir: &Path, hash: &str, download_count: u64) -> PathBuf {
    output_dir.join(format!("quotation_{}_{}.pdf", short_reference(hash), download_count))
}
