use log::{debug, info, warn};

use contest_results::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

mod config_reader;
mod io_common;
mod io_corrections;
mod io_sos;

pub use crate::transform::config_reader::*;
use crate::transform::io_common::write_json;
use crate::transform::io_corrections::read_corrections;
use crate::transform::io_sos::*;

#[derive(Debug, Snafu)]
pub enum TransformError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading corrections file {path}"))]
    OpeningCorrections { source: csv::Error, path: String },
    #[snafu(display("Error opening corrections workbook {path}"))]
    OpeningCorrectionsExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Corrections workbook {path} has no worksheet to read"))]
    EmptyCorrectionsExcel { path: String },
    #[snafu(display("Error parsing corrections file {path}, line {lineno}: {reason}"))]
    ParsingCorrections {
        path: String,
        lineno: usize,
        reason: String,
    },
    #[snafu(display("Error listing the raw data files"))]
    WalkingRawData { source: walkdir::Error },
    #[snafu(display("Error opening json file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Missing or invalid field {field:?} in {record}"))]
    MissingRequiredField { field: String, record: String },
    #[snafu(display("Error normalizing contest {title:?}"))]
    Normalize {
        source: NormalizeError,
        title: String,
    },
    #[snafu(display("Error serializing the transformed results"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing json file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Transformed results differ from the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type TResult<T> = Result<T, TransformError>;

/// The output of one run: all the contests that survived the corrections.
#[derive(PartialEq, Debug, Clone)]
pub struct TransformedBatch {
    pub scraped_datetime: String,
    pub races: Vec<Contest>,
}

impl TransformedBatch {
    pub fn new(scraped_at: &DateTime<FixedOffset>, races: Vec<Contest>) -> TransformedBatch {
        TransformedBatch {
            scraped_datetime: scraped_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            races,
        }
    }

    pub fn to_json(&self) -> JSValue {
        json!({
            "scraped_datetime": self.scraped_datetime,
            "races": races_to_json(&self.races),
        })
    }
}

fn candidate_to_json(c: &CandidateResult) -> JSValue {
    json!({
        "name": c.name,
        "party": c.party,
        "votes": c.votes,
        "votes_percent": c.votes_percent,
        "incumbent": c.incumbent,
    })
}

fn races_to_json(races: &[Contest]) -> JSValue {
    let l: Vec<JSValue> = races
        .iter()
        .map(|c| {
            let candidates: Vec<JSValue> = c.candidates.iter().map(candidate_to_json).collect();
            json!({
                "name": c.name,
                "slug": c.slug,
                "description": c.description,
                "geography": c.geography,
                "precincts_reporting": c.precincts_reporting,
                "candidates": candidates,
            })
        })
        .collect();
    JSValue::Array(l)
}

/// Reads all the raw snapshots and normalizes them, without writing anything.
pub fn build_batch(
    config: &TransformConfig,
    scraped_at: &DateTime<FixedOffset>,
) -> TResult<TransformedBatch> {
    let files = discover_latest_files(&config.raw_data_directory)?;
    info!("Transforming {} raw files", files.len());

    let corrections = read_corrections(
        &config.corrections_path,
        config.corrections_worksheet.as_deref(),
    )?;

    let mut documents: Vec<(String, JSValue)> = Vec::new();
    for p in files.iter() {
        documents.push(read_document(p)?);
    }
    let records = flatten_documents(documents)?;
    debug!("build_batch: {} flattened contest records", records.len());

    let mut races: Vec<Contest> = Vec::new();
    for record in records.iter() {
        let raw = parse_raw_contest(record)?;
        let normalized = normalize_contest(&raw, &corrections).context(NormalizeSnafu {
            title: raw.title.clone(),
        })?;
        if let Some(contest) = normalized {
            races.push(contest);
        }
    }
    info!(
        "Kept {} contests out of {} raw contests",
        races.len(),
        records.len()
    );

    Ok(TransformedBatch::new(scraped_at, races))
}

/// Writes the batch twice: once under its timestamp, once as the latest file.
///
/// Returns the paths of the timestamped file and of the latest file.
pub fn write_batch(batch: &TransformedBatch, output_dir: &Path) -> TResult<(PathBuf, PathBuf)> {
    let js = batch.to_json();
    let timestamp_path = output_dir.join(format!("{}.json", batch.scraped_datetime));
    write_json(&js, &timestamp_path)?;
    let latest_path = output_dir.join("latest.json");
    write_json(&js, &latest_path)?;
    info!(
        "Wrote {} contests to {} and {}",
        batch.races.len(),
        timestamp_path.display(),
        latest_path.display()
    );
    Ok((timestamp_path, latest_path))
}

/// Compares the contests of a batch with the ones of a previously
/// transformed file. The timestamps are not compared.
pub fn check_reference(batch: &TransformedBatch, reference_path: &str) -> TResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path,
    })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    let pretty_reference =
        serde_json::to_string_pretty(&reference["races"]).context(SerializingJsonSnafu {})?;
    let pretty_races =
        serde_json::to_string_pretty(&races_to_json(&batch.races)).context(SerializingJsonSnafu {})?;
    if pretty_reference != pretty_races {
        warn!("Found differences with the reference {}", reference_path);
        print_diff(pretty_reference.as_str(), pretty_races.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("Transformed results match the reference {}", reference_path);
    Ok(())
}

/// Runs the whole pipeline.
///
/// Nothing is written if any of the contests fails to be read or normalized,
/// or if the results differ from the reference.
pub fn run_transform(
    config: &TransformConfig,
    scraped_at: &DateTime<FixedOffset>,
    check_reference_path: Option<String>,
) -> TResult<TransformedBatch> {
    info!("config: {:?}", config);
    let batch = build_batch(config, scraped_at)?;
    if let Some(reference_path) = check_reference_path {
        check_reference(&batch, &reference_path)?;
    }
    write_batch(&batch, &config.transformed_data_directory)?;
    Ok(batch)
}
