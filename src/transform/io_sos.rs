// Primitives for reading the raw snapshots of the Secretary of State.

use serde_json::json;
use serde_json::Map as JSMap;
use walkdir::WalkDir;

use crate::transform::{io_common::category_of, *};

pub const SUPREME_COURT: &str = "supreme-court";
pub const BALLOT_MEASURES: &str = "ballot-measures";

/// The shapes of raw snapshots published by the Secretary of State.
#[derive(PartialEq, Debug, Clone)]
pub enum RawDocument {
    /// A snapshot with a `races` list. Each element is a contest.
    GenericRaceList(Vec<JSValue>),
    /// Retention votes of the justices, one contest per justice.
    SupremeCourtRetentions {
        entries: Vec<JSValue>,
        reporting: JSValue,
    },
    /// Propositions, one contest per measure.
    BallotMeasures {
        entries: Vec<JSValue>,
        reporting: JSValue,
    },
    /// The snapshot is itself a contest.
    SingleContest(JSValue),
}

impl RawDocument {
    pub fn classify(category: &str, doc: JSValue) -> TResult<RawDocument> {
        if let Some(races) = doc.get("races") {
            let races = races.as_array().context(MissingRequiredFieldSnafu {
                field: "races",
                record: category,
            })?;
            return Ok(RawDocument::GenericRaceList(races.clone()));
        }
        match category {
            SUPREME_COURT => {
                let (entries, reporting) = category_entries(category, &doc)?;
                Ok(RawDocument::SupremeCourtRetentions { entries, reporting })
            }
            BALLOT_MEASURES => {
                let (entries, reporting) = category_entries(category, &doc)?;
                Ok(RawDocument::BallotMeasures { entries, reporting })
            }
            _ => Ok(RawDocument::SingleContest(doc)),
        }
    }

    /// The contest records held by this snapshot, in order.
    pub fn into_contest_records(self) -> TResult<Vec<JSValue>> {
        match self {
            RawDocument::GenericRaceList(races) => Ok(races),
            RawDocument::SupremeCourtRetentions { entries, reporting } => entries
                .iter()
                .map(|e| {
                    let name = required_text(e, "Name", SUPREME_COURT)?;
                    yes_no_contest(
                        format!("Retain Supreme Court Justice {}", name),
                        &reporting,
                        e,
                        SUPREME_COURT,
                    )
                })
                .collect(),
            RawDocument::BallotMeasures { entries, reporting } => entries
                .iter()
                .map(|e| {
                    let number = required_text(e, "Number", BALLOT_MEASURES)?;
                    let name = required_text(e, "Name", BALLOT_MEASURES)?;
                    yes_no_contest(
                        format!("Proposition {}: {}", number, name),
                        &reporting,
                        e,
                        BALLOT_MEASURES,
                    )
                })
                .collect(),
            RawDocument::SingleContest(doc) => Ok(vec![doc]),
        }
    }
}

fn category_entries(category: &str, doc: &JSValue) -> TResult<(Vec<JSValue>, JSValue)> {
    let entries = doc
        .get(category)
        .and_then(|x| x.as_array())
        .context(MissingRequiredFieldSnafu {
            field: category,
            record: category,
        })?;
    let reporting = doc.get("Reporting").context(MissingRequiredFieldSnafu {
        field: "Reporting",
        record: category,
    })?;
    Ok((entries.clone(), reporting.clone()))
}

// Retention votes and propositions have the same Yes / No structure.
fn yes_no_contest(
    title: String,
    reporting: &JSValue,
    entry: &JSValue,
    category: &str,
) -> TResult<JSValue> {
    let yes = entry.get("yesVotes").context(MissingRequiredFieldSnafu {
        field: "yesVotes",
        record: category,
    })?;
    let no = entry.get("noVotes").context(MissingRequiredFieldSnafu {
        field: "noVotes",
        record: category,
    })?;
    Ok(json!({
        "raceTitle": title,
        "Reporting": reporting,
        "candidates": [
            {"Name": "Yes", "Votes": yes},
            {"Name": "No", "Votes": no},
        ],
    }))
}

// Text content of a field. Numbers are accepted and printed as they are.
fn js_text(x: &JSValue) -> Option<String> {
    match x {
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(obj: &JSValue, field: &str, record: &str) -> TResult<String> {
    obj.get(field)
        .and_then(js_text)
        .context(MissingRequiredFieldSnafu { field, record })
}

/// Lists all the latest snapshots under the root directory, sorted by path.
pub fn discover_latest_files(root: &Path) -> TResult<Vec<PathBuf>> {
    info!("Looking for raw files in {:?}", root);
    let mut res: Vec<PathBuf> = Vec::new();
    for entry_r in WalkDir::new(root).sort_by_file_name() {
        let entry = entry_r.context(WalkingRawDataSnafu {})?;
        let is_latest = entry.path().to_string_lossy().contains("latest.json");
        if entry.file_type().is_file() && is_latest {
            debug!("discover_latest_files: found {:?}", entry.path());
            res.push(entry.into_path());
        }
    }
    Ok(res)
}

/// Reads one snapshot, along with its category.
pub fn read_document(path: &Path) -> TResult<(String, JSValue)> {
    let path_s = path.display().to_string();
    info!("Attempting to read raw file {:?}", path_s);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path_s.clone(),
    })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu { path: path_s })?;
    Ok((category_of(path), js))
}

/// Flattens all the snapshots into a single list of contest records.
///
/// The order of the snapshots is kept, and then the order within each snapshot.
pub fn flatten_documents(documents: Vec<(String, JSValue)>) -> TResult<Vec<JSValue>> {
    let mut res: Vec<JSValue> = Vec::new();
    for (category, doc) in documents {
        let raw_doc = RawDocument::classify(&category, doc)?;
        let mut records = raw_doc.into_contest_records()?;
        debug!(
            "flatten_documents: {} contest records in category {:?}",
            records.len(),
            category
        );
        res.append(&mut records);
    }
    Ok(res)
}

/// Reads a flattened contest record into a raw contest.
pub fn parse_raw_contest(record: &JSValue) -> TResult<RawContest> {
    let empty = JSMap::new();
    let obj = record.as_object().unwrap_or(&empty);
    let describe = || format!("contest {}", summarize(record));

    let title = obj
        .get("raceTitle")
        .and_then(js_text)
        .context(MissingRequiredFieldSnafu {
            field: "raceTitle",
            record: describe(),
        })?;
    let record_name = format!("contest {:?}", title);
    let reporting = required_text(record, "Reporting", &record_name)?;
    let raw_candidates = obj
        .get("candidates")
        .and_then(|x| x.as_array())
        .context(MissingRequiredFieldSnafu {
            field: "candidates",
            record: record_name.clone(),
        })?;

    let mut candidates: Vec<RawCandidate> = Vec::new();
    for c in raw_candidates.iter() {
        candidates.push(RawCandidate {
            name: required_text(c, "Name", &record_name)?,
            votes: required_text(c, "Votes", &record_name)?,
            party: c.get("Party").and_then(js_text),
            incumbent: c.get("incumbent").and_then(|x| x.as_bool()),
        });
    }
    Ok(RawContest {
        title,
        reporting,
        candidates,
    })
}

// Short description of a record for the error messages.
fn summarize(record: &JSValue) -> String {
    let s = record.to_string();
    if s.chars().count() > 80 {
        format!("{}...", s.chars().take(80).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn supreme_court() {
        let doc = json!({
            "supreme-court": [{"Name": "Smith", "yesVotes": "100", "noVotes": "50"}],
            "Reporting": "80%"
        });
        let records = flatten_documents(vec![(SUPREME_COURT.to_string(), doc)]).unwrap();
        assert_eq!(
            records,
            vec![json!({
                "raceTitle": "Retain Supreme Court Justice Smith",
                "Reporting": "80%",
                "candidates": [
                    {"Name": "Yes", "Votes": "100"},
                    {"Name": "No", "Votes": "50"},
                ],
            })]
        );
    }

    #[test]
    fn ballot_measures() {
        let doc = json!({
            "ballot-measures": [
                {"Number": "1", "Name": "Tax Reform", "yesVotes": "10", "noVotes": "0"},
                {"Number": 27, "Name": "Sports Betting", "yesVotes": "1,000", "noVotes": "2,000"}
            ],
            "Reporting": "100%"
        });
        let records = flatten_documents(vec![(BALLOT_MEASURES.to_string(), doc)]).unwrap();
        assert_eq!(records.len(), 2);
        let first = parse_raw_contest(&records[0]).unwrap();
        assert_eq!(first.title, "Proposition 1: Tax Reform");
        assert_eq!(first.reporting, "100%");
        assert_eq!(first.candidates[0].name, "Yes");
        assert_eq!(first.candidates[0].votes, "10");
        assert_eq!(first.candidates[1].name, "No");
        assert_eq!(first.candidates[1].votes, "0");
        let second = parse_raw_contest(&records[1]).unwrap();
        assert_eq!(second.title, "Proposition 27: Sports Betting");
    }

    #[test]
    fn races_take_priority() {
        let doc = json!({
            "races": [{"raceTitle": "A"}, {"raceTitle": "B"}],
            "supreme-court": [{"Name": "Smith", "yesVotes": "1", "noVotes": "1"}],
            "Reporting": "1%"
        });
        let raw = RawDocument::classify(SUPREME_COURT, doc).unwrap();
        assert!(matches!(raw, RawDocument::GenericRaceList(ref l) if l.len() == 2));
    }

    #[test]
    fn ordering() {
        let docs = vec![
            (
                "statewide".to_string(),
                json!({"races": [{"raceTitle": "A"}, {"raceTitle": "B"}]}),
            ),
            ("governor".to_string(), json!({"raceTitle": "C"})),
            (
                BALLOT_MEASURES.to_string(),
                json!({"ballot-measures": [{"Number": "1", "Name": "D", "yesVotes": "1", "noVotes": "1"}], "Reporting": "1%"}),
            ),
        ];
        let titles: Vec<JSValue> = flatten_documents(docs)
            .unwrap()
            .iter()
            .map(|r| r["raceTitle"].clone())
            .collect();
        assert_eq!(titles, vec![json!("A"), json!("B"), json!("C"), json!("Proposition 1: D")]);
    }

    #[test]
    fn missing_fields() {
        let doc = json!({"supreme-court": [{"Name": "Smith", "yesVotes": "1"}], "Reporting": "1%"});
        assert!(matches!(
            flatten_documents(vec![(SUPREME_COURT.to_string(), doc)]),
            Err(TransformError::MissingRequiredField { .. })
        ));
        let doc = json!({"ballot-measures": []});
        assert!(matches!(
            flatten_documents(vec![(BALLOT_MEASURES.to_string(), doc)]),
            Err(TransformError::MissingRequiredField { .. })
        ));
        // Unknown shapes only fail when read as a contest.
        let records =
            flatten_documents(vec![("other".to_string(), json!({"title": "X"}))]).unwrap();
        assert!(matches!(
            parse_raw_contest(&records[0]),
            Err(TransformError::MissingRequiredField { .. })
        ));
        assert!(parse_raw_contest(&json!({"raceTitle": "X", "Reporting": "1%"})).is_err());
        assert!(parse_raw_contest(&json!([1, 2])).is_err());
    }

    #[test]
    fn candidates() {
        let raw = parse_raw_contest(&json!({
            "raceTitle": "Governor",
            "Reporting": 12.5,
            "candidates": [
                {"Name": "Jane Doe", "Party": "Dem", "Votes": "1,234", "incumbent": true},
                {"Name": "John Roe", "Party": null, "Votes": 987}
            ]
        }))
        .unwrap();
        assert_eq!(raw.reporting, "12.5");
        assert_eq!(
            raw.candidates,
            vec![
                RawCandidate {
                    name: "Jane Doe".to_string(),
                    votes: "1,234".to_string(),
                    party: Some("Dem".to_string()),
                    incumbent: Some(true),
                },
                RawCandidate {
                    name: "John Roe".to_string(),
                    votes: "987".to_string(),
                    party: None,
                    incumbent: None,
                },
            ]
        );
    }

    #[test]
    fn discovery() {
        let tmp = TempDir::new().unwrap();
        for rel in [
            "b/latest.json",
            "a/latest.json",
            "a/2022-11-08.json",
            "c/nested/latest.json",
        ] {
            let p = tmp.path().join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, "{}").unwrap();
        }
        let files = discover_latest_files(tmp.path()).unwrap();
        let rels: Vec<PathBuf> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rels,
            vec![
                PathBuf::from("a/latest.json"),
                PathBuf::from("b/latest.json"),
                PathBuf::from("c/nested/latest.json"),
            ]
        );
        let (category, js) = read_document(&files[2]).unwrap();
        assert_eq!(category, "nested");
        assert_eq!(js, json!({}));

        assert!(matches!(
            discover_latest_files(&tmp.path().join("missing")),
            Err(TransformError::WalkingRawData { .. })
        ));
    }
}
