// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A candidate, as found in the raw results of a contest.
///
/// The vote count is kept exactly as published (for example `"1,234"`).
/// It is only parsed during normalization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawCandidate {
    pub name: String,
    pub votes: String,
    pub party: Option<String>,
    pub incumbent: Option<bool>,
}

/// A contest, as found in the raw results, after flattening.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawContest {
    /// The title, exactly as published. It is the key for the corrections.
    pub title: String,
    /// How much of the vote has been tallied. Passed through as is.
    pub reporting: String,
    pub candidates: Vec<RawCandidate>,
}

// ********* Corrections ***********

/// What a correction says about keeping a contest in the output.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Inclusion {
    Include,
    Exclude,
}

impl Inclusion {
    /// Reads the include column of a correction row.
    ///
    /// Only `yes` (in any case) keeps the contest. Any other value, including
    /// an empty cell, excludes it.
    pub fn from_flag(flag: &str) -> Inclusion {
        if flag.trim().eq_ignore_ascii_case("yes") {
            Inclusion::Include
        } else {
            Inclusion::Exclude
        }
    }

    pub fn keeps_contest(&self) -> bool {
        matches!(self, Inclusion::Include)
    }
}

/// A manual override for one raw contest.
///
/// Empty cells in the correction table are represented as `None`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Correction {
    pub include: Inclusion,
    pub clean_name: Option<String>,
    pub clean_description: Option<String>,
    pub clean_geography: Option<String>,
    /// The names of the incumbents. A candidate is an incumbent if its name
    /// appears anywhere in this value.
    pub incumbent: Option<String>,
}

impl Correction {
    /// What applies to a contest that has no row in the table.
    pub const EMPTY: Correction = Correction {
        include: Inclusion::Include,
        clean_name: None,
        clean_description: None,
        clean_geography: None,
        incumbent: None,
    };

    /// Checks if the given candidate is listed as an incumbent.
    ///
    /// Returns None when this correction says nothing about incumbents.
    pub fn lists_incumbent(&self, candidate_name: &str) -> Option<bool> {
        self.incumbent
            .as_deref()
            .map(|incumbents| incumbents.contains(candidate_name))
    }
}

/// All the corrections, keyed by the raw contest title.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CorrectionTable {
    corrections: HashMap<String, Correction>,
}

impl CorrectionTable {
    pub fn new() -> CorrectionTable {
        CorrectionTable::default()
    }

    /// Adds a correction for a raw title.
    ///
    /// Returns the correction that was previously registered under the same
    /// title, if any. The last insertion wins.
    pub fn insert(&mut self, raw_title: &str, correction: Correction) -> Option<Correction> {
        self.corrections.insert(raw_title.to_string(), correction)
    }

    /// The correction registered for this exact raw title.
    pub fn lookup(&self, raw_title: &str) -> Option<&Correction> {
        self.corrections.get(raw_title)
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}

impl FromIterator<(String, Correction)> for CorrectionTable {
    fn from_iter<I: IntoIterator<Item = (String, Correction)>>(iter: I) -> Self {
        CorrectionTable {
            corrections: iter.into_iter().collect(),
        }
    }
}

// ******** Output data structures *********

/// One option of a contest, in the canonical schema.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateResult {
    pub name: String,
    pub party: Option<String>,
    pub votes: u64,
    /// Share of the votes of the contest, between 0 and 1, rounded to 4 decimals.
    pub votes_percent: f64,
    pub incumbent: Option<bool>,
}

/// One contest, in the canonical schema.
#[derive(PartialEq, Debug, Clone)]
pub struct Contest {
    pub name: String,
    /// Derived from the raw title, never from the corrected name.
    pub slug: String,
    pub description: Option<String>,
    pub geography: Option<String>,
    pub precincts_reporting: String,
    pub candidates: Vec<CandidateResult>,
}

/// Errors that prevent a contest from being normalized.
#[derive(PartialEq, Debug, Clone)]
pub enum NormalizeError {
    /// A vote count that is not a non-negative integer once cleaned up.
    MalformedVoteCount { value: String },
    /// A normalized record does not satisfy the canonical schema.
    SchemaValidation { reason: String },
}

impl Error for NormalizeError {}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::MalformedVoteCount { value } => {
                write!(f, "Malformed vote count: {:?}", value)
            }
            NormalizeError::SchemaValidation { reason } => {
                write!(f, "Schema validation failed: {}", reason)
            }
        }
    }
}
