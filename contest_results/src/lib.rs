mod config;
pub mod manual;

use deunicode::deunicode;
use log::{debug, info};

pub use crate::config::*;

/// Parses a vote count as published by the election authority.
///
/// Surrounding whitespace and thousands separators are ignored:
/// `"12,345"` is 12345 and `" 42 "` is 42.
pub fn parse_vote_count(value: &str) -> Result<u64, NormalizeError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<u64>()
        .map_err(|_| NormalizeError::MalformedVoteCount {
            value: value.to_string(),
        })
}

/// Builds a URL-safe identifier out of a contest title.
///
/// The title is transliterated to ASCII and lowercased. Apostrophes separate
/// words, commas inside numbers are dropped (`"1,000"` is `"1000"`) and every
/// other run of characters outside of `[a-z0-9]` becomes a single dash.
pub fn slugify(text: &str) -> String {
    let chars: Vec<char> = deunicode(text).to_lowercase().chars().collect();
    let is_digit_at = |idx: Option<usize>| {
        idx.and_then(|i| chars.get(i))
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    };
    let mut out = String::new();
    let mut pending_dash = false;
    for (idx, c) in chars.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(*c);
            pending_dash = false;
        } else if *c == ',' && is_digit_at(idx.checked_sub(1)) && is_digit_at(Some(idx + 1)) {
            continue;
        } else {
            pending_dash = true;
        }
    }
    out
}

fn round_share(share: f64) -> f64 {
    (share * 10_000.0).round_ties_even() / 10_000.0
}

/// Computes the share of the total for each of the vote counts.
///
/// The shares are rounded to 4 decimals, ties to the even digit. If nobody got any vote, all the
/// shares are zero.
pub fn vote_shares(votes: &[u64]) -> Result<Vec<f64>, NormalizeError> {
    let mut total: u64 = 0;
    for v in votes.iter() {
        total = total
            .checked_add(*v)
            .ok_or_else(|| NormalizeError::SchemaValidation {
                reason: format!("vote total overflows after adding {}", v),
            })?;
    }
    if total == 0 {
        return Ok(vec![0.0; votes.len()]);
    }
    Ok(votes
        .iter()
        .map(|v| round_share(*v as f64 / total as f64))
        .collect())
}

/// Maps one raw candidate to the canonical schema.
///
/// The share of the votes is computed at the level of the contest and
/// passed in.
pub fn normalize_candidate(
    raw: &RawCandidate,
    votes_percent: f64,
) -> Result<CandidateResult, NormalizeError> {
    let res = CandidateResult {
        name: raw.name.clone(),
        party: raw.party.clone(),
        votes: parse_vote_count(&raw.votes)?,
        votes_percent,
        incumbent: raw.incumbent,
    };
    validate_candidate(&res)?;
    Ok(res)
}

/// Checks if a contest is kept in the output.
///
/// A contest without correction is always kept.
pub fn is_included(raw: &RawContest, corrections: &CorrectionTable) -> bool {
    corrections
        .lookup(&raw.title)
        .map(|c| c.include.keeps_contest())
        .unwrap_or(true)
}

/// Maps one raw contest to the canonical schema.
///
/// Returns None if the corrections exclude this contest.
pub fn normalize_contest(
    raw: &RawContest,
    corrections: &CorrectionTable,
) -> Result<Option<Contest>, NormalizeError> {
    if !is_included(raw, corrections) {
        debug!("normalize_contest: excluding {:?}", raw.title);
        return Ok(None);
    }
    let no_correction = Correction::EMPTY;
    let correction = corrections.lookup(&raw.title).unwrap_or(&no_correction);

    let name = match correction.clean_name.as_deref() {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => raw.title.clone(),
    };

    // Mark the incumbents listed in the corrections.
    let marked: Vec<RawCandidate> = raw
        .candidates
        .iter()
        .map(|c| {
            let mut c2 = c.clone();
            if let Some(true) = correction.lists_incumbent(&c.name) {
                c2.incumbent = Some(true);
            }
            c2
        })
        .collect();

    let votes: Vec<u64> = marked
        .iter()
        .map(|c| parse_vote_count(&c.votes))
        .collect::<Result<Vec<u64>, NormalizeError>>()?;
    let shares = vote_shares(&votes)?;

    let mut candidates: Vec<CandidateResult> = Vec::new();
    for (c, share) in marked.iter().zip(shares) {
        candidates.push(normalize_candidate(c, share)?);
    }

    let contest = Contest {
        name,
        slug: slugify(&raw.title),
        description: non_empty(&correction.clean_description),
        geography: non_empty(&correction.clean_geography),
        precincts_reporting: raw.reporting.clone(),
        candidates,
    };
    validate_contest(&contest)?;
    debug!("normalize_contest: {:?} -> {:?}", raw.title, contest.slug);
    Ok(Some(contest))
}

/// Normalizes all the contests, in order, and drops the excluded ones.
pub fn normalize_contests(
    raws: &[RawContest],
    corrections: &CorrectionTable,
) -> Result<Vec<Contest>, NormalizeError> {
    info!(
        "Normalizing {:?} contests with {:?} corrections",
        raws.len(),
        corrections.len()
    );
    let mut res: Vec<Contest> = Vec::new();
    for raw in raws.iter() {
        if let Some(contest) = normalize_contest(raw, corrections)? {
            res.push(contest);
        }
    }
    info!(
        "Normalized {:?} contests, excluded {:?}",
        res.len(),
        raws.len() - res.len()
    );
    Ok(res)
}

fn non_empty(x: &Option<String>) -> Option<String> {
    match x {
        Some(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

// ******** Canonical schema *********

fn schema_error<T>(reason: String) -> Result<T, NormalizeError> {
    Err(NormalizeError::SchemaValidation { reason })
}

/// Checks that a candidate satisfies the canonical schema.
pub fn validate_candidate(c: &CandidateResult) -> Result<(), NormalizeError> {
    if c.name.is_empty() {
        return schema_error("candidate name is empty".to_string());
    }
    if !c.votes_percent.is_finite() || c.votes_percent < 0.0 || c.votes_percent > 1.0 {
        return schema_error(format!(
            "candidate {:?}: votes_percent {} is not within [0, 1]",
            c.name, c.votes_percent
        ));
    }
    Ok(())
}

/// Checks that a contest and all its candidates satisfy the canonical schema.
pub fn validate_contest(c: &Contest) -> Result<(), NormalizeError> {
    if c.name.is_empty() {
        return schema_error("contest name is empty".to_string());
    }
    if c.slug.is_empty() {
        return schema_error(format!("contest {:?}: slug is empty", c.name));
    }
    if !c
        .slug
        .chars()
        .all(|x| x.is_ascii_lowercase() || x.is_ascii_digit() || x == '-')
    {
        return schema_error(format!(
            "contest {:?}: slug {:?} is not URL-safe",
            c.name, c.slug
        ));
    }
    for cand in c.candidates.iter() {
        validate_candidate(cand)?;
    }
    Ok(())
}
