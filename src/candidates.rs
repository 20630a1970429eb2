//! Candidate transaction IDs
//!
//! A built-in list of IBM-supplied CICS transactions, optionally extended
//! from a file. CICS transaction IDs are at most four characters, so longer
//! entries are dropped before they reach a session.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Longest transaction ID CICS accepts
pub const MAX_ID_LEN: usize = 4;

/// Lines starting with this are skipped in ID lists
pub const COMMENT_MARKER: char = '#';

/// CICS-supplied transactions
pub const DEFAULT_TRANSACTION_IDS: &[&str] = &[
    "CADP", "CALL", "CATA", "CATD", "CATR", "CBAM", "CCIN", "CDBC", "CDBD", "CDBF", "CDBI",
    "CDBN", "CDBO", "CDBT", "CDST", "CDTS", "CEBR", "CEBT", "CECI", "CECS", "CEDA", "CEDB",
    "CEDC", "CEDF", "CEDX", "CEGN", "CEHP", "CEHS", "CEKL", "CEMN", "CEMT", "CEOT", "CEPD",
    "CEPF", "CEPH", "CEPM", "CEPQ", "CEPS", "CEPT", "CESC", "CESD", "CESF", "CESL", "CESN",
    "CEST", "CETR", "CEX2", "CFCL", "CFOR", "CFQR", "CFQS", "CFTL", "CFTS", "CGRP", "CIDP",
    "CIEP", "CIND", "CIOD", "CIOF", "CIOR", "CIRR", "CISB", "CISC", "CISD", "CISE", "CISM",
    "CISP", "CISQ", "CISR", "CISS", "CIST", "CISU", "CISX", "CITS", "CJGC", "CJPI", "CJSR",
    "CKAM", "CKBM", "CKBR", "CKCN", "CKDL", "CKDP", "CKQC", "CKRS", "CKRT", "CKSD", "CKSQ",
    "CKTI", "CLDM", "CLQ2", "CLR1", "CLR2", "CLS1", "CLS2", "CMAC", "CMPX", "CMSG", "CMTS",
    "COHT", "COIE", "COIR", "COVR", "CPCT", "CPIA", "CPIH", "CPIL", "CPIQ", "CPIR", "CPIS",
    "CPLT", "CPMI", "CPSS", "CQPI", "CQPO", "CQRY", "CRDI", "CREA", "CRED", "CRMD", "CRMF",
    "CRPA", "CRPC", "CRPM", "CRSQ", "CRSR", "CRSY", "CRTE", "CRTX", "CSAC", "CSCY", "CSFE",
    "CSFR", "CSFU", "CSGM", "CSHA", "CSHQ", "CSHR", "CSKP", "CSLG", "CSMI", "CSM1", "CSM2",
    "CSM3", "CSM5", "CSNC", "CSNE", "CSOL", "CSPG", "CSPK", "CSPP", "CSPQ", "CSPS", "CSQC",
    "CSRK", "CSRS", "CSSC", "CSSF", "CSSY", "CSTE", "CSTP", "CSXM", "CSZI", "CTIN", "CTSD",
    "CW2A", "CWBA", "CWBG", "CWTO", "CWWU", "CWXN", "CWXU", "CXCU", "CXRE", "CXRT", "DSNC",
];

#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("Failed to read ID list {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// IDs from list file contents: trimmed, blank and comment lines skipped
pub fn parse_idlist(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(str::to_string)
        .collect()
}

/// Keep IDs CICS could accept. Order and duplicates are preserved.
pub fn filter_candidates<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    candidates
        .into_iter()
        .filter(|c| !c.is_empty() && c.chars().count() <= MAX_ID_LEN)
        .collect()
}

/// Built-in IDs followed by those in `idlist`, filtered
pub async fn load_candidates(idlist: Option<&Path>) -> Result<Vec<String>, CandidateError> {
    let mut candidates: Vec<String> = DEFAULT_TRANSACTION_IDS
        .iter()
        .map(|id| id.to_string())
        .collect();

    if let Some(path) = idlist {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CandidateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let extra = parse_idlist(&contents);
        debug!("Read {} IDs from {}", extra.len(), path.display());
        candidates.extend(extra);
    }

    let total = candidates.len();
    let candidates = filter_candidates(candidates);
    if candidates.len() < total {
        info!(
            "Dropped {} IDs longer than {} characters",
            total - candidates.len(),
            MAX_ID_LEN
        );
    }
    Ok(candidates)
}
