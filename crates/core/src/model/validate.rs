//! Entity validation helpers.
//!
//! Checks run before any write so a rejected operation never leaves
//! partial state behind.

use super::Document;
use crate::Error;

/// Maximum item title length, in characters.
pub const TITLE_MAX_CHARS: usize = 35;

/// Maximum tag name length after trimming, in characters.
pub const TAG_NAME_MAX_CHARS: usize = 18;

/// Comparison key for tag names: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trim a tag name and check it is non-empty and within bounds.
pub fn tag_name(name: &str) -> Result<String, Error> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyName);
    }
    if trimmed.chars().count() > TAG_NAME_MAX_CHARS {
        return Err(Error::InvalidInput(format!("tag name must not exceed {TAG_NAME_MAX_CHARS} characters")));
    }
    Ok(trimmed.to_string())
}

pub fn title(title: Option<&str>) -> Result<(), Error> {
    match title {
        Some(t) if t.chars().count() > TITLE_MAX_CHARS => {
            Err(Error::InvalidInput(format!("title must not exceed {TITLE_MAX_CHARS} characters")))
        }
        _ => Ok(()),
    }
}

/// Every referenced tag id must exist in `doc`.
pub fn tag_refs(doc: &Document, tag_ids: &[String]) -> Result<(), Error> {
    match tag_ids.iter().find(|id| doc.tag(id).is_none()) {
        Some(missing) => Err(Error::NotFound { entity: "tag", id: missing.clone() }),
        None => Ok(()),
    }
}

/// Drop repeated ids, keeping first occurrences.
pub fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
