//! Batch grouping derived from upload filenames.
//!
//! Every candidate file belongs to a child location under a parent location.
//! The pair can be supplied explicitly alongside the upload; when it is not,
//! it is derived from the filename stem, `Child_Parent[...].ext`. All files of
//! one batch must agree on the parent.

use serde::{Deserialize, Serialize};

use crate::error::{FieldcovError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKey {
    pub child: String,
    pub parent: String,
}

impl GroupKey {
    pub fn new(child: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            parent: parent.into(),
        }
    }

    /// Derive the group from a filename, `Child_Parent.ext`.
    ///
    /// The extension is stripped first; tokens beyond the second are ignored.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let stem = match filename.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => filename,
        };
        let mut tokens = stem.split('_').filter(|t| !t.is_empty());
        match (tokens.next(), tokens.next()) {
            (Some(child), Some(parent)) => Ok(Self::new(child, parent)),
            _ => Err(FieldcovError::InvalidFilename {
                filename: filename.to_string(),
            }),
        }
    }
}

/// Check that every group of a batch resolves to the same parent.
///
/// Returns the shared group (the first file's child stands for the batch) or
/// an error enumerating the distinct parent tokens.
pub fn validate_batch(groups: &[GroupKey]) -> Result<GroupKey> {
    let first = groups.first().ok_or(FieldcovError::EmptyBatch)?;

    let mut parents: Vec<String> = groups.iter().map(|g| g.parent.clone()).collect();
    parents.sort();
    parents.dedup();
    if parents.len() > 1 {
        return Err(FieldcovError::GroupMismatch { parents });
    }
    Ok(first.clone())
}
