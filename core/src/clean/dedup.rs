//! Duplicate row removal

use crate::data::{Dataset, ValueKey};
use crate::error::Result;
use std::collections::HashSet;

/// Drop rows equal to an earlier row, keeping the first occurrence.
///
/// With `subset`, only those columns are compared. Returns the number of
/// rows removed.
pub fn drop_duplicates(dataset: &mut Dataset, subset: Option<&[String]>) -> Result<usize> {
    let columns: Vec<usize> = match subset {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| dataset.require_column(name))
            .collect::<Result<_>>()?,
        _ => (0..dataset.width()).collect(),
    };

    let before = dataset.len();
    let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(before);
    dataset.retain_rows(|row| seen.insert(columns.iter().map(|&c| row[c].key()).collect()));

    let removed = before - dataset.len();
    if removed > 0 {
        log::debug!("Removed {} duplicate rows", removed);
    }
    Ok(removed)
}
