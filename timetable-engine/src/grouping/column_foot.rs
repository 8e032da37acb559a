//! Footnote bands under the matrix.
//!
//! For each note code, the columns are split into consecutive spans that
//! share the same text (or lack of it).

use std::collections::{BTreeMap, BTreeSet};

use super::JourneyColumn;

/// One band of columns sharing a note's text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ColumnFoot {
    /// `None` for columns without the note.
    pub note: Option<String>,
    pub start: usize,
    pub span: usize,
}

/// Footnote bands for every note code used by any column.
pub fn column_feet(columns: &[JourneyColumn]) -> BTreeMap<String, Vec<ColumnFoot>> {
    let keys: BTreeSet<&str> = columns
        .iter()
        .flat_map(|c| c.notes.keys().map(String::as_str))
        .collect();

    keys.into_iter()
        .map(|key| (key.to_string(), bands(columns, key)))
        .collect()
}

fn bands(columns: &[JourneyColumn], key: &str) -> Vec<ColumnFoot> {
    let mut feet: Vec<ColumnFoot> = Vec::new();
    for (i, column) in columns.iter().enumerate() {
        let note = column.notes.get(key);
        match feet.last_mut() {
            Some(foot) if foot.note.as_ref() == note => foot.span += 1,
            _ => feet.push(ColumnFoot {
                note: note.cloned(),
                start: i,
                span: 1,
            }),
        }
    }
    feet
}
