//! Row matrix construction.
//!
//! Merges the stop sequences of several journey patterns into one ordered
//! list of rows, so that each pattern's stops appear in order. Rows live in
//! an arena addressed by [`RowId`]; the display order is a separate list of
//! ids, so inserting a row is a splice rather than pointer surgery.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::StopCode;
use crate::model::{JourneyPattern, StopUsage, TimingStatus};

/// Stable index of a row in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(usize);

/// One row of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub stop: StopCode,
    /// 0 for the first row of this stop, 1 for the second, and so on.
    pub occurrence: usize,
    /// Principal if any pattern uses the stop as a principal timing point.
    pub timing_status: TimingStatus,
}

/// Ordered rows for a set of patterns, plus where each pattern's stops landed.
#[derive(Debug, Clone, Default)]
pub struct RowMatrix {
    arena: Vec<MatrixRow>,
    order: Vec<RowId>,
    by_code: HashMap<StopCode, Vec<RowId>>,
    /// Per input pattern, the row of each stop position.
    pattern_rows: Vec<Vec<RowId>>,
    /// Display index of each arena row, kept current as rows are spliced in.
    positions: Vec<usize>,
}

impl RowMatrix {
    /// Merge `patterns` in the given order.
    ///
    /// The result depends on the order: earlier patterns decide which rows
    /// later ones share.
    pub fn build(patterns: &[&JourneyPattern]) -> Self {
        let mut matrix = Self {
            pattern_rows: vec![Vec::new(); patterns.len()],
            ..Self::default()
        };

        // Explicitly numbered patterns first, slotted by sequence number
        let mut by_sequence: BTreeMap<u32, RowId> = BTreeMap::new();
        for (i, pattern) in patterns.iter().enumerate() {
            if !pattern.has_sequence_numbers() {
                continue;
            }
            let mut rows = Vec::with_capacity(pattern.stop_count());
            for usage in pattern.stop_usages() {
                let sequence = usage.sequence_number.unwrap_or_default();
                let row = match by_sequence.get(&sequence) {
                    Some(row) => *row,
                    None => {
                        let row = matrix.new_row(&usage.stop);
                        by_sequence.insert(sequence, row);
                        row
                    }
                };
                matrix.mark_status(row, usage);
                rows.push(row);
            }
            matrix.pattern_rows[i] = rows;
        }
        matrix.order = by_sequence.into_values().collect();
        matrix.reindex_from(0);

        for (i, pattern) in patterns.iter().enumerate() {
            if !pattern.has_sequence_numbers() {
                matrix.pattern_rows[i] = matrix.merge_by_code(pattern);
            }
        }
        matrix
    }

    fn new_row(&mut self, stop: &StopCode) -> RowId {
        let id = RowId(self.arena.len());
        let rows = self.by_code.entry(stop.clone()).or_default();
        self.arena.push(MatrixRow {
            stop: stop.clone(),
            occurrence: rows.len(),
            timing_status: TimingStatus::Other,
        });
        rows.push(id);
        self.positions.push(usize::MAX);
        id
    }

    fn mark_status(&mut self, row: RowId, usage: &StopUsage) {
        if !usage.is_minor() {
            self.arena[row.0].timing_status = TimingStatus::Principal;
        }
    }

    /// Insert `row` at display index `pos`, shifting later rows down.
    fn splice(&mut self, pos: usize, row: RowId) {
        self.order.insert(pos, row);
        self.reindex_from(pos);
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, row) in self.order.iter().enumerate().skip(start) {
            self.positions[row.0] = index;
        }
    }

    /// Merge a pattern without sequence numbers, matching rows by stop code.
    ///
    /// Each stop reuses the earliest row for its code lying after the
    /// previous stop's row, unless this pattern already used it. Otherwise a
    /// new row is spliced in straight after the previous stop's row. Loops
    /// therefore get a second row instead of being folded back.
    fn merge_by_code(&mut self, pattern: &JourneyPattern) -> Vec<RowId> {
        let mut rows = Vec::with_capacity(pattern.stop_count());
        let mut used: HashSet<RowId> = HashSet::new();
        let mut cursor: Option<usize> = None;

        for usage in pattern.stop_usages() {
            let existing = self.by_code.get(&usage.stop).and_then(|candidates| {
                candidates
                    .iter()
                    .filter(|row| !used.contains(*row))
                    .map(|row| (*row, self.positions[row.0]))
                    .filter(|(_, pos)| cursor.is_none_or(|c| *pos > c))
                    .min_by_key(|(_, pos)| *pos)
            });

            let (row, pos) = match existing {
                Some(found) => found,
                None => {
                    let row = self.new_row(&usage.stop);
                    let pos = cursor.map_or(0, |c| c + 1);
                    self.splice(pos, row);
                    (row, pos)
                }
            };

            self.mark_status(row, usage);
            used.insert(row);
            cursor = Some(pos);
            rows.push(row);
        }

        rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &MatrixRow> {
        self.order.iter().map(|row| &self.arena[row.0])
    }

    /// Display index of stop `position` of the `pattern`-th input pattern.
    pub fn row_index(&self, pattern: usize, position: usize) -> Option<usize> {
        let row = self.pattern_rows.get(pattern)?.get(position)?;
        self.positions.get(row.0).copied()
    }

    /// Display indices of every stop of the `pattern`-th input pattern.
    pub fn pattern_indices(&self, pattern: usize) -> Vec<usize> {
        self.pattern_rows
            .get(pattern)
            .map(|rows| rows.iter().map(|row| self.positions[row.0]).collect())
            .unwrap_or_default()
    }
}
