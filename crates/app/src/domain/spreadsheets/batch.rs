//! Cell batch planning.
//!
//! A batch is validated against the sheet's dimensions as a whole, then folded
//! entry by entry over the stored cells it touches. Later entries at the same
//! coordinate supersede earlier ones. The resulting plan is the set of rows to
//! write and the set of coordinates to remove, both in row-major order.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::domain::spreadsheets::{
    data::{CellUpdate, Patch},
    errors::SpreadsheetsServiceError,
    values::{CellStyle, CellValue},
};

/// Most entries accepted in one batch.
pub const MAX_BATCH_CELLS: usize = 10_000;

/// Cell coordinate, `(row, col)`.
pub type Coordinate = (u32, u32);

/// A rejected batch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutOfRangeCell {
    /// Position of the entry in the submitted batch.
    pub index: usize,
    pub row: u32,
    pub col: u32,
}

/// Stored contents of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellContents {
    pub value: CellValue,
    pub formula: Option<String>,
    pub formatted_value: Option<String>,
    pub style: Option<CellStyle>,
}

#[derive(Debug, Default, PartialEq)]
pub struct BatchPlan {
    pub upserts: Vec<(Coordinate, CellContents)>,
    pub deletes: Vec<Coordinate>,
}

impl BatchPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Reject batches that are too large or touch cells outside the grid.
///
/// # Errors
///
/// Returns [`SpreadsheetsServiceError::BatchTooLarge`] or
/// [`SpreadsheetsServiceError::OutOfRange`] listing every offending entry.
pub fn validate(
    updates: &[CellUpdate],
    row_count: u32,
    column_count: u32,
) -> Result<(), SpreadsheetsServiceError> {
    if updates.len() > MAX_BATCH_CELLS {
        return Err(SpreadsheetsServiceError::BatchTooLarge {
            len: updates.len(),
            max: MAX_BATCH_CELLS,
        });
    }

    let cells: Vec<OutOfRangeCell> = updates
        .iter()
        .enumerate()
        .filter(|(_, update)| update.row >= row_count || update.col >= column_count)
        .map(|(index, update)| OutOfRangeCell {
            index,
            row: update.row,
            col: update.col,
        })
        .collect();

    if cells.is_empty() {
        Ok(())
    } else {
        Err(SpreadsheetsServiceError::OutOfRange { cells })
    }
}

/// Distinct coordinates touched by `updates`, row-major.
#[must_use]
pub fn coordinates(updates: &[CellUpdate]) -> Vec<Coordinate> {
    let mut coordinates: Vec<Coordinate> = updates.iter().map(|u| (u.row, u.col)).collect();

    coordinates.sort_unstable();
    coordinates.dedup();

    coordinates
}

/// Fold `updates` over the `existing` contents of the touched cells.
#[must_use]
pub fn plan(updates: Vec<CellUpdate>, existing: &FxHashMap<Coordinate, CellContents>) -> BatchPlan {
    let mut states: FxHashMap<Coordinate, Option<CellContents>> = FxHashMap::default();

    for update in updates {
        let coordinate = (update.row, update.col);

        let current = match states.remove(&coordinate) {
            Some(state) => state,
            None => existing.get(&coordinate).cloned(),
        };

        states.insert(coordinate, apply(current, update));
    }

    let mut plan = BatchPlan::default();

    for (coordinate, state) in states {
        match state {
            Some(contents) => plan.upserts.push((coordinate, contents)),
            None if existing.contains_key(&coordinate) => plan.deletes.push(coordinate),
            None => {}
        }
    }

    plan.upserts.sort_unstable_by_key(|(coordinate, _)| *coordinate);
    plan.deletes.sort_unstable();

    plan
}

/// Resulting contents of one cell after `update`, `None` when it is empty.
fn apply(current: Option<CellContents>, update: CellUpdate) -> Option<CellContents> {
    if matches!(update.value, Patch::Clear) && !matches!(update.formula, Patch::Set(_)) {
        return None;
    }

    let (value, formula, formatted_value, style) = match current {
        Some(cell) => (
            Some(cell.value),
            cell.formula,
            cell.formatted_value,
            cell.style,
        ),
        None => (None, None, None, None),
    };

    let value = update.value.apply(value);
    let formula = update.formula.apply(formula);
    let formatted_value = update.formatted_value.apply(formatted_value);
    let style = update.style.apply(style);

    let value = match value {
        Some(value) => value,
        None if formula.is_some() || formatted_value.is_some() || style.is_some() => {
            CellValue::empty()
        }
        None => return None,
    };

    Some(CellContents {
        value,
        formula,
        formatted_value,
        style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::String(value.to_string())
    }

    fn stored(value: CellValue) -> CellContents {
        CellContents {
            value,
            formula: None,
            formatted_value: None,
            style: None,
        }
    }

    #[test]
    fn last_write_to_a_coordinate_wins() {
        let plan = plan(
            vec![
                CellUpdate::value(0, 0, text("a")),
                CellUpdate::value(0, 0, text("b")),
            ],
            &FxHashMap::default(),
        );

        assert_eq!(plan.upserts, vec![((0, 0), stored(text("b")))]);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn style_only_write_keeps_value_and_formula() {
        let mut existing = FxHashMap::default();
        existing.insert(
            (1, 1),
            CellContents {
                formula: Some("=A1*2".to_string()),
                ..stored(CellValue::Number(4.0))
            },
        );

        let style = CellStyle {
            bold: true,
            ..CellStyle::default()
        };

        let plan = plan(
            vec![CellUpdate {
                row: 1,
                col: 1,
                style: Patch::Set(style.clone()),
                ..CellUpdate::default()
            }],
            &existing,
        );

        assert_eq!(
            plan.upserts,
            vec![(
                (1, 1),
                CellContents {
                    value: CellValue::Number(4.0),
                    formula: Some("=A1*2".to_string()),
                    formatted_value: None,
                    style: Some(style),
                }
            )]
        );
    }

    #[test]
    fn style_on_an_empty_cell_gets_an_empty_value() {
        let plan = plan(
            vec![CellUpdate {
                row: 2,
                col: 0,
                style: Patch::Set(CellStyle::default()),
                ..CellUpdate::default()
            }],
            &FxHashMap::default(),
        );

        let [(_, contents)] = plan.upserts.as_slice() else {
            panic!("expected one upsert, got {:?}", plan.upserts);
        };

        assert_eq!(contents.value, CellValue::empty());
    }

    #[test]
    fn null_value_deletes_a_stored_cell() {
        let mut existing = FxHashMap::default();
        existing.insert((0, 3), stored(CellValue::Boolean(true)));

        let plan = plan(vec![CellUpdate::clear(0, 3)], &existing);

        assert!(plan.upserts.is_empty());
        assert_eq!(plan.deletes, vec![(0, 3)]);
    }

    #[test]
    fn write_then_clear_in_one_batch_touches_nothing_new() {
        let plan = plan(
            vec![CellUpdate::value(5, 5, text("x")), CellUpdate::clear(5, 5)],
            &FxHashMap::default(),
        );

        assert!(plan.is_empty());
    }

    #[test]
    fn null_value_with_formula_keeps_the_cell() {
        let plan = plan(
            vec![CellUpdate {
                row: 0,
                col: 0,
                value: Patch::Clear,
                formula: Patch::Set("=SUM(A2:A3)".to_string()),
                ..CellUpdate::default()
            }],
            &FxHashMap::default(),
        );

        assert_eq!(plan.upserts.len(), 1);
    }

    #[test]
    fn plan_is_row_major() {
        let plan = plan(
            vec![
                CellUpdate::value(2, 0, text("c")),
                CellUpdate::value(0, 1, text("b")),
                CellUpdate::value(0, 0, text("a")),
            ],
            &FxHashMap::default(),
        );

        let order: Vec<Coordinate> = plan.upserts.iter().map(|(c, _)| *c).collect();

        assert_eq!(order, vec![(0, 0), (0, 1), (2, 0)]);
    }

    #[test]
    fn validation_accepts_the_last_row_and_column() {
        let updates = vec![CellUpdate::value(9, 9, text("corner"))];

        assert!(validate(&updates, 10, 10).is_ok());
    }

    #[test]
    fn validation_lists_every_offending_entry() {
        let updates = vec![
            CellUpdate::value(0, 0, CellValue::Number(1.0)),
            CellUpdate::value(10, 0, CellValue::Number(2.0)),
            CellUpdate::value(0, 10, CellValue::Number(3.0)),
        ];

        let Err(SpreadsheetsServiceError::OutOfRange { cells }) = validate(&updates, 10, 10) else {
            panic!("expected out of range");
        };

        assert_eq!(
            cells,
            vec![
                OutOfRangeCell { index: 1, row: 10, col: 0 },
                OutOfRangeCell { index: 2, row: 0, col: 10 },
            ]
        );
    }

    #[test]
    fn oversized_batches_are_rejected() {
        let updates = vec![CellUpdate::clear(0, 0); MAX_BATCH_CELLS + 1];

        assert!(matches!(
            validate(&updates, 10, 10),
            Err(SpreadsheetsServiceError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn coordinates_are_distinct() {
        let updates = vec![CellUpdate::clear(1, 0), CellUpdate::clear(0, 0), CellUpdate::clear(1, 0)];

        assert_eq!(coordinates(&updates), vec![(0, 0), (1, 0)]);
    }
}
