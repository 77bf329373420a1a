//! Spreadsheet Repositories

mod cells;
mod sheets;
mod spreadsheets;

pub(crate) use cells::PgCellsRepository;
pub(crate) use sheets::{PgSheetsRepository, SheetLayout};
pub(crate) use spreadsheets::PgSpreadsheetsRepository;
