//! Spreadsheet Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::spreadsheets::SpreadsheetsServiceError;

pub(crate) fn into_status_error(error: SpreadsheetsServiceError) -> StatusError {
    match error {
        SpreadsheetsServiceError::NotFound => {
            StatusError::not_found().brief("Spreadsheet or sheet not found")
        }
        SpreadsheetsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid spreadsheet payload")
        }
        SpreadsheetsServiceError::InvalidSheet(reason) => {
            StatusError::bad_request().brief("Invalid sheet").detail(reason)
        }
        SpreadsheetsServiceError::InvalidLayout(reason) => StatusError::unprocessable_entity()
            .brief("Sheet layout does not fit its dimensions")
            .detail(reason),
        SpreadsheetsServiceError::OutOfRange { cells } => {
            let entries = cells
                .iter()
                .map(|cell| format!("entry {} at ({}, {})", cell.index, cell.row, cell.col))
                .collect::<Vec<_>>();

            StatusError::unprocessable_entity()
                .brief("Cell coordinates outside the sheet")
                .detail(entries.join("; "))
        }
        SpreadsheetsServiceError::BatchTooLarge { len, max } => StatusError::bad_request()
            .brief("Batch too large")
            .detail(format!("batch of {len} cells exceeds the limit of {max}")),
        SpreadsheetsServiceError::InvalidRange => {
            StatusError::bad_request().brief("Range start must not be after its end")
        }
        SpreadsheetsServiceError::LastSheet => {
            StatusError::conflict().brief("A spreadsheet must keep at least one sheet")
        }
        SpreadsheetsServiceError::Transient(source) | SpreadsheetsServiceError::Sql(source) => {
            error!("spreadsheet storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use nexus_app::domain::spreadsheets::batch::OutOfRangeCell;

    use super::*;

    #[test]
    fn out_of_range_names_every_entry() {
        let error = into_status_error(SpreadsheetsServiceError::OutOfRange {
            cells: vec![
                OutOfRangeCell { index: 2, row: 10, col: 0 },
                OutOfRangeCell { index: 5, row: 0, col: 12 },
            ],
        });

        assert_eq!(error.code.as_u16(), 422);
        assert_eq!(
            error.detail.as_deref(),
            Some("entry 2 at (10, 0); entry 5 at (0, 12)")
        );
    }

    #[test]
    fn last_sheet_is_a_conflict() {
        assert_eq!(
            into_status_error(SpreadsheetsServiceError::LastSheet)
                .code
                .as_u16(),
            409
        );
    }
}
