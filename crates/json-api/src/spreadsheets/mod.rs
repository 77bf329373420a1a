//! Spreadsheets, their sheets and cells

pub(crate) mod cells;
mod errors;
mod handlers;
mod models;
pub(crate) mod sheets;

pub(crate) use handlers::*;

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use nexus_app::domain::spreadsheets::records::{
        SheetRecord, SheetUuid, SpreadsheetRecord, SpreadsheetUuid,
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TEST_USER_UUID};

    pub(crate) fn make_spreadsheet(uuid: SpreadsheetUuid) -> SpreadsheetRecord {
        SpreadsheetRecord {
            uuid,
            tenant: TEST_TENANT_UUID,
            owner: TEST_USER_UUID,
            title: "Budget".to_string(),
            folder: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    pub(crate) fn make_sheet(spreadsheet: SpreadsheetUuid, uuid: SheetUuid) -> SheetRecord {
        SheetRecord {
            uuid,
            spreadsheet,
            name: "Sheet1".to_string(),
            position: 0,
            row_count: 10,
            column_count: 10,
            frozen_rows: 0,
            frozen_columns: 0,
            hidden_rows: Vec::new(),
            hidden_columns: Vec::new(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
