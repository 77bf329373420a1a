//! Spreadsheets service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::info;

use crate::{
    auth::Claims,
    database::{Db, retry_transient},
    domain::{
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        spreadsheets::{
            batch,
            data::{
                CellRange, CellUpdate, DEFAULT_SHEET_NAME, MAX_COLUMNS, MAX_ROWS, NewSheet,
                NewSpreadsheet, SheetUpdate, SpreadsheetFilter, SpreadsheetUpdate,
            },
            errors::SpreadsheetsServiceError,
            records::{
                BatchOutcome, CellRecord, SheetRecord, SheetUuid, SpreadsheetDetail,
                SpreadsheetRecord, SpreadsheetUuid,
            },
            repositories::{
                PgCellsRepository, PgSheetsRepository, PgSpreadsheetsRepository, SheetLayout,
            },
        },
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgSpreadsheetsService {
    db: Db,
    spreadsheets: PgSpreadsheetsRepository,
    sheets: PgSheetsRepository,
    cells: PgCellsRepository,
    audit: PgAuditRepository,
}

impl PgSpreadsheetsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            spreadsheets: PgSpreadsheetsRepository::new(),
            sheets: PgSheetsRepository::new(),
            cells: PgCellsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    /// One attempt at applying a batch in its own transaction.
    async fn apply_cells(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        updates: Vec<CellUpdate>,
        action: AuditAction,
    ) -> Result<BatchOutcome, SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let locked = self
            .sheets
            .lock_sheet(&mut tx, claims.tenant, spreadsheet, sheet)
            .await?;

        batch::validate(&updates, locked.row_count, locked.column_count)?;

        let applied = updates.len();
        let coordinates = batch::coordinates(&updates);

        let existing = self
            .cells
            .find_cells(&mut tx, claims.tenant, sheet, &coordinates)
            .await?;

        let plan = batch::plan(updates, &existing);

        let cleared = plan.deletes;

        self.cells
            .delete_cells(&mut tx, claims.tenant, sheet, &cleared)
            .await?;

        let cells = self
            .cells
            .upsert_cells(&mut tx, claims.tenant, sheet, plan.upserts)
            .await?;

        self.spreadsheets
            .touch_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, action, sheet).with_metadata(json!({
                    "spreadsheet_uuid": spreadsheet.into_uuid(),
                    "applied": applied,
                    "written": cells.len(),
                    "cleared": cleared.len(),
                })),
            )
            .await?;

        tx.commit().await?;

        Ok(BatchOutcome {
            applied,
            cells,
            cleared,
        })
    }
}

fn check_title(title: &str) -> Result<(), SpreadsheetsServiceError> {
    if title.trim().is_empty() {
        Err(SpreadsheetsServiceError::InvalidData)
    } else {
        Ok(())
    }
}

fn check_sheet_name(name: &str) -> Result<(), SpreadsheetsServiceError> {
    if name.trim().is_empty() {
        Err(SpreadsheetsServiceError::InvalidSheet(
            "name must not be empty".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn check_dimensions(row_count: u32, column_count: u32) -> Result<(), SpreadsheetsServiceError> {
    if !(1..=MAX_ROWS).contains(&row_count) {
        return Err(SpreadsheetsServiceError::InvalidSheet(format!(
            "row count must be between 1 and {MAX_ROWS}"
        )));
    }

    if !(1..=MAX_COLUMNS).contains(&column_count) {
        return Err(SpreadsheetsServiceError::InvalidSheet(format!(
            "column count must be between 1 and {MAX_COLUMNS}"
        )));
    }

    Ok(())
}

/// Sorted, distinct hidden indices, each below `limit`.
fn normalize_hidden(
    mut indices: Vec<u32>,
    limit: u32,
    axis: &str,
) -> Result<Vec<u32>, SpreadsheetsServiceError> {
    indices.sort_unstable();
    indices.dedup();

    match indices.last() {
        Some(&last) if last >= limit => Err(SpreadsheetsServiceError::InvalidLayout(format!(
            "hidden {axis} index {last} is outside the sheet"
        ))),
        _ => Ok(indices),
    }
}

#[derive(Debug)]
struct MergedLayout {
    name: String,
    row_count: u32,
    column_count: u32,
    frozen_rows: u32,
    frozen_columns: u32,
    hidden_rows: Vec<u32>,
    hidden_columns: Vec<u32>,
}

impl MergedLayout {
    fn as_layout(&self) -> SheetLayout<'_> {
        SheetLayout {
            name: &self.name,
            row_count: self.row_count,
            column_count: self.column_count,
            frozen_rows: self.frozen_rows,
            frozen_columns: self.frozen_columns,
            hidden_rows: &self.hidden_rows,
            hidden_columns: &self.hidden_columns,
        }
    }
}

/// Merge `update` into `current`, enforcing the layout invariants.
///
/// Explicit hidden sets must fit the new grid; stored hidden indices beyond a
/// shrunken dimension are dropped.
fn merge_layout(
    current: &SheetRecord,
    update: SheetUpdate,
) -> Result<MergedLayout, SpreadsheetsServiceError> {
    let name = update.name.unwrap_or_else(|| current.name.clone());
    let row_count = update.row_count.unwrap_or(current.row_count);
    let column_count = update.column_count.unwrap_or(current.column_count);
    let frozen_rows = update.frozen_rows.unwrap_or(current.frozen_rows);
    let frozen_columns = update.frozen_columns.unwrap_or(current.frozen_columns);

    check_sheet_name(&name)?;
    check_dimensions(row_count, column_count)?;

    if frozen_rows > row_count {
        return Err(SpreadsheetsServiceError::InvalidLayout(format!(
            "{frozen_rows} frozen rows exceed the row count of {row_count}"
        )));
    }

    if frozen_columns > column_count {
        return Err(SpreadsheetsServiceError::InvalidLayout(format!(
            "{frozen_columns} frozen columns exceed the column count of {column_count}"
        )));
    }

    let hidden_rows = match update.hidden_rows {
        Some(rows) => normalize_hidden(rows, row_count, "row")?,
        None => current
            .hidden_rows
            .iter()
            .copied()
            .filter(|&row| row < row_count)
            .collect(),
    };

    let hidden_columns = match update.hidden_columns {
        Some(columns) => normalize_hidden(columns, column_count, "column")?,
        None => current
            .hidden_columns
            .iter()
            .copied()
            .filter(|&column| column < column_count)
            .collect(),
    };

    Ok(MergedLayout {
        name,
        row_count,
        column_count,
        frozen_rows,
        frozen_columns,
        hidden_rows,
        hidden_columns,
    })
}

#[async_trait]
impl SpreadsheetsService for PgSpreadsheetsService {
    #[tracing::instrument(
        name = "spreadsheets.service.create_spreadsheet",
        skip(self, claims, spreadsheet),
        fields(tenant_uuid = %claims.tenant),
        err
    )]
    async fn create_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: NewSpreadsheet,
    ) -> Result<SpreadsheetDetail, SpreadsheetsServiceError> {
        check_title(&spreadsheet.title)?;

        let sheets = if spreadsheet.sheets.is_empty() {
            vec![NewSheet::named(DEFAULT_SHEET_NAME)]
        } else {
            spreadsheet.sheets
        };

        for sheet in &sheets {
            check_sheet_name(&sheet.name)?;

            let (row_count, column_count) = sheet.dimensions();

            check_dimensions(row_count, column_count)?;
        }

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let created = self
            .spreadsheets
            .create_spreadsheet(
                &mut tx,
                claims.tenant,
                claims.subject,
                &spreadsheet.title,
                spreadsheet.folder,
            )
            .await?;

        let mut records = Vec::with_capacity(sheets.len());

        for sheet in &sheets {
            let (row_count, column_count) = sheet.dimensions();

            records.push(
                self.sheets
                    .create_sheet(
                        &mut tx,
                        claims.tenant,
                        created.uuid,
                        &sheet.name,
                        row_count,
                        column_count,
                    )
                    .await?,
            );
        }

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SpreadsheetCreate, created.uuid)
                    .with_metadata(json!({
                        "title": created.title,
                        "sheets": records.len(),
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(spreadsheet_uuid = %created.uuid, "created spreadsheet");

        Ok(SpreadsheetDetail {
            spreadsheet: created,
            sheets: records,
        })
    }

    async fn get_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<SpreadsheetDetail, SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let record = self
            .spreadsheets
            .get_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        let sheets = self
            .sheets
            .list_sheets(&mut tx, claims.tenant, spreadsheet)
            .await?;

        tx.commit().await?;

        Ok(SpreadsheetDetail {
            spreadsheet: record,
            sheets,
        })
    }

    async fn list_spreadsheets(
        &self,
        claims: &Claims,
        filter: SpreadsheetFilter,
        page: PageRequest,
    ) -> Result<Page<SpreadsheetRecord>, SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (spreadsheets, total) = self
            .spreadsheets
            .list_spreadsheets(&mut tx, claims.tenant, &filter, &page)
            .await?;

        tx.commit().await?;

        Ok(Page::new(spreadsheets, &page, total))
    }

    #[tracing::instrument(
        name = "spreadsheets.service.update_spreadsheet",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, spreadsheet_uuid = %spreadsheet),
        err
    )]
    async fn update_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        update: SpreadsheetUpdate,
    ) -> Result<SpreadsheetRecord, SpreadsheetsServiceError> {
        if let Some(title) = &update.title {
            check_title(title)?;
        }

        let fields = update.changed_fields();

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let updated = self
            .spreadsheets
            .update_spreadsheet(&mut tx, claims.tenant, spreadsheet, update)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SpreadsheetUpdate, spreadsheet)
                    .with_metadata(json!({ "fields": fields })),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "spreadsheets.service.delete_spreadsheet",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, spreadsheet_uuid = %spreadsheet),
        err
    )]
    async fn delete_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<(), SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .spreadsheets
            .lock_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        let rows_affected = self
            .spreadsheets
            .delete_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        if rows_affected == 0 {
            return Err(SpreadsheetsServiceError::NotFound);
        }

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SpreadsheetDelete, spreadsheet)
                    .with_metadata(json!({ "title": current.title })),
            )
            .await?;

        tx.commit().await?;

        info!(spreadsheet_uuid = %spreadsheet, "deleted spreadsheet");

        Ok(())
    }

    #[tracing::instrument(
        name = "spreadsheets.service.create_sheet",
        skip(self, claims, sheet),
        fields(tenant_uuid = %claims.tenant, spreadsheet_uuid = %spreadsheet),
        err
    )]
    async fn create_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: NewSheet,
    ) -> Result<SheetRecord, SpreadsheetsServiceError> {
        check_sheet_name(&sheet.name)?;

        let (row_count, column_count) = sheet.dimensions();

        check_dimensions(row_count, column_count)?;

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        self.spreadsheets
            .lock_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        let created = self
            .sheets
            .create_sheet(
                &mut tx,
                claims.tenant,
                spreadsheet,
                &sheet.name,
                row_count,
                column_count,
            )
            .await?;

        self.spreadsheets
            .touch_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SheetCreate, created.uuid).with_metadata(
                    json!({
                        "spreadsheet_uuid": spreadsheet.into_uuid(),
                        "name": created.name,
                        "position": created.position,
                    }),
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<SheetRecord, SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let record = self
            .sheets
            .get_sheet(&mut tx, claims.tenant, spreadsheet, sheet)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "spreadsheets.service.update_sheet",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, sheet_uuid = %sheet),
        err
    )]
    async fn update_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        update: SheetUpdate,
    ) -> Result<SheetRecord, SpreadsheetsServiceError> {
        let fields = update.changed_fields();

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .sheets
            .lock_sheet(&mut tx, claims.tenant, spreadsheet, sheet)
            .await?;

        let layout = merge_layout(&current, update)?;

        let removed_cells = if layout.row_count < current.row_count
            || layout.column_count < current.column_count
        {
            self.cells
                .delete_cells_outside(
                    &mut tx,
                    claims.tenant,
                    sheet,
                    layout.row_count,
                    layout.column_count,
                )
                .await?
        } else {
            0
        };

        let updated = self
            .sheets
            .update_sheet(&mut tx, claims.tenant, sheet, layout.as_layout())
            .await?;

        self.spreadsheets
            .touch_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SheetUpdate, sheet).with_metadata(json!({
                    "spreadsheet_uuid": spreadsheet.into_uuid(),
                    "fields": fields,
                    "removed_cells": removed_cells,
                })),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "spreadsheets.service.delete_sheet",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, sheet_uuid = %sheet),
        err
    )]
    async fn delete_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<(), SpreadsheetsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        self.spreadsheets
            .lock_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        let current = self
            .sheets
            .lock_sheet(&mut tx, claims.tenant, spreadsheet, sheet)
            .await?;

        let remaining = self
            .sheets
            .count_sheets(&mut tx, claims.tenant, spreadsheet)
            .await?;

        if remaining <= 1 {
            return Err(SpreadsheetsServiceError::LastSheet);
        }

        self.sheets
            .delete_sheet(&mut tx, claims.tenant, &current)
            .await?;

        self.spreadsheets
            .touch_spreadsheet(&mut tx, claims.tenant, spreadsheet)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SheetDelete, sheet).with_metadata(json!({
                    "spreadsheet_uuid": spreadsheet.into_uuid(),
                    "name": current.name,
                })),
            )
            .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "spreadsheets.service.update_cell",
        skip(self, claims, update),
        fields(
            tenant_uuid = %claims.tenant,
            sheet_uuid = %sheet,
            row = update.row,
            col = update.col
        ),
        err
    )]
    async fn update_cell(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        update: CellUpdate,
    ) -> Result<Option<CellRecord>, SpreadsheetsServiceError> {
        let outcome = retry_transient(|| {
            self.apply_cells(
                claims,
                spreadsheet,
                sheet,
                vec![update.clone()],
                AuditAction::CellsUpdate,
            )
        })
        .await?;

        Ok(outcome.cells.into_iter().next())
    }

    #[tracing::instrument(
        name = "spreadsheets.service.batch_update_cells",
        skip(self, claims, updates),
        fields(tenant_uuid = %claims.tenant, sheet_uuid = %sheet, entries = updates.len()),
        err
    )]
    async fn batch_update_cells(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        updates: Vec<CellUpdate>,
    ) -> Result<BatchOutcome, SpreadsheetsServiceError> {
        let outcome = retry_transient(|| {
            self.apply_cells(
                claims,
                spreadsheet,
                sheet,
                updates.clone(),
                AuditAction::CellsBatchUpdate,
            )
        })
        .await?;

        info!(
            sheet_uuid = %sheet,
            applied = outcome.applied,
            written = outcome.cells.len(),
            cleared = outcome.cleared.len(),
            "applied cell batch"
        );

        Ok(outcome)
    }

    async fn get_cells(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        range: CellRange,
    ) -> Result<Vec<CellRecord>, SpreadsheetsServiceError> {
        if !range.is_ordered() {
            return Err(SpreadsheetsServiceError::InvalidRange);
        }

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let record = self
            .sheets
            .get_sheet(&mut tx, claims.tenant, spreadsheet, sheet)
            .await?;

        let Some(range) = range.within(record.row_count, record.column_count) else {
            tx.commit().await?;

            return Ok(Vec::new());
        };

        let cells = self
            .cells
            .get_cells(&mut tx, claims.tenant, sheet, range)
            .await?;

        tx.commit().await?;

        Ok(cells)
    }
}

#[automock]
#[async_trait]
pub trait SpreadsheetsService: Send + Sync {
    /// Creates a spreadsheet with its initial sheets, or a single default one.
    async fn create_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: NewSpreadsheet,
    ) -> Result<SpreadsheetDetail, SpreadsheetsServiceError>;

    async fn get_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<SpreadsheetDetail, SpreadsheetsServiceError>;

    async fn list_spreadsheets(
        &self,
        claims: &Claims,
        filter: SpreadsheetFilter,
        page: PageRequest,
    ) -> Result<Page<SpreadsheetRecord>, SpreadsheetsServiceError>;

    async fn update_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        update: SpreadsheetUpdate,
    ) -> Result<SpreadsheetRecord, SpreadsheetsServiceError>;

    /// Soft-deletes; its sheets and cells become unreachable.
    async fn delete_spreadsheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<(), SpreadsheetsServiceError>;

    /// Appends a sheet after the last one.
    async fn create_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: NewSheet,
    ) -> Result<SheetRecord, SpreadsheetsServiceError>;

    async fn get_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<SheetRecord, SpreadsheetsServiceError>;

    /// Changes name, dimensions, frozen counts or hidden sets. Shrinking the
    /// grid removes the cells that no longer fit.
    async fn update_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        update: SheetUpdate,
    ) -> Result<SheetRecord, SpreadsheetsServiceError>;

    async fn delete_sheet(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<(), SpreadsheetsServiceError>;

    /// Single-entry batch; `None` when the cell ends up empty.
    async fn update_cell(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        update: CellUpdate,
    ) -> Result<Option<CellRecord>, SpreadsheetsServiceError>;

    /// Applies every entry or none; later entries at a coordinate win.
    async fn batch_update_cells(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        updates: Vec<CellUpdate>,
    ) -> Result<BatchOutcome, SpreadsheetsServiceError>;

    /// Stored cells in the closed `range`, row-major.
    async fn get_cells(
        &self,
        claims: &Claims,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
        range: CellRange,
    ) -> Result<Vec<CellRecord>, SpreadsheetsServiceError>;
}
