//! Row bookkeeping: how many rows exist and which of them are blank.

use crate::config::FormSetConfig;

/// Field values of one pre-existing row, in the order they were supplied.
pub type RowData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedRow<'a> {
    pub index: usize,
    pub data: Option<&'a RowData>,
}

impl RenderedRow<'_> {
    pub fn is_blank(&self) -> bool {
        self.data.is_none()
    }
}

/// Extra count at mount; negative when more rows were supplied than `TOTAL_FORMS`.
pub fn initial_extra(config: &FormSetConfig, rows: &[RowData]) -> i64 {
    i64::from(config.total_forms) - row_count(rows)
}

/// Supplied rows in order, then one blank row per unit of a positive `extra`.
pub fn rendered_rows(rows: &[RowData], extra: i64) -> Vec<RenderedRow<'_>> {
    let blank = usize::try_from(extra).unwrap_or(0);
    rows.iter()
        .enumerate()
        .map(|(index, data)| RenderedRow {
            index,
            data: Some(data),
        })
        .chain((0..blank).map(|offset| RenderedRow {
            index: rows.len() + offset,
            data: None,
        }))
        .collect()
}

/// Value of the `TOTAL_FORMS` field; the raw sum, even when `extra` is negative.
pub fn total_forms(rows: &[RowData], extra: i64) -> i64 {
    row_count(rows) + extra
}

fn row_count(rows: &[RowData]) -> i64 {
    i64::try_from(rows.len()).unwrap_or(i64::MAX)
}
