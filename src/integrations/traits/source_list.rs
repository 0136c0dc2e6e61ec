use async_trait::async_trait;

use crate::utils::error::{AppError, Result};

/// Trait for tabular identifier sources whose first row is a header.
#[async_trait]
pub trait SourceList: Send + Sync {
    fn name(&self) -> &str;

    /// Every row of the backing range, header included.
    async fn read_table(&self) -> Result<Vec<Vec<String>>>;

    /// Overwrites the data rows below the header; returns the number of cells written.
    async fn write_rows(&self, rows: &[Vec<String>]) -> Result<usize>;

    /// Overwrites the header row itself; returns the number of cells written.
    async fn write_header(&self, header: &[String]) -> Result<usize>;

    async fn read_column(&self, column: &str) -> Result<Vec<String>> {
        let table = self.read_table().await?;
        let rows = select_columns(&table, &[column])?;
        Ok(rows.into_iter().flatten().collect())
    }

    async fn read_columns(&self, columns: &[&str]) -> Result<Vec<Vec<String>>> {
        let table = self.read_table().await?;
        select_columns(&table, columns)
    }

    /// Replaces `column` in every data row with `values`, padding rows as needed.
    async fn update_column(&self, column: &str, values: &[String]) -> Result<usize> {
        let table = self.read_table().await?;
        let rows = replace_column(&table, column, values)?;
        self.write_rows(&rows).await
    }
}

fn column_index(header: &[String], column: &str) -> Result<usize> {
    header
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| AppError::ColumnNotFound {
            column: column.to_string(),
        })
}

/// Values of `columns` for each data row. Missing trailing cells read as empty.
pub fn select_columns(table: &[Vec<String>], columns: &[&str]) -> Result<Vec<Vec<String>>> {
    let (header, rows) = match table.split_first() {
        Some((header, rows)) => (header.as_slice(), rows),
        None => (&[][..], &[][..]),
    };

    let indexes = columns
        .iter()
        .map(|column| column_index(header, column))
        .collect::<Result<Vec<_>>>()?;

    Ok(rows
        .iter()
        .map(|row| {
            indexes
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect())
}

/// Data rows of `table` with `column` overwritten by `values`.
pub fn replace_column(table: &[Vec<String>], column: &str, values: &[String]) -> Result<Vec<Vec<String>>> {
    let Some((header, rows)) = table.split_first() else {
        return Err(AppError::ColumnNotFound {
            column: column.to_string(),
        });
    };
    let index = column_index(header, column)?;

    let count = rows.len().max(values.len());
    let updated = (0..count)
        .map(|i| {
            let mut row = rows.get(i).cloned().unwrap_or_default();
            if row.len() <= index {
                row.resize(index + 1, String::new());
            }
            row[index] = values.get(i).cloned().unwrap_or_default();
            row
        })
        .collect();

    Ok(updated)
}
