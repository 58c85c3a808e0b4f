//! Splitting a dataset into fixed-size row batches for the AI assessor.

use crate::error::Result;
use crate::utils::row_to_json;
use polars::prelude::*;

/// A contiguous slice of rows.
#[derive(Debug, Clone)]
pub struct RowBatch {
    /// 1-based batch number.
    pub number: usize,
    /// Index of the first row of this batch in the full dataset.
    pub offset: usize,
    pub frame: DataFrame,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Iterator over batches of at most `batch_size` rows, in row order.
#[derive(Debug)]
pub struct RowBatches<'a> {
    df: &'a DataFrame,
    batch_size: usize,
    next_offset: usize,
    next_number: usize,
}

impl<'a> RowBatches<'a> {
    /// A `batch_size` of 0 is treated as 1.
    pub fn new(df: &'a DataFrame, batch_size: usize) -> Self {
        Self {
            df,
            batch_size: batch_size.max(1),
            next_offset: 0,
            next_number: 1,
        }
    }

    /// Total number of batches: `ceil(rows / batch_size)`.
    pub fn total(&self) -> usize {
        self.df.height().div_ceil(self.batch_size)
    }
}

impl Iterator for RowBatches<'_> {
    type Item = RowBatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_offset >= self.df.height() {
            return None;
        }
        let frame = self.df.slice(self.next_offset as i64, self.batch_size);
        let batch = RowBatch {
            number: self.next_number,
            offset: self.next_offset,
            frame,
        };
        self.next_offset += self.batch_size;
        self.next_number += 1;
        Some(batch)
    }
}

/// Render a batch as prompt text, one `Row <index>: <json>` line per row.
pub fn render_batch_text(batch: &RowBatch) -> Result<String> {
    let mut lines = Vec::with_capacity(batch.len());
    for i in 0..batch.len() {
        let row = row_to_json(&batch.frame, i)?;
        lines.push(format!(
            "Row {}: {}",
            batch.offset + i,
            serde_json::Value::Object(row)
        ));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: i64) -> DataFrame {
        let ids: Vec<i64> = (0..rows).collect();
        df!["id" => ids].unwrap()
    }

    #[test]
    fn test_batches_cover_all_rows_in_order() {
        let df = frame(45);
        let batches = RowBatches::new(&df, 20);
        assert_eq!(batches.total(), 3);

        let batches: Vec<RowBatch> = RowBatches::new(&df, 20).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].number, 1);
        assert_eq!(batches[2].offset, 40);
        assert_eq!(batches[2].len(), 5);
        assert_eq!(batches.iter().map(RowBatch::len).sum::<usize>(), 45);
    }

    #[test]
    fn test_empty_frame_has_no_batches() {
        let df = frame(0);
        assert_eq!(RowBatches::new(&df, 20).total(), 0);
        assert_eq!(RowBatches::new(&df, 20).count(), 0);
    }

    #[test]
    fn test_render_batch_text_uses_absolute_indices() {
        let df = df!["id" => [1i64, 2, 3], "name" => ["a", "b", "c"]].unwrap();
        let batch = RowBatches::new(&df, 2).nth(1).unwrap();
        let text = render_batch_text(&batch).unwrap();
        assert_eq!(text, r#"Row 2: {"id":3,"name":"c"}"#);
    }
}
