use std::slice::Chunks;

use crate::utils::error::{AppError, Result};

/// Splits `items` into contiguous batches of `size`, the last one possibly shorter.
///
/// Concatenating the batches yields `items` again, in order.
pub fn batches<T>(items: &[T], size: usize) -> Result<Chunks<'_, T>> {
    if size == 0 {
        return Err(AppError::Validation("Batch size must be greater than 0".into()));
    }
    Ok(items.chunks(size))
}
