//! Fixed-size row batches for prompt-sized processing

use super::table::Dataset;
use crate::error::{CleanError, Result};

/// A consecutive slice of a dataset
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position of the batch in the sequence (0-based)
    pub index: usize,
    /// Row index of the first row within the full dataset
    pub offset: usize,
    pub data: Dataset,
}

impl Batch {
    /// Render the batch with absolute row indices
    pub fn to_text_table(&self) -> String {
        self.data.to_text_table(self.offset)
    }
}

/// Iterator over the batches of a dataset
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    next_offset: usize,
    next_index: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.next_offset >= self.dataset.len() {
            return None;
        }
        let offset = self.next_offset;
        let end = (offset + self.batch_size).min(self.dataset.len());
        let batch = Batch {
            index: self.next_index,
            offset,
            data: self.dataset.slice(offset..end),
        };
        self.next_offset = end;
        self.next_index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.next_offset);
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}

impl Dataset {
    /// Split into batches of `batch_size` rows; the last may be shorter
    pub fn batches(&self, batch_size: usize) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(CleanError::invalid_input("batch size must be greater than zero"));
        }
        Ok(Batches {
            dataset: self,
            batch_size,
            next_offset: 0,
            next_index: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Dataset {
        let rows: Vec<Vec<String>> = (0..n).map(|i| vec![i.to_string()]).collect();
        Dataset::from_strings(&["n".to_string()], rows.as_slice()).unwrap()
    }

    #[test]
    fn test_batch_sizes() {
        let ds = numbered(45);
        let batches: Vec<Batch> = ds.batches(20).unwrap().collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(
            batches.iter().map(|b| b.data.len()).collect::<Vec<_>>(),
            vec![20, 20, 5]
        );
        assert_eq!(batches[2].offset, 40);
        assert_eq!(batches[2].index, 2);
    }

    #[test]
    fn test_exact_multiple() {
        let ds = numbered(40);
        let iter = ds.batches(20).unwrap();
        assert_eq!(iter.len(), 2);
    }

    #[test]
    fn test_empty_dataset_has_no_batches() {
        let ds = numbered(0);
        assert_eq!(ds.batches(20).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_batch_size() {
        assert!(matches!(
            numbered(3).batches(0),
            Err(CleanError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_batch_text_uses_absolute_indices() {
        let ds = numbered(4);
        let last = ds.batches(3).unwrap().last().unwrap();
        assert!(last.to_text_table().lines().nth(1).unwrap().starts_with('3'));
    }
}
