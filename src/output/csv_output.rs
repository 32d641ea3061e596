//! Delimited table output
//!
//! Writes one row per record under a fixed header row whose columns are the
//! [`ListingField`](crate::listing::ListingField) names in table order.

use crate::listing::ListingRecord;
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use std::fs::File;
use std::path::{Path, PathBuf};

/// CSV output handler bound to a file path
///
/// The file is only created when there is at least one record to write.
pub struct CsvOutput {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for CsvOutput {
    fn write_records(&mut self, records: &[ListingRecord]) -> OutputResult<usize> {
        if records.is_empty() {
            tracing::warn!("No data to save");
            return Ok(0);
        }

        tracing::info!(
            "Saving {} listings to {}",
            records.len(),
            self.path.display()
        );

        if self.writer.is_none() {
            let writer = csv::Writer::from_path(&self.path).map_err(|e| {
                OutputError::Write(format!("cannot create {}: {}", self.path.display(), e))
            })?;
            self.writer = Some(writer);
        }

        if let Some(writer) = self.writer.as_mut() {
            for record in records {
                writer.serialize(record)?;
            }
        }

        Ok(records.len())
    }

    fn flush(&mut self) -> OutputResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            tracing::info!("Data saved successfully to {}", self.path.display());
        }
        Ok(())
    }
}

/// Writes records to `path` in one go
pub fn write_csv(records: &[ListingRecord], path: &Path) -> OutputResult<usize> {
    let mut output = CsvOutput::new(path);
    let written = output.write_records(records)?;
    output.flush()?;
    Ok(written)
}
