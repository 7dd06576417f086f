//! CSV export of a derived view.

use crate::{ReadingRecord, Reading, Result};
use std::io::Write;
use std::path::Path;

/// Write the readings as CSV with a header row, in the order given
pub fn write_csv<W: Write>(writer: W, readings: &[Reading]) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);

    for reading in readings {
        writer.serialize(ReadingRecord::from(reading))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} readings as CSV", readings.len());
    Ok(readings.len())
}

/// Export to a file, creating parent directories as needed
pub fn export_csv(path: &Path, readings: &[Reading]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let count = write_csv(file, readings)?;
    tracing::info!("Exported {} readings to {:?}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::reading;

    #[test]
    fn test_csv_has_header_and_rows() {
        let readings = vec![
            reading("2024-03-01", "07:00", "Fasting", 95.0),
            reading("2024-03-01", "13:00", "After Dinner", 150.5),
        ];
        let mut out = Vec::new();
        let count = write_csv(&mut out, &readings).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "id,date,time,context,level,unit,label");
        assert!(lines[1].ends_with(",2024-03-01,07:00,Fasting,95.0,mg/dL,Optimal"));
        assert!(lines[2].contains("After Dinner,150.5,mg/dL,Controlled"));
    }

    #[test]
    fn test_export_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("view.csv");
        export_csv(&path, &[reading("2024-03-01", "07:00", "Fasting", 95.0)]).unwrap();

        let reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.into_records().count(), 1);
    }

    #[test]
    fn test_empty_view_writes_nothing_but_succeeds() {
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[]).unwrap(), 0);
    }
}
