// CSV export of extraction results

use crate::agents::ExtractionMap;
use crate::types::{AppError, AppResult};

pub const EXPORT_HEADER: [&str; 2] = ["Entity", "Extracted Info"];
pub const EXPORT_FILE_NAME: &str = "extracted_data.csv";

/// One row per entity, in key order
pub fn extraction_csv(results: &ExtractionMap) -> AppResult<Vec<u8>> {
    let to_internal = |e: csv::Error| AppError::Internal(format!("CSV export failed: {}", e));

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(EXPORT_HEADER).map_err(to_internal)?;
    for (entity, info) in results {
        wtr.write_record([entity, info]).map_err(to_internal)?;
    }
    wtr.into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}
