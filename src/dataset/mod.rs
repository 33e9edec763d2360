//! Data loading: CSV uploads and Google Sheets, plus row-range slicing

pub mod sheets;
pub mod table;

pub use sheets::{SheetsClient, SheetsError};
pub use table::{Record, Table};
