//! # gridchat-core
//!
//! The spreadsheet model behind the gridchat bridge backend:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`CellValue`] - typed cell contents with JSON conversion
//! - [`Worksheet`], [`Workbook`] - sparse in-memory documents
//! - [`csv`] - import/export of single sheets
//!
//! ## Example
//!
//! ```rust
//! use gridchat_core::{CellRange, CellValue, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.set_cell("A1", "Total").unwrap();
//! sheet
//!     .write_block(
//!         &CellRange::parse("B1:C1").unwrap(),
//!         &[vec![CellValue::from(1.0), CellValue::from(2.0)]],
//!     )
//!     .unwrap();
//! assert_eq!(sheet.used_range().unwrap().to_string(), "A1:C1");
//! ```

pub mod address;
pub mod csv;
pub mod error;
pub mod value;
pub mod workbook;
pub mod worksheet;

pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};
pub use value::CellValue;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
