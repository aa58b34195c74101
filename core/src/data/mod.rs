//! Dataset model and CSV input/output
//!
//! ```text
//!  .csv ──► csv_io::read_csv ──► Dataset (headers + typed rows)
//!                                   │
//!                  ┌────────────────┼─────────────────┐
//!                  ▼                ▼                 ▼
//!           clean pipeline     profile/validate   batches ──► agent
//! ```

pub mod batch;
pub mod csv_io;
pub mod table;
pub mod value;

pub use batch::{Batch, Batches};
pub use csv_io::{read_csv, read_csv_from, write_csv, write_csv_to, CsvOptions};
pub use table::Dataset;
pub use value::{ColumnType, Value, ValueKey, MISSING_TOKENS};
