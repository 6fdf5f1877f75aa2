pub mod checkpoint;
pub mod export_xlsx;
pub mod opera;
pub mod str_report;

pub use checkpoint::write_checkpoint;
pub use export_xlsx::{export_bookings_xlsx, export_property_rows_xlsx, ExportError};
