pub mod booking;
pub mod property_row;
pub mod segment;
pub mod subscription;

pub use booking::OperaBooking;
pub use property_row::{HotelCode, PropertyRow, METRIC_COLUMNS, METRIC_COUNT};
pub use segment::Segment;
pub use subscription::Subscription;
