use chrono::NaiveDate;

/// One Opera reservation line that survived the export filters.
#[derive(Debug, Clone, PartialEq)]
pub struct OperaBooking {
    pub resort: String,
    pub confirmation_number: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub market_code: String,
    pub rate_code: String,
    pub vip_code: String,
    pub arrival_date: NaiveDate,
}
