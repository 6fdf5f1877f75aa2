use chrono::NaiveDateTime;

/// One row of `mail_list`. Never deleted; unsubscribing clears `subscribed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub listname: String,
    pub email: String,
    pub subscribed: bool,
    pub last_update: NaiveDateTime,
}
