pub mod listman;
pub mod logs;
pub mod tables;

pub use listman::{invalid_action_page, message_page, usage_page};
pub use logs::logs_page;
pub use tables::table_page;
