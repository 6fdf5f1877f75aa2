pub mod connection;
pub mod logs;
pub mod mail_lists;
pub mod property_map;
pub mod tables;

pub use connection::{init_db, Database, DbError};
