pub mod components;
pub mod email;
pub mod layouts;
pub mod pages;

// Re-exports for convenience
pub use components::{card, data_table, html_error_response};
pub use email::{render, TemplateError, TemplateParams};
pub use layouts::desktop::desktop_layout;
