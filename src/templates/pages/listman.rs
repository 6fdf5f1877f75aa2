// templates/pages/listman.rs
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn message_page(message: &str) -> Markup {
    desktop_layout(
        "Mailing lists",
        html! {
            p { (message) }
        },
    )
}

/// Shown when any of `action`, `listname` or `email` is missing.
pub fn usage_page(public_url: &str) -> Markup {
    let example = format!(
        "{}?action=<sub|unsub>&listname=<VALID_LISTNAME>&email=<VALID_EMAIL>",
        public_url
    );
    desktop_layout(
        "Mailing lists",
        html! {
            p { "Please ensure that all input parameters are filled correctly." }
            p { "A valid command would be" }
            pre { (example) }
        },
    )
}

pub fn invalid_action_page() -> Markup {
    message_page("Invalid action. action = \"sub\" or \"unsub\" only.")
}
