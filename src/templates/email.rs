// templates/email.rs
use crate::errors::{Classify, ErrorKind};
use chrono::{Datelike, Local};
use maud::{html, Markup, PreEscaped, DOCTYPE};

#[derive(Debug, thiserror::Error)]
#[error("unknown email template '{0}'")]
pub struct TemplateError(pub String);

impl Classify for TemplateError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Inputs every email template understands.
///
/// `message` and `message2` are trusted HTML written by the report jobs;
/// tables come in as already escaped markup.
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    pub message: String,
    pub table: Option<Markup>,
    pub message2: String,
    pub year: i32,
}

impl TemplateParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            table: None,
            message2: String::new(),
            year: Local::now().year(),
        }
    }

    pub fn with_table(mut self, table: Markup) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_message2(mut self, message2: impl Into<String>) -> Self {
        self.message2 = message2.into();
        self
    }
}

pub const BASIC_FRAME: &str = "basic_frame";

/// Renders the named template to a complete HTML document.
pub fn render(name: &str, params: &TemplateParams) -> Result<String, TemplateError> {
    match name {
        BASIC_FRAME => Ok(basic_frame(params).into_string()),
        other => Err(TemplateError(other.to_string())),
    }
}

fn basic_frame(p: &TemplateParams) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta http-equiv="Content-Type" content="text/html; charset=utf-8";
                style {
                    "body { font-family: Arial, sans-serif; font-size: 14px; color: #333; }"
                    "table { border-collapse: collapse; }"
                    "th, td { border: 1px solid #bbb; padding: 4px 8px; text-align: left; }"
                    "th { background: #eee; }"
                    ".footer { color: #999; font-size: 11px; margin-top: 24px; }"
                }
            }
            body {
                table width="100%" cellpadding="0" cellspacing="0" style="border: none" {
                    tr {
                        td style="border: none; padding: 16px" {
                            div class="message" { (PreEscaped(&p.message)) }
                            @if let Some(table) = &p.table {
                                div class="table" style="margin-top: 16px" { (table) }
                            }
                            @if !p.message2.is_empty() {
                                div class="message2" style="margin-top: 16px" { (PreEscaped(&p.message2)) }
                            }
                            p class="footer" {
                                "This is an automated message. Please do not reply. © " (p.year)
                            }
                        }
                    }
                }
            }
        }
    }
}
