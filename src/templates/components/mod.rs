use maud::{html, Markup};

pub mod error;

pub use error::html_error_response;

pub fn card(title: &str, meta: &str, body: Markup) -> Markup {
    html! {
        div class="card" {
            h2 { (title) }
            @if !meta.is_empty() {
                p class="meta" { (meta) }
            }
            div class="card-body" {
                (body)
            }
        }
    }
}

/// Plain bordered table; every cell is escaped.
pub fn data_table<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) -> Markup {
    html! {
        table {
            thead {
                tr {
                    @for h in headers {
                        th { (AsRef::<str>::as_ref(h)) }
                    }
                }
            }
            tbody {
                @for row in rows {
                    tr {
                        @for cell in row {
                            td { (cell) }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_cells_are_escaped() {
        let out = data_table(&["email"], &[vec!["<b>x</b>@example.com".to_string()]]).into_string();
        assert!(out.contains("<th>email</th>"));
        assert!(out.contains("&lt;b&gt;x&lt;/b&gt;@example.com"));
    }
}
