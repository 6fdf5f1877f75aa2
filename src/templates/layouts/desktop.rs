use maud::{html, Markup, DOCTYPE};

const STYLE: &str = "
body { font-family: system-ui, sans-serif; margin: 0; color: #222; }
header { display: flex; align-items: center; gap: 2rem; padding: 0.75rem 1.5rem; box-shadow: 0 1px 3px #0002; }
header ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
main { padding: 1rem 1.5rem; }
table { border-collapse: collapse; font-size: 0.9rem; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; }
th { background: #f4f4f4; }
.card { margin-bottom: 1.5rem; }
.meta { color: #666; font-size: 0.85rem; }
";

/// Page shell shared by the dashboard and list manager pages.
pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (STYLE) }
            }
            body {
                header {
                    h3 { "hotelops" }
                    nav {
                        ul {
                            li { a href="/logs" { "Logs" } }
                            li { a href="/logs?type=datarun" { "Job runs" } }
                            li { a href="/show_schedules" { "Schedules" } }
                            li { a href="/show_mail_lists" { "Mailing lists" } }
                        }
                    }
                }
                main { (content) }
            }
        }
    }
}
