use crate::db::tables::TableDump;
use crate::templates::{card, data_table, desktop_layout};
use maud::html;
use maud::Markup;

pub fn table_page(table: &str, dump: &TableDump) -> Markup {
    desktop_layout(
        table,
        html! {
            (card(table, &format!("{} rows", dump.rows.len()), data_table(&dump.columns, &dump.rows)))
        },
    )
}
