use super::ui;
use crate::converter::Converter;
use crate::core::RateTable;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use tracing::error;

impl RateTable {
    /// Lists every rate against one unit of the base, sorted by code.
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Units per 1 {}", self.base())),
        ]);

        let mut codes: Vec<_> = self.rates().iter().collect();
        codes.sort_by(|a, b| a.0.cmp(b.0));

        for (code, rate) in codes {
            table.add_row(vec![
                Cell::new(code),
                Cell::new(format!("{rate:.6}")).set_alignment(CellAlignment::Right),
            ]);
        }

        format!(
            "Rates: {}\n\n{}",
            ui::style_text(self.base(), ui::StyleType::Title),
            table
        )
    }
}

pub async fn run(converter: &Converter, base: &str, include_bitcoin: bool) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let result = converter.rate_table(base, include_bitcoin).await;
    pb.finish_and_clear();

    match result {
        Ok(table) => {
            println!("{}", table.display_as_table());
            if include_bitcoin {
                println!(
                    "\n{}",
                    ui::style_text(
                        "BTC shows the bitcoin price in the base currency",
                        ui::StyleType::Subtle
                    )
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(kind = ?e.kind(), cause = %e.detail(), "Rate lookup failed");
            Err(e.into())
        }
    }
}
