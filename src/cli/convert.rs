use super::ui;
use crate::converter::Converter;
use crate::core::ConversionRequest;
use anyhow::Result;
use tracing::error;

/// Renders a conversion as `<amount> <FROM> = <result> <TO>`.
pub fn format_conversion(request: &ConversionRequest, result: f64) -> String {
    format!(
        "{} {} = {} {}",
        ui::style_text(
            &ui::format_amount(request.amount, &request.from),
            ui::StyleType::Amount
        ),
        request.from,
        ui::style_text(
            &ui::format_amount(result, &request.to),
            ui::StyleType::Result
        ),
        request.to
    )
}

pub async fn run(converter: &Converter, request: &ConversionRequest) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let result = converter.convert(request).await;
    pb.finish_and_clear();

    match result {
        Ok(value) => {
            println!("{}", format_conversion(request, value));
            Ok(())
        }
        Err(e) => {
            error!(kind = ?e.kind(), cause = %e.detail(), "Conversion failed");
            Err(e.into())
        }
    }
}
