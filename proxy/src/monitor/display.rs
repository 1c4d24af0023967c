use crate::price_provider::{PriceProvider, PriceQuote};
use rust_decimal::{Decimal, RoundingStrategy};

const MIN_FRACTION_DIGITS: usize = 2;

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// USD rendering: thousands separators, at least two and at most
/// `max_fraction_digits` fraction digits, half away from zero.
pub fn format_price(price: Decimal, max_fraction_digits: u32) -> String {
    let rounded = price
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut frac = frac_part.to_string();
    while frac.len() < MIN_FRACTION_DIGITS {
        frac.push('0');
    }
    format!("{}${}.{}", sign, group_thousands(int_part), frac)
}

pub fn format_change(change: Decimal) -> String {
    let rounded = change.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{:.2}%", rounded)
    } else {
        format!("+{:.2}%", rounded.abs())
    }
}

pub fn render_price_table(provider: &dyn PriceProvider, quotes: &[PriceQuote]) -> Vec<String> {
    if quotes.is_empty() {
        return vec![format!("[{}] no price data available", provider.name())];
    }
    let width = quotes
        .iter()
        .map(|q| provider.label(&q.id).len())
        .max()
        .unwrap_or(0)
        .max(6);
    let mut lines = Vec::with_capacity(quotes.len() + 3);
    lines.push(format!("[{}] latest prices at {}", provider.name(), time::now_rfc3339()));
    lines.push("=".repeat(width + 24));
    for quote in quotes {
        let price = format_price(quote.price, provider.max_fraction_digits());
        let line = match quote.change_24h {
            Some(change) => format!(
                "{:<width$}: {} {}",
                provider.label(&quote.id),
                price,
                format_change(change),
                width = width
            ),
            None => format!("{:<width$}: {}", provider.label(&quote.id), price, width = width),
        };
        lines.push(line);
    }
    lines.push("=".repeat(width + 24));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(67000.12000000), 6), "$67,000.12");
        assert_eq!(format_price(dec!(1234567.5), 6), "$1,234,567.50");
        assert_eq!(format_price(dec!(0.12345678), 6), "$0.123457");
        assert_eq!(format_price(dec!(0.123456785), 8), "$0.12345679");
        assert_eq!(format_price(dec!(999.995), 2), "$1,000.00");
        assert_eq!(format_price(dec!(12), 6), "$12.00");
        assert_eq!(format_price(dec!(0), 6), "$0.00");
        assert_eq!(format_price(dec!(-1500.5), 6), "-$1,500.50");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(dec!(1.234)), "+1.23%");
        assert_eq!(format_change(dec!(-0.505)), "-0.51%");
        assert_eq!(format_change(dec!(0)), "+0.00%");
        assert_eq!(format_change(dec!(-0.001)), "+0.00%");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
