//! pt-BR display formatting
//!
//! Money is always shown with two decimals and a decimal comma.

use rust_decimal::{Decimal, RoundingStrategy};

/// Two-decimal rounding used for every money value shown or stored
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `1234.5` -> `1234,50` (no grouping, used in CSV cells)
pub fn decimal_comma(value: Decimal) -> String {
    let (sign, int_part, frac_part) = split_money(value);
    format!("{sign}{int_part},{frac_part}")
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_brl(value: Decimal) -> String {
    let (sign, int_part, frac_part) = split_money(value);
    format!("{sign}R$ {},{frac_part}", group_thousands(&int_part))
}

fn split_money(value: Decimal) -> (&'static str, String, String) {
    let rounded = round_money(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let mut abs = rounded.abs();
    abs.rescale(2);
    let text = abs.to_string();
    match text.split_once('.') {
        Some((i, f)) => (sign, i.to_string(), f.to_string()),
        None => (sign, text, "00".to_string()),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `1 venda` / `2 vendas`
pub fn count_label(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Cuts `text` to `max` characters and appends `...` when it was longer
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Product card age: `Agora`, `12m`, `5h`, `3d`, then `dd/mm/yyyy`
pub fn relative_age(now_millis: i64, then_millis: i64) -> String {
    let minutes = (now_millis - then_millis).max(0) / 60_000;
    match minutes {
        0 => "Agora".to_string(),
        1..=59 => format!("{minutes}m"),
        60..=1439 => format!("{}h", minutes / 60),
        1440..=10079 => format!("{}d", minutes / 1440),
        _ => chrono::DateTime::from_timestamp_millis(then_millis)
            .map(|dt| dt.with_timezone(&chrono::Local).format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
    }
}
