//! Amount formatting for the HTML page.
//!
//! Amounts are whole currency units. Format: sign + currency symbol + number
//! with the locale's thousands separator, e.g. `Lek 54 132` or `$54,132`.

/// Format an amount with currency symbol and thousands separators.
pub fn format_amount(amount: i64, currency: &str, locale: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let whole_str = format_with_thousands(amount.unsigned_abs(), thousands_separator(locale));
    format!("{}{}{}", sign, currency_symbol(currency), whole_str)
}

/// Thousands separator for a locale.
fn thousands_separator(locale: &str) -> char {
    match locale {
        "de-DE" | "de-AT" | "es-ES" | "it-IT" | "pt-BR" | "pt-PT" | "nl-NL" | "nl-BE"
        | "tr-TR" | "id-ID" | "da-DK" | "el-GR" => '.',
        // Space-grouped locales use a no-break space so amounts never wrap.
        "sq-AL" | "fr-FR" | "fr-BE" | "fr-CA" | "pl-PL" | "ru-RU" | "nb-NO" | "sv-SE"
        | "fi-FI" | "cs-CZ" | "sk-SK" | "hu-HU" | "bg-BG" | "uk-UA" => '\u{00a0}',
        _ => ',',
    }
}

/// Format a number with thousands separators.
fn format_with_thousands(n: u64, sep: char) -> String {
    let s = n.to_string();
    let chars: Vec<char> = s.chars().rev().collect();
    let mut result = Vec::with_capacity(chars.len() + chars.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(sep);
        }
        result.push(*c);
    }

    result.iter().rev().collect()
}

/// Get currency symbol for a currency code.
fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "ALL" => "Lek\u{00a0}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "JPY" => "\u{00a5}",
        "CHF" => "CHF\u{00a0}",
        "INR" => "\u{20b9}",
        "SEK" => "kr\u{00a0}",
        "NOK" => "kr\u{00a0}",
        "DKK" => "kr\u{00a0}",
        "PLN" => "z\u{0142}\u{00a0}",
        "TRY" => "\u{20ba}",
        _ => "",
    }
}
