use std::borrow::Cow;

/// Balances are plain floating-point numbers, matching the numeric cells of the
/// workbooks they are read from and written back into.
pub type Amount = f64;

/// Number format applied to every amount cell of a generated workbook.
/// Renders as `€ 1,234.56` with room for a trailing minus sign.
pub const EURO_FORMAT: &str = "\"€ \"#,##0.00_-";

/// Parse a balance as it appears in a ledger cell.
///
/// Accepts both comma and period decimals. Anything that does not start with a
/// number counts as zero, and trailing text after the number is ignored.
/// Example: "10,5" -> 10.5, "1.234,56" -> 1234.56, "12 EUR" -> 12.0, "n/a" -> 0.0
pub fn parse_saldo(input: &str) -> Amount {
    parse_float_prefix(&normalize_decimal_separator(input))
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Rewrite a localized number so that `.` is the only decimal separator.
///
/// When both separators occur, the one that comes last is the decimal mark and the
/// other is dropped as a thousands separator. A lone comma is a decimal comma.
fn normalize_decimal_separator(input: &str) -> Cow<'_, str> {
    match (input.rfind(','), input.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => {
            Cow::Owned(input.replace('.', "").replacen(',', ".", 1))
        }
        (Some(_), Some(_)) => Cow::Owned(input.replace(',', "")),
        (Some(_), None) => Cow::Owned(input.replacen(',', ".", 1)),
        _ => Cow::Borrowed(input),
    }
}

/// Parse the longest numeric prefix of `input`, skipping leading whitespace.
/// Returns `None` when no digits are found.
fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let count_digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_digits = count_digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Format an amount the way the euro number format displays it.
/// Example: 1234.5 -> "€ 1,234.50", -12.0 -> "-€ 12.00"
pub fn format_euro(amount: Amount) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}€ {}.{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
