//! 日期 / 金额单元格的归一化
//!
//! 表格里的日期来源不一 (API 导出的 ISO 日期、手工录入的美式日期),
//! 金额单元格带 `$` 和千分位。这里统一转换成 `NaiveDate` / `BigDecimal`。

use crate::error::NormalizeError;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::str::FromStr;

/// 依次尝试的日期格式, 顺序固定: (格式, 分隔符, 年份字段位置)
const DATE_FORMATS: [(&str, char, usize); 3] = [
    ("%Y-%m-%d", '-', 0),
    ("%m/%d/%Y", '/', 2),
    ("%m-%d-%Y", '-', 2),
];

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

/// 解析日期: ISO `YYYY-MM-DD` -> `MM/DD/YYYY` -> `MM-DD-YYYY`
pub fn parse_date(s: &str) -> Result<NaiveDate, NormalizeError> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .filter(|(_, sep, year_field)| has_four_digit_year(trimmed, *sep, *year_field))
        .find_map(|(fmt, _, _)| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| NormalizeError::UnparseableDate(s.to_string()))
}

/// chrono 的 `%Y` 接受任意位数, 年份必须正好 4 位数字
fn has_four_digit_year(s: &str, sep: char, year_field: usize) -> bool {
    s.split(sep)
        .nth(year_field)
        .map_or(false, |year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
}

/// 解析金额: 去掉货币符号和千分位后按十进制解析
pub fn parse_currency(s: &str) -> Result<BigDecimal, NormalizeError> {
    let err = || NormalizeError::UnparseableCurrency(s.to_string());

    let trimmed = s.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.trim_start_matches(&CURRENCY_SYMBOLS[..]);
    // "$-5.00" 这种写法也接受
    let (negative, rest) = match rest.strip_prefix('-') {
        Some(inner) if !negative => (true, inner),
        Some(_) => return Err(err()),
        None => (negative, rest),
    };

    let digits: String = rest.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(err());
    }

    let value = BigDecimal::from_str(&digits).map_err(|_| err())?;
    Ok(if negative { -value } else { value })
}

/// 渲染金额为 `$X,XXX.XX`; 空值或 0 渲染为 `$0.00`
pub fn format_currency(amount: Option<&BigDecimal>) -> String {
    let amount = match amount {
        Some(a) if !a.is_zero() => a,
        _ => return "$0.00".to_string(),
    };

    let fixed = amount.round(2).with_scale(2).to_string();
    let (negative, fixed) = match fixed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, fixed.as_str()),
    };
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative && (int_part.chars().any(|c| c != '0') || frac_part.chars().any(|c| c != '0')) {
        format!("-${}.{}", grouped, frac_part)
    } else {
        format!("${}.{}", grouped, frac_part)
    }
}

/// 四舍五入到分后转 f64, 用于 JSON 输出
pub fn to_cents_f64(amount: &BigDecimal) -> f64 {
    amount.round(2).to_string().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_date_formats_agree() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("2024-03-05").unwrap(), expected);
        assert_eq!(parse_date("03/05/2024").unwrap(), expected);
        assert_eq!(parse_date("03-05-2024").unwrap(), expected);
        assert_eq!(parse_date(" 3/5/2024 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for bad in ["", "yesterday", "2024/03/05", "13/01/2024", "2024-02-30", "05.03.2024"] {
            assert_eq!(
                parse_date(bad),
                Err(NormalizeError::UnparseableDate(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_date_requires_four_digit_year() {
        for bad in ["3-5-24", "12-31-23", "24-03-05", "3/5/24", "02024-03-05", "03/05/+2024"] {
            assert_eq!(
                parse_date(bad),
                Err(NormalizeError::UnparseableDate(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$1,234.50").unwrap(), dec("1234.50"));
        assert_eq!(parse_currency("82.5").unwrap(), dec("82.5"));
        assert_eq!(parse_currency(" $0.00 ").unwrap(), dec("0"));
        assert_eq!(parse_currency("-$12.00").unwrap(), dec("-12"));
        assert_eq!(parse_currency("$-12.00").unwrap(), dec("-12"));
    }

    #[test]
    fn test_parse_currency_rejects_malformed() {
        for bad in ["", "$", "abc", "$12.3.4", "12 USD", "--5", "-$-5"] {
            assert!(
                matches!(parse_currency(bad), Err(NormalizeError::UnparseableCurrency(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(None), "$0.00");
        assert_eq!(format_currency(Some(&dec("0"))), "$0.00");
        assert_eq!(format_currency(Some(&dec("1234.5"))), "$1,234.50");
        assert_eq!(format_currency(Some(&dec("999.999"))), "$1,000.00");
        assert_eq!(format_currency(Some(&dec("1234567.891"))), "$1,234,567.89");
        assert_eq!(format_currency(Some(&dec("12"))), "$12.00");
        assert_eq!(format_currency(Some(&dec("-1234.5"))), "-$1,234.50");
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let amount = dec("48213.07");
        assert_eq!(parse_currency(&format_currency(Some(&amount))).unwrap(), amount);
    }

    #[test]
    fn test_to_cents_f64() {
        assert_eq!(to_cents_f64(&dec("300.004")), 300.0);
        assert_eq!(to_cents_f64(&dec("12.345")), 12.35);
    }
}
