//! Cell Coercion

use chrono::NaiveDate;

/// Parse a cell as a number. `?`, blanks and unparsable text become `None`.
pub fn to_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Map a labelled flag to 1/0.
///
/// `yes` and `no` are matched case-insensitively; plain `1`/`0` are always
/// accepted. Anything else is `None`.
pub fn to_flag(cell: &str, yes: &[&str], no: &[&str]) -> Option<f64> {
    let cell = cell.trim();
    if yes.iter().any(|y| y.eq_ignore_ascii_case(cell)) {
        return Some(1.0);
    }
    if no.iter().any(|n| n.eq_ignore_ascii_case(cell)) {
        return Some(0.0);
    }
    match to_numeric(cell) {
        Some(v) if v == 1.0 => Some(1.0),
        Some(v) if v == 0.0 => Some(0.0),
        _ => None,
    }
}

/// Parse a date, day-first formats before ISO
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%Y/%m/%d"];
    let cell = cell.trim();
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(cell, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric(" 0.24 "), Some(0.24));
        assert_eq!(to_numeric("?"), None);
        assert_eq!(to_numeric(""), None);
        assert_eq!(to_numeric("NaN"), None);
    }

    #[test]
    fn test_to_flag() {
        let yes = ["Yes", "Working Day"];
        let no = ["No", "No work"];
        assert_eq!(to_flag("working day", &yes, &no), Some(1.0));
        assert_eq!(to_flag("No work", &yes, &no), Some(0.0));
        assert_eq!(to_flag("1", &yes, &no), Some(1.0));
        assert_eq!(to_flag("?", &yes, &no), None);
        assert_eq!(to_flag("2", &yes, &no), None);
    }

    #[test]
    fn test_parse_date_day_first() {
        let d = parse_date("05-03-2012").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2012, 3, 5));
        let iso = parse_date("2011-01-31").unwrap();
        assert_eq!(iso.day(), 31);
        assert!(parse_date("yesterday").is_none());
    }
}
