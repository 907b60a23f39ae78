/// Parse interval string like "30s", "5m", "1h", "1d" into seconds.
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map_err(|_| format!("Invalid hours: {}", hours))?
            .checked_mul(3600)
            .ok_or_else(|| format!("Interval too large: {}", s))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map_err(|_| format!("Invalid minutes: {}", minutes))?
            .checked_mul(60)
            .ok_or_else(|| format!("Interval too large: {}", s))
    } else if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map_err(|_| format!("Invalid days: {}", days))?
            .checked_mul(86400)
            .ok_or_else(|| format!("Interval too large: {}", s))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '30s', '5m', '1h'", s))
    }
}

/// Format seconds using the largest unit that divides them evenly.
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("30s").unwrap(), 30);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("1d").unwrap(), 86400);
        assert_eq!(parse_interval(" 45 ").unwrap(), 45);
        assert_eq!(parse_interval("2M").unwrap(), 120);
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("m").is_err());
    }

    #[test]
    fn test_parse_interval_overflow() {
        assert!(parse_interval("9999999999999999h").is_err());
        assert!(parse_interval("999999999999999999m").is_err());
        assert!(parse_interval("999999999999999d").is_err());
        assert_eq!(
            parse_interval(&format!("{}s", u64::MAX)).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(30), "30s");
        assert_eq!(format_interval(90), "90s");
        assert_eq!(format_interval(300), "5m");
        assert_eq!(format_interval(7200), "2h");
        assert_eq!(format_interval(86400), "1d");
    }
}
