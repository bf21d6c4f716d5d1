//! Unit tests for console rendering helpers

#[cfg(test)]
mod tests {
    use crate::ui::cli::format_time;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(9_000), "0:09");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(212_000), "3:32");
    }
}
