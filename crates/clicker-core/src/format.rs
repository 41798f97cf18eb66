//! Human-readable number abbreviation.

const SUFFIXES: [&str; 8] = ["K", "M", "G", "T", "P", "E", "Z", "Y"];

/// Abbreviate a number for display.
///
/// Values below 1000 are rounded to two decimals without trailing zeros.
/// Larger values are divided by the largest fitting power of 1000 and shown
/// with one decimal and a suffix (`K` through `Y`; `Y` absorbs the rest).
pub fn format_number(num: f64) -> String {
    if num < 1000.0 {
        // `+ 0.0` turns a rounded -0 into 0.
        return format!("{}", (num * 100.0).round() / 100.0 + 0.0);
    }

    let mut scale = 1000.0;
    for (i, suffix) in SUFFIXES.iter().enumerate() {
        let next = scale * 1000.0;
        if num < next || i == SUFFIXES.len() - 1 {
            return format!("{:.1}{suffix}", num / scale);
        }
        scale = next;
    }
    unreachable!("the last suffix always matches")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_round_to_two_decimals() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(3.14159), "3.14");
        assert_eq!(format_number(999.0), "999");
    }

    #[test]
    fn thousands_and_up_get_suffixes() {
        assert_eq!(format_number(1000.0), "1.0K");
        assert_eq!(format_number(1500.0), "1.5K");
        assert_eq!(format_number(2_500_000.0), "2.5M");
        assert_eq!(format_number(7e9), "7.0G");
        assert_eq!(format_number(1e12), "1.0T");
        assert_eq!(format_number(1e24), "1.0Y");
    }

    #[test]
    fn huge_values_stay_in_yotta() {
        assert_eq!(format_number(5e27), "5000.0Y");
    }

    #[test]
    fn negative_values_use_plain_form() {
        assert_eq!(format_number(-7.25), "-7.25");
        assert_eq!(format_number(-0.001), "0");
    }
}
