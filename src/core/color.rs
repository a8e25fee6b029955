pub const CATEGORIES: [&str; 7] = [
    "work",
    "personal",
    "health",
    "finance",
    "education",
    "household",
    "study",
];

const DEFAULT_HEX: &str = "#6b7280";

pub fn category_hex(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "work" => "#3b82f6",
        "personal" => "#22c55e",
        "health" => "#ef4444",
        "finance" => "#eab308",
        "education" => "#a855f7",
        "household" => "#f97316",
        "study" => "#14b8a6",
        _ => DEFAULT_HEX,
    }
}

pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Apply an opacity percentage to a hex colour. Full opacity returns the hex
/// unchanged; anything lower becomes an `rgba(...)` string.
pub fn custom_color(hex: &str, opacity: f64) -> String {
    let clamped = opacity.round().clamp(0.0, 100.0);
    if clamped >= 100.0 {
        return hex.to_string();
    }
    match hex_to_rgb(hex) {
        Some((r, g, b)) => format!("rgba({}, {}, {}, {})", r, g, b, clamped / 100.0),
        None => hex.to_string(),
    }
}

pub fn category_color(category: &str, opacity: f64) -> String {
    custom_color(category_hex(category), opacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_categories() {
        assert_eq!(category_hex("Work"), "#3b82f6");
        assert_eq!(category_hex("  study "), "#14b8a6");
        assert_eq!(category_hex("gardening"), DEFAULT_HEX);
        for category in CATEGORIES {
            assert_ne!(category_hex(category), DEFAULT_HEX);
        }
    }

    #[test]
    fn opacity_conversion() {
        assert_eq!(custom_color("#3b82f6", 100.0), "#3b82f6");
        assert_eq!(custom_color("#3b82f6", 250.0), "#3b82f6");
        assert_eq!(custom_color("#3b82f6", 50.0), "rgba(59, 130, 246, 0.5)");
        assert_eq!(custom_color("#000000", -5.0), "rgba(0, 0, 0, 0)");
        assert_eq!(category_color("health", 30.0), "rgba(239, 68, 68, 0.3)");
    }

    #[test]
    fn malformed_hex_is_passed_through() {
        assert_eq!(hex_to_rgb("blue"), None);
        assert_eq!(custom_color("blue", 50.0), "blue");
    }
}
