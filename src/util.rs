/// Mask a player name for display: everything but the last character is
/// kept, the last character becomes `*` ("김효준" -> "김효*"). One- and
/// two-character names keep only their first character.
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return "알 수 없음".to_string();
    }
    if chars.len() <= 2 {
        return format!("{}*", chars[0]);
    }
    let kept: String = chars[..chars.len() - 1].iter().collect();
    format!("{kept}*")
}

/// Countdown formatting used by the timer readout.
pub fn format_secs(secs: f64) -> String {
    format!("{secs:.2}")
}
