use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

/// `GZ` + base-36 millisecond timestamp + 3 random base-36 characters.
pub fn generate_tracking_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::rng();
    let suffix: String = (0..3)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!("GZ{}{}", to_base36(millis), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn tracking_ids_are_prefixed_and_distinct() {
        let ids: HashSet<String> = (0..200).map(|_| generate_tracking_id()).collect();

        assert!(ids.iter().all(|id| id.starts_with("GZ")));
        assert!(ids.iter().all(|id| id[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())));
        assert!(ids.len() > 190);
    }
}
