//! Booking-code generation: a `VR` prefix, the trailing digits of the
//! creation instant, and a random suffix. The suffix alphabet skips 0/O/1/I/L
//! so codes stay unambiguous when read over the phone. Uniqueness is enforced
//! by the store; callers regenerate on collision.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const CODE_PREFIX: &str = "VR";
const TIME_DIGITS: usize = 6;
const SUFFIX_LEN: usize = 4;
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub fn generate_code(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(TIME_DIGITS);
    let time_part = &millis[start..];

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}{}{}", CODE_PREFIX, time_part, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_code_shape() {
        let code = generate_code(Utc::now());
        assert_eq!(code.len(), CODE_PREFIX.len() + TIME_DIGITS + SUFFIX_LEN);
        assert!(code.starts_with(CODE_PREFIX));

        let time_part = &code[CODE_PREFIX.len()..CODE_PREFIX.len() + TIME_DIGITS];
        assert!(time_part.chars().all(|c| c.is_ascii_digit()));

        let suffix = &code[CODE_PREFIX.len() + TIME_DIGITS..];
        assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_codes_differ_across_instants() {
        let a = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 1).unwrap();
        // Different instants give different time components regardless of
        // what the random suffix does
        assert_ne!(
            generate_code(a)[..CODE_PREFIX.len() + TIME_DIGITS],
            generate_code(b)[..CODE_PREFIX.len() + TIME_DIGITS]
        );
    }
}
