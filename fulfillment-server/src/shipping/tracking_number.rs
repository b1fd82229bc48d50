//! Tracking number generation
//!
//! `<prefix><base36 millis><4 random base36>`, upper-cased.
//! Uniqueness is enforced by the shipment table, not here.

use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 4;

pub fn generate(prefix: &str) -> String {
    generate_at(prefix, shared::util::now_millis(), &mut rand::thread_rng())
}

pub fn generate_at<R: Rng + ?Sized>(prefix: &str, millis: i64, rng: &mut R) -> String {
    let mut out = String::with_capacity(prefix.len() + 9 + SUFFIX_LEN);
    out.push_str(&prefix.trim().to_uppercase());
    out.push_str(&to_base36(millis.max(0) as u64));
    for _ in 0..SUFFIX_LEN {
        out.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }
    out
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let tn = generate_at("trk", 1_700_000_000_000, &mut rng);

        assert!(tn.starts_with("TRKLOYW3V28"));
        assert_eq!(tn.len(), 3 + 8 + 4);
        assert!(
            tn.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_timestamp_round_trips() {
        let mut rng = StdRng::seed_from_u64(1);
        let millis = 1_760_000_000_000;
        let tn = generate_at("TRK", millis, &mut rng);
        let body = &tn[3..tn.len() - SUFFIX_LEN];
        assert_eq!(u64::from_str_radix(body, 36).unwrap(), millis as u64);
    }

    #[test]
    fn test_suffix_varies() {
        let a = generate("TRK");
        let b = generate("TRK");
        let c = generate("TRK");
        // 36^4 suffixes: three identical draws would be a broken RNG
        assert!(!(a == b && b == c));
    }
}
