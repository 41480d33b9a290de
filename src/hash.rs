use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

/// Map a salted hash of `value` onto `[0, 1)`. Different salts give
/// independent values for the same key.
pub fn unit_interval(seed: u64, value: &str, salt: u8) -> f64 {
    let bits = stable_hash_with(|hasher| {
        seed.hash(hasher);
        salt.hash(hasher);
        value.hash(hasher);
    });
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_is_repeatable_and_salted() {
        assert_eq!(unit_interval(7, "Ghana", 0), unit_interval(7, "Ghana", 0));
        assert_ne!(unit_interval(7, "Ghana", 0), unit_interval(7, "Ghana", 1));
    }

    #[test]
    fn unit_interval_stays_in_range() {
        for name in ["Nigeria", "Ghana", "France", ""] {
            for salt in 0..3 {
                let value = unit_interval(1, name, salt);
                assert!((0.0..1.0).contains(&value));
            }
        }
    }
}
