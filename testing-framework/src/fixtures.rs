// File: testing-framework/src/fixtures.rs
//
// Small, dependency-light builders for test inputs. Kept separate from the
// orchestrator module so tiers that only need deterministic time/rng don't
// have to pull in the rest.

use crate::orchestrator::TestRng;

/// Builds a deterministic-looking 0x-prefixed hex string of `len` bytes,
/// useful for fabricating wallet addresses and tx hashes in tests without
/// depending on real key material.
pub fn hex_id(rng: &TestRng, len: usize) -> String {
    let bytes: Vec<u8> = (0..len).map(|_| rng.gen_range(0u16..256) as u8).collect();
    format!("0x{}", hex::encode(bytes))
}

/// Generates a pseudo-random decimal amount in `[min, max)` with up to two
/// fractional digits, for fabricating payment/deposit amounts in tests.
pub fn decimal_amount(rng: &TestRng, min: u64, max: u64) -> rust_decimal::Decimal {
    let whole = rng.gen_range(min..max);
    let cents = rng.gen_range(0u64..100);
    rust_decimal::Decimal::new((whole * 100 + cents) as i64, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_id_has_expected_length() {
        let rng = TestRng::with_seed(1);
        let id = hex_id(&rng, 20);
        assert_eq!(id.len(), 2 + 40);
    }

    #[test]
    fn decimal_amount_stays_in_range() {
        let rng = TestRng::with_seed(2);
        for _ in 0..50 {
            let amt = decimal_amount(&rng, 10, 20);
            assert!(amt >= rust_decimal::Decimal::new(1000, 2));
            assert!(amt < rust_decimal::Decimal::new(2000, 2));
        }
    }
}
