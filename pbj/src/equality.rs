//! Fixed equality and hashing recipes (§4.5): generated `PartialEq`/`Eq`/
//! `Hash`/`Ord` impls call into these helpers instead of deriving, since
//! float fields need bit-pattern comparison rather than `PartialEq`'s
//! `NaN != NaN` and generated `Hash` needs the same fixed combination
//! formula every message uses, independent of field declaration order
//! stability across generator versions.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hashes a single value with a hasher built the same way every time.
/// `DefaultHasher::new()` always starts from the same fixed keys (it is
/// only the keys used by `RandomState` that vary per-process), so this is
/// stable across runs and across processes for a given Rust toolchain.
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// The seed a generated message's `Hash` impl starts folding from.
pub const HASH_SEED: u64 = 1;

/// Folds one more field's hash into a running message hash:
/// `acc = acc * 31 + field_hash`.
pub fn combine_field_hash(acc: u64, field_hash: u64) -> u64 {
    acc.wrapping_mul(31).wrapping_add(field_hash)
}

/// The hash contribution of a oneof field: `(31 + hash(kind)) * 31 +
/// hash(value)`. Exposed here as well as used by
/// [`crate::oneof::OneOf`]'s own `Hash` impl, so generated code that
/// inlines a oneof's hash (rather than going through `OneOf::hash`) still
/// matches.
pub fn oneof_field_hash(kind_hash: u64, value_hash: u64) -> u64 {
    (31u64.wrapping_add(kind_hash)).wrapping_mul(31).wrapping_add(value_hash)
}

/// Bit-pattern equality for `float`: two `NaN`s with identical bit
/// patterns compare equal, and `0.0 != -0.0`. This is deliberately not
/// IEEE-754 equality.
pub fn eq_f32(a: f32, b: f32) -> bool {
    a.to_bits() == b.to_bits()
}

pub fn eq_f64(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

/// Hashes a float by its bit pattern, matching [`eq_f32`]/[`eq_f64`].
pub fn hash_f32(value: f32) -> u64 {
    hash_one(&value.to_bits())
}

pub fn hash_f64(value: f64) -> u64 {
    hash_one(&value.to_bits())
}

/// A total order over `float`/`double`, for messages the generator marks
/// comparable. Matches `f32::total_cmp`/`f64::total_cmp`: orders `-NaN <
/// -inf < ... < -0.0 < 0.0 < ... < inf < NaN`.
pub fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}

pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_bit_pattern_not_ieee() {
        assert!(!eq_f32(0.0, -0.0));
        assert!(eq_f32(f32::NAN, f32::NAN));
    }

    #[test]
    fn hash_is_stable_within_a_process() {
        assert_eq!(hash_one(&42i32), hash_one(&42i32));
        assert_ne!(hash_one(&42i32), hash_one(&43i32));
    }

    #[test]
    fn combine_matches_the_fixed_recipe() {
        let h = combine_field_hash(combine_field_hash(HASH_SEED, 7), 9);
        assert_eq!(h, (HASH_SEED.wrapping_mul(31).wrapping_add(7)).wrapping_mul(31).wrapping_add(9));
    }

    #[test]
    fn float_total_order_places_nan_last() {
        assert_eq!(cmp_f32(1.0, f32::NAN), Ordering::Less);
        assert_eq!(cmp_f32(-0.0, 0.0), Ordering::Less);
    }
}
