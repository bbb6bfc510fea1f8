//! Value container runtime (§3, §4): a tagged union pairing a oneof
//! discriminator with its payload, with an explicit `Unset` variant so the
//! container is never absent (never represented by `null`/`None` at the
//! top level).

use std::hash::{Hash, Hasher};

/// Identifies a oneof group within a message's [`crate::schema::Schema`].
/// Members sharing a group id are mutually exclusive on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OneofGroupId(pub &'static str);

/// A generated oneof discriminator enum must provide an explicit "nothing
/// is set" value, since the wire format and the model both need a variant
/// to fall back to instead of `null` (§3, §9 "OneOf without null").
pub trait UnsetDiscriminant: Copy + Eq {
    /// The discriminator value meaning "no member is set".
    const UNSET: Self;
}

/// Pairs a oneof discriminator `E` with its payload `V`. `kind` is never
/// absent: when no member is set, `kind == E::UNSET` and `value == None`.
///
/// This invariant — `kind == E::UNSET` iff `value.is_none()` — is upheld by
/// every constructor in this module; generated builders only ever produce
/// `OneOf` values through [`OneOf::set`] or [`OneOf::unset`].
#[derive(Clone, Copy, Debug)]
pub struct OneOf<E, V> {
    kind: E,
    value: Option<V>,
}

impl<E, V> OneOf<E, V>
where
    E: UnsetDiscriminant,
{
    /// The unset value: `kind = E::UNSET`, `value = None`.
    pub fn unset() -> Self {
        OneOf {
            kind: E::UNSET,
            value: None,
        }
    }

    /// Sets the oneof to `kind` carrying `value`. Setting one member
    /// implicitly clears whichever sibling was previously active, since
    /// there is only one `(kind, value)` slot.
    pub fn set(kind: E, value: V) -> Self {
        OneOf {
            kind,
            value: Some(value),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.kind == E::UNSET
    }

    pub fn kind(&self) -> E {
        self.kind
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Returns the payload, assuming the caller already knows (e.g. from a
    /// prior match on `kind()`) that this variant is active.
    ///
    /// # Panics
    /// Panics if the oneof is unset.
    pub fn as_(&self) -> &V {
        self.value
            .as_ref()
            .expect("OneOf::as_ called while unset")
    }

    /// Normalizes away the case the wire format cannot represent: a oneof
    /// member whose declared type is an optional-wrapper, decoded with an
    /// empty wrapper payload. The wire format cannot distinguish "oneof set
    /// to an empty wrapper" from "oneof unset"; the model always chooses
    /// unset (§3, §9).
    pub fn normalize_empty_wrapper(self, is_empty: impl FnOnce(&V) -> bool) -> Self {
        match &self.value {
            Some(v) if is_empty(v) => OneOf::unset(),
            _ => self,
        }
    }
}

impl<E, V> Default for OneOf<E, V>
where
    E: UnsetDiscriminant,
{
    fn default() -> Self {
        OneOf::unset()
    }
}

impl<E, V> PartialEq for OneOf<E, V>
where
    E: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl<E, V> Eq for OneOf<E, V>
where
    E: Eq,
    V: Eq,
{
}

impl<E, V> PartialOrd for OneOf<E, V>
where
    E: PartialOrd,
    V: PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.kind.partial_cmp(&other.kind) {
            Some(std::cmp::Ordering::Equal) => self.value.partial_cmp(&other.value),
            other => other,
        }
    }
}

impl<E, V> Ord for OneOf<E, V>
where
    E: Ord,
    V: Ord,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// Hashing follows §4.5's fixed recipe for a oneof field:
/// `field_hash = (31 + hash(kind)) * 31 + hash(value)`.
impl<E, V> Hash for OneOf<E, V>
where
    E: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let kind_hash = crate::equality::hash_one(&self.kind);
        let value_hash = crate::equality::hash_one(&self.value);
        state.write_u64(crate::equality::oneof_field_hash(kind_hash, value_hash));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum FruitKind {
        Unset,
        Apple,
        Banana,
    }

    impl UnsetDiscriminant for FruitKind {
        const UNSET: Self = FruitKind::Unset;
    }

    #[test]
    fn unset_is_the_default() {
        let fruit: OneOf<FruitKind, String> = OneOf::default();
        assert!(fruit.is_unset());
        assert_eq!(fruit.value(), None);
    }

    #[test]
    fn last_write_wins_on_the_wire_maps_to_last_set_call() {
        let mut fruit = OneOf::set(FruitKind::Apple, "Gala".to_string());
        fruit = OneOf::set(FruitKind::Banana, "Yellow".to_string());
        assert_eq!(fruit.kind(), FruitKind::Banana);
        assert_eq!(fruit.as_(), "Yellow");
    }

    #[test]
    fn equality_is_pairwise() {
        let a = OneOf::set(FruitKind::Apple, "Gala".to_string());
        let b = OneOf::set(FruitKind::Apple, "Gala".to_string());
        let c = OneOf::set(FruitKind::Apple, "Fuji".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_wrapper_normalizes_to_unset() {
        let oneof = OneOf::set(FruitKind::Apple, Some(0i32));
        let normalized = oneof.normalize_empty_wrapper(|v: &Option<i32>| v == &Some(0));
        assert!(normalized.is_unset());
    }
}
