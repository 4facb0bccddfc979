//! Fast-hashing collection aliases, reused wherever the engine needs a
//! map/set keyed by broker ticket, cycle id, or account id and doesn't
//! need cryptographic hash resistance.

/// An [`indexmap::IndexMap`] using the (non-DoS-resistant, but fast) FNV
/// hasher. Appropriate here because keys are broker-issued/internal ids,
/// never attacker-controlled input.
pub type FnvIndexMap<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

/// An [`indexmap::IndexSet`] using the FNV hasher.
pub type FnvIndexSet<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;
