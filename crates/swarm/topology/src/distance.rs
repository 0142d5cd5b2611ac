use std::cmp::Ordering;

use meridian_swarm_peer::{AddressRecord, Identifier};

fn byte_at(id: &Identifier, index: usize) -> u8 {
    id.as_bytes().get(index).copied().unwrap_or(0)
}

/// XOR distance between two identifiers, as big-endian bytes.
///
/// The result is as long as the longer identifier.
pub fn distance(a: &Identifier, b: &Identifier) -> Vec<u8> {
    let len = a.len().max(b.len());
    (0..len).map(|i| byte_at(a, i) ^ byte_at(b, i)).collect()
}

/// Compare how close `a` and `b` are to `target`.
///
/// Returns `Less` when `a` is closer. Ties fall back to identifier bytes.
pub fn distance_cmp(target: &Identifier, a: &Identifier, b: &Identifier) -> Ordering {
    let len = target.len().max(a.len()).max(b.len());
    (0..len)
        .map(|i| {
            let t = byte_at(target, i);
            (t ^ byte_at(a, i)).cmp(&(t ^ byte_at(b, i)))
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Sort records closest-first to `target`.
pub fn sort_by_distance(target: &Identifier, records: &mut [AddressRecord]) {
    records.sort_by(|a, b| distance_cmp(target, a.identifier(), b.identifier()));
}
