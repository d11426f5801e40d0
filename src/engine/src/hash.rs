//! Fast hasher for the 128-bit UUID keys of the global state map.
//!
//! The map is probed once per trail inside the single critical section
//! guarding cross-store state, so a cheaper hash than the default
//! SipHash is a direct win; correctness never depends on which hasher is
//! used, only throughput does.

use std::hash::Hasher;

use smallvec::SmallVec;

/// A `Hasher` that buffers the bytes fed to it (a `Uuid` writes its 16
/// raw bytes in one call) and finishes with a single xxh64 pass.
#[derive(Default)]
pub struct UuidHasher {
    buf: SmallVec<[u8; 16]>,
}

impl Hasher for UuidHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn finish(&self) -> u64 {
        xxhash_rust::xxh64::xxh64(&self.buf, 0)
    }
}

pub type UuidBuildHasher = std::hash::BuildHasherDefault<UuidHasher>;
pub type UuidMap<V> = std::collections::HashMap<trck_store::Uuid, V, UuidBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use trck_store::Uuid;

    #[test]
    fn same_uuid_hashes_the_same_way_twice() {
        let mut map: UuidMap<u32> = UuidMap::default();
        map.insert(Uuid(42), 1);
        assert_eq!(map.get(&Uuid(42)), Some(&1));
    }

    #[test]
    fn distinct_uuids_do_not_collide_in_practice() {
        let mut map: UuidMap<u32> = UuidMap::default();
        for i in 0..1000u128 {
            map.insert(Uuid(i), i as u32);
        }
        assert_eq!(map.len(), 1000);
        assert_eq!(map.get(&Uuid(500)), Some(&500));
    }
}
