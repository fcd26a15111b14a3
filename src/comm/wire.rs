//! Fixed, little-endian wire types for the index handshake and value traffic.
//!
//! All multi-byte integers in these structs are **little-endian** on the wire.
//! We store them pre-LE with `.to_le()` and decode with `.from_le()`. Value
//! blocks travel as the raw bytes of their `Pod` representation; both sides
//! of a channel must be built for the same block type.

use bytemuck::{Pod, Zeroable};
use std::mem::size_of;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Count of following records.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// A global row index (u64) carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireGlobal {
    pub id_le: u64,
}

impl WireGlobal {
    pub fn of(id: u64) -> Self {
        Self { id_le: id.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.id_le)
    }
}

// ===== Compile-time sanity checks =========================================

const _: () = {
    // Pod/Zeroable ensures no padding contains uninit when cast to bytes.
    assert!(size_of::<WireCount>() == 4);
    assert!(size_of::<WireGlobal>() == 8);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_count() {
        let c = WireCount::new(7);
        let bytes: Vec<u8> = cast_slice(std::slice::from_ref(&c)).to_vec();
        let mut out = WireCount::zeroed();
        cast_slice_mut(std::slice::from_mut(&mut out)).copy_from_slice(&bytes);
        assert_eq!(out.get(), 7);
    }

    #[test]
    fn roundtrip_globals() {
        let v = vec![WireGlobal::of(1), WireGlobal::of(u64::MAX)];
        let bytes: Vec<u8> = cast_slice(&v).to_vec();
        let mut out = vec![WireGlobal::zeroed(); v.len()];
        cast_slice_mut(&mut out).copy_from_slice(&bytes);
        assert_eq!(out[0].get(), 1);
        assert_eq!(out[1].get(), u64::MAX);
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(WireCount, u32);
    assert_eq_size!(WireGlobal, u64);
}
