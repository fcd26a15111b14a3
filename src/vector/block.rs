//! Fixed-size numeric row blocks.

use bytemuck::Pod;

/// A fixed-size numeric block stored per row and shipped verbatim on the wire.
///
/// The `Pod` bound pins the memory layout so peer processes agree on the byte
/// representation; `add_assign` is the element-wise accumulation used by the
/// additive merge policies. Zero initialization comes from
/// [`Zeroable`](bytemuck::Zeroable), which `Pod` implies.
pub trait Block: Pod + Send + Sync + 'static {
    /// Element-wise `self += rhs`.
    fn add_assign(&mut self, rhs: &Self);
}

impl Block for f32 {
    #[inline]
    fn add_assign(&mut self, rhs: &Self) {
        *self += *rhs;
    }
}

impl Block for f64 {
    #[inline]
    fn add_assign(&mut self, rhs: &Self) {
        *self += *rhs;
    }
}

/// Blocks of several unknowns per row, e.g. pressure plus compositions.
impl<S: Block, const N: usize> Block for [S; N] {
    #[inline]
    fn add_assign(&mut self, rhs: &Self) {
        for (a, b) in self.iter_mut().zip(rhs.iter()) {
            a.add_assign(b);
        }
    }
}
