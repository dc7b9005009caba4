/// Opaque 64-bit table payload.
///
/// Tables are homogeneous: every value in one table is read back with the
/// accessor matching the constructor it was stored with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Value(u64);

impl Value {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn from_i32(v: i32) -> Self {
        Self(v as i64 as u64)
    }

    pub const fn from_i64(v: i64) -> Self {
        Self(v as u64)
    }

    pub const fn from_u32(v: u32) -> Self {
        Self(v as u64)
    }

    pub const fn from_u64(v: u64) -> Self {
        Self(v)
    }

    pub const fn from_bool(v: bool) -> Self {
        Self(v as u64)
    }

    pub fn from_f32(v: f32) -> Self {
        Self(v.to_bits() as u64)
    }

    pub fn from_f64(v: f64) -> Self {
        Self(v.to_bits())
    }

    /// Stores an index or handle, the stand-in for a raw pointer.
    pub const fn from_ptr(v: usize) -> Self {
        Self(v as u64)
    }

    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }

    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn as_bool(self) -> bool {
        self.0 != 0
    }

    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }

    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    pub const fn as_ptr(self) -> usize {
        self.0 as usize
    }
}
