//! numpy-style dynamic dtype tags for `Array`.

/// A dynamically tagged element type, named after numpy's one-letter-plus-size codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    I1,
    I2,
    I4,
    I8,
    U1,
    U2,
    U4,
    U8,
    F4,
    F8,
    C8,
    C16,
}

impl Dtype {
    /// Size in bytes of one element.
    pub fn size(self) -> usize {
        match self {
            Dtype::I1 | Dtype::U1 => 1,
            Dtype::I2 | Dtype::U2 => 2,
            Dtype::I4 | Dtype::U4 | Dtype::F4 => 4,
            Dtype::I8 | Dtype::U8 | Dtype::F8 | Dtype::C8 => 8,
            Dtype::C16 => 16,
        }
    }

    /// The numpy `.npy` header dtype string (little-endian), e.g. `"<f8"`.
    pub fn npy_descr(self) -> &'static str {
        match self {
            Dtype::I1 => "|i1",
            Dtype::I2 => "<i2",
            Dtype::I4 => "<i4",
            Dtype::I8 => "<i8",
            Dtype::U1 => "|u1",
            Dtype::U2 => "<u2",
            Dtype::U4 => "<u4",
            Dtype::U8 => "<u8",
            Dtype::F4 => "<f4",
            Dtype::F8 => "<f8",
            Dtype::C8 => "<c8",
            Dtype::C16 => "<c16",
        }
    }
}
