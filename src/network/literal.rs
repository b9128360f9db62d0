use std::fmt;
use std::ops::{BitXor, BitXorAssign, Not};

/// Representation of a literal (a variable or its complement)
///
/// Encoded as `2 * var + inversion`, as in the AIGER format.
/// Variable 0 is the constant false: literal 0 is false and literal 1 is true.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Lit {
    a: u32,
}

impl Lit {
    /// Constant zero literal
    pub fn zero() -> Lit {
        Lit { a: 0 }
    }

    /// Constant one literal
    pub fn one() -> Lit {
        Lit { a: 1 }
    }

    /// Create a positive literal from a variable index
    pub fn from_var(v: usize) -> Lit {
        debug_assert!(v <= (u32::MAX >> 1) as usize, "Variable {v} cannot be addressed");
        Lit { a: (v as u32) << 1 }
    }

    /// Create a literal from its raw AIGER encoding
    pub fn from_raw(a: u32) -> Lit {
        Lit { a }
    }

    /// Obtain the variable index addressed by the literal
    pub fn var(&self) -> usize {
        (self.a >> 1) as usize
    }

    /// Returns true if the literal is one of the two constants
    pub fn is_constant(&self) -> bool {
        self.a >> 1 == 0
    }

    /// Returns true if the literal is complemented
    pub fn is_inverted(&self) -> bool {
        self.a & 1 != 0
    }

    /// Clear the inversion, if set
    pub fn without_inversion(&self) -> Lit {
        Lit { a: self.a & !1u32 }
    }

    /// Return the raw AIGER encoding of the literal
    pub fn raw(&self) -> u32 {
        self.a
    }
}

impl From<bool> for Lit {
    fn from(b: bool) -> Lit {
        if b {
            Lit::one()
        } else {
            Lit::zero()
        }
    }
}

impl Not for Lit {
    type Output = Lit;
    fn not(self) -> Lit {
        Lit { a: self.a ^ 1u32 }
    }
}

impl Not for &'_ Lit {
    type Output = Lit;
    fn not(self) -> Lit {
        Lit { a: self.a ^ 1u32 }
    }
}

impl BitXorAssign<bool> for Lit {
    fn bitxor_assign(&mut self, rhs: bool) {
        self.a ^= rhs as u32;
    }
}

impl BitXor<bool> for Lit {
    type Output = Lit;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut l = self;
        l ^= rhs;
        l
    }
}

impl BitXor<bool> for &'_ Lit {
    type Output = Lit;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut l = *self;
        l ^= rhs;
        l
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inverted() {
            write!(f, "!")?;
        }
        write!(f, "{}", self.var())
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
