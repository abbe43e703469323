//! Field descriptors and bit packing
//!
//! A field is a named, contiguous bit range inside a register word. The mask
//! is derived once when the descriptor is built; packing and unpacking only
//! shift and mask.

use crate::error::{FieldError, FieldResult};

/// Mask covering `width` bits starting at `offset`.
///
/// Zero-width or out-of-word fields produce a truncated mask; such fields are
/// rejected by [`RegisterMap::build`](crate::map::RegisterMap::build).
const fn field_mask(offset: u8, width: u8) -> u64 {
    if width == 0 || offset >= 64 {
        return 0;
    }
    max_for_width(width) << offset
}

/// Largest value representable in `width` bits.
const fn max_for_width(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Immutable metadata for one named field of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDescriptor {
    name: &'static str,
    offset: u8,
    width: u8,
    mask: u64,
}

impl FieldDescriptor {
    /// Declare a field of `width` bits whose least-significant bit is `offset`
    ///
    /// Usable in `const` register tables:
    ///
    /// ```ignore
    /// const DB_ID: FieldDescriptor = FieldDescriptor::new("DbIdVal", 0, 16);
    /// ```
    pub const fn new(name: &'static str, offset: u8, width: u8) -> Self {
        Self {
            name,
            offset,
            width,
            mask: field_mask(offset, width),
        }
    }

    /// Declare a single-bit field
    pub const fn bit(name: &'static str, offset: u8) -> Self {
        Self::new(name, offset, 1)
    }

    /// Symbolic field name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Bit position of the least-significant bit
    pub const fn offset(&self) -> u8 {
        self.offset
    }

    /// Field width in bits
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Mask selecting the field's bits within the register word
    pub const fn mask(&self) -> u64 {
        self.mask
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u64 {
        max_for_width(self.width)
    }

    /// Whether the field is non-empty and ends within a `bits`-wide word
    pub(crate) const fn fits(&self, bits: u8) -> bool {
        self.width != 0 && (self.offset as u16 + self.width as u16) <= bits as u16
    }

    /// Whether this field shares any bit with `other`
    pub const fn overlaps(&self, other: &FieldDescriptor) -> bool {
        self.mask & other.mask != 0
    }

    /// Extract the field value from a register word
    #[inline]
    pub const fn unpack(&self, word: u64) -> u64 {
        match (word & self.mask).checked_shr(self.offset as u32) {
            Some(value) => value,
            None => 0,
        }
    }

    /// Shift and mask `value` into the field's position
    ///
    /// Fails when `value` needs more bits than the field provides.
    #[inline]
    pub const fn pack(&self, value: u64) -> FieldResult<u64> {
        let max = self.max_value();
        if value > max {
            return Err(FieldError::ValueOutOfRange {
                field: self.name,
                value,
                max,
            });
        }
        match value.checked_shl(self.offset as u32) {
            Some(bits) => Ok(bits & self.mask),
            None => Ok(0),
        }
    }

    /// Replace the field's bits in `word` with `value`, leaving all other bits
    #[inline]
    pub const fn insert(&self, word: u64, value: u64) -> FieldResult<u64> {
        match self.pack(value) {
            Ok(bits) => Ok((word & !self.mask) | bits),
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
