//! Register descriptors
//!
//! A register is a fixed-width word at an offset from a device's base
//! address, decomposed into [`FieldDescriptor`]s. The write mask is the union
//! of all field masks; everything else is reserved.

use super::field::FieldDescriptor;

// =============================================================================
// Register Width
// =============================================================================

/// Width of a register word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterWidth {
    /// 8-bit register
    Bits8,
    /// 16-bit register
    Bits16,
    /// 32-bit register
    #[default]
    Bits32,
    /// 64-bit register
    Bits64,
}

impl RegisterWidth {
    /// Width in bits
    pub const fn bits(self) -> u8 {
        match self {
            RegisterWidth::Bits8 => 8,
            RegisterWidth::Bits16 => 16,
            RegisterWidth::Bits32 => 32,
            RegisterWidth::Bits64 => 64,
        }
    }

    /// Width in bytes
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Mask covering every bit of the word
    pub const fn mask(self) -> u64 {
        match self {
            RegisterWidth::Bits8 => 0xFF,
            RegisterWidth::Bits16 => 0xFFFF,
            RegisterWidth::Bits32 => 0xFFFF_FFFF,
            RegisterWidth::Bits64 => u64::MAX,
        }
    }
}

// =============================================================================
// Register Descriptor
// =============================================================================

/// Immutable metadata for one register
///
/// Built in `const` tables and validated once by
/// [`RegisterMap::build`](super::RegisterMap::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDescriptor<'a> {
    name: &'static str,
    address: usize,
    width: RegisterWidth,
    write_mask: u64,
    fields: &'a [FieldDescriptor],
}

impl<'a> RegisterDescriptor<'a> {
    /// Declare a register at `address` (relative to the device base)
    ///
    /// ```ignore
    /// const DB_ID_FIELDS: [FieldDescriptor; 2] = [
    ///     FieldDescriptor::new("DbIdVal", 0, 16),
    ///     FieldDescriptor::bit("SlotIdVal", 16),
    /// ];
    /// const DB_ID: RegisterDescriptor<'static> =
    ///     RegisterDescriptor::new("DaughterboardId", 0x630, RegisterWidth::Bits32, &DB_ID_FIELDS);
    /// ```
    pub const fn new(
        name: &'static str,
        address: usize,
        width: RegisterWidth,
        fields: &'a [FieldDescriptor],
    ) -> Self {
        let mut write_mask = 0u64;
        let mut i = 0;
        while i < fields.len() {
            write_mask |= fields[i].mask();
            i += 1;
        }
        Self {
            name,
            address,
            width,
            write_mask,
            fields,
        }
    }

    /// Symbolic register name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Offset from the device base address
    pub const fn address(&self) -> usize {
        self.address
    }

    /// Register word width
    pub const fn width(&self) -> RegisterWidth {
        self.width
    }

    /// Union of all field masks
    pub const fn write_mask(&self) -> u64 {
        self.write_mask
    }

    /// Bits of the word not covered by any field
    pub const fn reserved_mask(&self) -> u64 {
        self.width.mask() & !self.write_mask
    }

    /// Fields in declaration order
    pub const fn fields(&self) -> &'a [FieldDescriptor] {
        self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&'a FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Iterate over the fields in declaration order
    pub fn list_fields(&self) -> core::slice::Iter<'a, FieldDescriptor> {
        self.fields.iter()
    }

    /// Decode every field of `word`, in declaration order
    pub fn decode(&self, word: u64) -> impl Iterator<Item = (&'a FieldDescriptor, u64)> + use<'a> {
        let fields: &'a [FieldDescriptor] = self.fields;
        fields.iter().map(move |f| (f, f.unpack(word)))
    }
}

/// Iterate over the fields of `register` in declaration order
pub fn list_fields<'a>(register: &RegisterDescriptor<'a>) -> core::slice::Iter<'a, FieldDescriptor> {
    register.list_fields()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    const CONTROL_FIELDS: [FieldDescriptor; 3] = [
        FieldDescriptor::bit("TxEnable", 0),
        FieldDescriptor::bit("RxEnable", 1),
        FieldDescriptor::new("Gain", 8, 6),
    ];

    const CONTROL: RegisterDescriptor<'static> =
        RegisterDescriptor::new("Control", 0x10, RegisterWidth::Bits16, &CONTROL_FIELDS);

    #[test]
    fn width_helpers() {
        assert_eq!(RegisterWidth::Bits8.bits(), 8);
        assert_eq!(RegisterWidth::Bits16.bytes(), 2);
        assert_eq!(RegisterWidth::Bits32.mask(), 0xFFFF_FFFF);
        assert_eq!(RegisterWidth::Bits64.mask(), u64::MAX);
        assert_eq!(RegisterWidth::default(), RegisterWidth::Bits32);
    }

    #[test]
    fn write_mask_is_union_of_fields() {
        assert_eq!(CONTROL.write_mask(), 0x3F03);
        assert_eq!(CONTROL.reserved_mask(), 0xC0FC);
    }

    #[test]
    fn register_without_fields_is_fully_reserved() {
        let r = RegisterDescriptor::new("Scratch", 0, RegisterWidth::Bits8, &[]);
        assert_eq!(r.write_mask(), 0);
        assert_eq!(r.reserved_mask(), 0xFF);
    }

    #[test]
    fn field_lookup_by_name() {
        assert_eq!(CONTROL.field("Gain").map(FieldDescriptor::offset), Some(8));
        assert!(CONTROL.field("Missing").is_none());
    }

    #[test]
    fn fields_enumerate_in_declaration_order() {
        let names: Vec<_> = list_fields(&CONTROL).map(FieldDescriptor::name).collect();
        assert_eq!(names, ["TxEnable", "RxEnable", "Gain"]);
    }

    #[test]
    fn decode_splits_word_into_fields() {
        let decoded: Vec<_> = CONTROL.decode(0x2A02).map(|(f, v)| (f.name(), v)).collect();
        assert_eq!(decoded, [("TxEnable", 0), ("RxEnable", 1), ("Gain", 0x2A)]);
    }
}
