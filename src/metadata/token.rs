//! Tokens identifying the types of a binding runtime.

use std::fmt;

/// A metadata token identifying a type or a member in the binding runtime.
///
/// Tokens follow the ECMA-335 layout:
/// - The high byte (bits 24-31) indicates the table the entity lives in
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// Types defined through a [`crate::metadata::typesystem::TypeRegistry`] receive `TypeDef`
/// tokens (`0x02xxxxxx`), assigned in definition order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Table id of type definitions
    pub const TABLE_TYPEDEF: u8 = 0x02;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table id and a row index
    ///
    /// Row indices are truncated to 24 bits.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Creates a `TypeDef` token for the given row
    #[must_use]
    pub fn type_def(row: u32) -> Self {
        Self::from_parts(Self::TABLE_TYPEDEF, row)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token points into the `TypeDef` table
    #[must_use]
    pub fn is_type_def(&self) -> bool {
        self.table() == Self::TABLE_TYPEDEF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
