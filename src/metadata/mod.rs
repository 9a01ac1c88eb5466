//! Declarations, descriptors and types of bodyless members.
//!
//! Everything in this module is fixed once a type is defined: the tokens identifying types, the
//! descriptors identifying member accessors, and the types themselves.

pub mod member;
pub mod token;
pub mod typesystem;
