//! Registry of the types defined in one runtime.
//!
//! This module provides the [`TypeRegistry`], the thread-safe store of every [`BindType`] a
//! [`crate::runtime::BindingRuntime`] defined. It hands out the tokens identifying types and
//! enforces unique full names.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: Primary index using type tokens (`SkipMap`)
//! - **Name-based lookup**: Secondary index by full name (`DashMap`)
//! - **Definition order**: Append-only log of definitions (`boxcar::Vec`)
//!
//! # Thread Safety
//!
//! - Lock-free data structures for primary storage and the definition log
//! - Concurrent hash map for the name index, whose entry API arbitrates name collisions
//! - Atomic operations for token generation
//!
//! # Identity
//!
//! Tokens are only unique within one registry. Every registry additionally draws a process-unique
//! id, which descriptors carry next to the owning token, so equally numbered types of two runtimes
//! never compare equal.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        token::Token,
        typesystem::{BindType, BindTypeRc},
    },
    Error, Result,
};

/// Highest row a `TypeDef` token can address
const MAX_ROW: u32 = 0x00FF_FFFF;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// All types of one runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// # fn example(runtime: &BindingRuntime) {
/// if let Some(document) = runtime.types().get_by_fullname("App.Document") {
///     println!("{} is {}", document.fullname(), document.token());
/// }
///
/// for ty in runtime.types().iter() {
///     println!("defined: {}", ty.fullname());
/// }
/// # }
/// ```
pub struct TypeRegistry {
    /// Process-unique id of this registry
    id: u64,
    /// Primary storage, by token
    types: SkipMap<Token, BindTypeRc>,
    /// Next free row in the type table
    next_row: AtomicU32,
    /// Full name to token
    types_by_fullname: DashMap<String, Token>,
    /// Types in the order they were defined
    definitions: boxcar::Vec<BindTypeRc>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            types: SkipMap::new(),
            next_row: AtomicU32::new(1),
            types_by_fullname: DashMap::new(),
            definitions: boxcar::Vec::new(),
        }
    }

    /// The process-unique id of this registry
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allocate the token of a new type.
    ///
    /// # Errors
    /// Returns [`Error::TypeTableFull`] once every 24-bit row is taken.
    pub(crate) fn next_token(&self) -> Result<Token> {
        self.next_row
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |row| {
                (row <= MAX_ROW).then_some(row + 1)
            })
            .map(Token::type_def)
            .map_err(|_| Error::TypeTableFull(MAX_ROW))
    }

    /// Register a newly defined type.
    ///
    /// # Errors
    /// Returns [`Error::TypeInsert`] if the full name or the token is already taken.
    pub(crate) fn insert(&self, new_type: &BindTypeRc) -> Result<()> {
        let fullname = new_type.fullname();
        match self.types_by_fullname.entry(fullname) {
            Entry::Occupied(existing) => {
                return Err(Error::TypeInsert(format!(
                    "{} is already defined as {}",
                    existing.key(),
                    existing.get()
                )));
            }
            Entry::Vacant(slot) => {
                if self.types.contains_key(&new_type.token()) {
                    return Err(Error::TypeInsert(format!(
                        "token {} is already taken",
                        new_type.token()
                    )));
                }
                slot.insert(new_type.token());
            }
        }

        self.types.insert(new_type.token(), new_type.clone());
        self.definitions.push(new_type.clone());
        Ok(())
    }

    /// Look up a type by token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<BindTypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Look up a type by namespace-qualified name
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<BindTypeRc> {
        let token = *self.types_by_fullname.get(fullname)?;
        self.get(&token)
    }

    /// Returns `true` if `ty` is registered here (and not merely an equally named type of another
    /// runtime)
    #[must_use]
    pub fn contains(&self, ty: &BindType) -> bool {
        self.types
            .get(&ty.token())
            .is_some_and(|entry| std::ptr::eq(entry.value().as_ref(), ty))
    }

    /// Number of defined types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type was defined yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all types in definition order
    pub fn iter(&self) -> impl Iterator<Item = &BindTypeRc> {
        self.definitions.iter().map(|(_, ty)| ty)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BindingConfig,
        metadata::typesystem::TypeBuilder,
        runtime::BindingRuntime,
    };

    #[test]
    fn test_lookup() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let first = TypeBuilder::new("App", "First").define(&runtime).unwrap();
        let second = TypeBuilder::new("", "Second")
            .extends(&first)
            .define(&runtime)
            .unwrap();

        let registry = runtime.types();
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());

        let found = registry.get_by_fullname("App.First").unwrap();
        assert!(std::sync::Arc::ptr_eq(&found, &first));
        assert!(registry.get_by_fullname("Second").is_some());
        assert!(registry.get(&second.token()).is_some());
        assert!(registry.contains(&second));
        assert!(registry.get_by_fullname("App.Missing").is_none());

        let order: Vec<String> = registry.iter().map(|ty| ty.fullname()).collect();
        assert_eq!(order, vec!["App.First".to_string(), "Second".to_string()]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        TypeBuilder::new("App", "Twice").define(&runtime).unwrap();
        let result = TypeBuilder::new("App", "Twice").define(&runtime);
        assert!(matches!(result, Err(Error::TypeInsert(_))));
        assert_eq!(runtime.types().len(), 1);
    }

    #[test]
    fn test_tokens_are_unique() {
        let registry = TypeRegistry::new();
        let first = registry.next_token().unwrap();
        let second = registry.next_token().unwrap();
        assert_ne!(first, second);
        assert!(first.is_type_def());
        assert_eq!(first.row() + 1, second.row());
    }

    #[test]
    fn test_exhausted_type_table() {
        let registry = TypeRegistry::new();
        registry.next_row.store(MAX_ROW, Ordering::Relaxed);

        let last = registry.next_token().unwrap();
        assert_eq!(last.row(), MAX_ROW);
        assert_eq!(registry.next_token(), Err(Error::TypeTableFull(MAX_ROW)));
        assert_eq!(registry.next_token(), Err(Error::TypeTableFull(MAX_ROW)));
    }

    #[test]
    fn test_registry_ids_are_unique() {
        let one = TypeRegistry::new();
        let other = TypeRegistry::new();
        assert_ne!(one.id(), other.id());
    }

    #[test]
    fn test_foreign_type_not_contained() {
        let one = BindingRuntime::new(BindingConfig::default());
        let other = BindingRuntime::new(BindingConfig::default());
        let ty = TypeBuilder::new("App", "Shared").define(&one).unwrap();
        TypeBuilder::new("App", "Shared").define(&other).unwrap();

        assert!(one.types().contains(&ty));
        assert!(!other.types().contains(&ty));
    }
}
