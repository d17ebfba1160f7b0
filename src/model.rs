//! The construction contract of a persistable model
//!
//! A model declares its identity fields statically in [`Model::FIELDS`]. Only
//! these fields are written to a document, and only these fields are accepted
//! when a document is loaded. Derived or cached attributes of a model are simply
//! not listed.
use std::collections::HashMap;

use crate::field::{FieldDescriptor, FieldKind, FieldRef, FieldValue, Scalar, ScalarSet};
use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// A model that can be saved to and loaded from a JSON document
///
/// # Examples
///
/// ```
/// use modulon::{FieldDescriptor, FieldKind, FieldRef, Fields, Model, ModulonResult, Table};
///
/// struct Weights {
///     m: Table,
///     cutoff: modulon::Scalar,
/// }
///
/// impl Model for Weights {
///     const FIELDS: &'static [FieldDescriptor] = &[
///         FieldDescriptor::required("M", FieldKind::Table),
///         FieldDescriptor::optional("cutoff", FieldKind::Scalar),
///     ];
///
///     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
///         match name {
///             "M" => Some(FieldRef::Table(&self.m)),
///             "cutoff" => Some(FieldRef::Scalar(&self.cutoff)),
///             _ => None,
///         }
///     }
///
///     fn from_fields(mut fields: Fields) -> ModulonResult<Self> {
///         Ok(Weights {
///             m: fields.take_required_table("M")?,
///             cutoff: fields.take_scalar("cutoff")?,
///         })
///     }
/// }
///
/// assert_eq!(Weights::descriptor("M").unwrap().kind(), FieldKind::Table);
/// assert!(Weights::descriptor("m_binarized").is_none());
/// ```
pub trait Model: Sized {
    /// The identity fields of the model
    ///
    /// This table is the single source of truth for the persisted document.
    const FIELDS: &'static [FieldDescriptor];

    /// Returns the current value of the identity field `name`
    ///
    /// `None` means the field is absent. It is written as `null`, unless the
    /// field is required.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Constructs the model from decoded fields
    ///
    /// # Errors
    ///
    /// Implementations return [`ModulonError::SchemaMismatch`] if a field
    /// cannot be used
    fn from_fields(fields: Fields) -> ModulonResult<Self>;

    /// Returns the descriptor of the identity field `name`
    fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|desc| desc.name() == name)
    }
}

/// Decoded construction arguments of a [`Model`]
///
/// Produced by [`crate::persist::decode`]. Every value already has the kind its
/// descriptor declares, so the typed `take_*` methods only fail when a
/// `Fields` was assembled by hand with mismatching kinds.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fields {
    inner: HashMap<String, FieldValue>,
}

impl Fields {
    /// Creates an empty set of fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field
    pub fn insert<K: Into<String>>(&mut self, name: K, value: FieldValue) -> Option<FieldValue> {
        self.inner.insert(name.into(), value)
    }

    /// Returns the field `name`
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.inner.get(name)
    }

    /// Removes and returns the field `name`
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.inner.remove(name)
    }

    /// Returns `true` if the field `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no field is present
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates all present field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Removes and returns the [`Table`] field `name`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field is not a table
    pub fn take_table(&mut self, name: &str) -> ModulonResult<Option<Table>> {
        match self.take(name) {
            None => Ok(None),
            Some(FieldValue::Table(table)) => Ok(Some(table)),
            Some(other) => Err(wrong_kind(name, FieldKind::Table, &other)),
        }
    }

    /// Removes and returns the [`Table`] field `name`, which must be present
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field is absent or not a table
    pub fn take_required_table(&mut self, name: &str) -> ModulonResult<Table> {
        self.take_table(name)?
            .ok_or_else(|| ModulonError::SchemaMismatch(format!("missing required field {name}")))
    }

    /// Removes and returns the [`Scalar`] field `name`
    ///
    /// An absent field is returned as [`Scalar::Null`]
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field is not a scalar
    pub fn take_scalar(&mut self, name: &str) -> ModulonResult<Scalar> {
        match self.take(name) {
            None => Ok(Scalar::Null),
            Some(FieldValue::Scalar(value)) => Ok(value),
            Some(other) => Err(wrong_kind(name, FieldKind::Scalar, &other)),
        }
    }

    /// Removes the boolean field `name`, `None` if it is absent or `null`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field holds anything but a boolean
    pub fn take_bool(&mut self, name: &str) -> ModulonResult<Option<bool>> {
        match self.take_scalar(name)? {
            Scalar::Null => Ok(None),
            Scalar::Bool(b) => Ok(Some(b)),
            other => Err(ModulonError::SchemaMismatch(format!(
                "field {name} must be a boolean, found {other}"
            ))),
        }
    }

    /// Removes the string field `name`, `None` if it is absent or `null`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field holds anything but a string
    pub fn take_str(&mut self, name: &str) -> ModulonResult<Option<String>> {
        match self.take_scalar(name)? {
            Scalar::Null => Ok(None),
            Scalar::Str(s) => Ok(Some(s)),
            other => Err(ModulonError::SchemaMismatch(format!(
                "field {name} must be a string, found {other}"
            ))),
        }
    }

    /// Removes and returns the sequence field `name`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field is not a sequence
    pub fn take_sequence(&mut self, name: &str) -> ModulonResult<Option<Vec<Scalar>>> {
        match self.take(name) {
            None => Ok(None),
            Some(FieldValue::Sequence(values)) => Ok(Some(values)),
            Some(other) => Err(wrong_kind(name, FieldKind::Sequence, &other)),
        }
    }

    /// Removes and returns the set field `name`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if the field is not a set
    pub fn take_set(&mut self, name: &str) -> ModulonResult<Option<ScalarSet>> {
        match self.take(name) {
            None => Ok(None),
            Some(FieldValue::Set(values)) => Ok(Some(values)),
            Some(other) => Err(wrong_kind(name, FieldKind::Set, &other)),
        }
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

fn wrong_kind(name: &str, expected: FieldKind, found: &FieldValue) -> ModulonError {
    ModulonError::SchemaMismatch(format!(
        "field {name} must be a {expected}, found a {}",
        found.kind()
    ))
}
