//! Field kinds and values of a persistable model
//!
//! Every model field belongs to exactly one [`FieldKind`]. The kind is declared
//! once in the model's field table (see [`crate::Model::FIELDS`]) and drives both
//! encoding and decoding. The document itself never carries type tags.
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use serde_json::{Number, Value};

use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// A primitive value: the cell type of a [`Table`] and the member type of
/// sequences and sets
///
/// JSON integers become [`Scalar::Int`], all other JSON numbers become
/// [`Scalar::Float`]. Strings are never parsed into numbers.
#[derive(Debug, Clone, Default)]
pub enum Scalar {
    /// Missing value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Returns `true` for [`Scalar::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Returns the inner string slice, if `self` is a [`Scalar::Str`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of `Int` and `Float` scalars
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner value of a [`Scalar::Int`]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner value of a [`Scalar::Bool`]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts the scalar into its JSON form
    ///
    /// # Errors
    ///
    /// [`ModulonError::NonFiniteFloat`] for NaN and infinities, they have no
    /// JSON representation
    pub fn to_json(&self) -> ModulonResult<Value> {
        Ok(match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(n) => Value::Number(Number::from(*n)),
            Scalar::Float(n) => Value::Number(
                Number::from_f64(*n).ok_or(ModulonError::NonFiniteFloat(*n))?,
            ),
            Scalar::Str(s) => Value::String(s.clone()),
        })
    }

    /// Parses a JSON primitive into a `Scalar`
    ///
    /// # Errors
    ///
    /// [`ModulonError::SchemaMismatch`] if `value` is an array or an object
    pub fn from_json(value: &Value) -> ModulonResult<Scalar> {
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else {
                    // u64 above i64::MAX or a number with fraction/exponent
                    n.as_f64().map(Scalar::Float).ok_or_else(|| {
                        ModulonError::SchemaMismatch(format!("unrepresentable number {n}"))
                    })
                }
            }
            Value::String(s) => Ok(Scalar::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(ModulonError::SchemaMismatch(format!(
                "expected a primitive value, found {value}"
            ))),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

// Floats compare by bit pattern, which makes equality reflexive
impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(n) => n.hash(state),
            Scalar::Float(n) => n.to_bits().hash(state),
            Scalar::Str(s) => s.hash(state),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

/// An unordered, duplicate-free collection of [`Scalar`]s
pub type ScalarSet = HashSet<Scalar>;

/// The kind of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single primitive value
    Scalar,
    /// A row- and column-labeled [`Table`]
    Table,
    /// An ordered list of scalars
    Sequence,
    /// An unordered set of scalars
    Set,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Table => "table",
            FieldKind::Sequence => "sequence",
            FieldKind::Set => "set",
        };
        write!(f, "{name}")
    }
}

/// Static description of one identity field of a model
///
/// Only fields listed in a model's descriptor table are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
    required: bool,
}

impl FieldDescriptor {
    /// An optional field
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    /// A field that must be present to save or load a model
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// The name of the field, also the key in the persisted document
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The [`FieldKind`] of the field
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns `true` if the field must be present
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Borrowed view of a field value, handed out by [`crate::Model::field`]
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Scalar(&'a Scalar),
    Table(&'a Table),
    Sequence(&'a [Scalar]),
    Set(&'a ScalarSet),
}

impl FieldRef<'_> {
    /// The [`FieldKind`] of the value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldRef::Scalar(_) => FieldKind::Scalar,
            FieldRef::Table(_) => FieldKind::Table,
            FieldRef::Sequence(_) => FieldKind::Sequence,
            FieldRef::Set(_) => FieldKind::Set,
        }
    }
}

/// Owned, decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Table(Table),
    Sequence(Vec<Scalar>),
    Set(ScalarSet),
}

impl FieldValue {
    /// The [`FieldKind`] of the value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::Table(_) => FieldKind::Table,
            FieldValue::Sequence(_) => FieldKind::Sequence,
            FieldValue::Set(_) => FieldKind::Set,
        }
    }

    /// Borrows the value as a [`FieldRef`]
    pub fn as_field_ref(&self) -> FieldRef<'_> {
        match self {
            FieldValue::Scalar(v) => FieldRef::Scalar(v),
            FieldValue::Table(v) => FieldRef::Table(v),
            FieldValue::Sequence(v) => FieldRef::Sequence(v),
            FieldValue::Set(v) => FieldRef::Set(v),
        }
    }
}
