//! Converts model fields to JSON values and back
//!
//! The encoding of each [`FieldKind`]:
//!
//! | Kind | JSON |
//! | --- | --- |
//! | Scalar | the primitive itself |
//! | Table | `{"index": [...], "columns": [...], "data": [[...], ...]}` (row-major) |
//! | Sequence | array, in order |
//! | Set | array, arbitrary order |
//!
//! An absent optional field is written as `null`. The document carries no
//! type tags, the decoder resolves each key through [`Model::FIELDS`].
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{trace, warn};

use crate::field::{FieldDescriptor, FieldKind, FieldRef, FieldValue, Scalar, ScalarSet};
use crate::model::{Fields, Model};
use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// The raw, JSON-encoded fields of a persisted model
pub type FieldMap = Map<String, Value>;

/// Encodes all identity fields of `model`
///
/// The keys of the returned map are exactly the names in [`Model::FIELDS`],
/// in declaration order.
///
/// # Errors
///
/// - [`ModulonError::MissingRequiredData`]: A required field is absent
/// - [`ModulonError::SchemaMismatch`]: The model returned a value of a different
///   kind than its descriptor declares
/// - [`ModulonError::NonFiniteFloat`]: A value holds NaN or an infinity
pub fn encode<M: Model>(model: &M) -> ModulonResult<FieldMap> {
    let mut map = FieldMap::new();
    for desc in M::FIELDS {
        let value = match model.field(desc.name()) {
            None | Some(FieldRef::Scalar(Scalar::Null)) if desc.is_required() => {
                return Err(ModulonError::MissingRequiredData(desc.name().to_string()));
            }
            None => Value::Null,
            Some(field) => {
                if field.kind() != desc.kind() {
                    return Err(ModulonError::SchemaMismatch(format!(
                        "field {} is declared as {} but holds a {}",
                        desc.name(),
                        desc.kind(),
                        field.kind()
                    )));
                }
                encode_value(field).map_err(|err| {
                    warn!("cannot encode field {}: {err}", desc.name());
                    err
                })?
            }
        };
        trace!("encoded field {}", desc.name());
        map.insert(desc.name().to_string(), value);
    }
    Ok(map)
}

/// Encodes a single field value
///
/// # Errors
///
/// [`ModulonError::NonFiniteFloat`] if the value, a member or a cell is NaN or
/// an infinity
pub fn encode_value(field: FieldRef<'_>) -> ModulonResult<Value> {
    match field {
        FieldRef::Scalar(value) => value.to_json(),
        FieldRef::Table(table) => encode_table(table),
        FieldRef::Sequence(values) => encode_array(values.iter()),
        FieldRef::Set(values) => encode_array(values.iter()),
    }
}

fn encode_array<'a, I: Iterator<Item = &'a Scalar>>(values: I) -> ModulonResult<Value> {
    values
        .map(Scalar::to_json)
        .collect::<ModulonResult<Vec<Value>>>()
        .map(Value::Array)
}

fn encode_table(table: &Table) -> ModulonResult<Value> {
    let data = table
        .rows()
        .map(|row| encode_array(row.iter()))
        .collect::<ModulonResult<Vec<Value>>>()?;
    Ok(json!({
        "index": table.index(),
        "columns": table.columns(),
        "data": data,
    }))
}

/// Decodes a raw field map into construction arguments for `M`
///
/// Every value is decoded into the kind declared for its key. `null` values
/// are treated as absent. All fields are decoded before the result is
/// returned, nothing is handed to the model on failure.
///
/// # Errors
///
/// [`ModulonError::SchemaMismatch`] if
/// - the map contains a key that is not an identity field of `M`
/// - a value cannot be decoded into the declared kind
/// - a required field is missing or `null`
pub fn decode<M: Model>(map: FieldMap) -> ModulonResult<Fields> {
    let mut fields = Fields::new();
    for (name, value) in map {
        let desc = M::descriptor(&name).ok_or_else(|| {
            ModulonError::SchemaMismatch(format!("unknown field {name}"))
        })?;
        if value.is_null() {
            continue;
        }
        let decoded = decode_value(desc, value)?;
        fields.insert(name, decoded);
    }

    if let Some(missing) = M::FIELDS
        .iter()
        .find(|desc| desc.is_required() && !fields.contains(desc.name()))
    {
        return Err(ModulonError::SchemaMismatch(format!(
            "missing required field {}",
            missing.name()
        )));
    }
    Ok(fields)
}

/// Decodes a single JSON value into the kind declared by `desc`
///
/// # Errors
///
/// [`ModulonError::SchemaMismatch`] if the value does not have the shape of the
/// declared kind
pub fn decode_value(desc: &FieldDescriptor, value: Value) -> ModulonResult<FieldValue> {
    match desc.kind() {
        FieldKind::Scalar => Scalar::from_json(&value).map(FieldValue::Scalar),
        FieldKind::Table => decode_table(desc.name(), value).map(FieldValue::Table),
        FieldKind::Sequence => {
            let values = expect_array(desc.name(), value)?;
            Ok(FieldValue::Sequence(
                values
                    .iter()
                    .map(Scalar::from_json)
                    .collect::<ModulonResult<Vec<Scalar>>>()?,
            ))
        }
        FieldKind::Set => {
            let values = expect_array(desc.name(), value)?;
            Ok(FieldValue::Set(
                values
                    .iter()
                    .map(Scalar::from_json)
                    .collect::<ModulonResult<ScalarSet>>()?,
            ))
        }
    }
}

fn expect_array(name: &str, value: Value) -> ModulonResult<Vec<Value>> {
    match value {
        Value::Array(values) => Ok(values),
        other => Err(ModulonError::SchemaMismatch(format!(
            "field {name} must be an array, found {other}"
        ))),
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SplitTable {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
}

fn decode_table(name: &str, value: Value) -> ModulonResult<Table> {
    let split: SplitTable = serde_json::from_value(value)
        .map_err(|err| ModulonError::SchemaMismatch(format!("field {name} is not a table: {err}")))?;

    let rows = split
        .data
        .iter()
        .map(|row| row.iter().map(Scalar::from_json).collect())
        .collect::<ModulonResult<Vec<Vec<Scalar>>>>()?;

    Table::from_rows(split.index, split.columns, rows).map_err(|err| {
        ModulonError::SchemaMismatch(format!("field {name} is not a valid table: {err}"))
    })
}
