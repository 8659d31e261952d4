//! Value rendering helpers
//!
//! Log lines and error messages show column values the way a person would
//! write them (`1`, `"alice"`, `NULL`) rather than the ORM's debug form.

use sea_orm::{ActiveModelTrait, ActiveValue, EntityTrait, IdenStatic, Iterable, ModelTrait, PrimaryKeyToColumn, Value};

fn render_opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "NULL".to_string(), ToString::to_string)
}

/// Render a single column value for log output
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Bool(v) => render_opt(v),
        Value::TinyInt(v) => render_opt(v),
        Value::SmallInt(v) => render_opt(v),
        Value::Int(v) => render_opt(v),
        Value::BigInt(v) => render_opt(v),
        Value::TinyUnsigned(v) => render_opt(v),
        Value::SmallUnsigned(v) => render_opt(v),
        Value::Unsigned(v) => render_opt(v),
        Value::BigUnsigned(v) => render_opt(v),
        Value::Float(v) => render_opt(v),
        Value::Double(v) => render_opt(v),
        Value::Char(v) => v.map_or_else(|| "NULL".to_string(), |c| format!("{:?}", c)),
        Value::String(v) => v.as_ref().map_or_else(|| "NULL".to_string(), |s| format!("{:?}", s)),
        other => format!("{:?}", other),
    }
}

/// Describe the fields a caller asked to write, e.g. `{username: "alice", name: NULL}`
///
/// Only `Set` fields are included; `Unchanged` and `NotSet` fields were not
/// part of the attempted data.
pub fn describe_active_model<A>(model: &A) -> String
where
    A: ActiveModelTrait,
{
    let fields: Vec<String> = <<A::Entity as EntityTrait>::Column as Iterable>::iter()
        .filter_map(|column| match model.get(column) {
            ActiveValue::Set(value) => Some(format!("{}: {}", column.as_str(), render_value(&value))),
            _ => None,
        })
        .collect();

    format!("{{{}}}", fields.join(", "))
}

/// Primary key column names and their values for a model instance
pub fn primary_key_values<M>(model: &M) -> Vec<(String, Value)>
where
    M: ModelTrait,
{
    <<M::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
        .map(|key| {
            let column = key.into_column();
            (column.as_str().to_string(), model.get(column))
        })
        .collect()
}

/// Render a model's identity: the bare value for a single-column key,
/// a tuple for a composite key.
pub fn render_identity<M>(model: &M) -> String
where
    M: ModelTrait,
{
    let values: Vec<String> = primary_key_values(model)
        .iter()
        .map(|(_, value)| render_value(value))
        .collect();

    match values.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", values.join(", ")),
    }
}
