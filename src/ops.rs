//! Data operations on an explicit session.
//!
//! Each operation rolls back the session's open transaction and logs before
//! returning a failure. Writes commit on success, so a shared session starts
//! a fresh transaction on its next use.

use std::collections::HashSet;

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, Condition, ConnectionTrait, DbErr, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, JsonValue, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, QueryResult, QueryTrait,
};

use crate::error::{classify, AssistantError, Result, Violation};
use crate::logger::Logger;
use crate::query::{all_of, Fetch, Rows};
use crate::session::Session;
use crate::utils::{describe_active_model, render_identity};

/// Primary key value type of entity `E`.
pub type PrimaryKeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Model type behind active model `A`.
pub type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

async fn rollback(log: &Logger, session: &mut Session) {
    if let Err(e) = session.rollback().await {
        log.error(format!("Rollback failed: {}", e));
    }
}

async fn rollback_on_error<T>(log: &Logger, session: &mut Session, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        log.error(e.to_string());
        rollback(log, session).await;
    }
    result
}

fn classify_write_error(err: DbErr, table: &str, data: &str) -> AssistantError {
    match classify(&err) {
        Some(Violation::Reference { key }) => AssistantError::ReferenceViolation {
            table: table.to_string(),
            key,
            data: data.to_string(),
        },
        Some(Violation::Unique) => AssistantError::AlreadyExists {
            table: table.to_string(),
            data: data.to_string(),
        },
        None => AssistantError::Database(err),
    }
}

/// Fetch one row by primary key; a missing row is [`AssistantError::NotFound`].
pub async fn get_obj<E>(log: &Logger, session: &mut Session, id: PrimaryKeyOf<E>) -> Result<E::Model>
where
    E: EntityTrait,
{
    let table = table_name::<E>();
    let id_text = format!("{:?}", id);

    let result = find_by_id::<E>(session, id)
        .await
        .and_then(|found| found.ok_or(AssistantError::NotFound { table, id: id_text }));

    rollback_on_error(log, session, result).await
}

async fn find_by_id<E: EntityTrait>(session: &mut Session, id: PrimaryKeyOf<E>) -> Result<Option<E::Model>> {
    let txn = session.transaction().await?;
    Ok(E::find_by_id(id).one(txn).await?)
}

/// Fetch rows described by `fetch`.
///
/// Without a projection the rows are mapped to models and de-duplicated by
/// identity; with one they come back raw.
pub async fn get_all_objs<E>(log: &Logger, session: &mut Session, fetch: Fetch<E>) -> Result<Rows<E::Model>>
where
    E: EntityTrait,
{
    let table = table_name::<E>();
    let result = run_fetch(session, fetch).await;
    let rows = rollback_on_error(log, session, result).await?;

    match &rows {
        Rows::Models(models) => {
            let ids: Vec<String> = models.iter().map(render_identity).collect();
            log.debug(format!("Returned rows of table `{}` [{}]", table, ids.join(", ")));
        }
        Rows::Raw(_) => log.debug(format!("Returned rows of table `{}`", table)),
    }

    Ok(rows)
}

async fn run_fetch<E: EntityTrait>(session: &mut Session, fetch: Fetch<E>) -> Result<Rows<E::Model>> {
    let projected = fetch.has_projection();
    let labels = fetch.labels();
    let select = fetch.into_select();
    let txn = session.transaction().await?;

    if projected {
        let statement = txn.get_database_backend().build(select.as_query());
        let rows = txn.query_all(statement).await?;
        Ok(Rows::Raw(rows.iter().map(|row| row_to_json(row, &labels)).collect()))
    } else {
        Ok(Rows::Models(distinct_by_identity(select.all(txn).await?)))
    }
}

/// Decode the labelled columns of a raw row.
///
/// Expression columns (aggregates, casts) carry no declared type on every
/// backend, so each value is decoded by trying concrete types in turn.
fn row_to_json(row: &QueryResult, labels: &[String]) -> JsonValue {
    let object = labels
        .iter()
        .map(|label| (label.clone(), decode_column(row, label)))
        .collect();
    JsonValue::Object(object)
}

fn decode_column(row: &QueryResult, label: &str) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<i64>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<i32>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<i16>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<f32>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<bool>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<String>>("", label) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    JsonValue::Null
}

fn distinct_by_identity<M: sea_orm::ModelTrait>(models: Vec<M>) -> Vec<M> {
    let mut seen = HashSet::new();
    models
        .into_iter()
        .filter(|model| seen.insert(render_identity(model)))
        .collect()
}

/// Insert a row, commit, and return it as persisted.
///
/// The returned model is read back after the insert, so server-side
/// defaults are filled in.
pub async fn create_obj<A>(log: &Logger, session: &mut Session, data: A) -> Result<ModelOf<A>>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A>,
{
    let table = table_name::<A::Entity>();
    let described = describe_active_model(&data);

    match insert_and_commit(session, data).await {
        Ok(model) => {
            log.debug(format!("Created new `{}` with data `{}`", table, described));
            Ok(model)
        }
        Err(e) => {
            rollback(log, session).await;
            let err = classify_write_error(e, &table, &described);
            log.error(err.to_string());
            Err(err)
        }
    }
}

async fn insert_and_commit<A>(session: &mut Session, data: A) -> std::result::Result<ModelOf<A>, DbErr>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A>,
{
    let txn = session.transaction().await?;
    let model = data.insert(txn).await?;
    session.commit().await?;
    Ok(model)
}

/// Apply the `Set` fields of `data` to every row matching `predicates`,
/// commit, and return the number of rows changed.
pub async fn update_objs<A>(
    log: &Logger,
    session: &mut Session,
    data: A,
    predicates: impl IntoIterator<Item = SimpleExpr>,
) -> Result<u64>
where
    A: ActiveModelTrait + Send,
{
    let table = table_name::<A::Entity>();
    let described = describe_active_model(&data);

    if !data.is_changed() {
        log.warning(format!("Nothing to update for table `{}`: no fields were set", table));
        return Ok(0);
    }

    match update_and_commit(session, data, all_of(predicates)).await {
        Ok(count) => {
            log.debug(format!(
                "Updated data for table `{}`. New data `{}`, rows affected: {}",
                table, described, count
            ));
            Ok(count)
        }
        Err(e) => {
            log.error(format!("Failed to update data for table `{}` data={}: {}", table, described, e));
            rollback(log, session).await;
            Err(e.into())
        }
    }
}

async fn update_and_commit<A>(session: &mut Session, data: A, condition: Condition) -> std::result::Result<u64, DbErr>
where
    A: ActiveModelTrait + Send,
{
    let txn = session.transaction().await?;
    let result = <A::Entity as EntityTrait>::update_many()
        .set(data)
        .filter(condition)
        .exec(txn)
        .await?;
    session.commit().await?;
    Ok(result.rows_affected)
}

/// Update the first row matching `predicates` with the `Set` fields of
/// `data`, or insert `data` when nothing matches. Commits either way.
///
/// Primary key fields in `data` are not applied on the update path.
pub async fn create_or_update<A>(
    log: &Logger,
    session: &mut Session,
    data: A,
    predicates: impl IntoIterator<Item = SimpleExpr>,
) -> Result<ModelOf<A>>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A>,
{
    let table = table_name::<A::Entity>();
    let described = describe_active_model(&data);

    match upsert_and_commit(session, data, all_of(predicates)).await {
        Ok((model, action)) => {
            log.debug(format!("{} `{}` with data `{}`", action.label(), table, described));
            Ok(model)
        }
        Err(e) => {
            rollback(log, session).await;
            let err = match classify_write_error(e, &table, &described) {
                AssistantError::ReferenceViolation { table, key, data } => {
                    log.error(format!("Related object for `{}` was not found. `{}`", table, key));
                    AssistantError::ReferenceViolation { table, key, data }
                }
                other => {
                    log.error(other.to_string());
                    other
                }
            };
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upserted {
    Created,
    Updated,
}

impl Upserted {
    fn label(self) -> &'static str {
        match self {
            Upserted::Created => "Created",
            Upserted::Updated => "Updated",
        }
    }
}

async fn upsert_and_commit<A>(
    session: &mut Session,
    data: A,
    condition: Condition,
) -> std::result::Result<(ModelOf<A>, Upserted), DbErr>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    ModelOf<A>: IntoActiveModel<A>,
{
    let txn = session.transaction().await?;
    let existing = <A::Entity as EntityTrait>::find().filter(condition).one(txn).await?;

    let outcome = match existing {
        Some(found) => {
            let mut target: A = found.into_active_model();
            overwrite_fields(&mut target, &data);
            (target.update(txn).await?, Upserted::Updated)
        }
        None => (data.insert(txn).await?, Upserted::Created),
    };

    session.commit().await?;
    Ok(outcome)
}

/// Copy every non-key `Set` field of `source` onto `target`.
fn overwrite_fields<A: ActiveModelTrait>(target: &mut A, source: &A) {
    let keys: Vec<String> = <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
        .map(|key| key.into_column().as_str().to_string())
        .collect();

    for column in <<A::Entity as EntityTrait>::Column as Iterable>::iter() {
        if keys.iter().any(|key| key == column.as_str()) {
            continue;
        }
        if let ActiveValue::Set(value) = source.get(column) {
            target.set(column, value);
        }
    }
}
