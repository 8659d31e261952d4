//! Descriptors for multi-row fetches.
//!
//! [`Fetch`] collects predicates, ordering, grouping, joins, aggregates and an
//! optional projection, then applies them to a SeaORM select in a fixed order:
//! projection, joins, predicates, grouping, aggregate columns, ordering.

use sea_orm::sea_query::{Func, IntoColumnRef, IntoCondition, SimpleExpr, TableRef};
use sea_orm::{
    ColumnTrait, Condition, EntityName, EntityTrait, IdenStatic, JoinType, JsonValue, Order, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, RelationDef, Select,
};

/// Qualified column expression, `"table"."column"`.
pub fn col<C: ColumnTrait>(column: C) -> SimpleExpr {
    SimpleExpr::Column((column.entity_name(), column).into_column_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

#[derive(Debug)]
enum JoinTarget {
    /// Join condition taken from a declared relation.
    Relation(RelationDef),
    /// Join against a table with an explicit condition.
    Table { table: TableRef, on: Condition },
}

/// One join clause.
#[derive(Debug)]
pub struct Join {
    kind: JoinKind,
    target: JoinTarget,
}

impl Join {
    /// Inner join following a declared relation.
    pub fn inner(relation: RelationDef) -> Self {
        Self {
            kind: JoinKind::Inner,
            target: JoinTarget::Relation(relation),
        }
    }

    /// Left join following a declared relation.
    pub fn left(relation: RelationDef) -> Self {
        Self {
            kind: JoinKind::Left,
            target: JoinTarget::Relation(relation),
        }
    }

    /// Inner join to `target` on an explicit condition.
    pub fn inner_on<T: EntityName>(target: T, on: impl IntoCondition) -> Self {
        Self {
            kind: JoinKind::Inner,
            target: JoinTarget::Table {
                table: target.table_ref(),
                on: on.into_condition(),
            },
        }
    }

    /// Left join to `target` on an explicit condition.
    pub fn left_on<T: EntityName>(target: T, on: impl IntoCondition) -> Self {
        Self {
            kind: JoinKind::Left,
            target: JoinTarget::Table {
                table: target.table_ref(),
                on: on.into_condition(),
            },
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    fn apply<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        match self.target {
            JoinTarget::Relation(relation) => select.join(self.kind.into(), relation),
            JoinTarget::Table { table, on } => {
                let mut select = select;
                QueryTrait::query(&mut select).join(self.kind.into(), table, on);
                select
            }
        }
    }
}

/// Aggregate function applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::CountDistinct => "count_distinct",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }

    /// Result label for `function(column)`, e.g. `id_count`.
    pub fn label<C: ColumnTrait>(self, column: C) -> String {
        format!("{}_{}", column.as_str(), self.name())
    }

    fn apply(self, expr: SimpleExpr) -> SimpleExpr {
        let call = match self {
            Aggregate::Count => Func::count(expr),
            Aggregate::CountDistinct => Func::count_distinct(expr),
            Aggregate::Sum => Func::sum(expr),
            Aggregate::Avg => Func::avg(expr),
            Aggregate::Min => Func::min(expr),
            Aggregate::Max => Func::max(expr),
        };
        SimpleExpr::FunctionCall(call)
    }
}

/// Everything `get_all_objs` can be asked to do beyond a plain select.
#[derive(Debug)]
pub struct Fetch<E: EntityTrait> {
    filters: Vec<SimpleExpr>,
    order_by: Vec<(SimpleExpr, Order)>,
    group_by: Vec<SimpleExpr>,
    joins: Vec<Join>,
    aggregates: Vec<(E::Column, Aggregate)>,
    fields: Vec<(SimpleExpr, String)>,
}

impl<E: EntityTrait> Default for Fetch<E> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            joins: Vec::new(),
            aggregates: Vec::new(),
            fields: Vec::new(),
        }
    }
}

impl<E: EntityTrait> Fetch<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate; all predicates are combined with AND.
    pub fn filter(mut self, predicate: SimpleExpr) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = SimpleExpr>) -> Self {
        self.filters.extend(predicates);
        self
    }

    pub fn order_by(mut self, expr: SimpleExpr, order: Order) -> Self {
        self.order_by.push((expr, order));
        self
    }

    pub fn order_by_asc<C: ColumnTrait>(self, column: C) -> Self {
        self.order_by(col(column), Order::Asc)
    }

    pub fn order_by_desc<C: ColumnTrait>(self, column: C) -> Self {
        self.order_by(col(column), Order::Desc)
    }

    pub fn group_by<C: ColumnTrait>(mut self, column: C) -> Self {
        self.group_by.push(col(column));
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add `function(column)` to the selected columns, labelled `{column}_{function}`.
    ///
    /// Mapped models ignore the label, so the value only reaches the caller
    /// through a projection.
    pub fn aggregate(mut self, column: E::Column, function: Aggregate) -> Self {
        self.aggregates.push((column, function));
        self
    }

    /// Select `column` explicitly; any field switches the result to raw rows.
    pub fn field<C: ColumnTrait>(mut self, column: C) -> Self {
        let alias = column.as_str().to_string();
        self.fields.push((col(column), alias));
        self
    }

    /// Select an arbitrary expression under `alias`.
    pub fn field_as(mut self, expr: SimpleExpr, alias: impl Into<String>) -> Self {
        self.fields.push((expr, alias.into()));
        self
    }

    pub fn has_projection(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn predicates(&self) -> &[SimpleExpr] {
        &self.filters
    }

    /// Labels of the selected fields followed by the aggregate labels.
    pub fn labels(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(_, alias)| alias.clone())
            .chain(self.aggregates.iter().map(|(column, function)| function.label(*column)))
            .collect()
    }

    /// Build the select statement.
    pub fn into_select(self) -> Select<E> {
        let mut select = E::find();

        if !self.fields.is_empty() {
            select = select.select_only();
            for (expr, alias) in self.fields {
                select = select.column_as(expr, alias);
            }
        }

        for join in self.joins {
            select = join.apply(select);
        }

        if !self.filters.is_empty() {
            select = select.filter(all_of(self.filters));
        }

        for expr in self.group_by {
            select = select.group_by(expr);
        }

        for (column, function) in self.aggregates {
            select = select.column_as(function.apply(col(column)), function.label(column));
        }

        for (expr, order) in self.order_by {
            select = select.order_by(expr, order);
        }

        select
    }
}

/// AND of every predicate; an empty list matches everything.
pub fn all_of(predicates: impl IntoIterator<Item = SimpleExpr>) -> Condition {
    predicates
        .into_iter()
        .fold(Condition::all(), |condition, predicate| condition.add(predicate))
}

/// Result of `get_all_objs`.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows<M> {
    /// Mapped entities, one per distinct identity.
    Models(Vec<M>),
    /// Raw rows of an explicit projection, keyed by alias.
    Raw(Vec<JsonValue>),
}

impl<M> Rows<M> {
    pub fn len(&self) -> usize {
        match self {
            Rows::Models(models) => models.len(),
            Rows::Raw(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mapped entities; empty for a projection.
    pub fn into_models(self) -> Vec<M> {
        match self {
            Rows::Models(models) => models,
            Rows::Raw(_) => Vec::new(),
        }
    }

    /// The raw rows; empty when entities were mapped.
    pub fn into_raw(self) -> Vec<JsonValue> {
        match self {
            Rows::Models(_) => Vec::new(),
            Rows::Raw(rows) => rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::entity::prelude::*;
    use sea_orm::sea_query::Expr;
    use sea_orm::DbBackend;

    mod user {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "user")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub username: String,
            pub name: Option<String>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(has_many = "super::post::Entity")]
            Post,
        }

        impl Related<super::post::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Post.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    mod post {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "post")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub user_id: i32,
            pub title: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(belongs_to = "super::user::Entity", from = "Column::UserId", to = "super::user::Column::Id")]
            User,
        }

        impl Related<super::user::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::User.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn sql(fetch: Fetch<user::Entity>) -> String {
        fetch.into_select().build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn test_plain_fetch_selects_entity() {
        let statement = sql(Fetch::new());
        assert!(statement.starts_with("SELECT \"user\".\"id\""));
        assert!(!statement.contains("WHERE"));
    }

    #[test]
    fn test_predicates_are_combined_with_and() {
        let statement = sql(Fetch::new()
            .filter(user::Column::Id.gt(1))
            .filter(user::Column::Username.eq("alice")));
        assert!(statement.contains("WHERE \"user\".\"id\" > 1 AND \"user\".\"username\" = 'alice'"));
    }

    #[test]
    fn test_clauses_follow_fixed_order() {
        let statement = sql(Fetch::new()
            .order_by_desc(user::Column::Id)
            .group_by(user::Column::Id)
            .filter(post::Column::Title.like("%rust%"))
            .join(Join::left(user::Relation::Post.def()))
            .field(user::Column::Username)
            .aggregate(user::Column::Id, Aggregate::Count));

        let select = statement.find("SELECT").unwrap();
        let join = statement.find("LEFT JOIN").unwrap();
        let filter = statement.find("WHERE").unwrap();
        let group = statement.find("GROUP BY").unwrap();
        let order = statement.find("ORDER BY").unwrap();
        assert!(select < join && join < filter && filter < group && group < order);
        assert!(statement.contains("COUNT(\"user\".\"id\") AS \"id_count\""));
    }

    #[test]
    fn test_projection_replaces_entity_columns() {
        let fetch = Fetch::<user::Entity>::new().field(user::Column::Username);
        assert!(fetch.has_projection());
        let statement = sql(fetch);
        assert!(statement.starts_with("SELECT \"user\".\"username\" AS \"username\" FROM"));
    }

    #[test]
    fn test_join_on_explicit_condition() {
        let statement = sql(Fetch::new().join(Join::inner_on(
            post::Entity,
            Expr::col((post::Entity, post::Column::UserId)).equals((user::Entity, user::Column::Id)),
        )));
        assert!(statement.contains("INNER JOIN \"post\" ON \"post\".\"user_id\" = \"user\".\"id\""));
    }

    #[test]
    fn test_labels_follow_fields_then_aggregates() {
        let fetch = Fetch::<user::Entity>::new()
            .aggregate(user::Column::Id, Aggregate::CountDistinct)
            .field(user::Column::Username)
            .field_as(col(user::Column::Name), "display_name");
        assert_eq!(fetch.labels(), vec!["username", "display_name", "id_count_distinct"]);
    }

    #[test]
    fn test_rows_accessors() {
        let rows: Rows<i32> = Rows::Models(vec![1, 2]);
        assert_eq!(rows.len(), 2);
        assert!(rows.clone().into_raw().is_empty());
        assert_eq!(rows.into_models(), vec![1, 2]);
    }
}
