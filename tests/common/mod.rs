#![allow(dead_code)]

use sea_orm::{ActiveValue::Set, DatabaseBackend};
use sql_assistant::config::DatabaseConfig;
use sql_assistant::{Logger, SchemaBase, SessionFactory, SqlAssistant};
use tempfile::TempDir;

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "user")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub username: String,
        pub name: Option<String>,
        pub password: String,
        pub is_delete: bool,
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

pub mod post {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "post")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub user_id: i32,
        pub title: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// A migrated SQLite database in a temporary directory plus an assistant
/// recording its log output.
pub struct TestDb {
    pub assistant: SqlAssistant,
    pub factory: SessionFactory,
    pub log: Logger,
    _dir: TempDir,
}

pub fn database_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display()),
        max_connections: 4,
        min_connections: 1,
        ..DatabaseConfig::default()
    }
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let factory = SessionFactory::connect(&database_config(&dir))
        .await
        .expect("connect to sqlite");

    let base = SchemaBase::new(DatabaseBackend::Sqlite);
    base.create_table(&factory, user::Entity).await.expect("create user table");
    base.create_table(&factory, post::Entity).await.expect("create post table");

    let log = Logger::capturing();
    let assistant = SqlAssistant::builder()
        .base(base)
        .session_factory(factory.clone())
        .logger(log.clone())
        .build()
        .expect("assistant");

    TestDb {
        assistant,
        factory,
        log,
        _dir: dir,
    }
}

pub fn new_user(username: &str, name: Option<&str>) -> user::ActiveModel {
    user::ActiveModel {
        username: Set(username.to_string()),
        name: Set(name.map(str::to_string)),
        password: Set("secret".to_string()),
        is_delete: Set(false),
        ..Default::default()
    }
}

pub fn new_post(user_id: i32, title: &str) -> post::ActiveModel {
    post::ActiveModel {
        user_id: Set(user_id),
        title: Set(title.to_string()),
        ..Default::default()
    }
}

/// Integer value of a raw aggregate column, whichever JSON shape the driver picked.
pub fn as_count(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
