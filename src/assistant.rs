//! The data access helper.
//!
//! [`SqlAssistant`] holds the injected session factory and logger and exposes
//! the CRUD helpers. Every helper runs the matching operation from
//! [`crate::ops`] inside a [`SessionScope`] and passes the outcome through the
//! call's [`OnError`] policy:
//!
//! ```rust,ignore
//! // Own session, failures returned to the caller
//! let found = assistant.get_obj::<user::Entity>(1, Call::new()).await?;
//!
//! // Caller session, failures replaced with `None`
//! let mut session = assistant.open_session();
//! let missing = assistant
//!     .get_obj::<user::Entity>(999, Call::new().session(&mut session).suppress())
//!     .await?;
//! assert!(missing.is_none());
//! session.close().await?;
//! ```

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, EntityTrait, IntoActiveModel};

use crate::constants::MSG_DEPENDENCIES_OK;
use crate::error::{AssistantError, Result};
use crate::logger::Logger;
use crate::middleware::{Call, SessionScope};
use crate::ops::{self, ModelOf, PrimaryKeyOf};
use crate::query::{Fetch, Rows};
use crate::session::{Session, SchemaBase, SessionFactory};

/// CRUD helpers over an injected session factory.
#[derive(Clone)]
pub struct SqlAssistant {
    base: SchemaBase,
    factory: SessionFactory,
    log: Logger,
}

/// Collects the three required dependencies of a [`SqlAssistant`].
#[derive(Default)]
pub struct SqlAssistantBuilder {
    base: Option<SchemaBase>,
    factory: Option<SessionFactory>,
    log: Option<Logger>,
}

impl SqlAssistantBuilder {
    pub fn base(mut self, base: SchemaBase) -> Self {
        self.base = Some(base);
        self
    }

    pub fn session_factory(mut self, factory: SessionFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn logger(mut self, log: Logger) -> Self {
        self.log = Some(log);
        self
    }

    /// Validate the dependencies and build the assistant.
    ///
    /// Fails when any dependency is missing (naming all of them), when the
    /// factory is disconnected, or when the schema base and the factory
    /// disagree on the database backend.
    pub fn build(self) -> Result<SqlAssistant> {
        let mut missing = Vec::new();
        if self.base.is_none() {
            missing.push("schema base");
        }
        if self.factory.is_none() {
            missing.push("session factory");
        }
        if self.log.is_none() {
            missing.push("logger");
        }

        let (Some(base), Some(factory), Some(log)) = (self.base, self.factory, self.log) else {
            return Err(AssistantError::Config(format!(
                "missing required dependencies: {}",
                missing.join(", ")
            )));
        };

        if !factory.is_connected() {
            let err = AssistantError::Config("session factory is not connected to a database".to_string());
            log.error(err.to_string());
            return Err(err);
        }

        if base.backend() != factory.backend() {
            let err = AssistantError::Config(format!(
                "schema base targets {:?} but the session factory is connected to {:?}",
                base.backend(),
                factory.backend()
            ));
            log.error(err.to_string());
            return Err(err);
        }

        log.success(MSG_DEPENDENCIES_OK);
        Ok(SqlAssistant { base, factory, log })
    }
}

impl SqlAssistant {
    pub fn builder() -> SqlAssistantBuilder {
        SqlAssistantBuilder::default()
    }

    pub fn base(&self) -> &SchemaBase {
        &self.base
    }

    pub fn session_factory(&self) -> &SessionFactory {
        &self.factory
    }

    pub fn logger(&self) -> &Logger {
        &self.log
    }

    /// Open a session for a caller-managed unit of work.
    pub fn open_session(&self) -> Session {
        self.factory.open()
    }

    /// Fetch one row by primary key.
    ///
    /// A missing row fails with [`AssistantError::NotFound`], or yields
    /// `None` when the call suppresses errors.
    pub async fn get_obj<E>(&self, id: impl Into<PrimaryKeyOf<E>>, call: Call<'_>) -> Result<Option<E::Model>>
    where
        E: EntityTrait,
    {
        let Call { session, on_error } = call;
        let mut scope = SessionScope::acquire(&self.factory, session);
        let result = ops::get_obj::<E>(&self.log, &mut scope, id.into()).await;
        scope.close(&self.log).await;
        on_error.apply(result)
    }

    /// Fetch the rows described by `fetch`.
    pub async fn get_all_objs<E>(&self, fetch: Fetch<E>, call: Call<'_>) -> Result<Option<Rows<E::Model>>>
    where
        E: EntityTrait,
    {
        let Call { session, on_error } = call;
        let mut scope = SessionScope::acquire(&self.factory, session);
        let result = ops::get_all_objs(&self.log, &mut scope, fetch).await;
        scope.close(&self.log).await;
        on_error.apply(result)
    }

    /// Insert a row and return it as persisted.
    pub async fn create_obj<A>(&self, data: A, call: Call<'_>) -> Result<Option<ModelOf<A>>>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        ModelOf<A>: IntoActiveModel<A>,
    {
        let Call { session, on_error } = call;
        let mut scope = SessionScope::acquire(&self.factory, session);
        let result = ops::create_obj(&self.log, &mut scope, data).await;
        scope.close(&self.log).await;
        on_error.apply(result)
    }

    /// Apply the `Set` fields of `data` to every row matching `predicates`;
    /// returns the number of rows changed.
    pub async fn update_objs<A>(
        &self,
        data: A,
        predicates: impl IntoIterator<Item = SimpleExpr>,
        call: Call<'_>,
    ) -> Result<Option<u64>>
    where
        A: ActiveModelTrait + Send,
    {
        let Call { session, on_error } = call;
        let mut scope = SessionScope::acquire(&self.factory, session);
        let result = ops::update_objs(&self.log, &mut scope, data, predicates).await;
        scope.close(&self.log).await;
        on_error.apply(result)
    }

    /// Update the first row matching `predicates`, or insert `data` when none does.
    pub async fn create_or_update<A>(
        &self,
        data: A,
        predicates: impl IntoIterator<Item = SimpleExpr>,
        call: Call<'_>,
    ) -> Result<Option<ModelOf<A>>>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        ModelOf<A>: IntoActiveModel<A>,
    {
        let Call { session, on_error } = call;
        let mut scope = SessionScope::acquire(&self.factory, session);
        let result = ops::create_or_update(&self.log, &mut scope, data, predicates).await;
        scope.close(&self.log).await;
        on_error.apply(result)
    }
}
