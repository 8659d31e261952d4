//! Cross-cutting call behavior, composed explicitly around each operation.
//!
//! - [`SessionScope`] reuses the caller's session or opens a fresh one that is
//!   closed once the operation is done.
//! - [`OnError`] decides whether a failure reaches the caller or is replaced
//!   by `None`.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::logger::Logger;
use crate::session::{Session, SessionFactory};

/// A session borrowed from the caller or owned for the length of one call.
pub enum SessionScope<'a> {
    Borrowed(&'a mut Session),
    Owned(Session),
}

impl<'a> SessionScope<'a> {
    /// Reuse `session` as-is when given, otherwise open a new one.
    ///
    /// A borrowed session gets no new transaction boundary, so several calls
    /// can share one caller-managed unit of work.
    pub fn acquire(factory: &SessionFactory, session: Option<&'a mut Session>) -> Self {
        match session {
            Some(session) => Self::Borrowed(session),
            None => Self::Owned(factory.open()),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Close an owned session; a borrowed one is left to its owner.
    ///
    /// If this is never reached, dropping the owned session still rolls back
    /// its open transaction.
    pub async fn close(self, log: &Logger) {
        if let Self::Owned(session) = self {
            if let Err(e) = session.close().await {
                log.error(format!("Failed to close session: {}", e));
            }
        }
    }
}

impl Deref for SessionScope<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        match self {
            Self::Borrowed(session) => session,
            Self::Owned(session) => session,
        }
    }
}

impl DerefMut for SessionScope<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        match self {
            Self::Borrowed(session) => session,
            Self::Owned(session) => session,
        }
    }
}

/// What to do with a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Discard the error and return `None`.
    Suppress,
}

impl OnError {
    pub fn apply<T>(self, result: Result<T>) -> Result<Option<T>> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (Self::Propagate, Err(e)) => Err(e),
            (Self::Suppress, Err(_)) => Ok(None),
        }
    }
}

/// Per-call options: an optional caller session and the error policy.
#[derive(Default)]
pub struct Call<'a> {
    pub session: Option<&'a mut Session>,
    pub on_error: OnError,
}

impl<'a> Call<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run inside `session` instead of a freshly opened one.
    pub fn session(mut self, session: &'a mut Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace any failure with `None`.
    pub fn suppress(mut self) -> Self {
        self.on_error = OnError::Suppress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;

    fn not_found() -> Result<i32> {
        Err(AssistantError::NotFound {
            table: "user".to_string(),
            id: "999".to_string(),
        })
    }

    #[test]
    fn test_propagate_is_default() {
        assert_eq!(OnError::default(), OnError::Propagate);
        assert_eq!(Call::new().on_error, OnError::Propagate);
    }

    #[test]
    fn test_propagate_returns_error() {
        let result = OnError::Propagate.apply(not_found());
        assert!(matches!(result, Err(AssistantError::NotFound { .. })));
    }

    #[test]
    fn test_suppress_returns_none() {
        let result = OnError::Suppress.apply(not_found());
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_success_is_wrapped_either_way() {
        assert!(matches!(OnError::Propagate.apply(Ok(1)), Ok(Some(1))));
        assert!(matches!(OnError::Suppress.apply(Ok(1)), Ok(Some(1))));
    }
}
