use crate::{Command, Error, IsolationLevel, ReadOnlySession, Result, TransactionId, cancellable};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
    /// Commit or rollback failed, the rollback happens on dispose.
    Failed,
}

/// A database transaction on a session.
///
/// Single use: once committed or rolled back every further completion attempt fails with an
/// invalid state error. The guard borrows the session and dereferences to it, statements run
/// through the guard are enlisted in the transaction.
///
/// [`Transaction::dispose`] rolls back a transaction that was never completed. A guard dropped
/// without being disposed cannot roll back right away, the rollback runs before the next
/// statement of the session or when it closes.
pub struct Transaction<'s, S: AsMut<ReadOnlySession>> {
    session: &'s mut S,
    id: TransactionId,
    state: TransactionState,
    disposed: bool,
}

impl<'s, S: AsMut<ReadOnlySession>> Transaction<'s, S> {
    pub(crate) async fn begin(session: &'s mut S, isolation_level: IsolationLevel) -> Result<Self> {
        let base = session.as_mut();
        base.check_open()?;
        let id = cancellable!(&base.cancellation, base.connection.begin(isolation_level))?;
        Ok(Self {
            session,
            id,
            state: TransactionState::Active,
            disposed: false,
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !self.disposed && self.state == TransactionState::Active
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_active(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::Disposed("transaction"));
        }
        if self.state != TransactionState::Active {
            return Err(Error::InvalidState(format!(
                "The transaction has already been completed ({:?})",
                self.state
            )));
        }
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.check_active()?;
        let id = self.id;
        let base = self.session.as_mut();
        match cancellable!(&base.cancellation, base.connection.commit(id)) {
            Ok(()) => {
                self.state = TransactionState::Committed;
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::Failed;
                Err(e)
            }
        }
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.check_active()?;
        let id = self.id;
        let base = self.session.as_mut();
        match cancellable!(&base.cancellation, base.connection.rollback(id)) {
            Ok(()) => {
                self.state = TransactionState::RolledBack;
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::Failed;
                Err(e)
            }
        }
    }

    /// Enlist `command` in this transaction.
    pub fn enlist(&self, command: &mut Command) -> Result<()> {
        if !self.is_active() {
            return Err(Error::InvalidState(
                "Cannot enlist a command in a transaction that is not active".into(),
            ));
        }
        command.transaction = Some(self.id);
        Ok(())
    }

    /// Release the transaction, rolling it back if it was never completed. Never fails.
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if matches!(self.state, TransactionState::Active | TransactionState::Failed) {
            let base = self.session.as_mut();
            if let Err(e) = base.connection.rollback(self.id).await {
                log::error!("Implicit rollback of transaction {:?} failed: {:#}", self.id, e);
                base.connection.complete(self.id).await;
            }
            if self.state == TransactionState::Active {
                self.state = TransactionState::RolledBack;
            }
        }
    }
}

impl<S: AsMut<ReadOnlySession>> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl<S: AsMut<ReadOnlySession>> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
    }
}

impl<S: AsMut<ReadOnlySession>> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if !self.disposed
            && matches!(self.state, TransactionState::Active | TransactionState::Failed)
        {
            log::warn!(
                "Transaction {:?} dropped without being disposed, it will be rolled back",
                self.id
            );
            self.session.as_mut().connection.defer_rollback(self.id);
        }
    }
}
