use crate::transactional::{Transaction, TransactionOptions};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

tokio::task_local! {
    /// Task-local storage for the active transaction.
    ///
    /// `None` inside a scope means any outer transaction is suspended.
    pub(crate) static ACTIVE_TRANSACTION: Option<Arc<TransactionContext>>;

    /// Name of the innermost boundary running without a transaction.
    pub(crate) static BOUNDARY_NAME: Option<String>;
}

/// The transaction a boundary began, shared with every participant that
/// joins it.
pub struct TransactionContext {
    id: Uuid,
    options: TransactionOptions,
    transaction: Mutex<Box<dyn Transaction>>,
    rollback_only: AtomicBool,
}

impl TransactionContext {
    pub(crate) fn new(options: TransactionOptions, transaction: Box<dyn Transaction>) -> Self {
        Self {
            id: Uuid::new_v4(),
            options,
            transaction: Mutex::new(transaction),
            rollback_only: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        self.options.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// The underlying transaction; repositories downcast it through
    /// [`Transaction::as_any_mut`].
    pub fn transaction(&self) -> &Mutex<Box<dyn Transaction>> {
        &self.transaction
    }

    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.load(Ordering::SeqCst)
    }

    /// Forces the owning boundary to roll back instead of committing.
    pub fn set_rollback_only(&self) {
        self.rollback_only.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("rollback_only", &self.is_rollback_only())
            .finish()
    }
}

/// Retrieves the currently active transaction from task-local storage.
///
/// Returns `None` outside any boundary, and inside boundaries that run
/// without a transaction.
pub fn current_transaction() -> Option<Arc<TransactionContext>> {
    ACTIVE_TRANSACTION.try_with(|tx| tx.clone()).unwrap_or(None)
}

/// Name of the active transaction, or of the enclosing boundary when that
/// boundary runs without one.
pub fn current_transaction_name() -> Option<String> {
    match current_transaction() {
        Some(tx) => Some(tx.name().to_string()),
        None => BOUNDARY_NAME.try_with(|name| name.clone()).unwrap_or(None),
    }
}

pub fn is_transaction_active() -> bool {
    current_transaction().is_some()
}
