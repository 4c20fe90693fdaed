//! Shared test doubles.

use crate::error::{BeanwireError, Result};
use crate::transactional::{
    Transaction, TransactionContext, TransactionManager, TransactionOptions, current_transaction,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TxEvent {
    Begin(String),
    Commit(String),
    Rollback(String),
}

type Rows = Arc<Mutex<Vec<String>>>;

/// Transaction manager that records what happens to each physical transaction.
#[derive(crate::Bean)]
#[bean(implements(TransactionManager))]
pub(crate) struct RecordingTransactionManager {
    events: Arc<Mutex<Vec<TxEvent>>>,
    received: Mutex<Vec<TransactionOptions>>,
    nested: bool,
}

impl RecordingTransactionManager {
    pub(crate) fn with_savepoints() -> Self {
        Self {
            events: Arc::default(),
            received: Mutex::default(),
            nested: true,
        }
    }

    /// Options of every transaction begun so far, in order.
    pub(crate) fn received_options(&self) -> Vec<TransactionOptions> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn events(&self) -> Vec<TxEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn open(&self, options: &TransactionOptions) -> Box<dyn Transaction> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options.clone());
        let name = options.name.clone().unwrap_or_default();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TxEvent::Begin(name.clone()));
        Box::new(RecordingTransaction {
            name,
            events: self.events.clone(),
            staged: Vec::new(),
        })
    }
}

#[async_trait]
impl TransactionManager for RecordingTransactionManager {
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn Transaction>> {
        Ok(self.open(&options))
    }

    async fn begin_nested(
        &self,
        _parent: &TransactionContext,
        options: TransactionOptions,
    ) -> Result<Box<dyn Transaction>> {
        if !self.nested {
            return Err(BeanwireError::NestedTransactionNotSupported {
                manager: "RecordingTransactionManager".to_string(),
            });
        }
        Ok(self.open(&options))
    }
}

/// Buffers repository writes until commit.
pub(crate) struct RecordingTransaction {
    name: String,
    events: Arc<Mutex<Vec<TxEvent>>>,
    staged: Vec<(Rows, String)>,
}

impl RecordingTransaction {
    fn stage(&mut self, rows: Rows, row: String) {
        self.staged.push((rows, row));
    }

    fn record(&self, event: TxEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn commit(&mut self) -> Result<()> {
        for (rows, row) in self.staged.drain(..) {
            rows.lock().unwrap_or_else(PoisonError::into_inner).push(row);
        }
        self.record(TxEvent::Commit(self.name.clone()));
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.staged.clear();
        self.record(TxEvent::Rollback(self.name.clone()));
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Repository whose writes join the active recording transaction, or apply
/// immediately without one.
#[derive(crate::Bean)]
#[bean(repository)]
pub(crate) struct UserRepository {
    rows: Rows,
}

impl UserRepository {
    pub(crate) async fn save(&self, user: &str) {
        if let Some(tx) = current_transaction() {
            let mut transaction = tx.transaction().lock().await;
            if let Some(recording) = transaction
                .as_any_mut()
                .downcast_mut::<RecordingTransaction>()
            {
                recording.stage(self.rows.clone(), user.to_string());
                return;
            }
        }
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user.to_string());
    }

    pub(crate) fn find_all(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
