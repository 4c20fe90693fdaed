//! Transaction boundaries
//!
//! Physical transactions belong to a [`TransactionManager`] implementation.
//! This module decides, per boundary, whether to begin, join, suspend or
//! refuse a transaction according to its [`Propagation`], keeps the active
//! transaction in task-local storage, and commits or rolls back what it
//! began.
//!
//! ```rust,ignore
//! use beanwire::prelude::*;
//!
//! #[derive(Bean)]
//! #[bean(service)]
//! pub struct UserService {
//!     transaction_manager: Autowired<dyn TransactionManager>,
//! }
//!
//! impl UserService {
//!     #[transactional(propagation = RequiresNew)]
//!     pub async fn change_password(&self, id: u64) -> Result<()> {
//!         // runs inside its own transaction
//!         Ok(())
//!     }
//! }
//! ```

mod boundary;
mod context;

pub use boundary::execute;
pub use context::{
    TransactionContext, current_transaction, current_transaction_name, is_transaction_active,
};

use crate::di::Autowired;
use crate::error::{BeanwireError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Isolation level requested from the transaction manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IsolationLevel {
    /// Reads may see uncommitted changes of other transactions.
    ReadUncommitted,
    /// Reads only see committed data.
    ReadCommitted,
    /// Rows read once read the same until the transaction ends.
    RepeatableRead,
    /// Transactions behave as if executed one after another.
    Serializable,
}

/// How a boundary relates to a transaction that is already active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Propagation {
    /// Join the active transaction, or begin one.
    #[default]
    Required,
    /// Always begin a transaction; the active one is suspended meanwhile.
    RequiresNew,
    /// Join the active transaction, or run without one.
    Supports,
    /// Join the active transaction; fail if there is none.
    Mandatory,
    /// Run in a nested transaction (savepoint) of the active one, or begin
    /// one. Requires manager support.
    Nested,
    /// Run without a transaction; fail if one is active.
    Never,
    /// Run without a transaction; the active one is suspended meanwhile.
    NotSupported,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Name reported by [`current_transaction_name`], usually the qualified
    /// method name.
    pub name: Option<String>,
    pub propagation: Propagation,
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TransactionOptions {
    pub fn new(propagation: Propagation) -> Self {
        Self {
            propagation,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = Some(isolation);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Trait for managing transactions
#[async_trait]
pub trait TransactionManager: Send + Sync + 'static {
    /// Begin a new physical transaction
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn Transaction>>;

    /// Begin a transaction nested in `parent`, usually backed by a savepoint
    async fn begin_nested(
        &self,
        _parent: &TransactionContext,
        _options: TransactionOptions,
    ) -> Result<Box<dyn Transaction>> {
        Err(BeanwireError::NestedTransactionNotSupported {
            manager: std::any::type_name::<Self>().to_string(),
        })
    }
}

/// A generic transaction abstraction
#[async_trait]
pub trait Transaction: Send + Sync + std::any::Any {
    /// Commit the transaction
    async fn commit(&mut self) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(&mut self) -> Result<()>;

    /// Gets this trait object as a mutable `Any` reference for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Where a `#[transactional]` method finds its manager.
pub trait TransactionManagerSource {
    fn transaction_manager(&self) -> Result<Arc<dyn TransactionManager>>;
}

impl TransactionManagerSource for Autowired<dyn TransactionManager> {
    fn transaction_manager(&self) -> Result<Arc<dyn TransactionManager>> {
        self.resolved()
    }
}

impl TransactionManagerSource for Arc<dyn TransactionManager> {
    fn transaction_manager(&self) -> Result<Arc<dyn TransactionManager>> {
        Ok(self.clone())
    }
}
