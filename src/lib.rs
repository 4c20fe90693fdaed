//! # Beanwire
//!
//! A bean container with field injection, component scanning and
//! declarative transaction boundaries.
//!
//! ## Features
//!
//! - **Bean Graph**: one shared instance per registered type, wired through
//!   `Autowired<T>` fields after every bean exists, so cycles are fine
//!   and the beans are dropped with the container
//! - **Trait Object Resolution**: `get_bean::<dyn UserDao>()` finds the bean
//!   declaring `#[bean(implements(UserDao))]`
//! - **Component Scanning**: `#[bean(service)]` and friends register a type
//!   at link time; `ClassPathScanner` collects them by module path
//! - **Transactions**: `#[transactional]` methods with seven propagation
//!   behaviors, plus an advisor chain for proxy-style interception
//!
//! ## Quick Start
//!
//! ```rust
//! use beanwire::{Autowired, Bean, BeanContainer, BeanDefinition};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Bean)]
//! pub struct UserRepository {
//!     saved: AtomicUsize,
//! }
//!
//! #[derive(Bean)]
//! pub struct UserService {
//!     repository: Autowired<UserRepository>,
//! }
//!
//! impl UserService {
//!     pub fn join(&self) -> beanwire::Result<()> {
//!         self.repository.resolved()?.saved.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> beanwire::Result<()> {
//!     let container = BeanContainer::new([
//!         BeanDefinition::of::<UserService>(),
//!         BeanDefinition::of::<UserRepository>(),
//!     ])?;
//!
//!     container.get_bean::<UserService>()?.join()?;
//!     let repository = container.get_bean::<UserRepository>()?;
//!     assert_eq!(repository.saved.load(Ordering::SeqCst), 1);
//!     Ok(())
//! }
//! ```

// Lets derive output name `::beanwire` from inside this crate too.
extern crate self as beanwire;

pub mod aop;
pub mod config;
pub mod di;
pub mod error;
pub mod scan;
pub mod transactional;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types
pub use config::{BeanwireConfig, ConfigService};
pub use di::{Autowired, Bean, BeanContainer, BeanContainerBuilder, BeanDefinition};
pub use error::{BeanwireError, Result};
pub use scan::{ClassPathScanner, Stereotype};

// Re-export macros
pub use beanwire_macro::{Bean, transactional};

// Used by macro expansions
pub use async_trait::async_trait;
#[doc(hidden)]
pub use inventory;

/// Prelude module for convenient imports
///
/// ```
/// use beanwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aop::{
        Advisor, DefaultPointcutAdvisor, Method, MethodInterceptor, MethodInvocation, Pointcut,
        ProxyFactory, TransactionAdvisor, TransactionHandler,
    };
    pub use crate::config::{AmbiguityPolicy, BeanwireConfig, ConfigService};
    pub use crate::di::{Autowired, BeanContainer, BeanContainerBuilder, BeanDefinition};
    pub use crate::error::{BeanwireError, Result};
    pub use crate::scan::{ClassPathScanner, Stereotype};
    pub use crate::transactional::{
        IsolationLevel, Propagation, Transaction, TransactionManager, TransactionOptions,
        current_transaction_name,
    };
    pub use crate::{Bean, transactional};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
