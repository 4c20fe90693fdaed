//! Method interception
//!
//! An [`Advisor`] pairs a [`Pointcut`], which selects methods, with a
//! [`MethodInterceptor`], the advice that runs around them. A
//! [`ProxyFactory`] collects advisors for one target and produces a
//! [`Proxy`] whose `invoke` runs every matching advice around the call.

mod handler;
mod proxy;
mod transaction;

pub use handler::TransactionHandler;
pub use proxy::{Proxy, ProxyFactory};
pub use transaction::{TransactionAdvice, TransactionAdvisor, TransactionPointcut};

use crate::di::TypeKey;
use crate::error::BoxError;
use crate::transactional::TransactionOptions;
use async_trait::async_trait;
use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type-erased return value of an intercepted call
pub type InvocationResult = Result<Box<dyn Any + Send>, BoxError>;

pub(crate) type InvocationFuture = Pin<Box<dyn Future<Output = InvocationResult> + Send>>;

/// Describes an intercepted method: its name and, when the method is
/// transactional, the options of its transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: Cow<'static, str>,
    transaction: Option<TransactionOptions>,
}

impl Method {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            transaction: None,
        }
    }

    /// Marks the method transactional.
    pub fn transactional(mut self, options: TransactionOptions) -> Self {
        self.transaction = Some(options);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transaction_options(&self) -> Option<&TransactionOptions> {
        self.transaction.as_ref()
    }

    pub fn is_transactional(&self) -> bool {
        self.transaction.is_some()
    }
}

/// One call travelling through the advice chain
pub struct MethodInvocation {
    method: Method,
    target: TypeKey,
    proceed: Box<dyn FnOnce() -> InvocationFuture + Send>,
}

impl MethodInvocation {
    pub fn new<F>(method: Method, target: TypeKey, proceed: F) -> Self
    where
        F: FnOnce() -> InvocationFuture + Send + 'static,
    {
        Self {
            method,
            target,
            proceed: Box::new(proceed),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// Runs the rest of the chain, ending with the target call.
    pub async fn proceed(self) -> InvocationResult {
        (self.proceed)().await
    }
}

/// Advice that runs around a method call.
///
/// # Example
/// ```rust
/// use beanwire::aop::{InvocationResult, MethodInterceptor, MethodInvocation};
/// use beanwire::async_trait;
///
/// struct LoggingAdvice;
///
/// #[async_trait]
/// impl MethodInterceptor for LoggingAdvice {
///     async fn invoke(&self, invocation: MethodInvocation) -> InvocationResult {
///         println!("before {}", invocation.method().name());
///         let result = invocation.proceed().await;
///         println!("after");
///         result
///     }
/// }
/// ```
#[async_trait]
pub trait MethodInterceptor: Send + Sync + 'static {
    async fn invoke(&self, invocation: MethodInvocation) -> InvocationResult;
}

/// Selects the join points an advice applies to.
pub trait Pointcut: Send + Sync + 'static {
    fn matches(&self, method: &Method, target: TypeKey) -> bool;
}

/// Matches methods by name; a pattern may start or end with `*`.
#[derive(Debug, Clone, Default)]
pub struct NameMatchPointcut {
    patterns: Vec<String>,
}

impl NameMatchPointcut {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    fn is_match(pattern: &str, name: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            return name.starts_with(prefix);
        }
        if let Some(suffix) = pattern.strip_prefix('*') {
            return name.ends_with(suffix);
        }
        pattern == name
    }
}

impl Pointcut for NameMatchPointcut {
    fn matches(&self, method: &Method, _target: TypeKey) -> bool {
        self.patterns
            .iter()
            .any(|pattern| Self::is_match(pattern, method.name()))
    }
}

/// One pointcut and one advice.
pub trait Advisor: Send + Sync + 'static {
    fn pointcut(&self) -> &dyn Pointcut;
    fn advice(&self) -> Arc<dyn MethodInterceptor>;
}

pub struct DefaultPointcutAdvisor {
    pointcut: Box<dyn Pointcut>,
    advice: Arc<dyn MethodInterceptor>,
}

impl DefaultPointcutAdvisor {
    pub fn new(pointcut: impl Pointcut, advice: impl MethodInterceptor) -> Self {
        Self {
            pointcut: Box::new(pointcut),
            advice: Arc::new(advice),
        }
    }
}

impl Advisor for DefaultPointcutAdvisor {
    fn pointcut(&self) -> &dyn Pointcut {
        self.pointcut.as_ref()
    }

    fn advice(&self) -> Arc<dyn MethodInterceptor> {
        self.advice.clone()
    }
}
