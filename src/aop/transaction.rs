use crate::aop::{Advisor, InvocationResult, Method, MethodInterceptor, MethodInvocation, Pointcut};
use crate::config::TransactionSettings;
use crate::di::TypeKey;
use crate::error::{BeanwireError, BoxError};
use crate::transactional::{TransactionManager, TransactionOptions, execute};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Matches methods marked transactional.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionPointcut;

impl Pointcut for TransactionPointcut {
    fn matches(&self, method: &Method, _target: TypeKey) -> bool {
        method.is_transactional()
    }
}

/// Runs the invocation at a transaction boundary.
///
/// A failing target is rolled back and reported as
/// [`BeanwireError::DataAccess`] carrying the original error.
pub struct TransactionAdvice {
    manager: Arc<dyn TransactionManager>,
    defaults: TransactionOptions,
}

impl TransactionAdvice {
    pub fn new(manager: Arc<dyn TransactionManager>) -> Self {
        Self {
            manager,
            defaults: TransactionOptions::default(),
        }
    }

    /// Options for advised methods that carry none of their own.
    pub fn with_defaults(mut self, settings: &TransactionSettings) -> Self {
        self.defaults = settings.options();
        self
    }
}

#[async_trait]
impl MethodInterceptor for TransactionAdvice {
    async fn invoke(&self, invocation: MethodInvocation) -> InvocationResult {
        let options = options_for(invocation.method(), invocation.target(), &self.defaults);
        run_in_transaction(self.manager.as_ref(), options, invocation.proceed()).await
    }
}

pub struct TransactionAdvisor {
    pointcut: TransactionPointcut,
    advice: Arc<TransactionAdvice>,
}

impl TransactionAdvisor {
    pub fn new(advice: TransactionAdvice, pointcut: TransactionPointcut) -> Self {
        Self {
            pointcut,
            advice: Arc::new(advice),
        }
    }

    pub fn for_manager(manager: Arc<dyn TransactionManager>) -> Self {
        Self::new(TransactionAdvice::new(manager), TransactionPointcut)
    }
}

impl Advisor for TransactionAdvisor {
    fn pointcut(&self) -> &dyn Pointcut {
        &self.pointcut
    }

    fn advice(&self) -> Arc<dyn MethodInterceptor> {
        self.advice.clone()
    }
}

/// Options of the method's transaction, named after the method unless the
/// options already carry a name.
pub(crate) fn options_for(
    method: &Method,
    target: TypeKey,
    defaults: &TransactionOptions,
) -> TransactionOptions {
    let mut options = method
        .transaction_options()
        .unwrap_or(defaults)
        .clone();
    if options.name.is_none() {
        options.name = Some(format!("{}::{}", target, method.name()));
    }
    options
}

enum Failure {
    Boundary(BeanwireError),
    Target(BoxError),
}

impl From<BeanwireError> for Failure {
    fn from(e: BeanwireError) -> Self {
        Failure::Boundary(e)
    }
}

pub(crate) async fn run_in_transaction<T, Fut>(
    manager: &dyn TransactionManager,
    options: TransactionOptions,
    call: Fut,
) -> Result<T, BoxError>
where
    T: Send,
    Fut: Future<Output = Result<T, BoxError>> + Send,
{
    let outcome = execute(manager, options, async move {
        call.await.map_err(Failure::Target)
    })
    .await;

    match outcome {
        Ok(value) => Ok(value),
        Err(Failure::Boundary(e)) => Err(e.into()),
        Err(Failure::Target(e)) => Err(BeanwireError::DataAccess(e).into()),
    }
}
