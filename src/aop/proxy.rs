use crate::aop::{
    Advisor, InvocationFuture, InvocationResult, Method, MethodInterceptor, MethodInvocation,
};
use crate::di::TypeKey;
use crate::error::{BeanwireError, BoxError};
use std::future::Future;
use std::sync::Arc;

/// Collects advisors for one target.
pub struct ProxyFactory<T: ?Sized> {
    target: Arc<T>,
    advisors: Vec<Arc<dyn Advisor>>,
}

impl<T: ?Sized + Send + Sync + 'static> ProxyFactory<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self {
            target,
            advisors: Vec::new(),
        }
    }

    /// Advisors apply in registration order; the first one is outermost.
    pub fn add_advisor(mut self, advisor: impl Advisor) -> Self {
        self.advisors.push(Arc::new(advisor));
        self
    }

    pub fn get_proxy(self) -> Proxy<T> {
        Proxy {
            target: self.target,
            target_key: TypeKey::of::<T>(),
            advisors: self.advisors.into(),
        }
    }
}

/// Target plus the advisors that apply to it.
pub struct Proxy<T: ?Sized> {
    target: Arc<T>,
    target_key: TypeKey,
    advisors: Arc<[Arc<dyn Advisor>]>,
}

impl<T: ?Sized> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            target_key: self.target_key,
            advisors: self.advisors.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Proxy<T> {
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Calls `call` on the target through every advice whose pointcut
    /// matches `method`.
    ///
    /// # Errors
    /// Returns the error of the target or of an advice, or
    /// [`BeanwireError::DowncastFailed`] when an advice replaced the result
    /// with a value of another type.
    pub async fn invoke<R, F, Fut>(&self, method: &Method, call: F) -> Result<R, BoxError>
    where
        R: Send + 'static,
        F: FnOnce(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    {
        let chain: Vec<Arc<dyn MethodInterceptor>> = self
            .advisors
            .iter()
            .filter(|advisor| advisor.pointcut().matches(method, self.target_key))
            .map(|advisor| advisor.advice())
            .collect();

        if chain.is_empty() {
            return call(self.target.clone()).await;
        }

        tracing::trace!(
            "Invoking {}::{} through {} advice(s)",
            self.target_key,
            method.name(),
            chain.len()
        );

        let target = self.target.clone();
        let mut next: Box<dyn FnOnce() -> InvocationFuture + Send> = Box::new(move || {
            Box::pin(async move {
                let value = call(target).await?;
                InvocationResult::Ok(Box::new(value))
            })
        });

        // chain[0] wraps chain[1] wraps ... the target call
        for advice in chain.into_iter().rev() {
            let invocation_method = method.clone();
            let target_key = self.target_key;
            let rest = next;
            next = Box::new(move || {
                Box::pin(async move {
                    let invocation = MethodInvocation::new(invocation_method, target_key, rest);
                    advice.invoke(invocation).await
                })
            });
        }

        let value = next().await?;
        match value.downcast::<R>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(BeanwireError::DowncastFailed {
                type_name: std::any::type_name::<R>().to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aop::{DefaultPointcutAdvisor, NameMatchPointcut};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Greeter {
        log: Log,
    }

    impl Greeter {
        fn greet(&self, name: &str) -> String {
            self.log.lock().unwrap().push("target".to_string());
            format!("hello {name}")
        }
    }

    struct Recording {
        label: &'static str,
        log: Log,
    }

    #[async_trait]
    impl MethodInterceptor for Recording {
        async fn invoke(&self, invocation: MethodInvocation) -> InvocationResult {
            self.log.lock().unwrap().push(format!("{} before", self.label));
            let result = invocation.proceed().await;
            self.log.lock().unwrap().push(format!("{} after", self.label));
            result
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl MethodInterceptor for ShortCircuit {
        async fn invoke(&self, _invocation: MethodInvocation) -> InvocationResult {
            Ok(Box::new(String::from("cached")))
        }
    }

    struct WrongType;

    #[async_trait]
    impl MethodInterceptor for WrongType {
        async fn invoke(&self, invocation: MethodInvocation) -> InvocationResult {
            invocation.proceed().await?;
            Ok(Box::new(42_u32))
        }
    }

    fn greeter(log: &Log) -> Arc<Greeter> {
        Arc::new(Greeter { log: log.clone() })
    }

    async fn greet(proxy: &Proxy<Greeter>, method: &str) -> Result<String, BoxError> {
        proxy
            .invoke(&Method::new(method.to_string()), |greeter: Arc<Greeter>| async move {
                Ok::<_, BoxError>(greeter.greet("bean"))
            })
            .await
    }

    #[tokio::test]
    async fn test_advice_runs_in_registration_order() {
        let log = Log::default();
        let proxy = ProxyFactory::new(greeter(&log))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["greet"]),
                Recording { label: "outer", log: log.clone() },
            ))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["gr*"]),
                Recording { label: "inner", log: log.clone() },
            ))
            .get_proxy();

        assert_eq!(greet(&proxy, "greet").await.unwrap(), "hello bean");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer before", "inner before", "target", "inner after", "outer after"]
        );
    }

    #[tokio::test]
    async fn test_unmatched_method_calls_target_directly() {
        let log = Log::default();
        let proxy = ProxyFactory::new(greeter(&log))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["save*"]),
                Recording { label: "advice", log: log.clone() },
            ))
            .get_proxy();

        assert_eq!(greet(&proxy, "greet").await.unwrap(), "hello bean");
        assert_eq!(*log.lock().unwrap(), vec!["target"]);
    }

    #[tokio::test]
    async fn test_advice_can_skip_target() {
        let log = Log::default();
        let proxy = ProxyFactory::new(greeter(&log))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["*"]),
                ShortCircuit,
            ))
            .get_proxy();

        assert_eq!(greet(&proxy, "greet").await.unwrap(), "cached");
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replaced_result_of_wrong_type() {
        let log = Log::default();
        let proxy = ProxyFactory::new(greeter(&log))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["greet"]),
                WrongType,
            ))
            .get_proxy();

        let err = greet(&proxy, "greet").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BeanwireError>(),
            Some(BeanwireError::DowncastFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_target_error_passes_through_advice() {
        let log = Log::default();
        let proxy = ProxyFactory::new(greeter(&log))
            .add_advisor(DefaultPointcutAdvisor::new(
                NameMatchPointcut::new(["fail"]),
                Recording { label: "advice", log: log.clone() },
            ))
            .get_proxy();

        let err = proxy
            .invoke(&Method::new("fail"), |_greeter: Arc<Greeter>| async move {
                Err::<(), BoxError>("target failed".into())
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "target failed");
        assert_eq!(*log.lock().unwrap(), vec!["advice before", "advice after"]);
    }
}
