use crate::config::{AmbiguityPolicy, BeanwireConfig};
use crate::di::{Bean, BeanContainer, BeanDefinition};
use crate::error::Result;
use crate::scan::ClassPathScanner;

/// Builder for constructing a bean container
///
/// Collect bean definitions here, then call [`build`](Self::build) to
/// instantiate and wire them into an immutable container.
///
/// # Example
/// ```
/// use beanwire::{Autowired, Bean, BeanContainerBuilder};
///
/// #[derive(Bean)]
/// pub struct Repository;
///
/// #[derive(Bean)]
/// pub struct Service {
///     repository: Autowired<Repository>,
/// }
///
/// let container = BeanContainerBuilder::new()
///     .register::<Service>()
///     .register::<Repository>()
///     .build()
///     .unwrap();
///
/// let service = container.get_bean::<Service>().unwrap();
/// assert!(service.repository.is_wired());
/// ```
#[derive(Default)]
pub struct BeanContainerBuilder {
    definitions: Vec<BeanDefinition>,
    policy: AmbiguityPolicy,
}

impl BeanContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded with the container settings of `config`.
    pub fn from_config(config: &BeanwireConfig) -> Self {
        Self::new().ambiguity(config.container.ambiguity)
    }

    /// Register a bean type using its own zero-argument constructor
    pub fn register<T: Bean>(self) -> Self {
        self.definition(BeanDefinition::of::<T>())
    }

    /// Register a bean type with an explicit zero-argument factory
    pub fn register_with<T, F>(self, factory: F) -> Self
    where
        T: Bean,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        self.definition(BeanDefinition::with_factory(factory))
    }

    pub fn definition(mut self, definition: BeanDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn definitions(mut self, definitions: impl IntoIterator<Item = BeanDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Add every component the scanner discovers
    pub fn scan(self, scanner: &ClassPathScanner) -> Self {
        self.definitions(scanner.scan())
    }

    /// How to resolve a dependency that more than one bean satisfies
    pub fn ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Instantiate and wire every registered bean
    ///
    /// # Errors
    /// Fails if no bean was registered, a constructor fails, or a dependency
    /// is ambiguous under [`AmbiguityPolicy::Reject`].
    pub fn build(self) -> Result<BeanContainer> {
        BeanContainer::construct(self.definitions, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Autowired;
    use crate::error::BeanwireError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(crate::Bean)]
    struct Counter {
        start: AtomicU32,
    }

    #[derive(crate::Bean)]
    struct Reporter {
        counter: Autowired<Counter>,
    }

    trait Clock: Send + Sync {}

    #[derive(crate::Bean)]
    #[bean(implements(Clock))]
    struct SystemClock;

    impl Clock for SystemClock {}

    #[derive(crate::Bean)]
    #[bean(implements(Clock))]
    struct FixedClock;

    impl Clock for FixedClock {}

    #[test]
    fn test_register_with_factory() -> anyhow::Result<()> {
        let container = BeanContainerBuilder::new()
            .register_with(|| {
                Ok(Counter {
                    start: AtomicU32::new(7),
                })
            })
            .register::<Reporter>()
            .build()?;

        let reporter = container.get_bean::<Reporter>()?;
        let counter = reporter.counter.resolved()?;
        assert_eq!(counter.start.load(Ordering::SeqCst), 7);
        Ok(())
    }

    #[test]
    fn test_build_without_beans_fails() {
        let err = BeanContainerBuilder::new().build().err().unwrap();
        assert!(matches!(err, BeanwireError::EmptyBeanSet));
    }

    #[test]
    fn test_ambiguity_policy_from_config() -> anyhow::Result<()> {
        let config =
            BeanwireConfig::from_json(r#"{"container": {"ambiguity": "first_registered"}}"#)?;

        let container = BeanContainerBuilder::from_config(&config)
            .register::<FixedClock>()
            .register::<SystemClock>()
            .build()?;

        assert!(container.get_bean::<dyn Clock>().is_ok());

        let strict = BeanContainerBuilder::new()
            .register::<FixedClock>()
            .register::<SystemClock>()
            .build()?;
        assert!(matches!(
            strict.get_bean::<dyn Clock>(),
            Err(BeanwireError::AmbiguousBean { .. })
        ));
        Ok(())
    }
}
