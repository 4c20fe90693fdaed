use crate::config::AmbiguityPolicy;
use crate::di::definition::{BeanDefinition, Interface, SharedAny, TypeKey};
use crate::di::{Bean, BeanContainerBuilder};
use crate::error::{BeanwireError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// One registry member.
struct BeanEntry {
    key: TypeKey,
    instance: SharedAny,
    bean: Arc<dyn Bean>,
    interfaces: Vec<Interface>,
}

impl BeanEntry {
    fn assignable_to(&self, key: TypeKey) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.key() == key)
    }
}

/// Immutable bean registry: one instance per bean type, wired once at
/// construction.
pub struct BeanContainer {
    beans: Vec<BeanEntry>,
    policy: AmbiguityPolicy,
}

impl BeanContainer {
    /// Build a container from the given definitions with the default
    /// ambiguity policy.
    pub fn new(definitions: impl IntoIterator<Item = BeanDefinition>) -> Result<Self> {
        Self::construct(definitions, AmbiguityPolicy::default())
    }

    pub fn builder() -> BeanContainerBuilder {
        BeanContainerBuilder::new()
    }

    pub(crate) fn construct(
        definitions: impl IntoIterator<Item = BeanDefinition>,
        policy: AmbiguityPolicy,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut beans = Vec::new();

        for definition in definitions {
            let key = definition.key();
            if !seen.insert(key) {
                tracing::debug!("Skipping duplicate bean type: {}", key);
                continue;
            }
            let instance = definition.instantiate()?;
            tracing::debug!("Instantiated bean: {}", key);
            beans.push(BeanEntry {
                key,
                instance: instance.any,
                bean: instance.bean,
                interfaces: definition.interfaces().to_vec(),
            });
        }

        if beans.is_empty() {
            return Err(BeanwireError::EmptyBeanSet);
        }

        let container = Self { beans, policy };
        container.inject_dependencies()?;

        tracing::info!("Bean container ready ({} beans)", container.len());
        Ok(container)
    }

    /// Single pass over every injection point of every bean.
    fn inject_dependencies(&self) -> Result<()> {
        for entry in &self.beans {
            for point in entry.bean.injection_points() {
                let dependency = point.dependency();
                match self.lookup(dependency)? {
                    Some(candidate) => {
                        point.inject(entry.key, candidate)?;
                        tracing::debug!("Injected {} into {}.{}", dependency, entry.key, point.field());
                    }
                    None => {
                        tracing::debug!(
                            "No bean for {}.{} ({}), leaving it unset",
                            entry.key,
                            point.field(),
                            dependency
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Finds the member assignable to `key` and casts it to an
    /// `Arc<dyn Any>` wrapping `Arc<key>`.
    fn lookup(&self, key: TypeKey) -> Result<Option<SharedAny>> {
        let mut matches = self
            .beans
            .iter()
            .filter_map(|entry| entry.assignable_to(key).map(|i| (entry, i)));

        let Some((first, interface)) = matches.next() else {
            return Ok(None);
        };

        let others: Vec<TypeKey> = matches.map(|(entry, _)| entry.key).collect();
        if !others.is_empty() {
            let candidates = std::iter::once(first.key)
                .chain(others)
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", ");
            match self.policy {
                AmbiguityPolicy::Reject => {
                    return Err(BeanwireError::AmbiguousBean {
                        type_name: key.name().to_string(),
                        candidates,
                    });
                }
                AmbiguityPolicy::FirstRegistered => {
                    tracing::warn!(
                        "Ambiguous bean for {}: [{}], using {}",
                        key,
                        candidates,
                        first.key
                    );
                }
            }
        }

        interface
            .cast(first.instance.clone())
            .map(Some)
            .ok_or_else(|| BeanwireError::DowncastFailed {
                type_name: key.name().to_string(),
            })
    }

    /// The bean assignable to `T`; `T` may be a concrete type or a trait
    /// object.
    pub fn get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let candidate = self
            .lookup(key)?
            .ok_or_else(|| BeanwireError::not_found(key.name()))?;

        let wrapper = candidate
            .downcast::<Arc<T>>()
            .map_err(|_| BeanwireError::DowncastFailed {
                type_name: key.name().to_string(),
            })?;
        Ok(wrapper.as_ref().clone())
    }

    pub fn contains_bean<T: ?Sized + 'static>(&self) -> bool {
        let key = TypeKey::of::<T>();
        self.beans.iter().any(|entry| entry.assignable_to(key).is_some())
    }

    /// Bean types in registration order.
    pub fn bean_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.beans.iter().map(|entry| entry.key)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}
