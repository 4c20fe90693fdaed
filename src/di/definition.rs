use crate::di::InjectionPoint;
use crate::error::{BeanwireError, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased shared instance as stored in the registry.
pub(crate) type SharedAny = Arc<dyn Any + Send + Sync>;

/// Casts a registry instance into an `Arc<dyn Any>` that wraps an `Arc<Target>`.
/// Returns `None` when the instance is not of the implementation type the
/// caster was built for.
type CasterFn = Arc<dyn Fn(SharedAny) -> Option<SharedAny> + Send + Sync>;

type FactoryFn = Arc<dyn Fn() -> Result<BeanInstance> + Send + Sync>;

/// Nominal type descriptor: identity plus a readable name.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type the container can manage.
///
/// Usually implemented with `#[derive(Bean)]`, which builds the factory from
/// `Default` field values, turns every `Autowired` field into an injection
/// point and registers the type for scanning when a stereotype is given.
///
/// # Example
/// ```
/// use beanwire::{Autowired, Bean};
///
/// pub trait UserDao: Send + Sync {}
///
/// #[derive(Bean)]
/// #[bean(implements(UserDao))]
/// pub struct InMemoryUserDao;
///
/// impl UserDao for InMemoryUserDao {}
///
/// #[derive(Bean)]
/// pub struct UserService {
///     dao: Autowired<dyn UserDao>,
/// }
/// ```
pub trait Bean: Send + Sync + 'static {
    /// Zero-argument constructor.
    ///
    /// # Errors
    /// Any error aborts container construction with `BeanInstantiation`.
    fn instantiate() -> Result<Self>
    where
        Self: Sized;

    /// Trait objects this type can be resolved as, besides itself.
    fn interfaces() -> Vec<Interface>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Dependency slots the container fills after every bean exists.
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        Vec::new()
    }
}

/// Declares that an implementation type is assignable to `Target`.
#[derive(Clone)]
pub struct Interface {
    key: TypeKey,
    caster: CasterFn,
}

impl Interface {
    /// Build the assignment `Impl -> Target` from an upcast function,
    /// typically `|bean| bean` with an `Arc<dyn Trait>` return type.
    pub fn of<Target, Impl>(cast: fn(Arc<Impl>) -> Arc<Target>) -> Self
    where
        Target: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
    {
        let caster: CasterFn = Arc::new(move |instance: SharedAny| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let target: Arc<Target> = cast(concrete);
            Some(Arc::new(target) as SharedAny)
        });
        Self {
            key: TypeKey::of::<Target>(),
            caster,
        }
    }

    /// The identity assignment of a type to itself.
    pub(crate) fn identity<T: Send + Sync + 'static>() -> Self {
        Self::of::<T, T>(|bean| bean)
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn cast(&self, instance: SharedAny) -> Option<SharedAny> {
        (self.caster)(instance)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface").field("key", &self.key).finish()
    }
}

/// A freshly created bean seen through both of its views.
pub(crate) struct BeanInstance {
    pub(crate) any: SharedAny,
    pub(crate) bean: Arc<dyn Bean>,
}

/// Constructor-registry entry for one bean type.
#[derive(Clone)]
pub struct BeanDefinition {
    key: TypeKey,
    factory: FactoryFn,
    interfaces: Vec<Interface>,
}

impl BeanDefinition {
    /// Definition using the type's own `Bean::instantiate`.
    pub fn of<T: Bean>() -> Self {
        Self::with_factory::<T, _>(T::instantiate)
    }

    /// Definition with an explicitly registered zero-argument factory.
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Bean,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        let mut interfaces = vec![Interface::identity::<T>()];
        interfaces.extend(T::interfaces());

        let factory: FactoryFn = Arc::new(move || {
            let instance = Arc::new(factory()?);
            Ok(BeanInstance {
                any: instance.clone(),
                bean: instance,
            })
        });

        Self {
            key: TypeKey::of::<T>(),
            factory,
            interfaces,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Every type this bean is assignable to, itself first.
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub(crate) fn instantiate(&self) -> Result<BeanInstance> {
        (self.factory)().map_err(|e| match e {
            e @ BeanwireError::BeanInstantiation { .. } => e,
            other => BeanwireError::instantiation(self.key.name(), other.to_string()),
        })
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("key", &self.key)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}
