use crate::di::TypeKey;
use crate::di::definition::SharedAny;
use crate::error::{BeanwireError, Result};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock, Weak};

/// A dependency slot filled by the container after every bean is created.
///
/// The slot starts unset. If no bean is assignable to `T` it stays unset,
/// which callers observe through [`Autowired::get`] returning `None`.
///
/// The slot does not own the injected bean; the container does. Beans that
/// wire each other (or themselves) are therefore dropped with the container,
/// and a slot outliving its container resolves to nothing.
pub struct Autowired<T: ?Sized> {
    cell: OnceLock<Weak<T>>,
}

impl<T: ?Sized> Autowired<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The injected bean while its container is alive.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().and_then(Weak::upgrade)
    }

    /// Whether the container assigned this slot, alive or not.
    pub fn is_wired(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: ?Sized + 'static> Autowired<T> {
    /// The injected bean.
    ///
    /// # Errors
    /// `BeanNotFound` when the slot was left unset, `BeanReleased` when the
    /// container that wired it has been dropped.
    pub fn resolved(&self) -> Result<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let weak = self
            .cell
            .get()
            .ok_or_else(|| BeanwireError::not_found(type_name))?;
        weak.upgrade().ok_or_else(|| BeanwireError::BeanReleased {
            type_name: type_name.to_string(),
        })
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("wired", &self.is_wired())
            .finish()
    }
}

/// Type-erased view of a dependency slot.
pub trait DependencySlot: Send + Sync {
    /// The declared type a bean must be assignable to.
    fn dependency(&self) -> TypeKey;

    /// Store `candidate`, an `Arc<dyn Any>` wrapping an `Arc` of the declared type.
    fn inject(&self, candidate: SharedAny) -> std::result::Result<(), String>;
}

impl<T: ?Sized + Send + Sync + 'static> DependencySlot for Autowired<T> {
    fn dependency(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn inject(&self, candidate: SharedAny) -> std::result::Result<(), String> {
        let wrapper = candidate
            .downcast::<Arc<T>>()
            .map_err(|_| format!("candidate is not an Arc<{}>", std::any::type_name::<T>()))?;
        self.cell
            .set(Arc::downgrade(wrapper.deref()))
            .map_err(|_| "slot is already wired".to_string())
    }
}

/// A named dependency slot of a bean.
pub struct InjectionPoint<'a> {
    field: &'static str,
    slot: &'a dyn DependencySlot,
}

impl<'a> InjectionPoint<'a> {
    pub fn new(field: &'static str, slot: &'a dyn DependencySlot) -> Self {
        Self { field, slot }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn dependency(&self) -> TypeKey {
        self.slot.dependency()
    }

    pub(crate) fn inject(&self, owner: TypeKey, candidate: SharedAny) -> Result<()> {
        self.slot
            .inject(candidate)
            .map_err(|message| BeanwireError::BeanAccess {
                type_name: owner.name().to_string(),
                field: self.field.to_string(),
                message,
            })
    }
}
