mod autowired;
mod builder;
mod container;
mod definition;

pub use autowired::{Autowired, DependencySlot, InjectionPoint};
pub use builder::BeanContainerBuilder;
pub use container::BeanContainer;
pub use definition::{Bean, BeanDefinition, Interface, TypeKey};
