//! Component scanning
//!
//! `#[derive(Bean)]` with a stereotype flag (`#[bean(service)]` and friends)
//! submits a [`ComponentRegistration`] at link time. A [`ClassPathScanner`]
//! picks the registrations below a module path and turns them into bean
//! definitions.

use crate::di::BeanDefinition;
use std::collections::HashSet;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Role marker carried by a scannable bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Stereotype {
    Component,
    Service,
    Repository,
    Controller,
}

/// Registration info for a bean type collected via inventory.
pub struct ComponentRegistration {
    pub stereotype: Stereotype,
    pub module_path: &'static str,
    pub type_name: fn() -> &'static str,
    pub definition: fn() -> BeanDefinition,
}

impl ComponentRegistration {
    pub const fn new(
        stereotype: Stereotype,
        module_path: &'static str,
        type_name: fn() -> &'static str,
        definition: fn() -> BeanDefinition,
    ) -> Self {
        Self {
            stereotype,
            module_path,
            type_name,
            definition,
        }
    }

    /// Whether the type lives in `namespace` or one of its submodules.
    pub fn is_within(&self, namespace: &str) -> bool {
        match self.module_path.strip_prefix(namespace) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }
}

inventory::collect!(ComponentRegistration);

const DEFAULT_STEREOTYPES: [Stereotype; 2] = [Stereotype::Service, Stereotype::Repository];

/// Finds stereotyped beans by module path.
///
/// # Example
/// ```rust
/// use beanwire::{ClassPathScanner, Stereotype};
///
/// let scanner = ClassPathScanner::new("my_app::users")
///     .stereotypes(&[Stereotype::Service, Stereotype::Controller]);
/// assert!(scanner.scan().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ClassPathScanner {
    namespace: String,
    stereotypes: HashSet<Stereotype>,
}

impl ClassPathScanner {
    /// Scanner for services and repositories below `namespace`, e.g.
    /// `module_path!()`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            stereotypes: HashSet::from(DEFAULT_STEREOTYPES),
        }
    }

    /// Widen the scan to every stereotype.
    pub fn all_stereotypes(mut self) -> Self {
        self.stereotypes = Stereotype::iter().collect();
        self
    }

    /// Restrict the scan to the given stereotypes
    pub fn stereotypes(mut self, stereotypes: &[Stereotype]) -> Self {
        self.stereotypes = stereotypes.iter().copied().collect();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Matching registrations, ordered by type name.
    pub fn registrations(&self) -> Vec<&'static ComponentRegistration> {
        let mut found: Vec<_> = inventory::iter::<ComponentRegistration>
            .into_iter()
            .filter(|reg| self.stereotypes.contains(&reg.stereotype))
            .filter(|reg| reg.is_within(&self.namespace))
            .collect();
        found.sort_by_key(|reg| (reg.type_name)());
        found
    }

    pub fn scan(&self) -> Vec<BeanDefinition> {
        let found = self.registrations();
        tracing::debug!(
            "Scanned {} component(s) under '{}'",
            found.len(),
            self.namespace
        );

        found
            .into_iter()
            .map(|reg| {
                tracing::debug!("Found {} {}", reg.stereotype, (reg.type_name)());
                (reg.definition)()
            })
            .collect()
    }
}
