//! Driver registry: symbolic names to implementations and live instances.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use roots::{ConnectorRef, DriverNamespace, RootError};
use tracing::debug;

use super::{default_driver_list, Driver, DriverKind};

/// Constructor for a driver implementation.
pub type DriverFactory = fn() -> Box<dyn Driver>;

/// Maps driver names to factories and holds the instances of one request.
///
/// Instantiating a name that already has an instance replaces it: the last
/// instantiation wins.
pub struct DriverRegistry {
    namespace: DriverNamespace,
    factories: BTreeMap<String, DriverFactory>,
    driver_list: Vec<String>,
    instances: BTreeMap<String, Box<dyn Driver>>,
}

impl DriverRegistry {
    /// A registry with no factories and an empty driver list.
    pub fn empty(namespace: DriverNamespace) -> Self {
        Self {
            namespace,
            factories: BTreeMap::new(),
            driver_list: Vec::new(),
            instances: BTreeMap::new(),
        }
    }

    /// A registry knowing the built-in drivers, with the default list active.
    pub fn with_builtin(namespace: DriverNamespace) -> Self {
        let mut registry = Self::empty(namespace);
        for kind in DriverKind::ALL {
            registry.register(kind.name(), kind.factory());
        }
        registry.driver_list = default_driver_list();
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: DriverFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            debug!(driver = %name, "Replaced driver factory");
        }
    }

    /// Whether `name` resolves to an implementation.
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn namespace(&self) -> &DriverNamespace {
        &self.namespace
    }

    /// Replace the names to activate. Names are not checked here.
    pub fn set_driver_list(&mut self, names: Vec<String>) {
        self.driver_list = names;
    }

    pub fn driver_list(&self) -> &[String] {
        &self.driver_list
    }

    /// Construct the driver registered as `name`, bind it to `connector` and
    /// store it under `name`.
    ///
    /// An unknown name fails with [`RootError::UnresolvedDriver`] and leaves
    /// existing instances untouched.
    pub fn instantiate(
        &mut self,
        name: &str,
        connector: &ConnectorRef,
    ) -> Result<&mut dyn Driver, RootError> {
        let factory = self
            .factories
            .get(name)
            .copied()
            .ok_or_else(|| RootError::UnresolvedDriver {
                name: name.to_string(),
            })?;

        let mut driver = factory();
        driver.set_name(name.to_string());
        driver.set_connector(connector.clone());

        let slot = match self.instances.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                debug!(driver = %name, "Replacing existing driver instance");
                entry.insert(driver);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(driver),
        };
        let driver: &mut dyn Driver = slot.as_mut();
        Ok(driver)
    }

    /// Store an already built driver under `name`, replacing any instance.
    ///
    /// The driver keeps its connector binding; only its name is set.
    /// Returns the replaced instance.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        mut driver: Box<dyn Driver>,
    ) -> Option<Box<dyn Driver>> {
        let name = name.into();
        driver.set_name(name.clone());
        let previous = self.instances.insert(name.clone(), driver);
        if previous.is_some() {
            debug!(driver = %name, "Replacing existing driver instance");
        }
        previous
    }

    /// Instantiate every name in the driver list.
    ///
    /// Unresolvable names are skipped; their errors are returned.
    pub fn instantiate_all(&mut self, connector: &ConnectorRef) -> Vec<RootError> {
        let names = self.driver_list.clone();
        names
            .iter()
            .filter_map(|name| self.instantiate(name, connector).err())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Driver> {
        self.instances.get(name).map(|driver| driver.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Driver> {
        let driver: &mut dyn Driver = self.instances.get_mut(name)?.as_mut();
        Some(driver)
    }

    /// Every instantiated driver, by name.
    pub fn all(&self) -> &BTreeMap<String, Box<dyn Driver>> {
        &self.instances
    }

    /// Drop every instance.
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// The registered name behind a qualified driver reference.
    pub fn resolve_qualified<'a>(&self, qualified: &'a str) -> Result<&'a str, RootError> {
        self.namespace
            .strip(qualified)
            .filter(|name| self.is_registered(name))
            .ok_or_else(|| RootError::UnresolvedDriver {
                name: qualified.to_string(),
            })
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin(DriverNamespace::default())
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("namespace", &self.namespace)
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("driver_list", &self.driver_list)
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}
