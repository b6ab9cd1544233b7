//! The per-request connector: turns the active drivers into storage roots.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use roots::{
    Attribute, Command, ConfigMerger, ConnectorRef, DefaultPolicy, DriverNamespace,
    PartialConfiguration, PluginContext, RootConfiguration, RootError, RootTemplate,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::access::dotfile_access;
use crate::context::RequestContext;
use crate::drivers::{default_driver_list, Driver, DriverRegistry};
use crate::error::{ConnectorError, Result};
use crate::hooks::{BindTable, CommandEvent, CommandHook, NoopCommandHook, HOOKED_COMMANDS};

/// Settings a connector is built with.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSettings {
    /// Driver names to activate, in root order.
    pub driver_list: Vec<String>,
    pub namespace: DriverNamespace,
    pub policy: DefaultPolicy,
    pub session_close_earlier: bool,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            driver_list: default_driver_list(),
            namespace: DriverNamespace::default(),
            policy: DefaultPolicy::builtin(),
            session_close_earlier: false,
        }
    }
}

/// A driver whose root could not be produced.
#[derive(Debug)]
pub struct RootFailure {
    pub driver: String,
    pub error: ConnectorError,
}

/// Roots produced for one request, with the drivers that were skipped.
#[derive(Debug, Default)]
pub struct RootAssembly {
    pub roots: Vec<RootConfiguration>,
    pub failures: Vec<RootFailure>,
}

/// The configuration handed to the file-manager runtime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operations {
    pub bind: BindTable,
    pub session_close_earlier: bool,
    pub roots: Vec<RootConfiguration>,
}

impl Operations {
    /// Fire the hooks bound to `event`'s command. Returns how many fired.
    pub fn dispatch(&self, event: &CommandEvent<'_>) -> usize {
        self.bind.dispatch(event)
    }
}

/// Builds the storage roots of one request.
///
/// Owns the driver instances; drivers reach the request context through a
/// non-owning handle so nothing outlives the connector.
pub struct Connector {
    context: Arc<RequestContext>,
    registry: DriverRegistry,
    policy: DefaultPolicy,
    merger: ConfigMerger,
    hook: Arc<dyn CommandHook>,
    session_close_earlier: bool,
}

impl Connector {
    /// Create a connector for `context`.
    ///
    /// Fails with [`ConnectorError::MissingContext`] when the path table has
    /// no temporary directory.
    pub fn new(context: Arc<RequestContext>, settings: ConnectorSettings) -> Result<Self> {
        context.validate()?;

        let mut registry = DriverRegistry::with_builtin(settings.namespace.clone());
        registry.set_driver_list(settings.driver_list);

        debug!(
            drivers = ?registry.driver_list(),
            namespace = %settings.namespace,
            "Connector created"
        );

        Ok(Self {
            context,
            registry,
            policy: settings.policy,
            merger: ConfigMerger::new(settings.namespace),
            hook: Arc::new(NoopCommandHook),
            session_close_earlier: settings.session_close_earlier,
        })
    }

    /// Non-owning handle drivers use to reach the request context.
    pub fn handle(&self) -> ConnectorRef {
        ConnectorRef::new(&self.context)
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn policy(&self) -> &DefaultPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Mutable registry access, e.g. to register additional drivers.
    pub fn registry_mut(&mut self) -> &mut DriverRegistry {
        &mut self.registry
    }

    pub fn driver_list(&self) -> &[String] {
        self.registry.driver_list()
    }

    pub fn set_driver_list(&mut self, names: Vec<String>) {
        self.registry.set_driver_list(names);
    }

    /// Instantiate the driver registered as `name`, replacing any instance.
    pub fn set_driver(&mut self, name: &str) -> Result<()> {
        let handle = self.handle();
        self.registry.instantiate(name, &handle)?;
        Ok(())
    }

    /// Instantiate every driver in the list, replacing existing instances.
    pub fn set_drivers(&mut self) -> Vec<RootError> {
        let handle = self.handle();
        let failures = self.registry.instantiate_all(&handle);
        for error in &failures {
            debug!(error = %error, "Driver not instantiated");
        }
        failures
    }

    /// Bind an already built driver to this connector and store it as `name`.
    ///
    /// Its roots only resolve when a factory is registered under `name`.
    pub fn add_driver(&mut self, name: &str, mut driver: Box<dyn Driver>) {
        driver.set_connector(self.handle());
        self.registry.insert(name, driver);
    }

    pub fn get_driver(&self, name: &str) -> Option<&dyn Driver> {
        self.registry.get(name)
    }

    /// Every instantiated driver, by name.
    pub fn drivers(&self) -> &BTreeMap<String, Box<dyn Driver>> {
        self.registry.all()
    }

    /// The policy baseline as a fresh template.
    pub fn default_driver_settings(&self) -> RootTemplate {
        self.policy.defaults()
    }

    /// Merge a driver configuration over the policy defaults.
    pub fn update_with_default_values(
        &self,
        configuration: &PartialConfiguration,
    ) -> Result<RootConfiguration> {
        Ok(self
            .merger
            .merge(&self.policy.defaults(), configuration)?)
    }

    /// Build one root per listed driver, keeping every failure.
    ///
    /// With `apply_defaults` unset, driver configurations are passed through
    /// without the policy baseline.
    pub fn assemble_roots(&mut self, apply_defaults: bool) -> RootAssembly {
        let handle = self.handle();
        let defaults = apply_defaults.then(|| self.policy.defaults());
        let mut assembly = RootAssembly::default();

        for name in self.registry.driver_list().to_vec() {
            match self.build_root(&name, &handle, defaults.as_ref()) {
                Ok(root) => assembly.roots.push(root),
                Err(error) => {
                    warn!(driver = %name, error = %error, "Skipping storage root");
                    assembly.failures.push(RootFailure {
                        driver: name,
                        error,
                    });
                }
            }
        }

        debug!(
            roots = assembly.roots.len(),
            skipped = assembly.failures.len(),
            "Storage roots assembled"
        );
        assembly
    }

    /// The roots of every driver that produced a valid configuration.
    ///
    /// Every returned root's driver resolves through the registry.
    pub fn get_roots(&mut self, apply_defaults: bool) -> Vec<RootConfiguration> {
        self.assemble_roots(apply_defaults).roots
    }

    fn build_root(
        &mut self,
        name: &str,
        handle: &ConnectorRef,
        defaults: Option<&RootTemplate>,
    ) -> Result<RootConfiguration> {
        if self.registry.get(name).is_none() {
            self.registry.instantiate(name, handle)?;
        }
        let driver = self
            .registry
            .get_mut(name)
            .ok_or_else(|| RootError::UnresolvedDriver {
                name: name.to_string(),
            })?;

        driver
            .setup()
            .map_err(|source| ConnectorError::DriverSetup {
                driver: name.to_string(),
                source,
            })?;

        let mut raw = driver.configuration();
        raw.plugin = Some(PluginContext::new(name, handle.clone()));

        let root = match defaults {
            Some(defaults) => self.merger.merge(defaults, &raw)?,
            None => self.merger.pass_through(&raw)?,
        };
        // The runtime instantiates roots by their declared driver type.
        self.registry.resolve_qualified(&root.driver)?;
        Ok(root)
    }

    /// Re-instantiate every driver and produce the runtime configuration.
    pub fn get_operations(&mut self) -> Operations {
        self.operations(true)
    }

    /// Like [`get_operations`](Self::get_operations), with the policy
    /// baseline applied only when `apply_defaults` is set.
    pub fn operations(&mut self, apply_defaults: bool) -> Operations {
        self.set_drivers();
        let roots = self.get_roots(apply_defaults);

        let mut bind = BindTable::new();
        bind.bind(HOOKED_COMMANDS, self.hook.clone());

        Operations {
            bind,
            session_close_earlier: self.session_close_earlier,
            roots,
        }
    }

    /// Access predicate for the runtime. `None` leaves the decision to it.
    ///
    /// `data` and `volume` are the runtime's entry metadata and volume; only
    /// the path is consulted.
    pub fn access(
        &self,
        attribute: Attribute,
        path: &str,
        _data: Option<&Value>,
        _volume: Option<&str>,
    ) -> Option<bool> {
        dotfile_access(attribute, path)
    }

    /// Replace the hook bound to completed commands.
    pub fn set_command_hook(&mut self, hook: Arc<dyn CommandHook>) {
        self.hook = hook;
    }

    /// Forward a completed command to the bound hook.
    pub fn on_command(
        &self,
        command: Command,
        result: &Value,
        args: &Value,
        runtime: Option<&dyn Any>,
    ) {
        self.hook.on_command(&CommandEvent {
            command,
            result,
            args,
            runtime,
        });
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("context", &self.context)
            .field("registry", &self.registry)
            .field("hook", &self.hook.name())
            .field("session_close_earlier", &self.session_close_earlier)
            .finish_non_exhaustive()
    }
}
