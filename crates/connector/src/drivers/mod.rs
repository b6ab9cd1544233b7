//! Storage drivers and their registry.
//!
//! A driver produces the configuration of one category of storage root.
//! This module provides:
//! - The [`Driver`] interface every implementation satisfies
//! - The five built-in drivers for course and user storage
//! - [`DriverRegistry`], mapping symbolic names to implementations
//!
//! Drivers hold a non-owning [`ConnectorRef`] to the request context and
//! resolve their root during [`Driver::setup`]. A driver whose required
//! identity is absent declares no driver type; the connector reports that
//! root as invalid and skips it.

/// Implements the naming and binding half of [`Driver`] by delegating to a
/// `base: DriverBase` field.
macro_rules! delegate_driver_base {
    () => {
        fn name(&self) -> &str {
            self.base.name()
        }

        fn set_name(&mut self, name: String) {
            self.base.set_name(name);
        }

        fn connector(&self) -> &roots::ConnectorRef {
            self.base.connector()
        }

        fn set_connector(&mut self, connector: roots::ConnectorRef) {
            self.base.set_connector(connector);
        }
    };
}

pub(crate) use delegate_driver_base;

pub mod course;
pub mod registry;
pub mod user;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use roots::{ConnectorRef, PartialConfiguration};

use crate::context::RequestContext;
use crate::error::DriverError;

pub use course::{CourseDriver, CourseUserDriver, DropBoxDriver};
pub use registry::{DriverFactory, DriverRegistry};
pub use user::{HomeDriver, PersonalDriver};

/// A pluggable strategy producing one storage root.
pub trait Driver: fmt::Debug {
    /// The name the driver was registered under.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// The connector this driver is bound to.
    fn connector(&self) -> &ConnectorRef;

    fn set_connector(&mut self, connector: ConnectorRef);

    /// Prepare the driver for the current request, e.g. resolve its path.
    ///
    /// Called once before [`configuration`](Driver::configuration) is read.
    fn setup(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    /// The driver's own configuration. It must declare `driver` to be usable.
    fn configuration(&self) -> PartialConfiguration;
}

/// The closed set of built-in drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Course,
    CourseUser,
    DropBox,
    Home,
    Personal,
}

impl DriverKind {
    /// Built-in drivers, in their default activation order.
    pub const ALL: [DriverKind; 5] = [
        DriverKind::Course,
        DriverKind::CourseUser,
        DriverKind::DropBox,
        DriverKind::Home,
        DriverKind::Personal,
    ];

    /// The symbolic name the driver is registered and configured under.
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Course => "CourseDriver",
            DriverKind::CourseUser => "CourseUserDriver",
            DriverKind::DropBox => "DropBoxDriver",
            DriverKind::Home => "HomeDriver",
            DriverKind::Personal => "PersonalDriver",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The constructor for this driver.
    pub fn factory(&self) -> DriverFactory {
        match self {
            DriverKind::Course => build::<CourseDriver>,
            DriverKind::CourseUser => build::<CourseUserDriver>,
            DriverKind::DropBox => build::<DropBoxDriver>,
            DriverKind::Home => build::<HomeDriver>,
            DriverKind::Personal => build::<PersonalDriver>,
        }
    }
}

fn build<D: Driver + Default + 'static>() -> Box<dyn Driver> {
    Box::new(D::default())
}

/// The default driver activation list.
pub fn default_driver_list() -> Vec<String> {
    DriverKind::ALL
        .iter()
        .map(|kind| kind.name().to_string())
        .collect()
}

/// Name and connector binding shared by the built-in drivers.
#[derive(Debug, Clone, Default)]
pub struct DriverBase {
    name: String,
    connector: ConnectorRef,
}

impl DriverBase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn connector(&self) -> &ConnectorRef {
        &self.connector
    }

    pub fn set_connector(&mut self, connector: ConnectorRef) {
        self.connector = connector;
    }

    /// The request context behind the connector binding.
    pub fn context(&self) -> Result<Arc<RequestContext>, DriverError> {
        self.connector
            .upgrade::<RequestContext>()
            .ok_or(DriverError::Detached)
    }
}

/// A root location resolved during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    pub path: PathBuf,
    pub url: String,
    pub alias: String,
}

impl ResolvedRoot {
    /// The configuration declaring this root for `driver`.
    pub fn configuration(&self, driver: &str) -> PartialConfiguration {
        PartialConfiguration {
            path: Some(self.path.clone()),
            url: Some(self.url.clone()),
            alias: Some(self.alias.clone()),
            ..PartialConfiguration::for_driver(driver)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in DriverKind::ALL {
            assert_eq!(DriverKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DriverKind::from_name("GhostDriver"), None);
    }

    #[test]
    fn test_default_driver_list_order() {
        assert_eq!(
            default_driver_list(),
            vec![
                "CourseDriver",
                "CourseUserDriver",
                "DropBoxDriver",
                "HomeDriver",
                "PersonalDriver"
            ]
        );
    }

    #[test]
    fn test_factory_builds_unnamed_driver() {
        let driver = (DriverKind::Home.factory())();
        assert_eq!(driver.name(), "");
        assert!(driver.connector().is_detached());
    }

    #[test]
    fn test_base_context_detached() {
        let base = DriverBase::default();
        assert_eq!(base.context().unwrap_err(), DriverError::Detached);
    }
}
