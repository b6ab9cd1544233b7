//! User-scoped drivers: the home folder and personal files.

use roots::PartialConfiguration;
use tracing::debug;

use super::{delegate_driver_base, Driver, DriverBase, ResolvedRoot};
use crate::context::{RequestContext, PATH_USERS};
use crate::error::DriverError;

fn user_root(
    ctx: &RequestContext,
    folder: &str,
    route: &str,
    alias_key: &str,
) -> Result<Option<ResolvedRoot>, DriverError> {
    let Some(user) = &ctx.user else {
        return Ok(None);
    };

    let users = ctx.paths.require(PATH_USERS)?;
    Ok(Some(ResolvedRoot {
        path: users.join(user.id.to_string()).join(folder),
        url: ctx
            .url_generator
            .generate(route, &[("user", user.id.to_string())]),
        alias: ctx.translator.trans(alias_key),
    }))
}

/// The user's "my files" folder.
#[derive(Debug, Default)]
pub struct HomeDriver {
    base: DriverBase,
    root: Option<ResolvedRoot>,
}

impl Driver for HomeDriver {
    delegate_driver_base!();

    fn setup(&mut self) -> Result<(), DriverError> {
        let ctx = self.base.context()?;
        self.root = user_root(&ctx, "my_files", "user_files", "MyFiles")?;
        if self.root.is_none() {
            debug!(driver = %self.base.name(), "No user in context");
        }
        Ok(())
    }

    fn configuration(&self) -> PartialConfiguration {
        match &self.root {
            Some(root) => root.configuration(self.name()),
            None => PartialConfiguration::default(),
        }
    }
}

/// The user's personal files.
#[derive(Debug, Default)]
pub struct PersonalDriver {
    base: DriverBase,
    root: Option<ResolvedRoot>,
}

impl Driver for PersonalDriver {
    delegate_driver_base!();

    fn setup(&mut self) -> Result<(), DriverError> {
        let ctx = self.base.context()?;
        self.root = user_root(&ctx, "personal", "user_personal_files", "PersonalFiles")?;
        if self.root.is_none() {
            debug!(driver = %self.base.name(), "No user in context");
        }
        Ok(())
    }

    fn configuration(&self) -> PartialConfiguration {
        match &self.root {
            Some(root) => root.configuration(self.name()),
            None => PartialConfiguration::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use roots::ConnectorRef;

    use super::*;
    use crate::drivers::testing::{context, course, user};

    #[test]
    fn test_home_driver_resolves_user_folder() {
        let ctx = context(Some(user()), None, None, &[]);
        let mut driver = HomeDriver::default();
        driver.set_name("HomeDriver".to_string());
        driver.set_connector(ConnectorRef::new(&ctx));
        driver.setup().unwrap();

        let cfg = driver.configuration();
        assert_eq!(cfg.driver.as_deref(), Some("HomeDriver"));
        assert_eq!(
            cfg.path.as_deref(),
            Some(Path::new("/srv/lms/users/42/my_files"))
        );
        assert_eq!(cfg.url.as_deref(), Some("https://lms.test/user_files?user=42"));
        assert_eq!(cfg.alias.as_deref(), Some("MyFiles"));
    }

    #[test]
    fn test_home_driver_has_no_course_dependency() {
        let ctx = context(Some(user()), Some(course()), None, &[]);
        let mut driver = HomeDriver::default();
        driver.set_name("HomeDriver".to_string());
        driver.set_connector(ConnectorRef::new(&ctx));
        driver.setup().unwrap();
        assert!(driver.configuration().driver.is_some());
    }

    #[test]
    fn test_personal_driver_inherits_upload_policy() {
        let ctx = context(Some(user()), None, None, &[]);
        let mut driver = PersonalDriver::default();
        driver.set_name("PersonalDriver".to_string());
        driver.set_connector(ConnectorRef::new(&ctx));
        driver.setup().unwrap();

        let cfg = driver.configuration();
        assert_eq!(cfg.upload_overwrite, None);
        assert!(cfg.attributes.is_none());
        assert_eq!(
            cfg.path.as_deref(),
            Some(Path::new("/srv/lms/users/42/personal"))
        );
    }

    #[test]
    fn test_anonymous_request_declares_nothing() {
        let ctx = context(None, None, None, &[]);
        let mut driver = PersonalDriver::default();
        driver.set_connector(ConnectorRef::new(&ctx));
        driver.setup().unwrap();
        assert_eq!(driver.configuration(), PartialConfiguration::default());
    }

    #[test]
    fn test_setup_after_context_dropped() {
        let ctx = context(Some(user()), None, None, &[]);
        let mut driver = HomeDriver::default();
        driver.set_connector(ConnectorRef::new(&ctx));
        drop(ctx);
        assert_eq!(driver.setup(), Err(DriverError::Detached));
    }
}
