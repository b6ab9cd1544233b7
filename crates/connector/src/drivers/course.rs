//! Course-scoped drivers: course documents, per-user shared folders and the
//! drop-box.

use std::path::PathBuf;

use roots::{Attribute, AttributeRule, PartialConfiguration};
use tracing::debug;

use super::{delegate_driver_base, Driver, DriverBase, ResolvedRoot};
use crate::context::{Course, RequestContext, PATH_COURSES};
use crate::error::DriverError;

/// Role that may edit the current course's documents.
pub const ROLE_COURSE_TEACHER: &str = "ROLE_CURRENT_COURSE_TEACHER";

/// Folder holding the documents of a course.
pub fn course_directory(ctx: &RequestContext, course: &Course) -> Result<PathBuf, DriverError> {
    let courses = ctx.paths.require(PATH_COURSES)?;
    let directory = course
        .directory
        .clone()
        .or_else(|| ctx.entities.course_directory(course.id))
        .unwrap_or_else(|| course.code.clone());
    Ok(courses.join(directory))
}

fn course_url(ctx: &RequestContext, route: &str, course: &Course) -> String {
    let mut params = vec![("cid", course.id.to_string())];
    if let Some(session) = &ctx.session {
        params.push(("sid", session.id.to_string()));
    }
    ctx.url_generator.generate(route, &params)
}

/// The documents area of the current course.
///
/// Users without the course teacher role get a read-only root.
#[derive(Debug, Default)]
pub struct CourseDriver {
    base: DriverBase,
    root: Option<ResolvedRoot>,
    read_only: bool,
}

impl Driver for CourseDriver {
    delegate_driver_base!();

    fn setup(&mut self) -> Result<(), DriverError> {
        let ctx = self.base.context()?;
        self.root = None;

        let Some(course) = &ctx.course else {
            debug!(driver = %self.base.name(), "No course in context");
            return Ok(());
        };

        self.root = Some(ResolvedRoot {
            path: course_directory(&ctx, course)?.join("document"),
            url: course_url(&ctx, "course_documents", course),
            alias: course.title.clone(),
        });
        self.read_only = !ctx.security.is_granted(ROLE_COURSE_TEACHER);
        Ok(())
    }

    fn configuration(&self) -> PartialConfiguration {
        let Some(root) = &self.root else {
            return PartialConfiguration::default();
        };

        let mut cfg = root.configuration(self.name());
        if self.read_only {
            cfg.push_attribute(
                AttributeRule::new("/.*/")
                    .with(Attribute::Write, false)
                    .with(Attribute::Locked, true),
            );
        }
        cfg
    }
}

/// The current user's shared folder inside the course documents.
#[derive(Debug, Default)]
pub struct CourseUserDriver {
    base: DriverBase,
    root: Option<ResolvedRoot>,
}

impl Driver for CourseUserDriver {
    delegate_driver_base!();

    fn setup(&mut self) -> Result<(), DriverError> {
        let ctx = self.base.context()?;
        self.root = None;

        let (Some(course), Some(user)) = (&ctx.course, &ctx.user) else {
            debug!(driver = %self.base.name(), "Shared folder needs a course and a user");
            return Ok(());
        };

        let shared = match &ctx.session {
            Some(session) => format!("shared_folder_session_{}", session.id),
            None => "shared_folder".to_string(),
        };

        self.root = Some(ResolvedRoot {
            path: course_directory(&ctx, course)?
                .join("document")
                .join(shared)
                .join(format!("sf_user_{}", user.id)),
            url: course_url(&ctx, "course_user_documents", course),
            alias: format!("{} ({})", ctx.translator.trans("UserFolder"), user.username),
        });
        Ok(())
    }

    fn configuration(&self) -> PartialConfiguration {
        match &self.root {
            Some(root) => root.configuration(self.name()),
            None => PartialConfiguration::default(),
        }
    }
}

/// The course drop-box.
#[derive(Debug, Default)]
pub struct DropBoxDriver {
    base: DriverBase,
    root: Option<ResolvedRoot>,
}

impl Driver for DropBoxDriver {
    delegate_driver_base!();

    fn setup(&mut self) -> Result<(), DriverError> {
        let ctx = self.base.context()?;
        self.root = None;

        let (Some(course), Some(_)) = (&ctx.course, &ctx.user) else {
            debug!(driver = %self.base.name(), "Drop-box needs a course and a user");
            return Ok(());
        };

        self.root = Some(ResolvedRoot {
            path: course_directory(&ctx, course)?.join("dropbox"),
            url: course_url(&ctx, "course_dropbox", course),
            alias: ctx.translator.trans("Dropbox"),
        });
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
    use crate::drivers::testing::{context, course, session, user};

    fn bound<D: Driver + Default>(name: &str, ctx: &std::sync::Arc<RequestContext>) -> D {
        let mut driver = D::default();
        driver.set_name(name.to_string());
        driver.set_connector(ConnectorRef::new(ctx));
        driver
    }

    #[test]
    fn test_course_driver_resolves_documents() {
        let ctx = context(Some(user()), Some(course()), None, &[ROLE_COURSE_TEACHER]);
        let mut driver: CourseDriver = bound("CourseDriver", &ctx);
        driver.setup().unwrap();

        let cfg = driver.configuration();
        assert_eq!(cfg.driver.as_deref(), Some("CourseDriver"));
        assert_eq!(
            cfg.path.as_deref(),
            Some(Path::new("/srv/lms/courses/PHYS101_DIR/document"))
        );
        assert_eq!(cfg.alias.as_deref(), Some("Physics 101"));
        assert_eq!(
            cfg.url.as_deref(),
            Some("https://lms.test/course_documents?cid=7")
        );
        assert!(cfg.attributes.is_none());
    }

    #[test]
    fn test_course_driver_read_only_for_students() {
        let ctx = context(Some(user()), Some(course()), Some(session()), &["ROLE_STUDENT"]);
        let mut driver: CourseDriver = bound("CourseDriver", &ctx);
        driver.setup().unwrap();

        let cfg = driver.configuration();
        let rules = cfg.attributes.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].get(Attribute::Write), Some(false));
        assert_eq!(rules[0].get(Attribute::Locked), Some(true));
        assert_eq!(
            cfg.url.as_deref(),
            Some("https://lms.test/course_documents?cid=7&sid=3")
        );
    }

    #[test]
    fn test_course_driver_without_course() {
        let ctx = context(Some(user()), None, None, &[]);
        let mut driver: CourseDriver = bound("CourseDriver", &ctx);
        driver.setup().unwrap();
        assert_eq!(driver.configuration(), PartialConfiguration::default());
    }

    #[test]
    fn test_course_directory_falls_back_to_lookup() {
        let mut c = course();
        c.directory = None;
        let ctx = context(None, Some(c.clone()), None, &[]);
        assert_eq!(
            course_directory(&ctx, &c).unwrap(),
            PathBuf::from("/srv/lms/courses/PHYS101_FROM_DB")
        );

        c.id = 99;
        assert_eq!(
            course_directory(&ctx, &c).unwrap(),
            PathBuf::from("/srv/lms/courses/PHYS101")
        );
    }

    #[test]
    fn test_course_user_driver_session_folder() {
        let ctx = context(Some(user()), Some(course()), Some(session()), &[]);
        let mut driver: CourseUserDriver = bound("CourseUserDriver", &ctx);
        driver.setup().unwrap();

        let cfg = driver.configuration();
        assert_eq!(
            cfg.path.as_deref(),
            Some(Path::new(
                "/srv/lms/courses/PHYS101_DIR/document/shared_folder_session_3/sf_user_42"
            ))
        );
        assert_eq!(cfg.alias.as_deref(), Some("UserFolder (jdoe)"));
    }

    #[test]
    fn test_course_user_driver_needs_user() {
        let ctx = context(None, Some(course()), None, &[]);
        let mut driver: CourseUserDriver = bound("CourseUserDriver", &ctx);
        driver.setup().unwrap();
        assert!(driver.configuration().driver.is_none());
    }

    #[test]
    fn test_dropbox_driver_inherits_policy() {
        let ctx = context(Some(user()), Some(course()), None, &[]);
        let mut driver: DropBoxDriver = bound("DropBoxDriver", &ctx);
        driver.setup().unwrap();

        let cfg = driver.configuration();
        assert_eq!(
            cfg.path.as_deref(),
            Some(Path::new("/srv/lms/courses/PHYS101_DIR/dropbox"))
        );
        assert_eq!(cfg.alias.as_deref(), Some("Dropbox"));
        assert!(cfg.attributes.is_none());
        assert_eq!(cfg.upload_overwrite, None);
    }

    #[test]
    fn test_setup_detached() {
        let mut driver = CourseDriver::default();
        assert_eq!(driver.setup(), Err(DriverError::Detached));
    }
}
