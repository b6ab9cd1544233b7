//! Request-scoped context handed to the connector.
//!
//! Identities arrive already resolved; the connector and its drivers only
//! read them. Routing, translation, authorization and persistence are
//! external collaborators reached through the traits defined here.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, DriverError, Result};

/// Temporary/archive directory. Required.
pub const PATH_TEMP: &str = "path.temp";
/// Installation root.
pub const PATH_ROOT: &str = "path.root";
/// Directory holding one folder per course.
pub const PATH_COURSES: &str = "path.courses";
/// Directory holding one folder per user.
pub const PATH_USERS: &str = "path.users";

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// The course the request runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub code: String,
    pub title: String,
    /// On-disk folder name, when already known.
    #[serde(default)]
    pub directory: Option<String>,
}

/// The course session the request runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    pub name: String,
}

/// Symbolic path keys mapped to absolute filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTable(BTreeMap<String, PathBuf>);

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(key, path);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.0.insert(key.into(), path.into());
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.0.get(key).map(PathBuf::as_path)
    }

    /// Look up a key a driver cannot work without.
    pub fn require(&self, key: &str) -> std::result::Result<&Path, DriverError> {
        self.get(key)
            .ok_or_else(|| DriverError::MissingPath(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, PathBuf>> for PathTable {
    fn from(map: BTreeMap<String, PathBuf>) -> Self {
        Self(map)
    }
}

/// Builds URLs for named routes.
pub trait UrlGenerator: Send + Sync {
    fn generate(&self, route: &str, params: &[(&str, String)]) -> String;
}

/// Translates interface strings.
pub trait Translator: Send + Sync {
    fn trans(&self, key: &str) -> String;
}

/// The caller's authorization state.
pub trait SecurityContext: Send + Sync {
    fn is_granted(&self, attribute: &str) -> bool;
}

/// Entity lookups drivers may need. The connector itself never calls it.
pub trait EntityLookup: Send + Sync {
    /// The on-disk folder of a course.
    fn course_directory(&self, course_id: u64) -> Option<String>;
}

/// URL generator that joins the route and its parameters onto a base URL.
#[derive(Debug, Clone)]
pub struct StaticUrlGenerator {
    base_url: String,
}

impl StaticUrlGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl UrlGenerator for StaticUrlGenerator {
    fn generate(&self, route: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}", self.base_url, route);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }
}

/// Translator that returns keys unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn trans(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Security context backed by a fixed set of granted roles.
#[derive(Debug, Clone, Default)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }
}

impl SecurityContext for RoleSet {
    fn is_granted(&self, attribute: &str) -> bool {
        self.0.iter().any(|role| role == attribute)
    }
}

/// Entity lookup that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntityLookup for NoEntities {
    fn course_directory(&self, _course_id: u64) -> Option<String> {
        None
    }
}

/// Everything a request supplies to the connector.
pub struct RequestContext {
    pub paths: PathTable,
    pub user: Option<User>,
    pub course: Option<Course>,
    pub session: Option<Session>,
    pub url_generator: Arc<dyn UrlGenerator>,
    pub translator: Arc<dyn Translator>,
    pub security: Arc<dyn SecurityContext>,
    pub entities: Arc<dyn EntityLookup>,
}

impl RequestContext {
    /// Start building a context around a path table.
    pub fn builder(paths: PathTable) -> RequestContextBuilder {
        RequestContextBuilder {
            paths,
            ..RequestContextBuilder::default()
        }
    }

    /// Check what every connector needs regardless of driver.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.paths.get(PATH_TEMP).is_none() {
            return Err(ConnectorError::MissingContext(format!(
                "path table entry {PATH_TEMP}"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("paths", &self.paths)
            .field("user", &self.user)
            .field("course", &self.course)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestContext`].
#[derive(Default)]
pub struct RequestContextBuilder {
    paths: PathTable,
    user: Option<User>,
    course: Option<Course>,
    session: Option<Session>,
    url_generator: Option<Arc<dyn UrlGenerator>>,
    translator: Option<Arc<dyn Translator>>,
    security: Option<Arc<dyn SecurityContext>>,
    entities: Option<Arc<dyn EntityLookup>>,
}

impl RequestContextBuilder {
    pub fn user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }

    pub fn course(mut self, course: Option<Course>) -> Self {
        self.course = course;
        self
    }

    pub fn session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn url_generator(mut self, url_generator: Arc<dyn UrlGenerator>) -> Self {
        self.url_generator = Some(url_generator);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn security(mut self, security: Arc<dyn SecurityContext>) -> Self {
        self.security = Some(security);
        self
    }

    pub fn entities(mut self, entities: Arc<dyn EntityLookup>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Finish the context. Every collaborator must have been supplied.
    pub fn build(self) -> Result<RequestContext> {
        fn required<T: ?Sized>(value: Option<Arc<T>>, what: &str) -> Result<Arc<T>> {
            value.ok_or_else(|| ConnectorError::MissingContext(what.to_string()))
        }

        Ok(RequestContext {
            paths: self.paths,
            user: self.user,
            course: self.course,
            session: self.session,
            url_generator: required(self.url_generator, "url generator")?,
            translator: required(self.translator, "translator")?,
            security: required(self.security, "security context")?,
            entities: required(self.entities, "entity lookup")?,
        })
    }
}
