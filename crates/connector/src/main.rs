//! finderbridge connector CLI
//!
//! Prints the file-manager configuration a request would receive.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use connector::access::dotfile_access;
use connector::context::{
    Course, IdentityTranslator, NoEntities, RoleSet, Session, StaticUrlGenerator, User,
};
use connector::roots::Attribute;
use connector::{Config, Connector, RequestContext};

/// finderbridge connector - storage roots for the file-manager runtime.
#[derive(Parser, Debug)]
#[command(name = "finder-connector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the runtime configuration as JSON
    Operations {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Skip the default policy
        #[arg(long)]
        raw: bool,
    },

    /// Print the default root template as JSON
    Defaults,

    /// Validate the configuration and the configured drivers
    Check {
        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Evaluate the access predicate for a path
    Access {
        /// Attribute to decide (read, write, hidden, locked)
        attribute: Attribute,

        /// Path of the entry
        path: String,
    },
}

/// Identities of the simulated request.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// Current user id
    #[arg(long)]
    pub user_id: Option<u64>,

    /// Current user name
    #[arg(long, default_value = "user")]
    pub username: String,

    /// Current course id
    #[arg(long)]
    pub course_id: Option<u64>,

    /// Current course code
    #[arg(long)]
    pub course_code: Option<String>,

    /// Current course title
    #[arg(long)]
    pub course_title: Option<String>,

    /// Storage folder of the current course
    #[arg(long)]
    pub course_dir: Option<String>,

    /// Current session id
    #[arg(long)]
    pub session_id: Option<u64>,

    /// Roles granted to the user (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Base URL for generated links
    #[arg(long, default_value = "http://localhost")]
    pub base_url: String,
}

impl IdentityArgs {
    fn user(&self) -> Option<User> {
        self.user_id.map(|id| User {
            id,
            username: self.username.clone(),
        })
    }

    fn course(&self) -> Option<Course> {
        self.course_id.map(|id| {
            let code = self
                .course_code
                .clone()
                .unwrap_or_else(|| format!("COURSE{id}"));
            Course {
                id,
                title: self.course_title.clone().unwrap_or_else(|| code.clone()),
                code,
                directory: self.course_dir.clone(),
            }
        })
    }

    fn session(&self) -> Option<Session> {
        self.session_id.map(|id| Session {
            id,
            name: format!("session {id}"),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };
    config.apply_env_overrides();
    config.validate()?;

    // Logs go to stderr; stdout carries the JSON output
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.connector.log_level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(config_path) = &cli.config {
        tracing::debug!(path = %config_path.display(), "Using config file");
    }

    match cli.command {
        Commands::Operations { identity, raw } => {
            let mut connector = build_connector(&config, &identity)?;
            let operations = connector.operations(!raw);
            println!(
                "{}",
                serde_json::to_string_pretty(&operations)
                    .context("Failed to serialize operations")?
            );
        }
        Commands::Defaults => {
            let template = config.policy.defaults();
            println!(
                "{}",
                serde_json::to_string_pretty(&template)
                    .context("Failed to serialize default template")?
            );
        }
        Commands::Check { identity } => {
            let mut connector = build_connector(&config, &identity)?;
            let unresolved = connector.set_drivers();
            let assembly = connector.assemble_roots(true);

            for root in &assembly.roots {
                let name = connector
                    .registry()
                    .resolve_qualified(&root.driver)
                    .with_context(|| format!("Root driver does not resolve: {}", root.driver))?;
                println!("ok       {name}");
            }
            for failure in &assembly.failures {
                println!("skipped  {}: {}", failure.driver, failure.error);
            }

            if !unresolved.is_empty() {
                anyhow::bail!("{} configured driver(s) do not resolve", unresolved.len());
            }
            println!(
                "Configuration valid: {} root(s), {} skipped",
                assembly.roots.len(),
                assembly.failures.len()
            );
        }
        Commands::Access { attribute, path } => match dotfile_access(attribute, &path) {
            Some(allowed) => println!("{attribute} {path}: {allowed}"),
            None => println!("{attribute} {path}: undecided"),
        },
    }

    Ok(())
}

/// Build a connector for the request described by `identity`.
fn build_connector(config: &Config, identity: &IdentityArgs) -> anyhow::Result<Connector> {
    let context = RequestContext::builder(config.path_table())
        .user(identity.user())
        .course(identity.course())
        .session(identity.session())
        .url_generator(Arc::new(StaticUrlGenerator::new(identity.base_url.as_str())))
        .translator(Arc::new(IdentityTranslator))
        .security(Arc::new(RoleSet::new(identity.roles.iter().cloned())))
        .entities(Arc::new(NoEntities))
        .build()
        .context("Failed to build request context")?;

    Connector::new(Arc::new(context), config.settings()).context("Failed to create connector")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_operations_command() {
        let cli = Cli::try_parse_from([
            "finder-connector",
            "operations",
            "--user-id",
            "42",
            "--course-id",
            "7",
            "--role",
            "ROLE_CURRENT_COURSE_TEACHER",
            "--raw",
        ])
        .unwrap();
        match cli.command {
            Commands::Operations { identity, raw } => {
                assert!(raw);
                assert_eq!(identity.user_id, Some(42));
                assert_eq!(identity.username, "user");
                assert_eq!(identity.roles, vec!["ROLE_CURRENT_COURSE_TEACHER"]);

                let course = identity.course().unwrap();
                assert_eq!(course.code, "COURSE7");
                assert_eq!(course.title, "COURSE7");
                assert!(identity.session().is_none());
            }
            _ => panic!("Expected Operations command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli =
            Cli::try_parse_from(["finder-connector", "defaults", "-v", "-c", "/etc/fb.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/fb.toml")));
        assert!(matches!(cli.command, Commands::Defaults));
    }

    #[test]
    fn test_access_command() {
        let cli = Cli::try_parse_from(["finder-connector", "access", "hidden", "/a/.env"]).unwrap();
        match cli.command {
            Commands::Access { attribute, path } => {
                assert_eq!(attribute, Attribute::Hidden);
                assert_eq!(path, "/a/.env");
            }
            _ => panic!("Expected Access command"),
        }
    }

    #[test]
    fn test_access_rejects_unknown_attribute() {
        assert!(Cli::try_parse_from(["finder-connector", "access", "execute", "/a"]).is_err());
    }

    #[test]
    fn test_build_connector_from_defaults() {
        let identity = IdentityArgs {
            user_id: Some(1),
            username: "admin".to_string(),
            base_url: "http://localhost".to_string(),
            ..IdentityArgs::default()
        };
        let mut connector = build_connector(&Config::default(), &identity).unwrap();
        assert_eq!(connector.get_roots(true).len(), 2);
    }
}
