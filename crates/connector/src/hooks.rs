//! Command hooks fired by the file-manager runtime after a command completes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use roots::Command;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::debug;

/// Commands the connector binds its hook to.
pub const HOOKED_COMMANDS: [Command; 3] = [Command::Upload, Command::Rm, Command::Mkdir];

/// A completed command as reported by the runtime.
#[derive(Clone, Copy)]
pub struct CommandEvent<'a> {
    pub command: Command,
    pub result: &'a Value,
    pub args: &'a Value,
    /// The runtime instance, opaque to the connector.
    pub runtime: Option<&'a dyn Any>,
}

impl fmt::Debug for CommandEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEvent")
            .field("command", &self.command)
            .field("result", &self.result)
            .field("args", &self.args)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// Receives completed commands, e.g. for auditing or quota updates.
pub trait CommandHook: Send + Sync {
    /// Identifier written into the serialized bind table.
    fn name(&self) -> &str;

    fn on_command(&self, event: &CommandEvent<'_>);
}

/// The default hook. Does nothing beyond logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommandHook;

impl CommandHook for NoopCommandHook {
    fn name(&self) -> &str {
        "connector.on_command"
    }

    fn on_command(&self, event: &CommandEvent<'_>) {
        debug!(command = %event.command, "Command completed");
    }
}

/// A hook bound to a set of commands.
#[derive(Clone)]
pub struct Binding {
    commands: Vec<Command>,
    hook: Arc<dyn CommandHook>,
}

impl Binding {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn hook(&self) -> &Arc<dyn CommandHook> {
        &self.hook
    }

    /// The runtime's key for this binding: command names joined by spaces.
    pub fn key(&self) -> String {
        self.commands
            .iter()
            .map(Command::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Command bindings handed to the runtime.
///
/// Serializes as a map from space-separated command names to hook names.
#[derive(Clone, Default)]
pub struct BindTable(Vec<Binding>);

impl BindTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(
        &mut self,
        commands: impl IntoIterator<Item = Command>,
        hook: Arc<dyn CommandHook>,
    ) {
        self.0.push(Binding {
            commands: commands.into_iter().collect(),
            hook,
        });
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fire every hook bound to the event's command. Returns how many fired.
    pub fn dispatch(&self, event: &CommandEvent<'_>) -> usize {
        self.0
            .iter()
            .filter(|binding| binding.commands.contains(&event.command))
            .inspect(|binding| binding.hook.on_command(event))
            .count()
    }
}

impl fmt::Debug for BindTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|b| (b.key(), b.hook.name().to_string())))
            .finish()
    }
}

impl Serialize for BindTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for binding in &self.0 {
            map.serialize_entry(&binding.key(), binding.hook.name())?;
        }
        map.end()
    }
}
