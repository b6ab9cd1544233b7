//! File manager command names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RootError};

/// A command understood by the external file-manager runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Archive,
    Chmod,
    Copy,
    Cut,
    Duplicate,
    Edit,
    Extract,
    File,
    Get,
    Help,
    Info,
    Ls,
    Mkdir,
    Mkfile,
    Netmount,
    Open,
    Paste,
    Put,
    Rename,
    Resize,
    Rm,
    Search,
    Tree,
    Upload,
    Zipdl,
}

impl Command {
    /// Every known command.
    pub const ALL: [Command; 25] = [
        Command::Archive,
        Command::Chmod,
        Command::Copy,
        Command::Cut,
        Command::Duplicate,
        Command::Edit,
        Command::Extract,
        Command::File,
        Command::Get,
        Command::Help,
        Command::Info,
        Command::Ls,
        Command::Mkdir,
        Command::Mkfile,
        Command::Netmount,
        Command::Open,
        Command::Paste,
        Command::Put,
        Command::Rename,
        Command::Resize,
        Command::Rm,
        Command::Search,
        Command::Tree,
        Command::Upload,
        Command::Zipdl,
    ];

    /// The command's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Archive => "archive",
            Command::Chmod => "chmod",
            Command::Copy => "copy",
            Command::Cut => "cut",
            Command::Duplicate => "duplicate",
            Command::Edit => "edit",
            Command::Extract => "extract",
            Command::File => "file",
            Command::Get => "get",
            Command::Help => "help",
            Command::Info => "info",
            Command::Ls => "ls",
            Command::Mkdir => "mkdir",
            Command::Mkfile => "mkfile",
            Command::Netmount => "netmount",
            Command::Open => "open",
            Command::Paste => "paste",
            Command::Put => "put",
            Command::Rename => "rename",
            Command::Resize => "resize",
            Command::Rm => "rm",
            Command::Search => "search",
            Command::Tree => "tree",
            Command::Upload => "upload",
            Command::Zipdl => "zipdl",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = RootError;

    fn from_str(s: &str) -> Result<Self> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| RootError::UnknownCommand(s.to_string()))
    }
}
