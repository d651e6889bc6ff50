//! Structured records parsed out of flatpak's column- and key/value-oriented
//! console output, plus the pure line parsers that build them. Parsing is
//! kept free of I/O so it is unit-testable on captured output.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FlatpakError;

static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// A slash-separated package identifier: `[type/]name/arch/branch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Leading `app` or `runtime` segment when the four-part form is used.
    pub kind: Option<String>,
    pub name: String,
    pub arch: String,
    pub branch: String,
}

impl Ref {
    pub fn new(name: &str, arch: &str, branch: &str) -> Self {
        Self {
            kind: None,
            name: name.to_string(),
            arch: arch.to_string(),
            branch: branch.to_string(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, FlatpakError> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [name, arch, branch] => Ok(Self {
                kind: None,
                name: name.to_string(),
                arch: arch.to_string(),
                branch: branch.to_string(),
            }),
            [kind, name, arch, branch] => Ok(Self {
                kind: Some(kind.to_string()),
                name: name.to_string(),
                arch: arch.to_string(),
                branch: branch.to_string(),
            }),
            _ => Err(FlatpakError::Parse(format!(
                "ref {s:?} must have 3 or 4 slash-separated parts"
            ))),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "{}/", kind)?;
        }
        write!(f, "{}/{}/{}", self.name, self.arch, self.branch)
    }
}

impl FromStr for Ref {
    type Err = FlatpakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One row of `flatpak list -d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub reference: Ref,
    pub origin: String,
    pub active_commit: String,
    pub latest_commit: String,
    pub installed_size: String,
    pub options: Vec<String>,
}

/// Parse one detail row: `ref origin active latest size-value size-unit options`.
/// The installed size spans two whitespace-separated tokens.
pub(crate) fn parse_list_line(line: &str) -> Result<ListEntry, FlatpakError> {
    let parts: Vec<&str> = SPACES_RE.split(line.trim()).collect();

    if parts.len() < 7 {
        return Err(FlatpakError::Parse(format!(
            "list row has {} columns, expected at least 7: {line:?}",
            parts.len()
        )));
    }

    Ok(ListEntry {
        reference: Ref::parse(parts[0])?,
        origin: parts[1].to_string(),
        active_commit: parts[2].to_string(),
        latest_commit: parts[3].to_string(),
        installed_size: format!("{} {}", parts[4], parts[5]),
        options: parts[6].split(',').map(str::to_string).collect(),
    })
}

/// Key/value fields of `flatpak info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub reference: String,
    pub id: String,
    pub arch: String,
    pub branch: String,
    pub origin: String,
    pub commit: String,
    pub location: String,
    pub installed_size: String,
    pub runtime: String,
}

/// Populate a [`PackageInfo`] from `key: value` lines. Unknown keys are
/// ignored; keys may be padded with leading whitespace for alignment.
pub(crate) fn parse_info_output(output: &str) -> PackageInfo {
    let mut info = PackageInfo::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.trim();

        match key.trim_start() {
            "Ref" => info.reference = value.to_string(),
            "ID" => info.id = value.to_string(),
            "Arch" => info.arch = value.to_string(),
            "Branch" => info.branch = value.to_string(),
            "Origin" => info.origin = value.to_string(),
            "Commit" => info.commit = value.to_string(),
            "Location" => info.location = value.to_string(),
            "Installed size" => info.installed_size = value.to_string(),
            "Runtime" => info.runtime = value.to_string(),
            _ => {}
        }
    }

    info
}

/// One row of `flatpak remotes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub options: Vec<String>,
}

/// Parse `name<ws>comma-separated-options`; the options column may be absent.
pub(crate) fn parse_remote_line(line: &str) -> Option<Remote> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_string();
    let options = parts
        .next()
        .map(|opts| opts.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    Some(Remote { name, options })
}
