use std::fmt;

use thiserror::Error;

use crate::filesystem::has_meta;

/// Commands without a leading `/` that the policy language treats as
/// built-in operations rather than filesystem paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PseudoCommand {
    List,
    Sudoedit,
}

impl PseudoCommand {
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Sudoedit => "sudoedit",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "list" => Some(Self::List),
            "sudoedit" => Some(Self::Sudoedit),
            _ => None,
        }
    }
}

/// A rule command value that cannot be classified.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("empty command in rule")]
    EmptyCommand,
    #[error("regular expression must be anchored with '^' and '$': \"{0}\"")]
    UnanchoredRegex(String),
    #[error("unknown pseudo-command \"{0}\"")]
    UnknownPseudoCommand(String),
}

/// The command field of a policy rule, discriminated once when the rule
/// is built instead of by byte inspection on every match attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleCommand {
    /// The `ALL` sentinel: the rule places no constraint on the command.
    All,
    /// An anchored extended regular expression (`^…$`).
    Regex(String),
    /// A recognized pseudo-command.
    Pseudo(PseudoCommand),
    /// An absolute path containing meta characters, matched by glob
    /// expansion or fnmatch depending on the `fast_glob` setting.
    Pattern(String),
    /// A directory prefix (trailing `/`): any program directly inside.
    Directory(String),
    /// A literal absolute path.
    Literal(String),
}

impl RuleCommand {
    /// Classify a rule's command field. `None` is the `ALL` sentinel.
    pub fn parse(cmnd: Option<&str>) -> Result<Self, RuleError> {
        let Some(cmnd) = cmnd else {
            return Ok(Self::All);
        };
        if cmnd.is_empty() {
            return Err(RuleError::EmptyCommand);
        }
        if cmnd.starts_with('^') {
            if cmnd.len() < 2 || !cmnd.ends_with('$') {
                return Err(RuleError::UnanchoredRegex(cmnd.to_string()));
            }
            return Ok(Self::Regex(cmnd.to_string()));
        }
        if !cmnd.starts_with('/') {
            return PseudoCommand::from_name(cmnd)
                .map(Self::Pseudo)
                .ok_or_else(|| RuleError::UnknownPseudoCommand(cmnd.to_string()));
        }
        if has_meta(cmnd) {
            return Ok(Self::Pattern(cmnd.to_string()));
        }
        if cmnd.ends_with('/') {
            return Ok(Self::Directory(cmnd.to_string()));
        }
        Ok(Self::Literal(cmnd.to_string()))
    }

    /// The textual form, as used in diagnostics.
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "ALL",
            Self::Regex(s) | Self::Pattern(s) | Self::Directory(s) | Self::Literal(s) => s,
            Self::Pseudo(kind) => kind.name(),
        }
    }
}

impl fmt::Display for RuleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument pattern of a rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RuleArgs {
    /// No pattern given: any user arguments are allowed.
    #[default]
    Any,
    /// The literal `""`: the user must supply no arguments.
    Empty,
    /// A pattern, matched as an anchored regex or with fnmatch.
    Pattern(String),
}

impl RuleArgs {
    pub fn parse(args: Option<&str>) -> Self {
        match args {
            None => Self::Any,
            Some("\"\"") => Self::Empty,
            Some(pattern) => Self::Pattern(pattern.to_string()),
        }
    }
}
