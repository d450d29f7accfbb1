//! Command-matching core for a privilege-escalation policy engine.
//!
//! Given what the user typed (resolved to a candidate executable) and
//! one parsed policy rule, [`command_matches`] decides whether the rule
//! admits the command. Rule commands come in several shapes, literal
//! paths, directory prefixes, globs, anchored regular expressions, the
//! `ALL` sentinel and pseudo-commands, each with its own matching
//! strategy.
//!
//! Matching is defensive by default: candidates are compared by
//! `(device, inode)` identity rather than by path string, an optional
//! digest list pins the program's bytes, and a successful match
//! publishes a trusted path plus, when configured, an open descriptor
//! for descriptor-based execution. Rules can also request evaluation
//! inside a chroot; the pivot is scoped and always restored.
//!
//! The filesystem-independent [`MatchMode::Name`] exists for offline
//! policy verification and fuzzing:
//!
//! ```
//! use privmatch::{
//!     command_matches, MatchContext, MatchMode, RuleArgs, RuleCommand, Settings, UserCommand,
//! };
//!
//! let rule = RuleCommand::parse(Some("/bin/ls")).unwrap();
//! let mut ctx = MatchContext::new(
//!     UserCommand::new("/bin/ls"),
//!     Settings::default(),
//!     MatchMode::Name,
//! );
//! assert!(command_matches(&mut ctx, &rule, &RuleArgs::Any, None, None, &[]));
//! assert_eq!(ctx.safe_cmnd.as_deref(), Some("/bin/ls"));
//! ```

mod context;
mod digest;
mod fileid;
pub mod filesystem;
mod matcher;
mod opener;
mod pivot;
mod resolver;
mod rule;
mod settings;

pub use crate::context::{CommandInfo, MatchContext, MatchMode, UserCommand};
pub use crate::digest::{Digest, DigestAlgorithm};
pub use crate::fileid::FileId;
pub use crate::matcher::command_matches;
pub use crate::pivot::PivotGuard;
pub use crate::resolver::{CmndResolver, PathResolver, Resolution, ResolveStatus};
pub use crate::rule::{PseudoCommand, RuleArgs, RuleCommand, RuleError};
pub use crate::settings::{FdExec, Settings};
