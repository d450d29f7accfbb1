use crate::context::UserCommand;
use crate::rule::{PseudoCommand, RuleArgs, RuleCommand};

use super::fnmatch::fnmatch;
use super::regex_match::regex_matches;

/// Match the user's arguments against the rule's argument pattern.
///
/// No pattern allows anything; the literal `""` requires no arguments;
/// an anchored `^…$` pattern is an extended regex; anything else is
/// fnmatch. Under `sudoedit` every argument is a path, so fnmatch
/// respects path separators there.
pub(crate) fn command_args_match(
    rule_cmnd: &RuleCommand,
    rule_args: &RuleArgs,
    user: &UserCommand,
) -> bool {
    match rule_args {
        RuleArgs::Any => true,
        RuleArgs::Empty => user.args.is_none(),
        RuleArgs::Pattern(pattern) => {
            let args = user.args.as_deref().unwrap_or("");
            if pattern.len() > 1 && pattern.starts_with('^') && pattern.ends_with('$') {
                return regex_matches(pattern, args);
            }
            let pathname = matches!(rule_cmnd, RuleCommand::Pseudo(PseudoCommand::Sudoedit));
            fnmatch(pattern, args, pathname)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn user_with_args(args: Option<&str>) -> UserCommand {
        UserCommand {
            args: args.map(String::from),
            ..UserCommand::new("/bin/ls")
        }
    }

    const CMND: RuleCommand = RuleCommand::All;

    #[test_case(None; "no user args")]
    #[test_case(Some("-l"); "some user args")]
    #[test_case(Some("--anything at all"); "arbitrary user args")]
    fn absent_rule_args_allow_everything(args: Option<&str>) {
        assert!(command_args_match(&CMND, &RuleArgs::Any, &user_with_args(args)));
    }

    #[test]
    fn empty_rule_args_require_no_args() {
        assert!(command_args_match(&CMND, &RuleArgs::Empty, &user_with_args(None)));
        assert!(!command_args_match(
            &CMND,
            &RuleArgs::Empty,
            &user_with_args(Some("-l"))
        ));
    }

    #[test_case("-L", true; "alternation matches")]
    #[test_case("-l", true; "lower case matches")]
    #[test_case("-lr", false; "extra characters do not match")]
    #[test_case("", false; "empty args do not match")]
    fn regex_args(user_args: &str, expected: bool) {
        let rule_args = RuleArgs::Pattern("^-[lL]$".into());
        assert_eq!(
            command_args_match(&CMND, &rule_args, &user_with_args(Some(user_args))),
            expected
        );
    }

    #[test]
    fn regex_matches_empty_when_no_args() {
        let rule_args = RuleArgs::Pattern("^$".into());
        assert!(command_args_match(&CMND, &rule_args, &user_with_args(None)));
    }

    #[test]
    fn unterminated_regex_falls_back_to_fnmatch() {
        // Starts with '^' but is not anchored at the end, so it is a
        // pattern, and `^-l` contains no meta characters.
        let rule_args = RuleArgs::Pattern("^-l".into());
        assert!(command_args_match(&CMND, &rule_args, &user_with_args(Some("^-l"))));
        assert!(!command_args_match(&CMND, &rule_args, &user_with_args(Some("-l"))));
    }

    #[test]
    fn bad_regex_is_a_non_match() {
        let rule_args = RuleArgs::Pattern("^-[l$".into());
        assert!(!command_args_match(&CMND, &rule_args, &user_with_args(Some("-l"))));
    }

    #[test]
    fn fnmatch_args_cross_separators() {
        // Without the sudoedit flag a `*` spans path separators.
        let rule_args = RuleArgs::Pattern("/var/log/*".into());
        assert!(command_args_match(
            &CMND,
            &rule_args,
            &user_with_args(Some("/var/log/nginx/access.log"))
        ));
    }

    #[test]
    fn sudoedit_args_respect_separators() {
        let sudoedit = RuleCommand::Pseudo(PseudoCommand::Sudoedit);
        let rule_args = RuleArgs::Pattern("/etc/*.conf".into());
        assert!(command_args_match(
            &sudoedit,
            &rule_args,
            &user_with_args(Some("/etc/hosts.conf"))
        ));
        assert!(!command_args_match(
            &sudoedit,
            &rule_args,
            &user_with_args(Some("/etc/nginx/nginx.conf"))
        ));
    }
}
