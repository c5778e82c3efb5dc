/// How the binary was invoked. Anything other than a plain hook run is
/// handled before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run,
    Help,
    Version,
    Unknown(String),
}

/// Interpret the arguments after the program name. The hook itself takes no
/// arguments; the flags exist so the binary is polite when poked by hand.
pub fn parse_args(mut args: impl Iterator<Item = String>) -> Invocation {
    match args.next() {
        None => Invocation::Run,
        Some(arg) => match arg.as_str() {
            "--help" | "-h" => Invocation::Help,
            "--version" | "-v" => Invocation::Version,
            _ => Invocation::Unknown(arg),
        },
    }
}

pub fn print_help() {
    println!("redmine-hook — emit open Redmine issues as normalized work items\n");
    println!("USAGE:");
    println!("  redmine-hook              Run the hook; writes one JSON envelope to stdout");
    println!("  redmine-hook --version    Print the version");
    println!();
    println!("ENVIRONMENT:");
    println!("  REDMINE_BASE_URL, REDMINE_URL   API server root (default http://redmine:3000)");
    println!("  REDMINE_API_KEY                 Credential sent as X-Redmine-API-Key");
    println!("  REDMINE_PROJECT_ID              Project filter; unset means \"1\", empty disables");
    println!("  REDMINE_QUERY_ID                Saved-query filter; unset or empty disables");
    println!("  REDMINE_CLOSED_STATUS_NAMES     Comma-separated statuses treated as closed");
    println!("                                  (default \"closed,resolved,done\")");
    println!();
    println!("Diagnostics go to stderr; set RUST_LOG=debug for request-level detail.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> std::vec::IntoIter<String> {
        strs.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn no_args_means_run() {
        assert_eq!(parse_args(args(&[])), Invocation::Run);
    }

    #[test]
    fn help_flags() {
        assert_eq!(parse_args(args(&["--help"])), Invocation::Help);
        assert_eq!(parse_args(args(&["-h"])), Invocation::Help);
    }

    #[test]
    fn version_flags() {
        assert_eq!(parse_args(args(&["--version"])), Invocation::Version);
        assert_eq!(parse_args(args(&["-v"])), Invocation::Version);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(
            parse_args(args(&["start"])),
            Invocation::Unknown("start".to_string())
        );
        assert_eq!(
            parse_args(args(&["--verbose"])),
            Invocation::Unknown("--verbose".to_string())
        );
    }
}
