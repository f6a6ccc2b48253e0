//! Command line and environment overrides, resolved once per handle.
//!
//! # Responsibilities
//! - Read `confcache.file`, `confcache.path` and `confcache.errorprint`
//! - Command line first (`--confcache.file=NAME` or `--confcache.file NAME`),
//!   then the environment (`CONFCACHE_FILE`, ...)
//!
//! # Design Decisions
//! - Sources are injected so tests never touch the process environment

/// Default configuration file name.
pub const FILE_KEY: &str = "confcache.file";
/// Custom search root.
pub const PATH_KEY: &str = "confcache.path";
/// Toggle for logging path-set errors.
pub const ERROR_PRINT_KEY: &str = "confcache.errorprint";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub file: Option<String>,
    pub path: Option<String>,
    pub error_print: Option<bool>,
}

impl Overrides {
    /// No overrides at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Overrides from `std::env::args()` and the process environment.
    pub fn from_process() -> Self {
        Self::from_sources(std::env::args().skip(1), |name| std::env::var(name).ok())
    }

    pub fn from_sources<I, S, F>(args: I, env: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let lookup = |key: &str| option_value(&args, key).or_else(|| env(&env_name(key)));

        Self {
            file: lookup(FILE_KEY).filter(|v| !v.is_empty()),
            path: lookup(PATH_KEY).filter(|v| !v.is_empty()),
            error_print: lookup(ERROR_PRINT_KEY).map(|v| parse_flag(&v)),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// `confcache.file` → `CONFCACHE_FILE`.
pub fn env_name(key: &str) -> String {
    key.to_ascii_uppercase().replace('.', "_")
}

fn option_value(args: &[String], key: &str) -> Option<String> {
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let Some(option) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            continue;
        };
        if let Some(value) = option.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
        if option == key {
            return match iter.peek() {
                Some(next) if !next.starts_with('-') => Some((*next).clone()),
                // Bare flag.
                _ => Some(String::new()),
            };
        }
    }
    None
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_env_name() {
        assert_eq!(env_name(FILE_KEY), "CONFCACHE_FILE");
        assert_eq!(env_name(ERROR_PRINT_KEY), "CONFCACHE_ERRORPRINT");
    }

    #[test]
    fn test_args_forms() {
        let o = Overrides::from_sources(["--confcache.file=app.yaml", "--confcache.path", "/srv"], env(&[]));
        assert_eq!(o.file.as_deref(), Some("app.yaml"));
        assert_eq!(o.path.as_deref(), Some("/srv"));
        assert_eq!(o.error_print, None);
    }

    #[test]
    fn test_args_win_over_env() {
        let o = Overrides::from_sources(
            ["--confcache.file=cli.toml"],
            env(&[("CONFCACHE_FILE", "env.toml"), ("CONFCACHE_PATH", "/etc/app")]),
        );
        assert_eq!(o.file.as_deref(), Some("cli.toml"));
        assert_eq!(o.path.as_deref(), Some("/etc/app"));
    }

    #[test]
    fn test_error_print_flag() {
        let o = Overrides::from_sources(["--confcache.errorprint"], env(&[]));
        assert_eq!(o.error_print, Some(true));
        let o = Overrides::from_sources(Vec::<String>::new(), env(&[("CONFCACHE_ERRORPRINT", "false")]));
        assert_eq!(o.error_print, Some(false));
    }

    #[test]
    fn test_similar_keys_do_not_match() {
        let o = Overrides::from_sources(["--confcache.filex=a", "confcache.file=b"], env(&[]));
        assert_eq!(o, Overrides::none());
    }
}
