use std::fmt;
use std::str::FromStr;

/// Severity of a record, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// The most verbose `log` crate filter that still passes this level.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            // log's Trace is folded into Debug, so a Debug threshold lets it through.
            Level::Debug => log::LevelFilter::Trace,
            Level::Info => log::LevelFilter::Info,
            Level::Warning => log::LevelFilter::Warn,
            Level::Error | Level::Critical => log::LevelFilter::Error,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warning,
            log::Level::Error => Level::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "FATAL" => Ok(Level::Critical),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}

/// Name of the elevated level that also widens the scope to the root.
pub const TRACE: &str = "TRACE";

/// Threshold chosen from a `LOG_LEVEL` style value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSelection {
    pub level: Level,
    pub root_scope: bool,
}

impl LevelSelection {
    /// Unset, empty, or unknown names fall back to `INFO`. `TRACE` selects
    /// `DEBUG` on the root scope.
    pub fn resolve(raw: Option<&str>) -> Self {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.eq_ignore_ascii_case(TRACE) {
            return Self {
                level: Level::Debug,
                root_scope: true,
            };
        }
        Self {
            level: raw.parse().unwrap_or(Level::Info),
            root_scope: false,
        }
    }
}

/// Which records a logger accepts from the `log` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every target.
    Root,
    /// Only targets inside the named hierarchy.
    Named(String),
}

impl Scope {
    pub fn name(&self) -> &str {
        match self {
            Scope::Root => "root",
            Scope::Named(name) => name,
        }
    }

    /// Whether `target` lies in this scope. Both `::` and `.` separate
    /// hierarchy levels.
    pub fn contains(&self, target: &str) -> bool {
        match self {
            Scope::Root => true,
            Scope::Named(name) => match target.strip_prefix(name.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with("::") || rest.starts_with('.'),
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("Critical".parse::<Level>().unwrap(), Level::Critical);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_resolve_defaults_to_info() {
        for raw in [None, Some(""), Some("  "), Some("loud")] {
            assert_eq!(
                LevelSelection::resolve(raw),
                LevelSelection {
                    level: Level::Info,
                    root_scope: false
                }
            );
        }
    }

    #[test]
    fn test_resolve_trace_selects_root() {
        let selection = LevelSelection::resolve(Some("TRACE"));
        assert_eq!(selection.level, Level::Debug);
        assert!(selection.root_scope);
    }

    #[test]
    fn test_resolve_named_level() {
        let selection = LevelSelection::resolve(Some("ERROR"));
        assert_eq!(selection.level, Level::Error);
        assert!(!selection.root_scope);
    }

    #[test]
    fn test_scope_contains() {
        let scope = Scope::Named("svc".to_owned());
        assert!(scope.contains("svc"));
        assert!(scope.contains("svc::db"));
        assert!(scope.contains("svc.http"));
        assert!(!scope.contains("svcx"));
        assert!(!scope.contains("other"));
        assert!(Scope::Root.contains("anything"));
    }

    #[test]
    fn test_ordering_and_filters() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Error < Level::Critical);
        assert_eq!(Level::Debug.to_level_filter(), log::LevelFilter::Trace);
        assert_eq!(Level::from(log::Level::Warn), Level::Warning);
    }
}
