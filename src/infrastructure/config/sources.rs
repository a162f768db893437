//! Variable sources read by the profile resolver.
//!
//! A [`SourceChain`] describes where variables come from: an optional
//! `KEY=value` side-file and the ambient process environment. Taking a
//! [`Snapshot`] reads every layer once; lookups against the snapshot honor
//! layer order, side-file first. Side-file values are read literally.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::resolver::ResolveError;

/// Side-file read by default, relative to the working directory.
pub const DEFAULT_SIDE_FILE: &str = ".env";

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    SideFile(PathBuf),
    Ambient,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SideFile(path) => write!(f, "side-file {}", path.display()),
            Self::Ambient => f.write_str("process environment"),
        }
    }
}

#[derive(Debug, Clone)]
enum Ambient {
    Process,
    Fixed(Vec<(String, String)>),
}

/// Ordered description of the variable sources.
#[derive(Debug, Clone)]
pub struct SourceChain {
    side_file: Option<PathBuf>,
    ambient: Ambient,
}

impl Default for SourceChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceChain {
    /// `.env` in the working directory, then the process environment.
    pub fn new() -> Self {
        Self {
            side_file: Some(PathBuf::from(DEFAULT_SIDE_FILE)),
            ambient: Ambient::Process,
        }
    }

    /// Read the side-file from `path` instead of `.env`.
    #[must_use]
    pub fn with_side_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.side_file = Some(path.into());
        self
    }

    /// Skip the side-file entirely.
    #[must_use]
    pub fn without_side_file(mut self) -> Self {
        self.side_file = None;
        self
    }

    /// Replace the process environment with a fixed set of variables.
    #[must_use]
    pub fn with_ambient_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ambient = Ambient::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn side_file(&self) -> Option<&Path> {
        self.side_file.as_deref()
    }

    /// Read every layer once.
    ///
    /// A missing side-file is skipped. A side-file that exists but cannot be
    /// read or parsed fails the whole snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, ResolveError> {
        let mut layers = Vec::with_capacity(2);

        if let Some(path) = &self.side_file {
            if let Some(vars) = read_side_file(path)? {
                layers.push(Layer {
                    origin: SourceOrigin::SideFile(path.clone()),
                    vars,
                });
            }
        }

        let ambient = match &self.ambient {
            Ambient::Process => {
                let mut vars: Vec<_> = std::env::vars_os()
                    .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                    .collect();
                vars.sort();
                vars
            }
            Ambient::Fixed(vars) => vars.clone(),
        };
        layers.push(Layer {
            origin: SourceOrigin::Ambient,
            vars: ambient,
        });

        Ok(Snapshot { layers })
    }
}

fn read_side_file(path: &Path) -> Result<Option<Vec<(String, String)>>, ResolveError> {
    // Values are taken literally; `$NAME` and `${NAME}` are never expanded
    let vars = match env_file_reader::read_file(path) {
        Ok(vars) => vars,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no side-file, skipping");
            return Ok(None);
        }
        Err(source) => {
            return Err(ResolveError::SourceReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut vars: Vec<_> = vars.into_iter().collect();
    vars.sort();

    debug!(path = %path.display(), entries = vars.len(), "side-file loaded");
    Ok(Some(vars))
}

#[derive(Debug, Clone)]
struct Layer {
    origin: SourceOrigin,
    vars: Vec<(String, String)>,
}

impl Layer {
    /// An exact-case entry wins; otherwise every case-folded entry must agree.
    fn find(&self, name: &str) -> Result<Option<&str>, ResolveError> {
        if let Some((_, value)) = self.vars.iter().rev().find(|(key, _)| key == name) {
            return Ok(Some(value.as_str()));
        }

        let mut folded = self.vars.iter().filter(|(key, _)| key.eq_ignore_ascii_case(name));
        let Some((first_key, first)) = folded.next() else {
            return Ok(None);
        };
        if let Some((other_key, _)) = folded.find(|(_, value)| value != first) {
            return Err(ResolveError::ValidationError {
                field: name.to_string(),
                reason: format!(
                    "conflicting entries {first_key} and {other_key} in {}",
                    self.origin
                ),
            });
        }
        Ok(Some(first.as_str()))
    }
}

/// Variables captured from a [`SourceChain`] at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    layers: Vec<Layer>,
}

impl Snapshot {
    /// Highest-precedence value for `name`.
    ///
    /// Names match case-insensitively, but an exact-case entry beats any
    /// differently cased one in the same layer.
    pub fn lookup(&self, name: &str) -> Result<Option<(&str, &SourceOrigin)>, ResolveError> {
        for layer in &self.layers {
            if let Some(value) = layer.find(name)? {
                return Ok(Some((value, &layer.origin)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn side_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_side_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let chain = SourceChain::new()
            .with_side_file(dir.path().join("absent.env"))
            .with_ambient_vars([("DEV_DATABASE_URL", "sqlite://dev.db")]);

        let snapshot = chain.snapshot().expect("missing side-file should not fail");
        let (value, origin) = snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap();
        assert_eq!(value, "sqlite://dev.db");
        assert_eq!(origin, &SourceOrigin::Ambient);
    }

    #[test]
    fn test_side_file_comments_ignored() {
        let file = side_file("# DEV_DATABASE_URL=commented\nDEV_DATABASE_URL=sqlite://dev.db\n");
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars(Vec::<(String, String)>::new());

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0, "sqlite://dev.db");
        assert!(snapshot.lookup("# DEV_DATABASE_URL").unwrap().is_none());
    }

    #[test]
    fn test_malformed_side_file_fails() {
        let file = side_file("DEV_DATABASE_URL sqlite://dev.db\n");
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars(Vec::<(String, String)>::new());

        match chain.snapshot() {
            Err(ResolveError::SourceReadError { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected SourceReadError, got {other:?}"),
        }
    }

    #[test]
    fn test_side_file_wins_over_ambient() {
        let file = side_file("DEV_DATABASE_URL=Y\n");
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars([("DEV_DATABASE_URL", "X")]);

        let snapshot = chain.snapshot().unwrap();
        let (value, origin) = snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap();
        assert_eq!(value, "Y");
        assert_eq!(origin, &SourceOrigin::SideFile(file.path().to_path_buf()));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let chain = SourceChain::new()
            .without_side_file()
            .with_ambient_vars([("dev_database_url", "sqlite://lower.db")]);

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0, "sqlite://lower.db");
    }

    #[test]
    fn test_last_entry_in_layer_wins() {
        let file = side_file("DEV_DATABASE_URL=first\nDEV_DATABASE_URL=second\n");
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars(Vec::<(String, String)>::new());

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0, "second");
    }

    #[test]
    fn test_quoted_values_unquoted() {
        let file = side_file("PROD_DATABASE_URL=\"postgres://u:p@host/db\"\n");
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars(Vec::<(String, String)>::new());

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(snapshot.lookup("PROD_DATABASE_URL").unwrap().unwrap().0, "postgres://u:p@host/db");
    }

    #[test]
    fn test_dollar_signs_kept_literally() {
        let file = side_file(
            "PROD_DATABASE_URL=postgres://app:pa$sword@db/prod\nDEV_DATABASE_URL=sqlite://${HOME}/dev.db\n",
        );
        let chain = SourceChain::new()
            .with_side_file(file.path())
            .with_ambient_vars(Vec::<(String, String)>::new());

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(
            snapshot.lookup("PROD_DATABASE_URL").unwrap().unwrap().0,
            "postgres://app:pa$sword@db/prod"
        );
        assert_eq!(
            snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0,
            "sqlite://${HOME}/dev.db"
        );
    }

    #[test]
    fn test_exact_case_beats_folded_case() {
        for vars in [
            [("dev_database_url", "sqlite://lower.db"), ("DEV_DATABASE_URL", "sqlite://exact.db")],
            [("DEV_DATABASE_URL", "sqlite://exact.db"), ("dev_database_url", "sqlite://lower.db")],
        ] {
            let chain = SourceChain::new().without_side_file().with_ambient_vars(vars);

            let snapshot = chain.snapshot().unwrap();
            assert_eq!(snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0, "sqlite://exact.db");
        }
    }

    #[test]
    fn test_conflicting_folded_entries_rejected() {
        let chain = SourceChain::new().without_side_file().with_ambient_vars([
            ("dev_database_url", "sqlite://lower.db"),
            ("Dev_Database_Url", "sqlite://mixed.db"),
        ]);

        let snapshot = chain.snapshot().unwrap();
        match snapshot.lookup("DEV_DATABASE_URL") {
            Err(ResolveError::ValidationError { field, reason }) => {
                assert_eq!(field, "DEV_DATABASE_URL");
                assert!(reason.contains("conflicting"));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_agreeing_folded_entries_accepted() {
        let chain = SourceChain::new().without_side_file().with_ambient_vars([
            ("dev_database_url", "sqlite://same.db"),
            ("Dev_Database_Url", "sqlite://same.db"),
        ]);

        let snapshot = chain.snapshot().unwrap();
        assert_eq!(snapshot.lookup("DEV_DATABASE_URL").unwrap().unwrap().0, "sqlite://same.db");
    }
}
