//! Archive entry stripping for repackaged dependency archives.
//!
//! When the driver repackages an archive it consults a
//! [`StripArchivesConfig`]: an ordered list of include/exclude glob
//! [`Pattern`]s evaluated first-match-wins. [`StripArchivesBuilder::build`]
//! always appends two terminal patterns — exclude `**/*.class`, then
//! include `**/*` — so every path gets a defined answer and class files are
//! dropped unless an earlier rule keeps them.
//!
//! Globs are Ant-style: `?` matches one character, `*` one path segment,
//! `**` any number of segments.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

const EXCLUDE_CLASS_FILES: &str = "**/*.class";
const INCLUDE_ALL: &str = "**/*";

/// One include/exclude rule bound to a compiled glob.
#[derive(Clone, Debug)]
pub struct Pattern {
    glob: String,
    include: bool,
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(glob: &str, include: bool) -> Result<Self, StripArchivesError> {
        let matcher = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|source| StripArchivesError::InvalidPattern {
                glob: glob.to_string(),
                source,
            })?
            .compile_matcher();
        Ok(Self {
            glob: glob.to_string(),
            include,
            matcher,
        })
    }

    fn terminal(glob: &'static str, include: bool) -> Self {
        match Self::new(glob, include) {
            Ok(pattern) => pattern,
            Err(err) => unreachable!("terminal glob failed to compile: {err}"),
        }
    }

    /// Does this rule apply to `path`?
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// `true` for include rules.
    pub fn is_include(&self) -> bool {
        self.include
    }

    /// `true` for exclude rules.
    pub fn is_exclude(&self) -> bool {
        !self.include
    }

    /// The glob text this rule was built from.
    pub fn glob(&self) -> &str {
        &self.glob
    }
}

/// Ordered strip rules for archive entries.
///
/// Immutable once built. The auto-appended terminal patterns guarantee that
/// [`should_include`](Self::should_include) has an answer for every path, so
/// the default config (no user rules) drops `*.class` entries and keeps
/// everything else.
#[derive(Clone, Debug)]
pub struct StripArchivesConfig {
    patterns: Vec<Pattern>,
}

impl StripArchivesConfig {
    /// Should the archive entry at `path` be kept?
    ///
    /// The first matching pattern decides.
    pub fn should_include(&self, path: &str) -> bool {
        for pattern in &self.patterns {
            if pattern.matches(path) {
                return pattern.is_include();
            }
        }
        // The terminal include-all pattern matches every path.
        true
    }

    /// The rules in evaluation order, terminal patterns included.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

impl Default for StripArchivesConfig {
    /// The config produced by an empty builder: strip class files, keep
    /// everything else.
    fn default() -> Self {
        match StripArchivesBuilder::default().build() {
            Ok(config) => config,
            Err(err) => unreachable!("default strip config failed to build: {err}"),
        }
    }
}

/// Collects strip rules in order and finishes with [`build`](Self::build).
///
/// Single-use: every method fails with
/// [`StripArchivesError::AlreadyBuilt`] once `build` has run. The config
/// returned by the successful `build` stays valid regardless.
#[derive(Debug, Default)]
pub struct StripArchivesBuilder {
    patterns: Vec<Pattern>,
    built: bool,
}

impl StripArchivesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rule per glob, include or exclude per `include`.
    pub fn add(&mut self, include: bool, globs: &[&str]) -> Result<(), StripArchivesError> {
        if self.built {
            return Err(StripArchivesError::AlreadyBuilt);
        }
        for glob in globs {
            self.patterns.push(Pattern::new(glob, include)?);
        }
        Ok(())
    }

    /// Append include rules.
    pub fn add_include(&mut self, globs: &[&str]) -> Result<(), StripArchivesError> {
        self.add(true, globs)
    }

    /// Append exclude rules.
    pub fn add_exclude(&mut self, globs: &[&str]) -> Result<(), StripArchivesError> {
        self.add(false, globs)
    }

    /// Append the terminal patterns and return the finished config,
    /// consuming the accumulated rules.
    pub fn build(&mut self) -> Result<StripArchivesConfig, StripArchivesError> {
        if self.built {
            return Err(StripArchivesError::AlreadyBuilt);
        }
        self.built = true;
        let mut patterns = std::mem::take(&mut self.patterns);
        patterns.push(Pattern::terminal(EXCLUDE_CLASS_FILES, false));
        patterns.push(Pattern::terminal(INCLUDE_ALL, true));
        Ok(StripArchivesConfig { patterns })
    }
}

/// Error from [`StripArchivesBuilder`].
#[derive(Debug)]
pub enum StripArchivesError {
    /// The builder has already been used and can't be reused.
    AlreadyBuilt,
    /// A user glob failed to compile.
    InvalidPattern {
        glob: String,
        source: globset::Error,
    },
}

impl fmt::Display for StripArchivesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripArchivesError::AlreadyBuilt => {
                write!(f, "strip archives builder has already been used")
            }
            StripArchivesError::InvalidPattern { glob, source } => {
                write!(f, "invalid strip pattern `{glob}`: {source}")
            }
        }
    }
}

impl std::error::Error for StripArchivesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StripArchivesError::AlreadyBuilt => None,
            StripArchivesError::InvalidPattern { source, .. } => Some(source),
        }
    }
}
