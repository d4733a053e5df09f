//! Unity editor version parsing and detection
//!
//! Editor versions look like `2022.3.5f1`: three numbers, a release-type
//! letter (`a`lpha, `b`eta, `f`inal, `p`atch) and a build number.
//!
//! # Examples
//!
//! ```
//! use mrfeature::UnityVersion;
//!
//! let editor = UnityVersion::parse("2022.3.5f1");
//! assert!(editor > UnityVersion::parse("2022.3.0f1"));
//! assert!(editor < UnityVersion::parse("6000.0.0f0"));
//! ```

use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Relative location of the editor version descriptor inside a project
pub const PROJECT_VERSION_FILE: &str = "ProjectSettings/ProjectVersion.txt";

const EDITOR_VERSION_KEY: &str = "m_EditorVersion:";

/// A Unity editor version
///
/// Ordering is lexicographic over the fields in declaration order; the
/// release-type letter compares by its raw character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnityVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub release_type: char,
    pub build: u32,
}

impl Default for UnityVersion {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 0,
            patch: 0,
            release_type: 'f',
            build: 0,
        }
    }
}

fn full_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)([abfp])(\d+)").expect("valid editor version regex")
    })
}

fn short_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("valid editor version regex"))
}

impl UnityVersion {
    /// Parse a version string; never fails
    ///
    /// `6000.0.0` is accepted as `6000.0.0f0`. Anything unrecognised, or a
    /// number that does not fit, yields zero in that position.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let mut version = Self::default();

        let number = |s: &str| s.parse::<u32>().unwrap_or(0);

        if let Some(caps) = full_pattern().captures(input) {
            version.major = number(&caps[1]);
            version.minor = number(&caps[2]);
            version.patch = number(&caps[3]);
            version.release_type = caps[4].chars().next().unwrap_or('f');
            version.build = number(&caps[5]);
        } else if let Some(caps) = short_pattern().captures(input) {
            version.major = number(&caps[1]);
            version.minor = number(&caps[2]);
            version.patch = number(&caps[3]);
        }

        version
    }
}

impl fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{}{}",
            self.major, self.minor, self.patch, self.release_type, self.build
        )
    }
}

/// Read the editor version string recorded in a project
///
/// Returns `None` when the descriptor or its `m_EditorVersion:` line is missing.
pub fn read_editor_version<P: AsRef<Path>>(project_root: P) -> Option<String> {
    let path = project_root.as_ref().join(PROJECT_VERSION_FILE);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("No editor version at {}: {}", path.display(), e);
            return None;
        }
    };

    content
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(EDITOR_VERSION_KEY))
        .map(|rest| rest.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse the editor version of a project
pub fn detect_editor_version<P: AsRef<Path>>(project_root: P) -> Option<UnityVersion> {
    read_editor_version(project_root).map(|v| UnityVersion::parse(&v))
}
