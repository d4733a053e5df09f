//! Version comparison for release artifacts
//!
//! Artifact versions look like `MAJOR.MINOR.PATCH` with an optional
//! pre-release suffix such as `-pre.3`. The ordering differs from strict
//! semver in one respect: when one numeric core is a strict prefix of the
//! other (`3.0` vs `3.0.0`), the longer one is considered newer.
//!
//! # Examples
//!
//! ```
//! use mrfeature::version::is_newer;
//!
//! assert!(is_newer("3.0.0", "3.0.1").unwrap());
//! assert!(is_newer("3.0.0-pre.2", "3.0.0").unwrap());
//! assert!(is_newer("3.0.0-pre.2", "3.0.0-pre.10").unwrap());
//! ```

use crate::{Error, Result};
use std::cmp::Ordering;

/// A version split into its numeric core and optional pre-release tag
struct Parts<'a> {
    core: Vec<u64>,
    pre: Option<&'a str>,
}

fn split(version: &str) -> Result<Parts<'_>> {
    let (core, pre) = match version.find('-') {
        Some(pos) => (&version[..pos], Some(&version[pos + 1..])),
        None => (version, None),
    };

    let core = core
        .split('.')
        .map(|segment| {
            segment
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::MalformedVersion(version.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Parts { core, pre })
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn compare_pre_tags(old: &str, new: &str) -> Ordering {
    let old_segments: Vec<&str> = old.split('.').collect();
    let new_segments: Vec<&str> = new.split('.').collect();

    for (o, n) in old_segments.iter().zip(new_segments.iter()) {
        let ordering = if is_numeric(o) && is_numeric(n) {
            // Digit-only segments can still overflow u64; fall back to length then text
            match (o.parse::<u64>(), n.parse::<u64>()) {
                (Ok(o), Ok(n)) => n.cmp(&o),
                _ => n.len().cmp(&o.len()).then_with(|| n.cmp(o)),
            }
        } else {
            n.cmp(o)
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    new_segments.len().cmp(&old_segments.len())
}

/// Returns how `new` orders relative to `old` (`Greater` means `new` is newer)
fn order(old: &str, new: &str) -> Result<Ordering> {
    let old = split(old)?;
    let new = split(new)?;

    for (o, n) in old.core.iter().zip(new.core.iter()) {
        match n.cmp(o) {
            Ordering::Equal => continue,
            decided => return Ok(decided),
        }
    }

    match new.core.len().cmp(&old.core.len()) {
        Ordering::Equal => {}
        decided => return Ok(decided),
    }

    Ok(match (old.pre, new.pre) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (Some(o), Some(n)) => compare_pre_tags(o, n),
    })
}

/// Check whether `new` is strictly newer than `old`
///
/// Fails with [`Error::MalformedVersion`] when a numeric core segment of either
/// input is not an integer.
pub fn is_newer(old: &str, new: &str) -> Result<bool> {
    Ok(order(old, new)? == Ordering::Greater)
}

/// Check that a version string has an integer numeric core
pub fn validate(version: &str) -> Result<()> {
    split(version).map(|_| ())
}

/// Total order over version strings, suitable for `sort_by`
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    order(b, a)
}
