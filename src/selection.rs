//! Packages offered to the user and the fixed platform-runtime table

use crate::platform::UnityVersion;
use serde::Serialize;

/// Category of a selectable package
///
/// Components take part in dependency resolution; platform runtimes are
/// written straight into the manifest by the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageKind {
    /// A toolkit component published in the release index
    Component,
    /// An XR runtime package served by the host's own registry
    PlatformRuntime,
}

/// A top-level offering presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectablePackage {
    pub display_name: String,
    pub identifier: String,
    pub kind: PackageKind,
}

impl SelectablePackage {
    pub fn component(identifier: &str) -> Self {
        Self {
            display_name: identifier.to_string(),
            identifier: identifier.to_string(),
            kind: PackageKind::Component,
        }
    }

    pub fn platform_runtime(display_name: &str, identifier: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            identifier: identifier.to_string(),
            kind: PackageKind::PlatformRuntime,
        }
    }
}

/// A package the user picked, optionally at a specific version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub package: SelectablePackage,
    pub requested_version: Option<String>,
}

impl Selection {
    pub fn latest(package: SelectablePackage) -> Self {
        Self {
            package,
            requested_version: None,
        }
    }

    pub fn at_version(package: SelectablePackage, version: &str) -> Self {
        Self {
            package,
            requested_version: Some(version.to_string()),
        }
    }
}

/// How the manifest version of a platform runtime is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRule {
    /// Always the same version
    Pinned(&'static str),
    /// Depends on the editor version
    Tiered {
        newest: Tier,
        minimum: Tier,
    },
}

/// A runtime version and the editor release that bounds it
///
/// The newest tier applies from `since` onwards; the minimum tier only to
/// editors strictly above its `since`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub since: &'static str,
    pub version: &'static str,
}

/// A platform runtime known to the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRuntime {
    pub display_name: &'static str,
    pub identifier: &'static str,
    pub rule: PlatformRule,
}

pub const MICROSOFT_OPENXR: &str = "com.microsoft.mixedreality.openxr";
pub const META_OPENXR: &str = "com.unity.xr.meta-openxr";

/// Every platform runtime that can be selected, in menu order
pub fn platform_runtimes() -> Vec<PlatformRuntime> {
    vec![
        PlatformRuntime {
            display_name: "Microsoft Mixed Reality OpenXR",
            identifier: MICROSOFT_OPENXR,
            rule: PlatformRule::Pinned("1.11.2"),
        },
        PlatformRuntime {
            display_name: "Meta OpenXR",
            identifier: META_OPENXR,
            rule: PlatformRule::Tiered {
                newest: Tier {
                    since: "6000.0.0f0",
                    version: "2.2.0",
                },
                minimum: Tier {
                    since: "2022.3.0f1",
                    version: "1.0.4",
                },
            },
        },
    ]
}

pub fn find_platform_runtime(identifier: &str) -> Option<PlatformRuntime> {
    platform_runtimes()
        .into_iter()
        .find(|r| r.identifier == identifier)
}

/// Outcome of applying a [`PlatformRule`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformDecision {
    Pinned(String),
    NewestTier(String),
    MinimumTier(String),
    /// Editor is older than the minimum tier
    Unsupported,
    /// Editor version could not be determined
    UnknownEditor,
}

impl PlatformDecision {
    /// Version to write into the manifest, if any
    pub fn version(&self) -> Option<&str> {
        match self {
            PlatformDecision::Pinned(v)
            | PlatformDecision::NewestTier(v)
            | PlatformDecision::MinimumTier(v) => Some(v),
            PlatformDecision::Unsupported | PlatformDecision::UnknownEditor => None,
        }
    }
}

impl PlatformRule {
    pub fn decide(&self, editor: Option<&UnityVersion>) -> PlatformDecision {
        match self {
            PlatformRule::Pinned(version) => PlatformDecision::Pinned(version.to_string()),
            PlatformRule::Tiered { newest, minimum } => {
                let Some(editor) = editor else {
                    return PlatformDecision::UnknownEditor;
                };
                if *editor >= UnityVersion::parse(newest.since) {
                    PlatformDecision::NewestTier(newest.version.to_string())
                } else if *editor > UnityVersion::parse(minimum.since) {
                    PlatformDecision::MinimumTier(minimum.version.to_string())
                } else {
                    PlatformDecision::Unsupported
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_rule() -> PlatformRule {
        find_platform_runtime(META_OPENXR).unwrap().rule
    }

    #[test]
    fn test_pinned_ignores_editor() {
        let rule = find_platform_runtime(MICROSOFT_OPENXR).unwrap().rule;
        assert_eq!(
            rule.decide(None),
            PlatformDecision::Pinned("1.11.2".to_string())
        );
    }

    #[test]
    fn test_unity_2022_gets_minimum_tier() {
        let editor = UnityVersion::parse("2022.3.5f1");
        assert_eq!(
            meta_rule().decide(Some(&editor)),
            PlatformDecision::MinimumTier("1.0.4".to_string())
        );
    }

    #[test]
    fn test_unity_6_gets_newest_tier() {
        let editor = UnityVersion::parse("6000.0.23f1");
        assert_eq!(
            meta_rule().decide(Some(&editor)),
            PlatformDecision::NewestTier("2.2.0".to_string())
        );
    }

    #[test]
    fn test_minimum_tier_excludes_its_boundary() {
        let editor = UnityVersion::parse("2022.3.0f1");
        assert_eq!(
            meta_rule().decide(Some(&editor)),
            PlatformDecision::Unsupported
        );
        let editor = UnityVersion::parse("2022.3.0f2");
        assert_eq!(meta_rule().decide(Some(&editor)).version(), Some("1.0.4"));
    }

    #[test]
    fn test_newest_tier_includes_its_boundary() {
        let editor = UnityVersion::parse("6000.0.0f0");
        assert_eq!(meta_rule().decide(Some(&editor)).version(), Some("2.2.0"));
    }

    #[test]
    fn test_old_editor_is_unsupported() {
        let editor = UnityVersion::parse("2021.3.30f1");
        assert_eq!(
            meta_rule().decide(Some(&editor)),
            PlatformDecision::Unsupported
        );
    }

    #[test]
    fn test_unknown_editor() {
        assert_eq!(meta_rule().decide(None), PlatformDecision::UnknownEditor);
        assert_eq!(PlatformDecision::UnknownEditor.version(), None);
    }
}
