//! Configuration descriptors.
//!
//! The tsconfig-like file is read leniently: `//` line comments and
//! trailing commas are stripped before JSON parsing, and unknown fields are
//! ignored. The package descriptor is strict: the package id must match the
//! identifier grammar and the version must be semver with an optional
//! prerelease.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Compiler options, shaped like a `tsconfig.json` `compilerOptions` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub strict: bool,
    pub out_dir: Option<String>,
    pub root_dir: Option<String>,
    pub target: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    pub compiler_options: CompilerOptions,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl CompilerConfig {
    pub fn from_file(path: &Path) -> Result<CompilerConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file '{}'", path.display()))?;
        Self::from_text(&text)
            .with_context(|| format!("parsing config file '{}'", path.display()))
    }

    pub fn from_text(text: &str) -> Result<CompilerConfig> {
        let cleaned = strip_lenient_syntax(text);
        Ok(serde_json::from_str(&cleaned)?)
    }
}

/// Remove `//` line comments and trailing commas, respecting string
/// literals.
fn strip_lenient_syntax(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: skip to end of line, keep the newline.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ',' => {
                // Trailing comma: drop when the next non-space char closes
                // a container.
                let mut lookahead = chars.clone();
                let mut next_significant = None;
                for next in lookahead.by_ref() {
                    if !next.is_whitespace() {
                        next_significant = Some(next);
                        break;
                    }
                }
                if matches!(next_significant, Some('}') | Some(']')) {
                    continue;
                }
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// A `package.json`-like descriptor with validated id and version.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
}

impl PackageDescriptor {
    pub fn from_text(text: &str) -> Result<PackageDescriptor> {
        let descriptor: PackageDescriptor = serde_json::from_str(text)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_package_id(&self.name) {
            bail!("invalid package id '{}'", self.name);
        }
        if !is_valid_version(&self.version) {
            bail!("invalid package version '{}'", self.version);
        }
        Ok(())
    }
}

/// Identifier grammar: starts with a letter or underscore; continues with
/// letters, digits, `_`, `.`, `-`; no leading or trailing separator.
pub fn is_valid_package_id(id: &str) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if id.ends_with('.') || id.ends_with('-') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// `MAJOR.MINOR.PATCH` with an optional `-prerelease` of dot-separated
/// alphanumeric/hyphen identifiers.
pub fn is_valid_version(version: &str) -> bool {
    let (core, prerelease) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return false;
    }
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        // No leading zeros (except "0" itself).
        if part.len() > 1 && part.starts_with('0') {
            return false;
        }
    }

    match prerelease {
        None => true,
        Some(pre) => {
            !pre.is_empty()
                && pre.split('.').all(|segment| {
                    !segment.is_empty()
                        && segment
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '-')
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing_accepts_comments_and_trailing_commas() {
        let text = r#"{
            // project configuration
            "compilerOptions": {
                "strict": true,
                "outDir": "dist", // emitted here
            },
            "include": ["src",],
        }"#;
        let config = CompilerConfig::from_text(text).unwrap();
        assert!(config.compiler_options.strict);
        assert_eq!(config.compiler_options.out_dir.as_deref(), Some("dist"));
        assert_eq!(config.include, vec!["src"]);
    }

    #[test]
    fn slashes_inside_strings_are_not_comments() {
        let text = r#"{"compilerOptions": {"outDir": "a//b"}}"#;
        let config = CompilerConfig::from_text(text).unwrap();
        assert_eq!(config.compiler_options.out_dir.as_deref(), Some("a//b"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config = CompilerConfig::from_text(r#"{"futureOption": 1}"#).unwrap();
        assert!(!config.compiler_options.strict);
    }

    #[test]
    fn package_id_grammar() {
        assert!(is_valid_package_id("my_pkg"));
        assert!(is_valid_package_id("my-pkg.core"));
        assert!(is_valid_package_id("_internal"));
        assert!(!is_valid_package_id(""));
        assert!(!is_valid_package_id("1pkg"));
        assert!(!is_valid_package_id("pkg-"));
        assert!(!is_valid_package_id("pkg."));
        assert!(!is_valid_package_id("pkg name"));
    }

    #[test]
    fn semver_grammar_with_optional_prerelease() {
        assert!(is_valid_version("1.2.3"));
        assert!(is_valid_version("0.0.1"));
        assert!(is_valid_version("1.2.3-alpha.1"));
        assert!(is_valid_version("1.2.3-rc-2"));
        assert!(!is_valid_version("1.2"));
        assert!(!is_valid_version("1.2.3.4"));
        assert!(!is_valid_version("01.2.3"));
        assert!(!is_valid_version("1.2.3-"));
        assert!(!is_valid_version("1.2.3-alpha..1"));
    }

    #[test]
    fn descriptor_validation_round_trip() {
        let ok = PackageDescriptor::from_text(r#"{"name": "tool", "version": "1.0.0"}"#);
        assert!(ok.is_ok());
        let bad = PackageDescriptor::from_text(r#"{"name": "9tool", "version": "1.0.0"}"#);
        assert!(bad.is_err());
    }
}
