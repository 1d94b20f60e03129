// sieve-core/src/filter/content.rs
use std::collections::BTreeMap;

use regex::Regex;
use sieve_common::error::{Result, SieveError};
use sieve_common::model::{AttributeValue, ModuleComponentIdentifier, ModuleIdentifier};
use sieve_common::rules::{ContentRules, ModuleMatcher};
use tracing::debug;

use super::{FilterPolicy, Visibility, VisibilityRequest};

/// A [`FilterPolicy`] compiled from declarative [`ContentRules`].
///
/// Checks run in a fixed order and the first failing check excludes:
/// consumer allow list, consumer deny list, includes, excludes, required
/// consumer attributes.
#[derive(Debug)]
pub struct ContentFilter {
    include: Vec<CompiledMatcher>,
    exclude: Vec<CompiledMatcher>,
    only_for_consumers: Option<Vec<String>>,
    not_for_consumers: Vec<String>,
    required_attributes: BTreeMap<String, Vec<AttributeValue>>,
}

impl ContentFilter {
    pub fn compile(rules: &ContentRules) -> Result<Self> {
        let compile_all = |matchers: &[ModuleMatcher]| {
            matchers
                .iter()
                .map(CompiledMatcher::compile)
                .collect::<Result<Vec<_>>>()
        };
        Ok(Self {
            include: compile_all(&rules.include)?,
            exclude: compile_all(&rules.exclude)?,
            only_for_consumers: rules.only_for_consumers.clone(),
            not_for_consumers: rules.not_for_consumers.clone(),
            required_attributes: rules.required_attributes.clone(),
        })
    }

    fn exclusion_reason(&self, request: &VisibilityRequest<'_>) -> Option<&'static str> {
        let consumer = request.consumer_name();
        if let Some(allowed) = &self.only_for_consumers {
            if !allowed.iter().any(|c| c == consumer) {
                return Some("source is not enabled for this consumer");
            }
        }
        if self.not_for_consumers.iter().any(|c| c == consumer) {
            return Some("source is disabled for this consumer");
        }
        if !self.include.is_empty() && !self.include.iter().any(|m| m.matches(request)) {
            return Some("no include rule matches");
        }
        if self.exclude.iter().any(|m| m.matches(request)) {
            return Some("an exclude rule matches");
        }
        let attributes = request.consumer_attributes();
        for (key, accepted) in &self.required_attributes {
            match attributes.get(key) {
                Some(value) if accepted.contains(value) => {}
                _ => return Some("consumer attributes do not satisfy the source"),
            }
        }
        None
    }
}

impl FilterPolicy for ContentFilter {
    fn decide(&self, request: &VisibilityRequest<'_>) -> Visibility {
        match self.exclusion_reason(request) {
            None => Visibility::Visible,
            Some(reason) => {
                debug!(
                    "Excluding {} for consumer '{}': {}",
                    request
                        .component()
                        .map_or_else(|| request.module().to_string(), ToString::to_string),
                    request.consumer_name(),
                    reason
                );
                Visibility::Excluded
            }
        }
    }
}

#[derive(Debug)]
enum CompiledMatcher {
    Group(String),
    GroupRegex(Regex),
    Module(ModuleIdentifier),
    ModuleRegex {
        group: Regex,
        name: Regex,
    },
    Version(ModuleComponentIdentifier),
    VersionRegex {
        group: Regex,
        name: Regex,
        version: Regex,
    },
}

impl CompiledMatcher {
    fn compile(matcher: &ModuleMatcher) -> Result<Self> {
        Ok(match matcher {
            ModuleMatcher::Group(group) => Self::Group(group.clone()),
            ModuleMatcher::GroupRegex(pattern) => Self::GroupRegex(full_match(pattern)?),
            ModuleMatcher::Module(module) => Self::Module(module.parse()?),
            ModuleMatcher::ModuleRegex { group, name } => Self::ModuleRegex {
                group: full_match(group)?,
                name: full_match(name)?,
            },
            ModuleMatcher::Version(component) => Self::Version(component.parse()?),
            ModuleMatcher::VersionRegex {
                group,
                name,
                version,
            } => Self::VersionRegex {
                group: full_match(group)?,
                name: full_match(name)?,
                version: full_match(version)?,
            },
        })
    }

    /// Version matchers match a version listing on the module alone, since no
    /// version has been picked yet.
    fn matches(&self, request: &VisibilityRequest<'_>) -> bool {
        let module = request.module();
        match self {
            Self::Group(group) => module.group() == group,
            Self::GroupRegex(group) => group.is_match(module.group()),
            Self::Module(expected) => module == expected,
            Self::ModuleRegex { group, name } => {
                group.is_match(module.group()) && name.is_match(module.name())
            }
            Self::Version(expected) => {
                module == expected.module()
                    && request
                        .component()
                        .is_none_or(|c| c.version() == expected.version())
            }
            Self::VersionRegex {
                group,
                name,
                version,
            } => {
                group.is_match(module.group())
                    && name.is_match(module.name())
                    && request
                        .component()
                        .is_none_or(|c| version.is_match(c.version()))
            }
        }
    }
}

fn full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| SieveError::InvalidPattern(pattern.to_string(), e.to_string()))
}
