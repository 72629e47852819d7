//! Tag-based resource selection

use crate::condition::{Condition, NamedCondition};
use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value tag attached to a remote resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A remote resource as seen by the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name (e.g. an auto scaling group name)
    pub name: String,

    /// Tags in the order the remote API returned them
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }
}

/// Selects resources having at least one tag that satisfies the condition
/// registered for its key
#[derive(Debug, Clone)]
pub struct ResourceSelector {
    conditions: HashMap<String, Condition>,
}

impl ResourceSelector {
    /// Build a selector from named conditions
    ///
    /// Fails with a configuration error when no condition is given. A later
    /// condition for the same tag key replaces an earlier one.
    pub fn new(conditions: impl IntoIterator<Item = NamedCondition>) -> Result<Self> {
        let conditions: HashMap<String, Condition> = conditions
            .into_iter()
            .map(|named| (named.name, named.condition))
            .collect();

        if conditions.is_empty() {
            return Err(CloudError::configuration(
                "Missing parameter: tags are required",
            ));
        }

        Ok(Self { conditions })
    }

    /// Names of matching resources, in input order, each at most once
    pub fn select<'a, I>(&self, resources: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        resources
            .into_iter()
            .filter(|resource| self.matches(resource))
            .map(|resource| resource.name.clone())
            .collect()
    }

    /// Whether any registered tag of `resource` satisfies its condition
    pub fn matches(&self, resource: &Resource) -> bool {
        tracing::debug!("Checking resource [{}]", resource.name);
        resource.tags.iter().any(|tag| {
            let Some(condition) = self.conditions.get(&tag.key) else {
                tracing::debug!("Looking for tag [{}] -> [false]", tag.key);
                return false;
            };
            tracing::debug!("Looking for tag [{}] -> [true]", tag.key);
            let matched = condition.evaluate(&tag.value);
            if matched {
                tracing::debug!("Adding resource named [{}]", resource.name);
            }
            matched
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Select from `resources` using a tag-key to condition mapping
pub fn select(
    resources: &[Resource],
    conditions: &HashMap<String, Condition>,
) -> Result<Vec<String>> {
    let selector = ResourceSelector::new(
        conditions
            .iter()
            .map(|(key, cond)| NamedCondition::new(key.clone(), cond.clone())),
    )?;
    Ok(selector.select(resources))
}
