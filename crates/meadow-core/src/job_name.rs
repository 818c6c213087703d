//! Structured job names: `<prefix><resourceClass>-<iteration>`.

use regex::Regex;

/// Builds and parses the names of jobs submitted by this adapter.
#[derive(Debug, Clone)]
pub struct JobNamer {
    prefix: String,
    pattern: Regex,
}

impl JobNamer {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"^{}(.+)-(\d+)(\[.*\])?$", regex::escape(prefix)))?;
        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name shared by every task of one submitted array.
    pub fn array_name(&self, rc_name: &str, iteration: u64) -> String {
        format!("{}{}-{}", self.prefix, rc_name, iteration)
    }

    /// Whether `name` belongs to a job this adapter submitted.
    pub fn has_prefix(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Resource class encoded in `name`, if it follows the convention.
    pub fn resource_class<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(name.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
