//! In-memory record store with JSON persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::store::RecordStore;
use crate::value::Value;

/// One level of the record tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    values: BTreeMap<String, Value>,
    #[serde(default)]
    groups: BTreeMap<String, Group>,
}

impl Group {
    /// Names of the values stored directly in this group, sorted.
    pub fn value_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Names of the child groups, sorted.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

/// A [`RecordStore`] that keeps the whole group tree in memory.
///
/// The tree can be written to and read from JSON, which is how files are
/// produced on disk.
///
/// # Example
///
/// ```
/// use gabor_record::{MemoryRecord, RecordStore};
///
/// let mut store = MemoryRecord::new();
/// store.set_bool("DCfree", true).unwrap();
/// assert!(store.read_bool("DCfree").unwrap());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryRecord {
    root: Group,
    cwd: Vec<String>,
}

impl MemoryRecord {
    /// Creates an empty store positioned at the root group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root group.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Returns the current group path, `/` for the root.
    pub fn current_path(&self) -> String {
        format!("/{}", self.cwd.join("/"))
    }

    /// Serialises the whole tree (independent of the current group).
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Parses a tree previously produced by [`to_json`](Self::to_json).
    /// The returned store is positioned at the root.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let root: Group = serde_json::from_str(json)?;
        Ok(Self {
            root,
            cwd: Vec::new(),
        })
    }

    /// Writes the tree as JSON to `path`.
    pub fn write_file(&self, path: &Path) -> Result<(), RecordError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| RecordError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads a JSON tree from `path`.
    pub fn read_file(path: &Path) -> Result<Self, RecordError> {
        let json = fs::read_to_string(path).map_err(|e| RecordError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    fn current(&self) -> Result<&Group, RecordError> {
        let mut group = &self.root;
        for name in &self.cwd {
            group = group
                .groups
                .get(name)
                .ok_or_else(|| RecordError::MissingGroup { name: name.clone() })?;
        }
        Ok(group)
    }

    fn current_mut(&mut self) -> Result<&mut Group, RecordError> {
        let mut group = &mut self.root;
        for name in &self.cwd {
            group = group
                .groups
                .get_mut(name)
                .ok_or_else(|| RecordError::MissingGroup { name: name.clone() })?;
        }
        Ok(group)
    }
}

fn validate_name(name: &str) -> Result<(), RecordError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(RecordError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl RecordStore for MemoryRecord {
    fn set(&mut self, name: &str, value: Value) -> Result<(), RecordError> {
        validate_name(name)?;
        self.current_mut()?.values.insert(name.to_string(), value);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Value, RecordError> {
        self.current()?
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::MissingKey {
                name: name.to_string(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.current().is_ok_and(|g| g.values.contains_key(name))
    }

    fn create_group(&mut self, name: &str) -> Result<(), RecordError> {
        validate_name(name)?;
        self.current_mut()?
            .groups
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn has_group(&self, name: &str) -> bool {
        self.current().is_ok_and(|g| g.groups.contains_key(name))
    }

    fn cd(&mut self, path: &str) -> Result<(), RecordError> {
        let mut target = if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.clone()
        };

        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    if target.pop().is_none() {
                        return Err(RecordError::MissingGroup {
                            name: "..".to_string(),
                        });
                    }
                }
                name => target.push(name.to_string()),
            }
        }

        // validate the whole path before committing
        let mut group = &self.root;
        for name in &target {
            group = group
                .groups
                .get(name)
                .ok_or_else(|| RecordError::MissingGroup { name: name.clone() })?;
        }

        self.cwd = target;
        Ok(())
    }
}
