//! Process-wide key/value configuration, read the way `build.prop` style
//! property files are laid out.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("failed to read property file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid property assignment '{0}', expected key=value")]
    BadAssignment(String),
}

pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: PropertyStore + ?Sized> PropertyStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// In-memory property store.
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    values: HashMap<String, String>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parse a single `key=value` assignment as given on the command line.
    pub fn set_assignment(&mut self, assignment: &str) -> Result<(), PropertyError> {
        let (key, value) = split_assignment(assignment)
            .ok_or_else(|| PropertyError::BadAssignment(assignment.to_string()))?;
        self.set(key, value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertyStore for MapProperties {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Properties loaded once from a `build.prop` style file.
///
/// One `key=value` per line; blank lines and `#` comments are skipped and the
/// last assignment of a key wins.
#[derive(Debug, Clone)]
pub struct PropertyFile {
    path: PathBuf,
    values: MapProperties,
}

impl PropertyFile {
    pub fn load(path: &Path) -> Result<Self, PropertyError> {
        let text = fs::read_to_string(path).map_err(|source| PropertyError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            values: Self::parse(&text),
        })
    }

    fn parse(text: &str) -> MapProperties {
        let mut values = MapProperties::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match split_assignment(line) {
                Some((key, value)) => values.set(key, value),
                None => log::debug!("ignoring property line without '=': {}", line),
            }
        }
        values
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertyStore for PropertyFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key)
    }
}

/// Overrides looked up first, then the base store.
pub struct LayeredProperties<B> {
    overrides: MapProperties,
    base: B,
}

impl<B: PropertyStore> LayeredProperties<B> {
    pub fn new(overrides: MapProperties, base: B) -> Self {
        Self { overrides, base }
    }
}

impl<B: PropertyStore> PropertyStore for LayeredProperties<B> {
    fn get(&self, key: &str) -> Option<String> {
        self.overrides.get(key).or_else(|| self.base.get(key))
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Read a comma separated integer list property.
///
/// The whole default list is returned (and a warning logged) when the key is
/// missing, the element count differs from `defaults`, or any element fails
/// to parse.
pub fn get_int_list<T>(store: &dyn PropertyStore, key: &str, defaults: &[T]) -> Vec<T>
where
    T: FromStr + Copy,
{
    match parse_int_list(store.get(key).as_deref().unwrap_or(""), defaults.len()) {
        Some(values) => values,
        None => {
            log::warn!("property '{}' does not exist or has an unexpected value", key);
            defaults.to_vec()
        }
    }
}

fn parse_int_list<T: FromStr>(raw: &str, expected: usize) -> Option<Vec<T>> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != expected {
        return None;
    }

    parts
        .into_iter()
        .map(|part| part.trim().parse::<T>().ok())
        .collect()
}
