//! Settings sources

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use parking_lot::RwLock;

/// Read access to named settings
///
/// Empty values are reported as absent, so an exported-but-blank environment
/// variable never counts as configured.
pub trait SettingsSource: Send + Sync {
	/// Returns the value of `name`, if set and non-empty
	fn get_setting(&self, name: &str) -> Option<String>;
}

impl<S: SettingsSource + ?Sized> SettingsSource for Arc<S> {
	fn get_setting(&self, name: &str) -> Option<String> {
		(**self).get_setting(name)
	}
}

fn non_empty(value: String) -> Option<String> {
	if value.trim().is_empty() {
		None
	} else {
		Some(value)
	}
}

/// Process environment settings source
///
/// With prefix `"APP_"`, the setting `"SERVER_PORT"` is read from the
/// environment variable `APP_SERVER_PORT`.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
	prefix: String,
}

impl EnvSettings {
	/// Reads variables verbatim
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads variables under `prefix`
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	fn env_var_name(&self, name: &str) -> String {
		format!("{}{}", self.prefix, name.to_uppercase())
	}
}

impl SettingsSource for EnvSettings {
	fn get_setting(&self, name: &str) -> Option<String> {
		env::var(self.env_var_name(name)).ok().and_then(non_empty)
	}
}

/// In-memory settings source, for tests and embedding runtimes
#[derive(Debug, Default)]
pub struct MemorySettings {
	values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
	/// Creates an empty source
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert
	pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(name, value);
		self
	}

	/// Inserts or replaces a setting
	pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
		self.values.write().insert(name.into(), value.into());
	}

	/// Removes a setting
	pub fn remove(&self, name: &str) {
		self.values.write().remove(name);
	}
}

impl<K, V> FromIterator<(K, V)> for MemorySettings
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let values = iter
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		Self {
			values: RwLock::new(values),
		}
	}
}

impl SettingsSource for MemorySettings {
	fn get_setting(&self, name: &str) -> Option<String> {
		self.values.read().get(name).cloned().and_then(non_empty)
	}
}

/// Consults several sources in order; the first one holding a value wins
#[derive(Default, Clone)]
pub struct ChainedSettings {
	sources: Vec<Arc<dyn SettingsSource>>,
}

impl ChainedSettings {
	/// Creates an empty chain
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a lower-priority source
	pub fn then(mut self, source: impl SettingsSource + 'static) -> Self {
		self.sources.push(Arc::new(source));
		self
	}
}

impl SettingsSource for ChainedSettings {
	fn get_setting(&self, name: &str) -> Option<String> {
		self.sources
			.iter()
			.find_map(|source| source.get_setting(name))
	}
}
