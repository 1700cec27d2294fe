use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

use crate::error::IndexLoadError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The full documentation index: package name to package entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIndex {
    packages: BTreeMap<String, PackageEntry>,
}

/// The types of one package, keyed by bare or package-qualified name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageEntry {
    types: BTreeMap<String, TypeEntry>,
}

/// Documentation payload for a single type. The shape is not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeEntry(Value);

impl PackageIndex {
    /// Decode an index document, inflating it first if it is gzip-compressed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexLoadError> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut decoder = GzDecoder::new(bytes);
            let mut json = Vec::new();
            decoder
                .read_to_end(&mut json)
                .map_err(|e| IndexLoadError::Decompress(e.to_string()))?;
            return Self::from_json(&json);
        }
        Self::from_json(bytes)
    }

    fn from_json(json: &[u8]) -> Result<Self, IndexLoadError> {
        serde_json::from_slice(json).map_err(|e| IndexLoadError::Parse(e.to_string()))
    }

    pub fn package(&self, name: &str) -> Option<&PackageEntry> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &PackageEntry)> {
        self.packages.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Total number of type entries across all packages.
    pub fn type_count(&self) -> usize {
        self.packages.values().map(PackageEntry::len).sum()
    }

    /// Search for types by partial name match, ignoring case.
    ///
    /// Returns `(package, key)` pairs ordered by package then key.
    pub fn search_types(&self, query: &str) -> Vec<(&str, &str)> {
        let query_lower = query.to_lowercase();
        let query_lower = query_lower.as_str();
        self.packages()
            .flat_map(move |(package, entry)| {
                entry
                    .types()
                    .filter(move |(key, _)| key.to_lowercase().contains(query_lower))
                    .map(move |(key, _)| (package, key))
            })
            .collect()
    }
}

impl FromIterator<(String, PackageEntry)> for PackageIndex {
    fn from_iter<I: IntoIterator<Item = (String, PackageEntry)>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

impl PackageEntry {
    pub fn get(&self, key: &str) -> Option<&TypeEntry> {
        self.types.get(key)
    }

    /// Look a type up by its bare name, falling back to `<package>.<type>`.
    ///
    /// Returns the key that matched together with the entry.
    pub fn lookup(&self, package: &str, type_name: &str) -> Option<(&str, &TypeEntry)> {
        if let Some((key, entry)) = self.types.get_key_value(type_name) {
            return Some((key.as_str(), entry));
        }
        let qualified = format!("{}.{}", package, type_name);
        self.types
            .get_key_value(&qualified)
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Types in key order.
    pub fn types(&self) -> impl Iterator<Item = (&str, &TypeEntry)> {
        self.types.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// The name to show for `key` inside `package`, without the package prefix.
    pub fn display_name<'a>(package: &str, key: &'a str) -> &'a str {
        key.strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(key)
    }

    /// The `:type` segment that reaches `key` through [`lookup`](Self::lookup).
    ///
    /// This is the display name unless a bare key of that name exists too, in
    /// which case the bare lookup would shadow `key` and the full key is used.
    pub fn route_name<'a>(&self, package: &str, key: &'a str) -> &'a str {
        let name = Self::display_name(package, key);
        if name != key && self.types.contains_key(name) {
            key
        } else {
            name
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<(String, TypeEntry)> for PackageEntry {
    fn from_iter<I: IntoIterator<Item = (String, TypeEntry)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl TypeEntry {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Pretty-printed JSON of the payload.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}
