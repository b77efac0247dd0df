//! User-defined phrase aliases.
//!
//! Aliases come from configuration as a `key=value;key=value` list and are
//! applied before any other prompt processing. Substitution is substring
//! replace-all, key by key in declaration order, so an expansion can itself
//! be rewritten by a later key. That chained behavior is deliberate and has
//! no cycle detection; configurations are expected to keep alias tables
//! simple.

/// Ordered alias table. Later duplicate keys overwrite earlier ones in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasResolver {
    entries: Vec<(String, String)>,
}

impl AliasResolver {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the configured `key=value;key=value` list.
    ///
    /// Entries that do not split into exactly one key and one value are
    /// dropped; embedded newlines are stripped from both sides. An empty or
    /// missing configuration yields an empty table.
    #[must_use]
    pub fn from_spec(spec: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();

        for part in spec.split(';') {
            let fields: Vec<&str> = part.split('=').collect();
            if fields.len() != 2 {
                continue;
            }

            let key = fields[0].replace('\n', "");
            let value = fields[1].replace('\n', "");
            if key.is_empty() {
                continue;
            }

            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }

        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the prompt by replacing every occurrence of each key with its
    /// expansion, in declaration order. A no-op when the table is empty.
    #[must_use]
    pub fn resolve(&self, prompt: &str) -> String {
        self.entries
            .iter()
            .fold(prompt.to_string(), |resolved, (key, value)| {
                resolved.replace(key.as_str(), value)
            })
    }
}
