use std::collections::HashMap;

use super::Record;

/// Mapping sheet column holding the owner's email address.
pub const EMAIL_FIELD: &str = "Email";
/// Mapping sheet column holding the owner's display name.
pub const NAME_FIELD: &str = "Name";

/// One row of the mapping sheet: an email address and the name it reports under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub email: String,
    pub name: String,
}

impl MappingEntry {
    /// Build an entry from a mapping record. Rows missing either the email or the
    /// name yield `None` and are meant to be skipped.
    pub fn from_record(record: &Record) -> Option<Self> {
        let email = record.get(EMAIL_FIELD);
        let name = record.get(NAME_FIELD);
        if !email.is_truthy() || !name.is_truthy() {
            return None;
        }
        Some(Self {
            email: email.to_display(),
            name: name.to_display(),
        })
    }
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Lookup table from normalized email to display name.
#[derive(Debug, Clone, Default)]
pub struct EmailDirectory {
    names: HashMap<String, String>,
}

impl EmailDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry. A later entry for the same email replaces the earlier one.
    pub fn insert(&mut self, entry: MappingEntry) {
        self.names.insert(normalize_email(&entry.email), entry.name);
    }

    /// Display name for an email, compared case-insensitively.
    pub fn resolve(&self, email: &str) -> Option<&str> {
        self.names.get(&normalize_email(email)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<MappingEntry> for EmailDirectory {
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        let mut directory = Self::new();
        for entry in iter {
            directory.insert(entry);
        }
        directory
    }
}
