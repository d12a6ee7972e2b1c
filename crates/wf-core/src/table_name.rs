//! Strongly-typed table name.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::sql_utils::{quote_qualified, split_qualified_name};

/// A non-empty, possibly schema-qualified relation name (`hdhi_raw`,
/// `analytics.hdhi_dashboard`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Name from a known non-empty literal; use [`try_new`](Self::try_new)
    /// for untrusted input.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(!value.is_empty(), "TableName must not be empty");
        Self(value)
    }

    /// `None` for an empty name
    pub fn try_new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The relation name quoted for direct interpolation into SQL.
    pub fn quoted(&self) -> String {
        quote_qualified(self.as_str())
    }

    /// Schema component, `main` when the name is unqualified.
    pub fn schema(&self) -> &str {
        split_qualified_name(self.as_str()).0
    }

    /// Bare table component.
    pub fn table(&self) -> &str {
        split_qualified_name(self.as_str()).1
    }
}

impl<'de> Deserialize<'de> for TableName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        TableName::try_new(value)
            .ok_or_else(|| serde::de::Error::custom("table name must not be empty"))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_table_defaults_to_main() {
        let name = TableName::new("hdhi_raw");
        assert_eq!(name.schema(), "main");
        assert_eq!(name.table(), "hdhi_raw");
        assert_eq!(name.quoted(), r#""hdhi_raw""#);
    }

    #[test]
    fn test_qualified_table() {
        let name = TableName::new("analytics.hdhi_dashboard");
        assert_eq!(name.schema(), "analytics");
        assert_eq!(name.table(), "hdhi_dashboard");
        assert_eq!(name.quoted(), r#""analytics"."hdhi_dashboard""#);
    }

    #[test]
    fn test_empty_table_name_rejected() {
        assert!(TableName::try_new("").is_none());
        let parsed: Result<TableName, _> = serde_yaml::from_str("''");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let name: TableName = serde_yaml::from_str("staging.hdhi_raw").unwrap();
        assert_eq!(name.as_str(), "staging.hdhi_raw");
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""staging.hdhi_raw""#);
    }
}
