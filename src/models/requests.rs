//! Request DTOs for the news API
//!
//! Defines the query parameters accepted by the HTTP handlers.

use serde::Deserialize;

/// Default number of articles returned by the category endpoint.
pub const DEFAULT_LIMIT: usize = 5;

/// Upper bound on `limit`.
pub const MAX_LIMIT: usize = 50;

/// Query string for `GET /api/v1/news/category`
///
/// # Fields
/// - `name`: Category to list (required)
/// - `limit`: Number of articles, defaults to 5
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub name: Option<String>,
    /// Kept as text so a malformed value yields a JSON error body
    #[serde(default)]
    pub limit: Option<String>,
}

impl CategoryQuery {
    /// Validates the query, returning the category and the effective limit.
    pub fn validate(&self) -> Result<(&str, usize), String> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err("Category name is required".to_string()),
        };

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit.min(MAX_LIMIT),
                _ => return Err(format!("Invalid limit: {}", raw)),
            },
        };

        Ok((name, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(name: Option<&str>, limit: Option<&str>) -> CategoryQuery {
        CategoryQuery {
            name: name.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_category_query_deserialize() {
        let json = r#"{"name": "Technology", "limit": "3"}"#;
        let req: CategoryQuery = serde_json::from_str(json).unwrap();
        assert_eq!(req.name.as_deref(), Some("Technology"));
        assert_eq!(req.limit.as_deref(), Some("3"));
    }

    #[test]
    fn test_validate_missing_name() {
        assert_eq!(
            query(None, None).validate(),
            Err("Category name is required".to_string())
        );
        assert!(query(Some("  "), None).validate().is_err());
    }

    #[test]
    fn test_validate_default_limit() {
        assert_eq!(query(Some("Science"), None).validate(), Ok(("Science", 5)));
    }

    #[test]
    fn test_validate_limit_bounds() {
        assert_eq!(query(Some("Science"), Some("500")).validate(), Ok(("Science", MAX_LIMIT)));
        assert!(query(Some("Science"), Some("0")).validate().is_err());
        assert!(query(Some("Science"), Some("five")).validate().is_err());
    }
}
