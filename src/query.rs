// 🔎 Query Pipeline - filter → search → sort over in-memory collections
//
// Request parameters follow JSON:API conventions:
//   filter[<field>]=a,b   equality, any of the listed values
//   filter[search]=term   case-insensitive substring over searchable fields
//   sort=field,-other     stable sort, '-' for descending
//   include=rel1,rel2     related resources to embed (used by the serializer)
//
// Every stage keeps the relative order of records it does not reorder.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

use crate::entities::transfer::format_timestamp;

/// Query key holding the free text search term
pub const SEARCH_KEY: &str = "search";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("unknown filter field: {0}")]
    UnknownFilter(String),

    #[error("unknown sort field: {0}")]
    UnknownSort(String),

    #[error("unknown relationship in include: {0}")]
    UnknownInclude(String),
}

// ============================================================================
// FIELD VALUES
// ============================================================================

/// Value of a record field as seen by the query pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    Time(DateTime<Utc>),
    Null,
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(value))
    }

    /// Check if a raw query string value designates this value
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            FieldValue::Text(text) => text.as_ref() == raw,
            FieldValue::Int(value) => raw.trim().parse::<i64>().map_or(false, |v| v == *value),
            FieldValue::Time(time) => DateTime::parse_from_rfc3339(raw.trim())
                .map_or(false, |t| t.with_timezone(&Utc) == *time),
            FieldValue::Null => raw.is_empty() || raw == "null",
        }
    }

    /// Check if this value contains the (already lowercased) term
    pub fn contains(&self, lower_term: &str) -> bool {
        match self {
            FieldValue::Text(text) => text.to_lowercase().contains(lower_term),
            FieldValue::Int(value) => value.to_string().contains(lower_term),
            FieldValue::Time(time) => format_timestamp(time).to_lowercase().contains(lower_term),
            FieldValue::Null => false,
        }
    }

    /// Null sorts first; values of different kinds compare equal
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.as_ref().cmp(b.as_ref()),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Time(a), FieldValue::Time(b)) => a.cmp(b),
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

// ============================================================================
// QUERYABLE RECORDS
// ============================================================================

/// Explicit field access for a resource type
pub trait Queryable {
    /// Fields accepted by filters and sort keys
    const FIELDS: &'static [&'static str];

    /// Fields scanned by free text search
    const SEARCH_FIELDS: &'static [&'static str];

    /// Value of a field, `None` when the field does not exist
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub filters: Vec<Filter>,
    pub search: Option<String>,
    pub sort: Vec<SortKey>,
    pub include: Vec<String>,
}

impl QueryParams {
    /// Parse raw query parameters; keys not understood are ignored
    pub fn parse(raw: &HashMap<String, String>) -> Self {
        let mut params = QueryParams::default();

        let mut keys: Vec<&String> = raw.keys().collect();
        keys.sort();

        for key in keys {
            let value = &raw[key];
            if let Some(field) = key.strip_prefix("filter[").and_then(|k| k.strip_suffix(']')) {
                if field == SEARCH_KEY {
                    let term = value.trim();
                    if !term.is_empty() {
                        params.search = Some(term.to_string());
                    }
                } else {
                    params.filters.push(Filter {
                        field: field.to_string(),
                        values: value.split(',').map(|v| v.to_string()).collect(),
                    });
                }
            } else if key == "sort" {
                params.sort = split_list(value)
                    .map(|item| match item.strip_prefix('-') {
                        Some(field) => SortKey { field: field.to_string(), descending: true },
                        None => SortKey { field: item.to_string(), descending: false },
                    })
                    .collect();
            } else if key == "include" {
                params.include = split_list(value).map(|v| v.to_string()).collect();
            }
        }

        params
    }

    /// Remove a filter that the route handles itself (e.g. `filter[account]`)
    pub fn take_filter(&mut self, field: &str) -> Option<Vec<String>> {
        let index = self.filters.iter().position(|f| f.field == field)?;
        Some(self.filters.remove(index).values)
    }

    pub fn includes(&self, relationship: &str) -> bool {
        self.include.iter().any(|r| r == relationship)
    }

    /// Reject `include` entries the route cannot resolve
    pub fn check_includes(&self, allowed: &[&str]) -> Result<(), QueryError> {
        match self.include.iter().find(|r| !allowed.contains(&r.as_str())) {
            Some(unknown) => Err(QueryError::UnknownInclude(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Run the whole pipeline: filter, then search, then sort
    pub fn apply<'a, T: Queryable>(&self, records: Vec<&'a T>) -> Result<Vec<&'a T>, QueryError> {
        let records = filter(records, &self.filters)?;
        let records = search(records, self.search.as_deref());
        sort(records, &self.sort)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// STAGES
// ============================================================================

/// Keep records whose fields equal one of the requested values
pub fn filter<'a, T: Queryable>(records: Vec<&'a T>, filters: &[Filter]) -> Result<Vec<&'a T>, QueryError> {
    if let Some(unknown) = filters.iter().find(|f| !T::has_field(&f.field)) {
        return Err(QueryError::UnknownFilter(unknown.field.clone()));
    }

    Ok(records
        .into_iter()
        .filter(|record| {
            filters.iter().all(|f| {
                record
                    .field(&f.field)
                    .map_or(false, |value| f.values.iter().any(|raw| value.matches(raw)))
            })
        })
        .collect())
}

/// Keep records where any searchable field contains the term
pub fn search<'a, T: Queryable>(records: Vec<&'a T>, term: Option<&str>) -> Vec<&'a T> {
    let term = match term.map(str::trim) {
        Some(term) if !term.is_empty() => term.to_lowercase(),
        _ => return records,
    };

    records
        .into_iter()
        .filter(|record| {
            T::SEARCH_FIELDS
                .iter()
                .filter_map(|name| record.field(name))
                .any(|value| value.contains(&term))
        })
        .collect()
}

/// Stable sort by the given keys, earlier keys take precedence
pub fn sort<'a, T: Queryable>(mut records: Vec<&'a T>, keys: &[SortKey]) -> Result<Vec<&'a T>, QueryError> {
    if let Some(unknown) = keys.iter().find(|k| !T::has_field(&k.field)) {
        return Err(QueryError::UnknownSort(unknown.field.clone()));
    }
    if keys.is_empty() {
        return Ok(records);
    }

    records.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = match (a.field(&key.field), b.field(&key.field)) {
                    (Some(x), Some(y)) => x.compare(&y),
                    _ => Ordering::Equal,
                };
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: &'static str,
        kind: &'static str,
        size: i64,
    }

    impl Queryable for Item {
        const FIELDS: &'static [&'static str] = &["name", "kind", "size"];
        const SEARCH_FIELDS: &'static [&'static str] = &["name"];

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "name" => Some(FieldValue::text(self.name)),
                "kind" => Some(FieldValue::text(self.kind)),
                "size" => Some(FieldValue::Int(self.size)),
                _ => None,
            }
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "Bicycle repair", kind: "offer", size: 3 },
            Item { name: "Bread", kind: "need", size: 1 },
            Item { name: "Guitar lessons", kind: "offer", size: 2 },
            Item { name: "Baby sitting", kind: "need", size: 3 },
            Item { name: "Carpentry", kind: "offer", size: 1 },
        ]
    }

    fn names(records: &[&Item]) -> Vec<&'static str> {
        records.iter().map(|i| i.name).collect()
    }

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_filter_keeps_only_matches_in_order() {
        let data = items();
        let filters = vec![Filter { field: "kind".to_string(), values: vec!["offer".to_string()] }];
        let result = filter(data.iter().collect(), &filters).unwrap();

        assert_eq!(names(&result), vec!["Bicycle repair", "Guitar lessons", "Carpentry"]);
        assert!(result.iter().all(|i| i.kind == "offer"));
    }

    #[test]
    fn test_filter_any_of_values() {
        let data = items();
        let params = QueryParams::parse(&raw(&[("filter[size]", "1,2")]));
        let result = params.apply(data.iter().collect()).unwrap();

        assert_eq!(names(&result), vec!["Bread", "Guitar lessons", "Carpentry"]);
    }

    #[test]
    fn test_filter_unknown_field_is_rejected() {
        let data = items();
        let params = QueryParams::parse(&raw(&[("filter[color]", "red")]));
        let result = params.apply(data.iter().collect());

        assert_eq!(result, Err(QueryError::UnknownFilter("color".to_string())));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let data = items();
        let result = search(data.iter().collect(), Some("  BR "));

        assert_eq!(names(&result), vec!["Bread"]);
    }

    #[test]
    fn test_empty_search_is_noop() {
        let data = items();
        assert_eq!(search(data.iter().collect(), Some("   ")).len(), 5);
        assert_eq!(search(data.iter().collect(), None).len(), 5);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let data = items();
        let params = QueryParams::parse(&raw(&[("sort", "size")]));
        let result = params.apply(data.iter().collect()).unwrap();

        // Ties keep their original relative order
        assert_eq!(
            names(&result),
            vec!["Bread", "Carpentry", "Guitar lessons", "Bicycle repair", "Baby sitting"]
        );
    }

    #[test]
    fn test_sort_descending_with_secondary_key() {
        let data = items();
        let params = QueryParams::parse(&raw(&[("sort", "-size,name")]));
        let result = params.apply(data.iter().collect()).unwrap();

        assert_eq!(
            names(&result),
            vec!["Baby sitting", "Bicycle repair", "Guitar lessons", "Bread", "Carpentry"]
        );
    }

    #[test]
    fn test_pipeline_order_filter_search_sort() {
        let data = items();
        let params = QueryParams::parse(&raw(&[
            ("filter[kind]", "offer"),
            ("filter[search]", "r"),
            ("sort", "-name"),
        ]));
        let result = params.apply(data.iter().collect()).unwrap();

        assert_eq!(names(&result), vec!["Guitar lessons", "Carpentry", "Bicycle repair"]);
    }

    #[test]
    fn test_parse_params() {
        let mut params = QueryParams::parse(&raw(&[
            ("filter[account]", "a-1,a-2"),
            ("filter[search]", "coffee"),
            ("include", "payer, payee"),
            ("page[size]", "20"),
        ]));

        assert_eq!(params.search.as_deref(), Some("coffee"));
        assert!(params.includes("payer"));
        assert!(params.includes("payee"));
        assert_eq!(params.take_filter("account"), Some(vec!["a-1".to_string(), "a-2".to_string()]));
        assert!(params.filters.is_empty());
        assert_eq!(params.take_filter("account"), None);
    }

    #[test]
    fn test_field_value_matching() {
        assert!(FieldValue::Int(-300).matches("-300"));
        assert!(!FieldValue::Int(-300).matches("abc"));
        assert!(FieldValue::Null.matches("null"));
        assert_eq!(FieldValue::Null.compare(&FieldValue::Int(0)), Ordering::Less);
    }

    #[test]
    fn test_check_includes() {
        let params = QueryParams::parse(&raw(&[("include", "payer,currency")]));
        assert!(params.check_includes(&["payer", "payee", "currency"]).is_ok());
        assert_eq!(
            params.check_includes(&["payer"]),
            Err(QueryError::UnknownInclude("currency".to_string()))
        );
    }
}
