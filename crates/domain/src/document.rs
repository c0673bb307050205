//! Document primitives shared by every store adapter
//!
//! Documents are JSON objects. Filters are conjunctions of equality and
//! set-membership predicates over dotted field paths. Stores that cannot
//! push a filter down can evaluate it with the helpers in this module.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::ports::StoreError;

/// A stored document
pub type Document = Map<String, Value>;

/// The collections known to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Tweets,
    Followers,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::Tweets, Collection::Followers];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "Users",
            Collection::Tweets => "Tweets",
            Collection::Followers => "Followers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value
    Eq { field: String, value: Value },
    /// Field is one of the values; an empty set matches nothing
    In { field: String, values: Vec<Value> },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. } | Predicate::In { field, .. } => field,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        let actual = get_path(document, self.field());
        match self {
            Predicate::Eq { value, .. } => actual == Some(value),
            Predicate::In { values, .. } => actual.is_some_and(|a| values.contains(a)),
        }
    }
}

/// Conjunction of predicates, the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.predicates.push(Predicate::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }
}

/// One sort key; later keys break ties of earlier ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

/// Sort, projection and limit for `find_many`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    /// Top-level fields to keep, `None` keeps everything
    pub projection: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.projection = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort, truncate and project an already filtered result set
    pub fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if !self.sort.is_empty() {
            documents.sort_by(|a, b| compare_documents(a, b, &self.sort));
        }
        if let Some(limit) = self.limit {
            documents.truncate(limit);
        }
        match &self.projection {
            Some(fields) => documents.iter().map(|d| project(d, fields)).collect(),
            None => documents,
        }
    }
}

/// Field update applied by `update_one`
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Set { field: String, value: Value },
    /// Add to an unsigned counter, a missing counter starts at zero
    Inc { field: String, by: u64 },
    /// Subtract from an unsigned counter, saturating at zero
    Dec { field: String, by: u64 },
}

impl Update {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Update::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn inc(field: &str) -> Self {
        Update::Inc {
            field: field.to_string(),
            by: 1,
        }
    }

    pub fn dec(field: &str) -> Self {
        Update::Dec {
            field: field.to_string(),
            by: 1,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Update::Set { field, .. } | Update::Inc { field, .. } | Update::Dec { field, .. } => {
                field
            }
        }
    }

    /// Apply the update in place
    pub fn apply(&self, document: &mut Document) -> Result<(), StoreError> {
        let current = match get_path(document, self.field()) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                StoreError::InvalidUpdate(format!("field {} is not a counter", self.field()))
            })),
        };

        let next = match self {
            Update::Set { value, .. } => value.clone(),
            Update::Inc { by, .. } => {
                let current = current.transpose()?.unwrap_or(0);
                Value::from(current.saturating_add(*by))
            }
            Update::Dec { by, .. } => {
                let current = current.transpose()?.unwrap_or(0);
                Value::from(current.saturating_sub(*by))
            }
        };

        set_path(document, self.field(), next)
    }
}

/// Resolve a dotted path such as `metrics.followers_count`
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn set_path(document: &mut Document, path: &str, value: Value) -> Result<(), StoreError> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(last) = parts.pop() else {
        return Err(StoreError::InvalidUpdate("empty field path".to_string()));
    };

    let mut current = document;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = entry.as_object_mut().ok_or_else(|| {
            StoreError::InvalidUpdate(format!("field {} is not an object", part))
        })?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Keep only the listed top-level fields
pub fn project(document: &Document, fields: &[String]) -> Document {
    fields
        .iter()
        .filter_map(|f| document.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = compare_values(get_path(a, &key.field), get_path(b, &key.field));
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing sorts first; numbers compare numerically, strings lexically
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
