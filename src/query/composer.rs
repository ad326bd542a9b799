use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldValue;
use crate::query::ast::{BoolQuery, Query};
use crate::query::types::{Bounds, FilterAttribute, FilterKind, QueryAttribute};
use crate::schema::key::{MULTI_WILDCARD, SINGLE_WILDCARD};
use crate::schema::schema::{Relation, ValueType, PRIMARY_KEY};

/// Characters the query parser gives a meaning to
const QUERY_SYNTAX: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/', '\'',
];

const QUERY_OPERATORS: &[&str] = &["AND", "OR", "NOT", "IN", "TO"];

/// Accumulates filter and text clauses into one query
///
/// Each `add_*` call contributes at most one top-level clause; `build`
/// joins them with MUST so every call narrows the result.
pub struct QueryComposer<'a> {
    relation: &'a Relation,
    clauses: Vec<Query>,
}

impl<'a> QueryComposer<'a> {
    pub fn new(relation: &'a Relation) -> Self {
        QueryComposer {
            relation,
            clauses: Vec::new(),
        }
    }

    /// Add an already built clause as-is
    pub fn add_query(&mut self, query: Query) {
        self.clauses.push(query);
    }

    /// One filter is added bare; several are grouped with essential
    /// filters as MUST and the rest as SHOULD.
    pub fn add_filter_clauses(&mut self, filters: &[FilterAttribute]) -> Result<()> {
        match filters {
            [] => {}
            [single] => {
                let query = self.filter_query(single)?;
                self.clauses.push(query);
            }
            many => {
                let mut group = BoolQuery::new();
                for filter in many {
                    let query = self.filter_query(filter)?;
                    if filter.essential {
                        group.must.push(query);
                    } else {
                        group.should.push(query);
                    }
                }
                debug!(must = group.must.len(), should = group.should.len(), "grouped filter clauses");
                self.clauses.push(Query::Bool(group));
            }
        }
        Ok(())
    }

    /// One analyzed clause per attribute, all in a single group.
    /// An attribute without its own keyword uses `query_text`; blank
    /// keywords contribute nothing.
    pub fn add_analyzed_clauses(
        &mut self,
        query_text: Option<&str>,
        attributes: &[QueryAttribute],
    ) -> Result<()> {
        let mut group = BoolQuery::new();

        for attribute in attributes {
            let column = self.relation.column(&attribute.column).ok_or_else(|| {
                Error::validation(format!(
                    "query column '{}' is not part of relation '{}'",
                    attribute.column, self.relation.name
                ))
            })?;
            if !column.is_searchable() {
                return Err(Error::validation(format!(
                    "column '{}' is not indexed and tokenized", column.name
                )));
            }

            let raw = attribute.keyword.as_deref().or(query_text).unwrap_or_default();
            let keyword = if self.relation.expert_query_mode {
                raw.trim().to_string()
            } else {
                plain_text(raw)
            };
            if keyword.is_empty() {
                continue;
            }

            group.add(
                attribute.occur.unwrap_or_default(),
                Query::parsed(vec![column.name.clone()], &keyword),
            );
        }

        if !group.is_empty() {
            debug!(clauses = group.len(), "added analyzed clauses");
            self.clauses.push(Query::Bool(group));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn build(mut self) -> Result<Query> {
        match self.clauses.len() {
            0 => Err(Error::new(ErrorKind::EmptyQuery, "no clause was added to the query")),
            1 => Ok(self.clauses.remove(0)),
            _ => Ok(Query::Bool(BoolQuery {
                must: self.clauses,
                ..BoolQuery::new()
            })),
        }
    }

    /// Engine-neutral clause of one filter. Fails with Validation when
    /// the column cannot be filtered or the value does not fit its type.
    pub fn filter_query(&self, filter: &FilterAttribute) -> Result<Query> {
        let value_type = self.filter_type(&filter.column)?;
        let field = filter.column.as_str();

        let query = match (&filter.kind, value_type) {
            (FilterKind::Equal(value), ValueType::Text) => {
                if value.contains([MULTI_WILDCARD, SINGLE_WILDCARD]) {
                    Query::wildcard(field, value)
                } else {
                    Query::text_term(field, value)
                }
            }
            (FilterKind::Equal(value), ValueType::Integer) => {
                Query::term(field, FieldValue::Integer(parse_number(field, value)?))
            }
            (FilterKind::Equal(value), ValueType::Float) => {
                Query::term(field, FieldValue::Float(parse_number(field, value)?))
            }
            (FilterKind::IntRange(bounds), ValueType::Integer) => {
                range(field, bounds, |v| FieldValue::Integer(i64::from(v)))
            }
            (FilterKind::LongRange(bounds), ValueType::Integer) => {
                range(field, bounds, FieldValue::Integer)
            }
            (FilterKind::FloatRange(bounds), ValueType::Float) => {
                range(field, bounds, |v| FieldValue::Float(f64::from(v)))
            }
            (FilterKind::DoubleRange(bounds), ValueType::Float) => {
                range(field, bounds, FieldValue::Float)
            }
            (FilterKind::TextRange(bounds), ValueType::Text) => {
                range(field, bounds, FieldValue::Text)
            }
            (kind, value_type) => {
                return Err(Error::validation(format!(
                    "filter {:?} does not apply to {:?} column '{}'", kind, value_type, field
                )));
            }
        };
        Ok(query)
    }

    fn filter_type(&self, name: &str) -> Result<ValueType> {
        if name == PRIMARY_KEY {
            return Ok(ValueType::Text);
        }
        let column = self.relation.column(name).ok_or_else(|| {
            Error::validation(format!(
                "filter column '{}' is not part of relation '{}'", name, self.relation.name
            ))
        })?;
        if !column.is_filterable() {
            return Err(Error::validation(format!(
                "column '{}' is not indexed as an untokenized value", name
            )));
        }
        Ok(column.value_type)
    }
}

fn range<T: Clone>(field: &str, bounds: &Bounds<T>, convert: impl Fn(T) -> FieldValue) -> Query {
    Query::range(field, bounds.lower_bound(&convert), bounds.upper_bound(&convert))
}

fn parse_number<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse::<T>().map_err(|err| {
        Error::with_source(
            ErrorKind::Validation,
            format!("'{}' is not a number for column '{}'", value, field),
            err,
        )
    })
}

/// Reduce user text to bare words the parser reads literally
pub fn plain_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if QUERY_SYNTAX.contains(&c) { ' ' } else { c })
        .collect();

    replaced
        .split_whitespace()
        .map(|word| {
            if QUERY_OPERATORS.contains(&word) {
                word.to_lowercase()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
