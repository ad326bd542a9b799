use std::ops::Bound;
use tantivy::query::{
    BooleanQuery, BoostQuery, Occur as EngineOccur, Query as EngineQuery, QueryParser,
    RangeQuery as EngineRangeQuery, RegexQuery, TermQuery as EngineTermQuery,
};
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, Term};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldValue;
use crate::index::engine::FieldMap;
use crate::query::ast::{BoolQuery, ParsedQuery, Query, RangeQuery};
use crate::schema::key::{MULTI_WILDCARD, SINGLE_WILDCARD};
use crate::schema::schema::{Relation, ValueType};

const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// Translates the engine-neutral query tree into engine queries
pub struct QueryPlanner<'a> {
    index: &'a Index,
    fields: &'a FieldMap,
    relation: &'a Relation,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(index: &'a Index, fields: &'a FieldMap, relation: &'a Relation) -> Self {
        QueryPlanner { index, fields, relation }
    }

    pub fn plan(&self, query: &Query) -> Result<Box<dyn EngineQuery>> {
        match query {
            Query::Term(term) => {
                let engine_term = self.term(&term.field, &term.value)?;
                let planned = Box::new(EngineTermQuery::new(engine_term, IndexRecordOption::Basic));
                Ok(self.boosted(&term.field, planned))
            }
            Query::Prefix(prefix) => {
                let pattern = format!("{}.*", escape_regex(&prefix.prefix));
                self.regex(&prefix.field, &pattern)
            }
            Query::Wildcard(wildcard) => self.regex(&wildcard.field, &glob_to_regex(&wildcard.pattern)),
            Query::Range(range) => self.range(range),
            Query::Bool(group) => self.boolean(group),
            Query::Parsed(parsed) => self.parsed(parsed),
        }
    }

    fn term(&self, name: &str, value: &FieldValue) -> Result<Term> {
        let field = self.fields.indexed_field(name)?;
        match (self.fields.value_type(name), value) {
            (ValueType::Text, FieldValue::Text(text)) => Ok(Term::from_field_text(field, text)),
            (ValueType::Integer, FieldValue::Integer(v)) => Ok(Term::from_field_i64(field, *v)),
            (ValueType::Float, FieldValue::Float(v)) => Ok(Term::from_field_f64(field, *v)),
            (ValueType::Float, FieldValue::Integer(v)) => Ok(Term::from_field_f64(field, *v as f64)),
            (value_type, value) => Err(Error::validation(format!(
                "'{}' cannot match {:?} column '{}'", value, value_type, name
            ))),
        }
    }

    fn regex(&self, name: &str, pattern: &str) -> Result<Box<dyn EngineQuery>> {
        let field = self.fields.indexed_field(name)?;
        if self.fields.value_type(name) != ValueType::Text {
            return Err(Error::validation(format!(
                "pattern match needs a text column, '{}' is numeric", name
            )));
        }
        let planned = Box::new(RegexQuery::from_pattern(pattern, field)?);
        Ok(self.boosted(name, planned))
    }

    fn range(&self, range: &RangeQuery) -> Result<Box<dyn EngineQuery>> {
        self.fields.indexed_field(&range.field)?;
        let name = range.field.clone();

        let planned: Box<dyn EngineQuery> = match self.fields.value_type(&range.field) {
            ValueType::Integer => Box::new(EngineRangeQuery::new_i64_bounds(
                name,
                convert_bound(&range.lower, as_i64)?,
                convert_bound(&range.upper, as_i64)?,
            )),
            ValueType::Float => Box::new(EngineRangeQuery::new_f64_bounds(
                name,
                convert_bound(&range.lower, as_f64)?,
                convert_bound(&range.upper, as_f64)?,
            )),
            ValueType::Text => {
                let lower = convert_bound(&range.lower, as_text)?;
                let upper = convert_bound(&range.upper, as_text)?;
                Box::new(EngineRangeQuery::new_str_bounds(
                    name,
                    lower.as_ref().map(String::as_str),
                    upper.as_ref().map(String::as_str),
                ))
            }
        };
        Ok(self.boosted(&range.field, planned))
    }

    fn boolean(&self, group: &BoolQuery) -> Result<Box<dyn EngineQuery>> {
        let mut clauses = Vec::with_capacity(group.len());
        for query in &group.must {
            clauses.push((EngineOccur::Must, self.plan(query)?));
        }
        for query in &group.should {
            clauses.push((EngineOccur::Should, self.plan(query)?));
        }
        for query in &group.must_not {
            clauses.push((EngineOccur::MustNot, self.plan(query)?));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn parsed(&self, parsed: &ParsedQuery) -> Result<Box<dyn EngineQuery>> {
        let mut targets = Vec::with_capacity(parsed.fields.len());
        for name in &parsed.fields {
            targets.push(self.fields.indexed_field(name)?);
        }

        let mut parser = QueryParser::for_index(self.index, targets.clone());
        for (name, field) in parsed.fields.iter().zip(&targets) {
            if let Some(column) = self.relation.column(name) {
                parser.set_field_boost(*field, column.boost);
            }
        }

        parser.parse_query(&parsed.text).map_err(|err| {
            Error::with_source(
                ErrorKind::Validation,
                format!("cannot parse query text '{}'", parsed.text),
                err,
            )
        })
    }

    fn boosted(&self, name: &str, query: Box<dyn EngineQuery>) -> Box<dyn EngineQuery> {
        match self.relation.column(name) {
            Some(column) if (column.boost - 1.0).abs() > f32::EPSILON => {
                Box::new(BoostQuery::new(query, column.boost))
            }
            _ => query,
        }
    }
}

fn convert_bound<T>(bound: &Bound<FieldValue>, convert: fn(&FieldValue) -> Option<T>) -> Result<Bound<T>> {
    let converted = |value: &FieldValue| {
        convert(value).ok_or_else(|| Error::validation(format!("range bound '{}' has the wrong type", value)))
    };
    Ok(match bound {
        Bound::Included(value) => Bound::Included(converted(value)?),
        Bound::Excluded(value) => Bound::Excluded(converted(value)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

fn as_i64(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Integer(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Float(v) => Some(*v),
        FieldValue::Integer(v) => Some(*v as f64),
        FieldValue::Text(_) => None,
    }
}

fn as_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) => Some(text.clone()),
        _ => None,
    }
}

pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if REGEX_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Anchored regex equivalent of a key pattern: `*` any run, `?` one char
pub fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    for c in pattern.chars() {
        match c {
            MULTI_WILDCARD => regex.push_str(".*"),
            SINGLE_WILDCARD => regex.push('.'),
            other => {
                if REGEX_META.contains(&other) {
                    regex.push('\\');
                }
                regex.push(other);
            }
        }
    }
    regex
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn full_match(pattern: &str, text: &str) -> bool {
        Regex::new(&format!("^(?:{})$", pattern)).unwrap().is_match(text)
    }

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(escape_regex("a.b(c)"), r"a\.b\(c\)");
        assert_eq!(escape_regex("site:notice:"), "site:notice:");
    }

    #[test]
    fn glob_translation() {
        assert_eq!(glob_to_regex("a:*:c"), "a:.*:c");
        assert_eq!(glob_to_regex("a:b?"), "a:b.");
        assert_eq!(glob_to_regex("v1.0:*"), r"v1\.0:.*");
    }

    #[test]
    fn glob_matches_like_key_patterns() {
        let pattern = glob_to_regex("site:*:4?");
        assert!(full_match(&pattern, "site:notice:42"));
        assert!(full_match(&pattern, "site:a:b:40"));
        assert!(!full_match(&pattern, "site:notice:4"));
        assert!(!full_match(&pattern, "other:notice:42"));

        let literal = glob_to_regex("a.b:*");
        assert!(!full_match(&literal, "axb:1"));
    }

    #[test]
    fn wrong_bound_type_is_rejected() {
        let bound = Bound::Included(FieldValue::Text("x".into()));
        assert_eq!(convert_bound(&bound, as_i64).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(convert_bound(&Bound::Included(FieldValue::Integer(2)), as_f64).unwrap(), Bound::Included(2.0));
    }
}
