use std::ops::Bound;
use serde::{Serialize, Deserialize};
use crate::core::types::FieldValue;
use crate::query::types::Occur;

/// Engine-neutral query tree produced by the composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),         // Exact term match
    Prefix(PrefixQuery),     // Raw terms starting with a prefix
    Wildcard(WildcardQuery), // Pattern matching with * and ?
    Range(RangeQuery),       // Numeric or lexicographic range
    Bool(BoolQuery),         // Boolean combinations
    Parsed(ParsedQuery),     // Free text run through the analyzer-aware parser
}

/// Single term query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardQuery {
    pub field: String,
    pub pattern: String, // '*' any run, '?' exactly one char
}

/// Range query; value types of both bounds match the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub lower: Bound<FieldValue>,
    pub upper: Bound<FieldValue>,
}

/// Boolean query with must/should/must_not clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,      // All must match (AND)
    pub should: Vec<Query>,    // At least one must match when `must` is empty
    pub must_not: Vec<Query>,  // None must match (NOT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub fields: Vec<String>,
    pub text: String,
}

impl Query {
    pub fn term(field: &str, value: FieldValue) -> Self {
        Query::Term(TermQuery { field: field.to_string(), value })
    }

    pub fn text_term(field: &str, text: &str) -> Self {
        Query::term(field, FieldValue::Text(text.to_string()))
    }

    pub fn prefix(field: &str, prefix: &str) -> Self {
        Query::Prefix(PrefixQuery { field: field.to_string(), prefix: prefix.to_string() })
    }

    pub fn wildcard(field: &str, pattern: &str) -> Self {
        Query::Wildcard(WildcardQuery { field: field.to_string(), pattern: pattern.to_string() })
    }

    pub fn range(field: &str, lower: Bound<FieldValue>, upper: Bound<FieldValue>) -> Self {
        Query::Range(RangeQuery { field: field.to_string(), lower, upper })
    }

    pub fn parsed(fields: Vec<String>, text: &str) -> Self {
        Query::Parsed(ParsedQuery { fields, text: text.to_string() })
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        BoolQuery {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn with_must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn with_should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn with_must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn add(&mut self, occur: Occur, query: Query) {
        match occur {
            Occur::Must => self.must.push(query),
            Occur::Should => self.should.push(query),
            Occur::MustNot => self.must_not.push(query),
        }
    }

    pub fn len(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
