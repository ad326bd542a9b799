use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use parking_lot::RwLock;
use rust_stemmers::Algorithm;
use tantivy::tokenizer::{Token as EngineToken, TokenStream, Tokenizer as EngineTokenizer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::ngram::NGramFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, Result};

/// Text analysis pipeline
///
/// Handed to the index engine as the tokenizer of every tokenizable
/// column of a relation, and used again by the query parser so query
/// text and indexed text are reduced to the same terms.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Create standard analyzer for English
    pub fn standard_english() -> Self {
        Analyzer::new("standard".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(StopWordFilter::english()))
            .add_filter(Box::new(StemmerFilter::new(Algorithm::English)))
    }

    /// Unicode words, lowercased, nothing removed
    pub fn simple() -> Self {
        Analyzer::new("simple".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
    }

    /// Bi- and tri-grams, for scripts without reliable word breaks
    pub fn ngram() -> Self {
        Analyzer::new("ngram".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(NGramFilter::new(2, 3)))
    }
}

impl Clone for Analyzer {
    fn clone(&self) -> Self {
        Analyzer {
            tokenizer: self.tokenizer.clone_box(),
            filters: self.filters.iter().map(|filter| filter.clone_box()).collect(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|filter| filter.name()).collect();
        f.debug_struct("Analyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field("filters", &filters)
            .finish()
    }
}

/// Token stream over an already analyzed text
pub struct AnalyzedTokenStream {
    tokens: Vec<EngineToken>,
    advanced: usize,
}

impl TokenStream for AnalyzedTokenStream {
    fn advance(&mut self) -> bool {
        if self.advanced < self.tokens.len() {
            self.advanced += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &EngineToken {
        &self.tokens[self.advanced.saturating_sub(1)]
    }

    fn token_mut(&mut self) -> &mut EngineToken {
        let current = self.advanced.saturating_sub(1);
        &mut self.tokens[current]
    }
}

impl EngineTokenizer for Analyzer {
    type TokenStream<'a> = AnalyzedTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let tokens = self
            .analyze(text)
            .into_iter()
            .map(|token| EngineToken {
                offset_from: token.offset,
                offset_to: token.offset + token.length,
                position: token.position as usize,
                text: token.text,
                position_length: 1,
            })
            .collect();

        AnalyzedTokenStream { tokens, advanced: 0 }
    }
}

/// Registry for managing analyzers
pub struct AnalyzerRegistry {
    analyzers: Arc<RwLock<HashMap<String, Arc<Analyzer>>>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        let registry = AnalyzerRegistry {
            analyzers: Arc::new(RwLock::new(HashMap::new())),
        };

        // Register default analyzers
        registry.register_defaults();
        registry
    }

    fn register_defaults(&self) {
        self.register("standard", Analyzer::standard_english());
        self.register("simple", Analyzer::simple());
        self.register("ngram", Analyzer::ngram());
    }

    pub fn register(&self, name: &str, analyzer: Analyzer) {
        self.analyzers.write().insert(name.to_string(), Arc::new(analyzer));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Analyzer>> {
        self.analyzers.read().get(name).cloned()
    }

    /// Analyzer a relation refers to by name
    pub fn resolve(&self, name: &str) -> Result<Arc<Analyzer>> {
        self.get(name)
            .ok_or_else(|| Error::configuration(format!("analyzer '{}' is not registered", name)))
    }

    pub fn analyze(&self, analyzer_name: &str, text: &str) -> Result<Vec<Token>> {
        Ok(self.resolve(analyzer_name)?.analyze(text))
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn terms(analyzer: &Analyzer, text: &str) -> Vec<String> {
        analyzer.analyze(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn standard_removes_stop_words_and_stems() {
        let analyzer = Analyzer::standard_english();
        assert_eq!(terms(&analyzer, "The Running of the Dogs"), ["run", "dog"]);
    }

    #[test]
    fn simple_keeps_every_word() {
        assert_eq!(terms(&Analyzer::simple(), "The Dogs"), ["the", "dogs"]);
    }

    #[test]
    fn engine_stream_yields_analyzed_tokens() {
        let mut analyzer = Analyzer::standard_english();
        let mut stream = analyzer.token_stream("Hello worlds");

        let mut seen = Vec::new();
        while stream.advance() {
            let token = stream.token();
            seen.push((token.text.clone(), token.position, token.offset_from, token.offset_to));
        }

        assert_eq!(seen, [("hello".to_string(), 0, 0, 5), ("world".to_string(), 1, 6, 12)]);
    }

    #[test]
    fn clone_keeps_pipeline() {
        let analyzer = Analyzer::standard_english().clone();
        assert_eq!(analyzer.filters.len(), 3);
        assert_eq!(analyzer.name, "standard");
    }

    #[test]
    fn debug_lists_the_pipeline() {
        let shown = format!("{:?}", Analyzer::simple());
        assert!(shown.contains("\"simple\""));
        assert!(shown.contains("lowercase"));
    }

    #[test]
    fn registry_resolves_defaults() {
        let registry = AnalyzerRegistry::new();
        assert!(registry.get("ngram").is_some());
        assert_eq!(registry.analyze("simple", "A b").unwrap(), Analyzer::simple().analyze("A b"));
        assert_eq!(registry.resolve("korean").unwrap_err().kind(), ErrorKind::Configuration);
    }
}
