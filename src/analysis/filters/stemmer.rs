use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::{Token, TokenType};

#[derive(Clone, Copy)]
pub struct StemmerFilter {
    pub algorithm: Algorithm,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter { algorithm }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        let stemmer = Stemmer::create(self.algorithm);

        for token in tokens.iter_mut().filter(|t| t.token_type == TokenType::Word) {
            let stemmed = stemmer.stem(&token.text).into_owned();
            if stemmed != token.text {
                token.text = stemmed;
            }
        }
        tokens
    }

    fn name(&self) -> &str {
        "stemmer"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(*self)
    }
}
