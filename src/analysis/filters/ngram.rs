use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Splits every token into character n-grams of `min_gram..=max_gram`
#[derive(Clone)]
pub struct NGramFilter {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl NGramFilter {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        NGramFilter {
            min_gram: min_gram.max(1),
            max_gram: max_gram.max(min_gram.max(1)),
        }
    }
}

impl TokenFilter for NGramFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();

        for token in tokens {
            // Byte offset of every char boundary, end included
            let bounds: Vec<usize> = token
                .text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(token.text.len()))
                .collect();
            let chars = bounds.len() - 1;

            // Shorter than the smallest gram: keep the token whole
            if chars < self.min_gram {
                result.push(token);
                continue;
            }

            // Lowercasing can change the byte length ('İ'); grams then span the whole token
            let aligned = token.text.len() == token.length;

            for n in self.min_gram..=self.max_gram.min(chars) {
                for i in 0..=chars - n {
                    let (start, end) = (bounds[i], bounds[i + n]);
                    let mut gram = Token::new(
                        token.text[start..end].to_string(),
                        token.position,
                        token.offset,
                    );
                    if aligned {
                        gram.offset += start;
                        gram.length = end - start;
                    } else {
                        gram.length = token.length;
                    }
                    gram.token_type = token.token_type;
                    result.push(gram);
                }
            }
        }

        result
    }

    fn name(&self) -> &str {
        "ngram"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grams_respect_char_boundaries() {
        let tokens = vec![Token::new("한글자".to_string(), 0, 0)];
        let grams = NGramFilter::new(2, 3).filter(tokens);

        let texts: Vec<&str> = grams.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["한글", "글자", "한글자"]);
    }

    #[test]
    fn grams_point_into_the_source_text() {
        let grams = NGramFilter::new(2, 2).filter(vec![Token::new("abc".to_string(), 0, 5)]);
        let spans: Vec<(usize, usize)> = grams.iter().map(|t| (t.offset, t.length)).collect();
        assert_eq!(spans, [(5, 2), (6, 2)]);
    }

    #[test]
    fn grams_of_resized_tokens_keep_the_token_span() {
        // "İst" lowercases to a longer byte string
        let mut token = Token::new("İst".to_lowercase(), 0, 10);
        token.length = "İst".len();

        let grams = NGramFilter::new(2, 2).filter(vec![token]);
        assert!(!grams.is_empty());
        assert!(grams.iter().all(|t| t.offset == 10 && t.length == 4));
    }

    #[test]
    fn short_tokens_survive() {
        let grams = NGramFilter::new(2, 3).filter(vec![Token::new("a".to_string(), 4, 0)]);
        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0].position, 4);
    }
}
