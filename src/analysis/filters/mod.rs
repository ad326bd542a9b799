pub mod lowercase;
pub mod ngram;
pub mod stemmer;
pub mod stopword;
