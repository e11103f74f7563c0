//! Feature extraction: text vectorizers and optional derived-feature steps.
pub mod augment;
pub mod vectorizer;

pub use augment::{FeatureAugmenter, KeywordExtractor};
pub use vectorizer::{CountVectorizer, TextVectorizer, TfidfVectorizer};
