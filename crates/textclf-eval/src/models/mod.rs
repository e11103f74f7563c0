pub mod baseline;
pub mod classifier_trait;
pub mod factory;
pub mod gbdt;
pub mod knn;
pub mod logistic;
pub mod naive_bayes;
pub mod svm;
pub mod trees;
pub mod utils;

pub use classifier_trait::Classifier;
