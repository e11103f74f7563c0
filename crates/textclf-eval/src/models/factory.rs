use crate::config::ModelType;
use crate::evaluation::ClassifierSpec;
use crate::models::baseline::MajorityClass;
use crate::models::classifier_trait::Classifier;
use crate::models::gbdt::{GradientBoosting, GradientBoostingParams};
use crate::models::knn::{KNearestNeighbors, KnnParams};
use crate::models::logistic::{LogisticParams, LogisticRegression};
use crate::models::naive_bayes::{MultinomialNaiveBayes, NaiveBayesParams};
use crate::models::svm::{LinearSvc, LinearSvcParams};
use crate::models::trees::{DecisionTreeClassifier, ForestParams, RandomForest, TreeParams};
use crate::models::utils::ClassWeight;

/// Build an unfitted classifier from its typed configuration.
pub fn build_model(model_type: &ModelType, random_state: u64) -> Box<dyn Classifier> {
    match model_type {
        ModelType::LogisticRegression(params) => Box::new(LogisticRegression::new(params.clone())),
        ModelType::NaiveBayes(params) => Box::new(MultinomialNaiveBayes::new(params.clone())),
        ModelType::LinearSvc(params) => Box::new(LinearSvc::new(params.clone())),
        ModelType::DecisionTree(params) => Box::new(DecisionTreeClassifier::new(params.clone())),
        ModelType::RandomForest(params) => Box::new(RandomForest::new(params.clone(), random_state)),
        ModelType::Knn(params) => Box::new(KNearestNeighbors::new(params.clone())),
        ModelType::GradientBoosting(params) => Box::new(GradientBoosting::new(params.clone())),
        ModelType::Majority => Box::new(MajorityClass::new()),
    }
}

/// The default classifier grid, in display order. The linear models and the
/// forest use balanced class weights.
pub fn default_classifiers(random_state: u64) -> Vec<ClassifierSpec> {
    let balanced = Some(ClassWeight::Balanced);
    let grid = [
        (
            "Logistic Regression",
            ModelType::LogisticRegression(LogisticParams {
                class_weight: balanced,
                ..LogisticParams::default()
            }),
        ),
        ("Naive Bayes", ModelType::NaiveBayes(NaiveBayesParams::default())),
        (
            "Linear SVM",
            ModelType::LinearSvc(LinearSvcParams {
                class_weight: balanced,
                ..LinearSvcParams::default()
            }),
        ),
        (
            "Random Forest",
            ModelType::RandomForest(ForestParams {
                class_weight: balanced,
                ..ForestParams::default()
            }),
        ),
        ("Decision Tree", ModelType::DecisionTree(TreeParams::default())),
        ("KNN", ModelType::Knn(KnnParams::default())),
        ("Gradient Boosting", ModelType::GradientBoosting(GradientBoostingParams::default())),
    ];
    grid.iter()
        .map(|(name, model_type)| ClassifierSpec::new(*name, build_model(model_type, random_state)))
        .collect()
}
