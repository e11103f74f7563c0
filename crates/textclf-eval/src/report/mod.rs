pub mod markdown;
pub mod plots;
pub mod report;

pub use markdown::{save_result, slugify, Figure, SavedResult};
pub use plots::{plot_confusion_matrix, ConfusionGrid};
pub use report::{Report, ReportSection};
