//! Input prediction: which files each project reads

pub mod catalog;
pub mod collector;
pub mod predictor;
pub mod registry;

pub use collector::{PredictionCollector, PredictionIndex};
pub use predictor::{GraphPredictor, Predictions, ProjectPredictor};
pub use registry::PredictorRegistry;
