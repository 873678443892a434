pub mod engine;
pub mod publisher;
pub mod sequence;
pub mod translator;

pub use crate::domain::model::{OptimizedPlan, PublishReport, TranslationOutcome, VehiclePlan};
pub use crate::domain::ports::{ContextualPipeline, DeliveryService, RouteOptimizer, Storage, TokenProvider};
pub use crate::utils::error::Result;
