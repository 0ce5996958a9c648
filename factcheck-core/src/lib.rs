pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod shaper;
pub mod store;
pub mod validate;

pub use config::FactcheckConfig;
pub use error::{FactError, FieldErrors};
pub use models::{Fact, FactPatch, Feedback, NewFact};
pub use shaper::{shape_fact, ShapedFact};
pub use store::{FactStore, MemoryFactStore, PgFactStore};
