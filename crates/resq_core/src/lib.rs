pub mod api;
pub mod cluster;
pub mod error;
pub mod ids;
pub mod mappings;
pub mod results;
pub mod scenario;
pub mod views;

pub use api::*;
pub use cluster::*;
pub use error::{ReferenceKind, ResqError, ResqResult};
pub use ids::*;
pub use mappings::*;
pub use results::*;
pub use scenario::*;
pub use views::*;
