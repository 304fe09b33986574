pub mod attr_group_service;
pub mod attribute_service;
pub mod dataset_service;
pub mod scenario_service;

pub use attr_group_service::*;
pub use attribute_service::*;
pub use dataset_service::*;
pub use scenario_service::*;
