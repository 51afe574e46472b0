pub mod disease_indicator;
pub mod enums;
pub mod filters;
pub mod patient;

pub use disease_indicator::*;
pub use filters::*;
pub use patient::*;
