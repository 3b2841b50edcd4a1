pub mod errors;
pub mod model;
pub mod outcome;
pub mod params;

pub use errors::*;
pub use model::*;
pub use outcome::*;
pub use params::*;
