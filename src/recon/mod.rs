pub mod aggregate;
pub mod mismatch;
pub mod normalize;
pub mod types;
pub mod value;

pub use aggregate::*;
pub use mismatch::*;
pub use normalize::*;
pub use types::*;
pub use value::*;
