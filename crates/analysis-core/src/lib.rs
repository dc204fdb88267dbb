pub mod error;
pub mod statement;
pub mod traits;
pub mod types;

pub use error::*;
pub use statement::{Cell, Statement};
pub use traits::*;
pub use types::*;
