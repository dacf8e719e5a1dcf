pub mod types;
pub mod cast;
pub mod validator;

pub use types::*;
pub use cast::*;
pub use validator::*;
