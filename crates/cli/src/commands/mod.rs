pub mod connectors;
pub mod serve;
pub mod validate;

pub use connectors::handle_connectors;
pub use serve::{handle_serve, ServeArgs};
pub use validate::{handle_validate, ValidateArgs};
