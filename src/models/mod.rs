pub mod auth;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod identity;
pub mod messages;
pub mod task;

pub use auth::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use identity::*;
pub use messages::*;
pub use task::*;
