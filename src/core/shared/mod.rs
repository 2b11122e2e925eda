pub mod error;
pub mod models;
pub mod schema;
pub mod state;
pub mod store;
pub mod utils;

pub use error::{DeskError, FatalError};
pub use schema::*;
pub use store::Transactional;
pub use utils::{create_conn, DbPool};
