pub mod changes;
pub mod database;
pub mod debates;
pub mod documents;
pub mod error;
pub mod media;
pub mod participants;
pub mod row_helpers;
pub mod schema;
pub mod summaries;
pub mod turns;
pub mod verdicts;
pub mod votes;

pub use changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
pub use database::Database;
pub use error::StoreError;
