pub mod initdb;
pub mod process_recurring;
pub mod serve;

pub use initdb::init_database;
pub use process_recurring::process_recurring;
pub use serve::{serve, ServeOptions};
