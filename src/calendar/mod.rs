pub mod event;
pub mod free_time;
pub mod persist;
pub mod reminder;
pub mod store;

pub use event::{Event, Kind, Owner};
pub use free_time::{free_time, FreeInterval};
pub use persist::JsonFile;
pub use reminder::Reminder;
pub use store::Store;
