pub mod channel;
pub mod dispatcher;
pub mod messages;

pub use channel::{spawn, WorkerHandle};
pub use messages::{Command, Response};
