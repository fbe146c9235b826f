mod coordinator;
mod observer;

pub use coordinator::*;
pub use observer::*;
