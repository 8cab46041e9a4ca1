pub mod buffer;
pub mod connection;
pub mod reactor;

pub use buffer::Buffer;
pub use connection::{Connection, ConnectionId};
pub use reactor::{Reactor, ReactorEvent};
