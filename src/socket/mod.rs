pub mod socket;

pub use socket::{classify, ChannelGate, ChannelState, SocketEvent, SocketManager};
