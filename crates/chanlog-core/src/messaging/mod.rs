//! Messenger abstractions (Telegram today, MTProto user clients later).

pub mod autodelete;
pub mod port;
pub mod throttled;
pub mod types;
