//! 핸들러 모듈

pub mod connection;
pub mod room;
pub mod scores;

pub use connection::*;
pub use room::*;
pub use scores::*;
