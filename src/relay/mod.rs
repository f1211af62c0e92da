//! 매칭 및 이벤트 릴레이
//!
//! 상태는 `RelayEngine` 하나가 소유한다. 멀티스레드 런타임에서는 반드시
//! 하나의 뮤텍스 뒤에 두고 이벤트를 한 번에 하나씩 처리해야 한다.

pub mod engine;
pub mod registry;
pub mod rooms;

pub use engine::{Outbound, RelayEngine};
pub use registry::ConnectionId;
