//! The real-time collaboration core for the community board.
//!
//! One room task owns all shared state (who is connected, who is editing or
//! typing what); every mutation enters through its command queue and is
//! applied to completion before the next, so presence and indicator
//! semantics are linearizable without locks. Nothing here is persisted.

pub mod broadcaster;
pub mod indicators;
pub mod presence;
pub mod registry;
pub mod relay;
#[allow(clippy::module_inception)]
pub mod room;

pub use indicators::IndicatorSet;
pub use registry::ConnId;
pub use relay::MutationRelay;
pub use room::{spawn, RoomHandle, RoomStats};
