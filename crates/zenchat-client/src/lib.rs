//! ZenChat client state.
//!
//! Everything a client needs to turn the relay's outbound stream into
//! renderable state, independent of any UI or transport:
//!
//! - [`RoomView`]: roster, timeline and typing indicators for one room
//! - [`ReactionBook`]: reaction aggregate rebuilt from `reaction` broadcasts
//! - [`generate_room_id`]: identifiers for new rooms

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod reactions;
pub mod room_id;
pub mod room_view;

pub use reactions::{EmojiReactions, ReactionBook};
pub use room_id::{ROOM_ID_LEN, generate_room_id, is_generated_room_id};
pub use room_view::{RoomView, TimelineEntry, chat_message_id};
