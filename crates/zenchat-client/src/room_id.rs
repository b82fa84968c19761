//! Room ID generation.
//!
//! Rooms are created implicitly by joining them, so "creating a room" on the
//! client just means picking an identifier nobody is likely to be using.

use zenchat_core::Environment;

/// Length of generated room IDs.
pub const ROOM_ID_LEN: usize = 5;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fresh room ID: [`ROOM_ID_LEN`] characters from `A-Z0-9`.
pub fn generate_room_id<E: Environment>(env: &E) -> String {
    (0..ROOM_ID_LEN).map(|_| char::from(ALPHABET[env.random_index(ALPHABET.len())])).collect()
}

/// Whether `id` has the shape of a generated room ID.
///
/// Any non-blank string is a valid room to join; this only recognizes IDs
/// produced by [`generate_room_id`].
pub fn is_generated_room_id(id: &str) -> bool {
    id.len() == ROOM_ID_LEN && id.bytes().all(|b| ALPHABET.contains(&b))
}
