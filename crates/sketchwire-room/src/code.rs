//! Room code generation.

use rand::Rng;
use sketchwire_protocol::RoomCode;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random 6-character uppercase alphanumeric code.
///
/// Uniqueness is not checked here; the registry enforces it on insert.
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..RoomCode::LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
