//! Built-in secret words.

/// Used when a room's word pool is empty, so a round never fails to start.
pub const FALLBACK_WORD: &str = "pencil";

const DEFAULT_WORDS: &[&str] = &[
    "apple", "banana", "bicycle", "bridge", "butterfly", "cactus", "camera",
    "candle", "castle", "cloud", "dragon", "elephant", "guitar", "hamburger",
    "helicopter", "house", "island", "kangaroo", "kite", "ladder", "lighthouse",
    "moon", "mountain", "octopus", "penguin", "piano", "pizza", "rainbow",
    "robot", "rocket", "sandwich", "snowman", "spider", "sun", "telescope",
    "tree", "umbrella", "volcano", "whale", "windmill",
];

/// Returns the default word pool as owned strings.
pub fn default_word_pool() -> Vec<String> {
    DEFAULT_WORDS.iter().map(|w| (*w).to_string()).collect()
}
