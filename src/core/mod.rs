// Core module containing the text pipeline: decoding, timestamping, search
pub mod constants;
pub mod decode;
pub mod formatter;
pub mod search;
pub mod timestamp;

// Re-export commonly used types
pub use constants::*;
pub use decode::ChunkDecoder;
pub use formatter::FormatterState;
pub use search::{find_next, Direction, FindOptions};
pub use timestamp::{available_zones, matching_zones, render_timestamp, Clock, FixedClock, SystemClock, Zone, ZoneError};
