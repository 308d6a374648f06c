//! Ordered packet streams over capture directories.

mod capture;
mod cursor;
mod natural;

pub use capture::{PacketStream, StreamOrder, read_packet};
pub use cursor::{Lookahead, PacketCursor};
pub use natural::natural_cmp;
