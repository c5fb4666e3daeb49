//! Command vocabulary for the datagram and request-line channels

mod datagram;
mod request;

pub use datagram::{DatagramCommand, MAX_DATAGRAM_LEN};
pub use request::{is_traversal_free, RequestRoute, MAX_REQUEST_LINE_LEN};
