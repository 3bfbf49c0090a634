//! Wire protocol between relaychat clients and the server.
//!
//! Every logical unit on a connection is one [`Message`]. Frames are a 4-byte
//! big-endian length prefix followed by a JSON [`Envelope`], so chat text may
//! contain any character, newlines included.
//!
//! | kind       | direction     | body              |
//! |------------|---------------|-------------------|
//! | USER       | client→server | new username      |
//! | ENTRY      | client→server | chat text         |
//! | DISCONNECT | client→server | absent            |
//! | BROADCAST  | server→client | formatted text    |

mod codec;
mod envelope;
mod error;
mod message;

pub use codec::{MAX_FRAME_LENGTH, MessageCodec, fits_in_frame};
pub use envelope::Envelope;
pub use error::ProtocolError;
pub use message::{Message, MessageKind};
