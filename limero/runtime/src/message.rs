//! Message type identification.
//!
//! Every message type carries a 32-bit id derived at compile time from its
//! declared name with FNV-1a. Actors built independently can address each
//! other's messages by name alone. Ids are not collision free, so dispatch
//! always confirms the concrete Rust type before a handler sees the message.

use std::any::Any;
use std::fmt;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the bytes of `name`.
pub const fn fnv1a_32(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Stable identifier of a message type within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MsgId(u32);

impl MsgId {
    pub const fn of(name: &str) -> Self {
        MsgId(fnv1a_32(name))
    }

    pub const fn from_raw(raw: u32) -> Self {
        MsgId(raw)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A typed payload that can travel in an [`Envelope`](crate::Envelope).
///
/// Usually implemented with [`message!`](crate::message). A closed protocol
/// between two actors is best expressed as one enum implementing `Message`.
pub trait Message: Any + Send + Sync {
    /// Declared name, also the last segment of the message's default topic.
    const NAME: &'static str;

    const ID: MsgId = MsgId::of(Self::NAME);
}

/// Implement [`Message`] for one or more types, named after the type.
///
/// ```rust
/// use limero_runtime::{message, Message, MsgId};
///
/// pub struct Blink { pub interval_ms: u32 }
/// pub enum LedCmd { On, Off }
/// message!(Blink, LedCmd);
///
/// pub struct Reboot;
/// message!(Reboot => "sys.Reboot");
///
/// assert_eq!(Blink::NAME, "Blink");
/// assert_eq!(Reboot::ID, MsgId::of("sys.Reboot"));
/// ```
#[macro_export]
macro_rules! message {
    ($ty:ty => $name:expr) => {
        impl $crate::Message for $ty {
            const NAME: &'static str = $name;
        }
    };
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::Message for $ty {
                const NAME: &'static str = stringify!($ty);
            }
        )+
    };
}
