pub mod channel;
pub mod event;
pub mod item;
pub mod offset;

pub use channel::{check_channel, is_valid_channel, ChannelMeta};
pub use event::AnalyticsEvent;
pub use item::{newest_first, Item, MediaKind, MediaRef};
pub use offset::{Direction, Offset};
