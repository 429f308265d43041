pub mod clip;
pub mod message;
pub mod stored;
pub mod stream;

pub use clip::{Clip, ClipFilter, ClipUpdate};
pub use message::Message;
pub use stored::Stored;
pub use stream::{DurationInput, Stream};
