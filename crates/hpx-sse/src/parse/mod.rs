//! Event-stream parsing.
//!
//! A self-contained Server-Sent Events parser following the
//! [HTML Living Standard](https://html.spec.whatwg.org/multipage/server-sent-events.html).
//! Only the `event` and `data` fields are interpreted; every other field is
//! accepted and ignored.
//!
//! | Layer | Type |
//! |-------|------|
//! | line classification | [`classify`], [`Line`] |
//! | one pending event | [`EventBuilder`] |
//! | bytes → events | [`EventDecoder`] |
//! | byte stream → event stream | [`EventStream`] |

pub mod builder;
pub(crate) mod constants;
pub mod decoder;
pub mod event_stream;
pub mod line;

pub use builder::EventBuilder;
pub use decoder::EventDecoder;
pub use event_stream::EventStream;
pub use line::{Line, classify};
