//! Shared-memory IPC substrate connecting this process (the producer) to a
//! separate consumer process over memfd-backed regions handed over via
//! `SCM_RIGHTS`: a framebuffer with hardware cursor, a PCM audio ring, and a
//! reverse-direction input event ring.

#[macro_use]
extern crate lazy_static;
#[macro_use]
pub mod util;
mod ring;
mod system;

pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod refresh;
pub mod rendezvous;
pub mod video;

pub use config::{AudioChannelConfig, FbChannelConfig};
pub use driver::JukeDriver;
pub use error::Error;
pub use input::{InputEvent, InputEventKind, InputSink};
pub use refresh::{FixedRefreshProbe, NoRefreshProbe, RefreshProbe};
pub use util::{LogLevel, Logger};
pub use video::cursor::{CursorShape, CursorSource};
pub use video::header::Surface;
pub use video::{FbChannel, GfxSource};
pub use audio::AudioChannel;
