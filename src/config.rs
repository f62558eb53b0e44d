//! Configuration surface (spec §3.6, §6.6). This crate never parses argv or
//! env itself — the embedding VMM's own config/CLI layer populates these
//! builder-style structs and hands them to [`crate::driver::JukeDriver`].

pub use crate::audio::AudioChannelConfig;
pub use crate::video::FbChannelConfig;
