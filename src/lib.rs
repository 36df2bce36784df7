mod chunk;
mod config;
mod dispatch;
mod output;
pub mod sink;
mod speaker;
pub mod synth;

pub use chunk::{AudioChunk, StreamStatus, Waveform};
pub use config::BusProfile;
pub use dispatch::{dispatch, Dispatcher};
pub use output::Output;
pub use sink::{AudioFormat, AudioSink, DeviceInfo};
pub use speaker::Speaker;
pub use synth::{Synthesizer, Tone};
