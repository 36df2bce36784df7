mod bus;
mod callback;
mod stream;
mod system;

pub use bus::{
    Bus, BusConfig, BusMode, BusSink, ChannelFormat, CommFormat, PinConfig, DEFAULT_PINS,
};
pub use callback::Callback;
pub use stream::{Stream, Text};
pub use system::System;

/// Sample encodings an engine may ask a sink to open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Linear16,
    Linear8,
    Mulaw,
}

/// What a sink negotiated when it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
    /// name of the sink that opened this device, for logging only
    pub owner: &'static str,
}

/// Open/closed state shared by every sink.
///
/// A sink is open exactly when it holds a `DeviceInfo`.
#[derive(Debug, Clone, Default)]
pub struct SinkState {
    info: Option<DeviceInfo>,
}

impl SinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the negotiated parameters. Opening twice replaces them.
    pub fn open(
        &mut self,
        owner: &'static str,
        sample_rate: u32,
        channels: u16,
        format: AudioFormat,
    ) -> &DeviceInfo {
        tracing::debug!("{}::open: {}, {}, {:?}", owner, sample_rate, channels, format);
        self.info.insert(DeviceInfo {
            sample_rate,
            channels,
            format,
            owner,
        })
    }

    pub fn close(&mut self) {
        self.info = None;
    }

    pub fn is_open(&self) -> bool {
        self.info.is_some()
    }

    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }
}

pub trait AudioSink {
    /// Short name used in log lines and `DeviceInfo::owner`.
    fn name(&self) -> &'static str;

    fn state(&self) -> &SinkState;
    fn state_mut(&mut self) -> &mut SinkState;

    /// Write interleaved samples, laid out per the channel count negotiated
    /// at open. The slice is only valid for the duration of the call.
    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()>;

    fn open(&mut self, sample_rate: u32, channels: u16, format: AudioFormat) -> &DeviceInfo {
        let name = self.name();
        self.state_mut().open(name, sample_rate, channels, format)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.state_mut().close();
        Ok(())
    }

    /// Block until written audio has been played.
    fn drain(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Throw away audio that was written but not yet played.
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state().is_open()
    }

    fn info(&self) -> Option<&DeviceInfo> {
        self.state().info()
    }

    fn channels(&self) -> u16 {
        self.info().map(|i| i.channels).unwrap_or(0)
    }

    fn sample_rate(&self) -> u32 {
        self.info().map(|i| i.sample_rate).unwrap_or(0)
    }

    fn bits_per_sample(&self) -> u16 {
        match self.info().map(|i| i.format) {
            None => 0,
            Some(AudioFormat::Linear16) => 16,
            Some(AudioFormat::Linear8) => 8,
            Some(other) => {
                tracing::warn!("{}: unsupported audio format {:?}", self.name(), other);
                0
            }
        }
    }
}

impl AudioSink for Box<dyn AudioSink> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn state(&self) -> &SinkState {
        (**self).state()
    }

    fn state_mut(&mut self) -> &mut SinkState {
        (**self).state_mut()
    }

    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
        (**self).write(samples)
    }

    fn open(&mut self, sample_rate: u32, channels: u16, format: AudioFormat) -> &DeviceInfo {
        (**self).open(sample_rate, channels, format)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        (**self).close()
    }

    fn drain(&mut self) -> anyhow::Result<()> {
        (**self).drain()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        (**self).flush()
    }
}
