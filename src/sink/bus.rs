use super::{AudioFormat, AudioSink, DeviceInfo, SinkState};

/// Low-level driver for a fixed-channel serial audio bus (I2S and friends).
///
/// Everything here is expected to be called from the streaming path, so
/// `write` should only block for as long as the bus needs to make room.
pub trait Bus {
    fn install(&mut self, port: u8, config: &BusConfig) -> anyhow::Result<()>;
    fn uninstall(&mut self, port: u8) -> anyhow::Result<()>;

    /// Route the bus to external pins, or to the internal DAC when `None`.
    fn set_pins(&mut self, port: u8, pins: Option<&PinConfig>) -> anyhow::Result<()>;

    /// Write interleaved frames, returning the number of bytes accepted.
    fn write(&mut self, port: u8, samples: &[i16]) -> anyhow::Result<usize>;

    /// Silence whatever is still queued for playback.
    fn zero_buffer(&mut self, port: u8) -> anyhow::Result<()>;
}

impl Bus for Box<dyn Bus> {
    fn install(&mut self, port: u8, config: &BusConfig) -> anyhow::Result<()> {
        (**self).install(port, config)
    }

    fn uninstall(&mut self, port: u8) -> anyhow::Result<()> {
        (**self).uninstall(port)
    }

    fn set_pins(&mut self, port: u8, pins: Option<&PinConfig>) -> anyhow::Result<()> {
        (**self).set_pins(port, pins)
    }

    fn write(&mut self, port: u8, samples: &[i16]) -> anyhow::Result<usize> {
        (**self).write(port, samples)
    }

    fn zero_buffer(&mut self, port: u8) -> anyhow::Result<()> {
        (**self).zero_buffer(port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusMode {
    pub master: bool,
    pub transmit: bool,
    pub receive: bool,
    pub dac_built_in: bool,
}

impl Default for BusMode {
    fn default() -> Self {
        BusMode {
            master: true,
            transmit: true,
            receive: false,
            dac_built_in: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFormat {
    RightLeft,
    AllRight,
    AllLeft,
    OnlyRight,
    OnlyLeft,
}

impl ChannelFormat {
    /// Number of slots each frame occupies on the wire.
    pub fn channels(self) -> u16 {
        match self {
            ChannelFormat::RightLeft | ChannelFormat::AllRight | ChannelFormat::AllLeft => 2,
            ChannelFormat::OnlyRight | ChannelFormat::OnlyLeft => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommFormat {
    I2s,
    I2sMsb,
    I2sLsb,
    Pcm,
    PcmShort,
    PcmLong,
}

/// Bus profile. Everything except the sample rate is fixed when the sink
/// is built; the rate is taken from the first chunk of each stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub mode: BusMode,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channel_format: ChannelFormat,
    pub comm_format: Vec<CommFormat>,
    pub intr_alloc_flags: u32,
    pub dma_buf_count: usize,
    pub dma_buf_len: usize,
    pub use_apll: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            mode: BusMode::default(),
            sample_rate: 0,
            bits_per_sample: 16,
            channel_format: ChannelFormat::RightLeft,
            comm_format: vec![CommFormat::I2s, CommFormat::I2sMsb],
            intr_alloc_flags: 0,
            dma_buf_count: 8,
            dma_buf_len: 64,
            use_apll: false,
        }
    }
}

impl BusConfig {
    /// Total number of frames the bus can hold before `write` blocks.
    pub fn buffer_frames(&self) -> usize {
        self.dma_buf_count * self.dma_buf_len
    }
}

/// Physical pin assignment. `None` leaves a pin unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub bck: Option<u8>,
    pub ws: Option<u8>,
    pub data_out: Option<u8>,
    pub data_in: Option<u8>,
}

pub const DEFAULT_PINS: PinConfig = PinConfig {
    bck: Some(26),
    ws: Some(25),
    data_out: Some(22),
    data_in: None,
};

impl Default for PinConfig {
    fn default() -> Self {
        DEFAULT_PINS
    }
}

/// Sink that drives a stereo-only bus directly.
///
/// Mono streams are upmixed by writing every sample to both slots of a
/// frame, one bus write per frame. Speech rates are low enough that the
/// extra calls cost nothing audible.
pub struct BusSink<B> {
    state: SinkState,
    bus: B,
    port: u8,
    config: BusConfig,
    pins: PinConfig,
}

impl<B> BusSink<B>
where
    B: Bus,
{
    pub fn new(bus: B, port: u8) -> Self {
        Self::with_config(bus, port, BusConfig::default(), DEFAULT_PINS)
    }

    pub fn with_config(bus: B, port: u8, config: BusConfig, pins: PinConfig) -> Self {
        BusSink {
            state: SinkState::new(),
            bus,
            port,
            config,
            pins,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn pins(&self) -> &PinConfig {
        &self.pins
    }

    pub fn into_bus(self) -> B {
        self.bus
    }
}

impl<B> AudioSink for BusSink<B>
where
    B: Bus,
{
    fn name(&self) -> &'static str {
        "BusSink"
    }

    fn state(&self) -> &SinkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SinkState {
        &mut self.state
    }

    fn open(&mut self, sample_rate: u32, channels: u16, format: AudioFormat) -> &DeviceInfo {
        tracing::debug!("setting sample rate for bus {}: {}", self.port, sample_rate);
        self.config.sample_rate = sample_rate;
        if let Err(e) = self.bus.install(self.port, &self.config) {
            tracing::error!("failed to install bus {}: {}", self.port, e);
        }

        let pins = if self.config.mode.dac_built_in {
            tracing::debug!("set_pins: internal DAC");
            None
        } else {
            tracing::debug!("set_pins: external DAC");
            Some(&self.pins)
        };
        if let Err(e) = self.bus.set_pins(self.port, pins) {
            tracing::error!("failed to set pins on bus {}: {}", self.port, e);
        }

        self.state.open("BusSink", sample_rate, channels, format)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if !self.state.is_open() {
            return Ok(());
        }
        if let Err(e) = self.bus.uninstall(self.port) {
            tracing::error!("failed to uninstall bus {}: {}", self.port, e);
        }
        self.state.close();
        Ok(())
    }

    fn drain(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.bus.zero_buffer(self.port) {
            tracing::error!("failed to zero buffer on bus {}: {}", self.port, e);
        }
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
        tracing::debug!("BusSink::write: {}", samples.len());
        if self.channels() == 2 {
            if let Err(e) = self.bus.write(self.port, samples) {
                tracing::error!("write failed on bus {}: {}", self.port, e);
            }
        } else {
            let mut total = 0;
            for &s in samples {
                match self.bus.write(self.port, &[s, s]) {
                    Ok(n) => total += n,
                    Err(e) => tracing::error!("write failed on bus {}: {}", self.port, e),
                }
            }
            tracing::debug!("bus write - bytes written: {}", total);
        }
        Ok(())
    }
}
