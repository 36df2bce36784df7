use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{OutputCallbackInfo, Sample, SampleFormat, SampleRate, Stream};
use rb::{RbConsumer, RbProducer, RB};

use super::{Bus, BusConfig, PinConfig};

/// A bus that plays on the host's default output device.
///
/// The ring between `write` and the device callback is sized from the
/// profile's DMA depth, so writes block the same way a real bus would.
#[derive(Default)]
pub struct System {
    installed: Option<Installed>,
}

struct Installed {
    port: u8,
    stream: Stream,
    buffer: rb::SpscRb<i16>,
    tx: rb::Producer<i16>,
}

struct AudioThread {
    rx: rb::Consumer<i16>,
    buffer: Vec<i16>,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    fn get(&self, port: u8) -> anyhow::Result<&Installed> {
        match self.installed {
            Some(ref inst) if inst.port == port => Ok(inst),
            Some(ref inst) => anyhow::bail!("bus {} is not installed ({} is)", port, inst.port),
            None => anyhow::bail!("bus {} is not installed", port),
        }
    }
}

impl AudioThread {
    pub fn callback<T>(&mut self, data: &mut [T], _: &OutputCallbackInfo)
    where
        T: Sample,
    {
        if self.buffer.len() < data.len() {
            self.buffer.resize(data.len(), 0);
        }
        // an empty ring means the speaker is between chunks, so play silence
        let cnt = self.rx.read(&mut self.buffer[..data.len()]).unwrap_or(0);
        for (i, sample) in self.buffer[..cnt].iter().enumerate() {
            data[i] = Sample::from(sample);
        }
        for d in data[cnt..].iter_mut() {
            *d = Sample::from(&0i16);
        }
    }
}

impl Bus for System {
    fn install(&mut self, port: u8, config: &BusConfig) -> anyhow::Result<()> {
        if let Some(ref inst) = self.installed {
            anyhow::bail!("bus {} already installed", inst.port);
        }

        let channels = config.channel_format.channels();
        let rate = SampleRate(config.sample_rate);
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("could not find default output device"))?;
        let supported = device
            .supported_output_configs()?
            .find(|c| {
                c.channels() == channels && c.min_sample_rate() <= rate && rate <= c.max_sample_rate()
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no output configuration for {} channels at {} Hz",
                    channels,
                    config.sample_rate
                )
            })?
            .with_sample_rate(rate);
        let err_fn = |err: cpal::StreamError| tracing::error!("audio stream error: {}", err);
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        let buffer = rb::SpscRb::new(config.buffer_frames().max(1) * channels as usize);
        let tx = buffer.producer();
        let rx = buffer.consumer();
        let mut thread = AudioThread { rx, buffer: vec![] };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |d, cb| thread.callback::<f32>(d, cb),
                err_fn,
            ),
            SampleFormat::I16 => device.build_output_stream(
                &stream_config,
                move |d, cb| thread.callback::<i16>(d, cb),
                err_fn,
            ),
            SampleFormat::U16 => device.build_output_stream(
                &stream_config,
                move |d, cb| thread.callback::<u16>(d, cb),
                err_fn,
            ),
        }?;
        stream.play()?;
        tracing::info!(
            "bus {} installed on host output: {} channels at {} Hz",
            port,
            channels,
            config.sample_rate
        );

        self.installed = Some(Installed {
            port,
            stream,
            buffer,
            tx,
        });
        Ok(())
    }

    fn uninstall(&mut self, port: u8) -> anyhow::Result<()> {
        self.get(port)?;
        if let Some(inst) = self.installed.take() {
            inst.stream.pause()?;
        }
        Ok(())
    }

    fn set_pins(&mut self, port: u8, pins: Option<&PinConfig>) -> anyhow::Result<()> {
        self.get(port)?;
        // the host decides its own routing
        tracing::debug!("bus {}: ignoring pin routing {:?}", port, pins);
        Ok(())
    }

    fn write(&mut self, port: u8, mut samples: &[i16]) -> anyhow::Result<usize> {
        let inst = self.get(port)?;
        let total = samples.len() * 2;
        while !samples.is_empty() {
            if let Some(cnt) = inst.tx.write_blocking(samples) {
                samples = &samples[cnt..];
            } else {
                break;
            }
        }
        Ok(total)
    }

    fn zero_buffer(&mut self, port: u8) -> anyhow::Result<()> {
        self.get(port)?.buffer.clear();
        Ok(())
    }
}
