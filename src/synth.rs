use crate::chunk::{StreamStatus, Waveform};

/// The engine's streaming callback: `(waveform, start, size, is_last)`.
pub type StreamCallback<'a> = dyn FnMut(&Waveform, usize, usize, bool) -> StreamStatus + 'a;

/// A speech engine that streams what it renders.
///
/// Implementations call `stream` once per chunk, in order, and set
/// `is_last` on the final one. The waveform may be reused after each call.
pub trait Synthesizer {
    fn synthesize(&mut self, text: &str, stream: &mut StreamCallback<'_>) -> anyhow::Result<()>;
}

impl Synthesizer for Box<dyn Synthesizer> {
    fn synthesize(&mut self, text: &str, stream: &mut StreamCallback<'_>) -> anyhow::Result<()> {
        (**self).synthesize(text, stream)
    }
}

/// A stand-in engine that beeps: one short sine tone per character, and a
/// gap of silence for whitespace.
///
/// Output is streamed in chunks of `chunk_frames` frames, so it exercises a
/// sink the same way a real engine would.
#[derive(Debug, Clone)]
pub struct Tone {
    samplerate: u32,
    channels: u16,
    chunk_frames: usize,
    symbol_secs: f32,
    amplitude: f32,
}

impl Tone {
    pub fn new(samplerate: u32, channels: u16) -> Self {
        Tone {
            samplerate,
            channels,
            chunk_frames: 256,
            symbol_secs: 0.08,
            amplitude: 0.3,
        }
    }

    pub fn chunk_frames(mut self, frames: usize) -> Self {
        self.chunk_frames = frames.max(1);
        self
    }

    pub fn symbol_secs(mut self, secs: f32) -> Self {
        self.symbol_secs = secs;
        self
    }

    pub fn samplerate(&self) -> u32 {
        self.samplerate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn symbol_frames(&self) -> usize {
        (self.samplerate as f32 * self.symbol_secs) as usize
    }

    // characters map onto a pentatonic-ish ladder above 300 Hz
    fn frequency(c: char) -> Option<f32> {
        if c.is_whitespace() {
            None
        } else {
            Some(300.0 + 40.0 * (c as u32 % 24) as f32)
        }
    }

    fn render(&self, text: &str, wave: &mut Waveform) {
        let channels = self.channels as usize;
        let frames = self.symbol_frames();
        wave.samples.clear();
        wave.samples.reserve(text.chars().count() * frames * channels);
        for c in text.chars() {
            let omega = Self::frequency(c).map(|f| 2.0 * std::f32::consts::PI * f);
            for frame in 0..frames {
                let v = match omega {
                    Some(omega) => {
                        let t = frame as f32 / self.samplerate as f32;
                        // short linear fade at both ends avoids clicks
                        let edge = (frame.min(frames - frame) as f32 / 64.0).min(1.0);
                        (omega * t).sin() * self.amplitude * edge
                    }
                    None => 0.0,
                };
                let s = (v * i16::MAX as f32) as i16;
                for _ in 0..channels {
                    wave.samples.push(s);
                }
            }
        }
    }
}

impl Synthesizer for Tone {
    fn synthesize(&mut self, text: &str, stream: &mut StreamCallback<'_>) -> anyhow::Result<()> {
        let mut wave = Waveform::new(self.samplerate, self.channels);
        self.render(text, &mut wave);

        let step = self.chunk_frames * self.channels as usize;
        let total = wave.samples.len();
        let mut start = 0;
        while start < total {
            let size = step.min(total - start);
            let last = start + size >= total;
            if stream(&wave, start, size, last) == StreamStatus::Abort {
                tracing::debug!("tone: stream aborted at sample {}", start);
                break;
            }
            start += size;
        }
        Ok(())
    }
}
