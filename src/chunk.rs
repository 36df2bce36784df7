/// A synthesized waveform, owned by the engine while it streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl Waveform {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Waveform {
            sample_rate,
            channels,
            samples: vec![],
        }
    }

    /// Borrow `size` samples starting at `start` as a chunk.
    ///
    /// The range is clamped to the buffer, so an engine that overstates
    /// `size` on its last chunk still hands out a valid view.
    pub fn chunk(&self, start: usize, size: usize, is_last: bool) -> AudioChunk<'_> {
        let start = start.min(self.samples.len());
        let end = start.saturating_add(size).min(self.samples.len());
        AudioChunk {
            samples: &self.samples[start..end],
            start,
            is_last,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// One streaming callback's worth of audio.
///
/// This is only a view: it lives for the duration of one dispatch, and
/// the engine reuses the buffer behind it as soon as the call returns.
#[derive(Debug, Clone, Copy)]
pub struct AudioChunk<'a> {
    samples: &'a [i16],
    start: usize,
    is_last: bool,
    sample_rate: u32,
    channels: u16,
}

impl<'a> AudioChunk<'a> {
    pub fn new(samples: &'a [i16], sample_rate: u32, channels: u16, is_last: bool) -> Self {
        AudioChunk {
            samples,
            start: 0,
            is_last,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &'a [i16] {
        self.samples
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// What the streaming callback reports back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Continue,
    Abort,
}

#[cfg(test)]
mod test {
    use super::Waveform;

    #[test]
    fn chunk_view() {
        let mut wave = Waveform::new(8000, 1);
        wave.samples = vec![1, 2, 3, 4, 5, 6];
        let chunk = wave.chunk(2, 3, false);
        assert_eq!(chunk.samples(), &[3, 4, 5]);
        assert_eq!(chunk.start(), 2);
        assert_eq!(chunk.size(), 3);
        assert_eq!(chunk.sample_rate(), 8000);
        assert_eq!(chunk.channels(), 1);
        assert!(!chunk.is_last());
    }

    #[test]
    fn chunk_clamps_to_buffer() {
        let mut wave = Waveform::new(8000, 1);
        wave.samples = vec![1, 2, 3];
        assert_eq!(wave.chunk(1, 10, true).samples(), &[2, 3]);
        assert_eq!(wave.chunk(5, 2, true).size(), 0);
    }
}
