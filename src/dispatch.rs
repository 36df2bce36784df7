use crate::chunk::{AudioChunk, StreamStatus, Waveform};
use crate::sink::{AudioFormat, AudioSink};

/// Route one chunk to `sink`, opening it first if this is the first chunk
/// it has seen.
///
/// The first chunk's rate and channel count hold for the whole stream. Sink
/// errors are logged here and never reach the engine, so this always asks
/// the engine to continue.
pub fn dispatch(sink: Option<&mut dyn AudioSink>, chunk: AudioChunk) -> StreamStatus {
    tracing::debug!("stream chunk - start: {}, size: {}", chunk.start(), chunk.size());

    let sink = match sink {
        Some(s) => s,
        // no output configured
        None => return StreamStatus::Continue,
    };

    if !sink.is_open() {
        sink.open(chunk.sample_rate(), chunk.channels(), AudioFormat::Linear16);
    }

    if let Err(e) = sink.write(chunk.samples()) {
        tracing::error!("{}: failed to write chunk: {}", sink.name(), e);
    }

    if chunk.is_last() {
        tracing::debug!("stream chunk - done");
    }

    StreamStatus::Continue
}

/// Holds the one sink that currently receives synthesized audio.
///
/// Swap the sink only between synthesis calls; nothing here guards
/// against replacing it mid-stream.
#[derive(Default)]
pub struct Dispatcher {
    sink: Option<Box<dyn AudioSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink<S>(sink: S) -> Self
    where
        S: AudioSink + 'static,
    {
        let mut d = Self::new();
        d.set_sink(sink);
        d
    }

    /// Install `sink`, closing and dropping whatever was there before.
    pub fn set_sink<S>(&mut self, sink: S)
    where
        S: AudioSink + 'static,
    {
        self.replace(Some(Box::new(sink)));
    }

    /// Remove the current sink without closing it.
    pub fn take_sink(&mut self) -> Option<Box<dyn AudioSink>> {
        self.sink.take()
    }

    /// Remove and close the current sink.
    pub fn clear(&mut self) {
        self.replace(None);
    }

    pub fn sink(&self) -> Option<&dyn AudioSink> {
        self.sink.as_deref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut (dyn AudioSink + 'static)> {
        self.sink.as_deref_mut()
    }

    pub fn stream_chunk(&mut self, chunk: AudioChunk) -> StreamStatus {
        match self.sink {
            Some(ref mut sink) => {
                let sink: &mut dyn AudioSink = &mut **sink;
                dispatch(Some(sink), chunk)
            }
            None => dispatch(None, chunk),
        }
    }

    /// Entry point shaped like the engine's streaming callback.
    pub fn on_chunk(
        &mut self,
        wave: &Waveform,
        start: usize,
        size: usize,
        last: bool,
    ) -> StreamStatus {
        self.stream_chunk(wave.chunk(start, size, last))
    }

    fn replace(&mut self, sink: Option<Box<dyn AudioSink>>) {
        if let Some(mut old) = std::mem::replace(&mut self.sink, sink) {
            if let Err(e) = old.close() {
                tracing::error!("{}: failed to close replaced sink: {}", old.name(), e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{dispatch, Dispatcher};
    use crate::chunk::{AudioChunk, StreamStatus, Waveform};
    use crate::sink::{AudioFormat, AudioSink, Callback, DeviceInfo, SinkState, Stream};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        opens: Vec<(u32, u16, AudioFormat)>,
        writes: Vec<Vec<i16>>,
        closes: usize,
        drains: usize,
    }

    struct Counting {
        state: SinkState,
        counts: Rc<RefCell<Counts>>,
    }

    impl Counting {
        fn new() -> (Self, Rc<RefCell<Counts>>) {
            let counts = Rc::new(RefCell::new(Counts::default()));
            let sink = Counting {
                state: SinkState::new(),
                counts: counts.clone(),
            };
            (sink, counts)
        }
    }

    impl AudioSink for Counting {
        fn name(&self) -> &'static str {
            "Counting"
        }

        fn state(&self) -> &SinkState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut SinkState {
            &mut self.state
        }

        fn open(&mut self, sample_rate: u32, channels: u16, format: AudioFormat) -> &DeviceInfo {
            self.counts
                .borrow_mut()
                .opens
                .push((sample_rate, channels, format));
            self.state.open("Counting", sample_rate, channels, format)
        }

        fn close(&mut self) -> anyhow::Result<()> {
            self.counts.borrow_mut().closes += 1;
            self.state.close();
            Ok(())
        }

        fn drain(&mut self) -> anyhow::Result<()> {
            self.counts.borrow_mut().drains += 1;
            Ok(())
        }

        fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
            self.counts.borrow_mut().writes.push(samples.to_vec());
            Ok(())
        }
    }

    #[test]
    fn opens_exactly_once() {
        let (sink, counts) = Counting::new();
        let mut d = Dispatcher::with_sink(sink);
        assert!(!d.sink().unwrap().is_open());

        let status = d.stream_chunk(AudioChunk::new(&[1, 2], 16000, 1, false));
        assert_eq!(status, StreamStatus::Continue);
        assert!(d.sink().unwrap().is_open());

        // later chunks never renegotiate, even if they disagree
        d.stream_chunk(AudioChunk::new(&[3], 8000, 2, true));

        let counts = counts.borrow();
        assert_eq!(counts.opens, vec![(16000, 1, AudioFormat::Linear16)]);
        assert_eq!(counts.writes, vec![vec![1, 2], vec![3]]);
        assert_eq!(d.sink().unwrap().sample_rate(), 16000);
    }

    #[test]
    fn last_chunk_does_not_close() {
        let (sink, counts) = Counting::new();
        let mut d = Dispatcher::with_sink(sink);
        d.stream_chunk(AudioChunk::new(&[1], 16000, 1, true));
        assert!(d.sink().unwrap().is_open());
        assert_eq!(counts.borrow().closes, 0);
        assert_eq!(counts.borrow().drains, 0);
    }

    #[test]
    fn no_sink_is_a_noop() {
        let mut d = Dispatcher::new();
        assert!(d.sink().is_none());
        let status = d.stream_chunk(AudioChunk::new(&[1, 2, 3], 16000, 1, false));
        assert_eq!(status, StreamStatus::Continue);
        assert_eq!(
            dispatch(None, AudioChunk::new(&[1], 8000, 1, true)),
            StreamStatus::Continue
        );
    }

    #[test]
    fn forwards_waveform_slice() {
        let (sink, counts) = Counting::new();
        let mut d = Dispatcher::with_sink(sink);
        let mut wave = Waveform::new(22050, 1);
        wave.samples = vec![0, 1, 2, 3, 4, 5, 6];
        d.on_chunk(&wave, 2, 3, false);
        d.on_chunk(&wave, 5, 2, true);
        assert_eq!(counts.borrow().writes, vec![vec![2, 3, 4], vec![5, 6]]);
        assert_eq!(counts.borrow().opens, vec![(22050, 1, AudioFormat::Linear16)]);
    }

    #[test]
    fn replacing_closes_previous() {
        let (first, first_counts) = Counting::new();
        let (second, second_counts) = Counting::new();
        let mut d = Dispatcher::with_sink(first);
        d.stream_chunk(AudioChunk::new(&[1], 16000, 1, false));

        d.set_sink(second);
        assert_eq!(first_counts.borrow().closes, 1);
        assert!(!d.sink().unwrap().is_open());

        d.stream_chunk(AudioChunk::new(&[2], 8000, 1, false));
        assert_eq!(first_counts.borrow().writes.len(), 1);
        assert_eq!(second_counts.borrow().writes, vec![vec![2]]);

        d.clear();
        assert!(d.sink().is_none());
        assert_eq!(second_counts.borrow().closes, 1);
    }

    #[test]
    fn take_sink_leaves_it_open() {
        let mut d = Dispatcher::with_sink(Stream::new(Vec::new()));
        d.stream_chunk(AudioChunk::new(&[1, 2], 16000, 1, false));
        let sink = d.take_sink().unwrap();
        assert!(sink.is_open());
        assert!(d.sink().is_none());
    }

    #[test]
    fn write_errors_are_swallowed() {
        struct Failing(SinkState);

        impl AudioSink for Failing {
            fn name(&self) -> &'static str {
                "Failing"
            }

            fn state(&self) -> &SinkState {
                &self.0
            }

            fn state_mut(&mut self) -> &mut SinkState {
                &mut self.0
            }

            fn write(&mut self, _: &[i16]) -> anyhow::Result<()> {
                anyhow::bail!("no room")
            }
        }

        let mut d = Dispatcher::with_sink(Failing(SinkState::new()));
        let status = d.stream_chunk(AudioChunk::new(&[1], 16000, 1, false));
        assert_eq!(status, StreamStatus::Continue);
        assert!(d.sink().unwrap().is_open());
    }

    #[test]
    fn callback_scenario() {
        let seen = Rc::new(RefCell::new(vec![]));
        let record = seen.clone();
        let mut d = Dispatcher::with_sink(Callback::new(move |s: &[i16]| {
            record.borrow_mut().push(s.to_vec())
        }));

        let samples = [10, -10, 20, -20];
        d.stream_chunk(AudioChunk::new(&samples, 16000, 1, false));

        assert_eq!(*seen.borrow(), vec![vec![10, -10, 20, -20]]);
        let sink = d.sink().unwrap();
        assert!(sink.is_open());
        assert_eq!(sink.sample_rate(), 16000);
        assert_eq!(sink.channels(), 1);
    }
}
