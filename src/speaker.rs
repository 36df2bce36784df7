use crate::dispatch::Dispatcher;
use crate::sink::{AudioSink, Bus, BusSink, Callback, Stream, Text};
use crate::synth::Synthesizer;

/// A synthesizer wired to one output.
///
/// Every constructor installs a sink in the dispatcher; `say` streams the
/// rendered text into it. The sink stays open between utterances. Call
/// `end` (or drain/close through `output_mut`) when done.
pub struct Speaker<S> {
    synth: S,
    dispatcher: Dispatcher,
}

impl<S> Speaker<S>
where
    S: Synthesizer,
{
    /// Print samples as text on stdout.
    pub fn new(synth: S) -> Self {
        Self::with_output(synth, Text::stdout())
    }

    pub fn with_output<O>(synth: S, output: O) -> Self
    where
        O: AudioSink + 'static,
    {
        Speaker {
            synth,
            dispatcher: Dispatcher::with_sink(output),
        }
    }

    pub fn with_callback<F>(synth: S, callback: F) -> Self
    where
        F: FnMut(&[i16]) + 'static,
    {
        Self::with_output(synth, Callback::new(callback))
    }

    /// Write to a byte stream, either as raw PCM or as decimal text lines.
    pub fn with_stream<W>(synth: S, out: W, as_text: bool) -> Self
    where
        W: std::io::Write + 'static,
    {
        if as_text {
            Self::with_output(synth, Text::new(out))
        } else {
            Self::with_output(synth, Stream::new(out))
        }
    }

    pub fn with_bus<B>(synth: S, bus: B, port: u8) -> Self
    where
        B: Bus + 'static,
    {
        Self::with_output(synth, BusSink::new(bus, port))
    }

    pub fn say(&mut self, text: &str) -> anyhow::Result<()> {
        let dispatcher = &mut self.dispatcher;
        self.synth
            .synthesize(text, &mut |wave, start, size, last| {
                dispatcher.on_chunk(wave, start, size, last)
            })
    }

    pub fn output(&self) -> Option<&dyn AudioSink> {
        self.dispatcher.sink()
    }

    pub fn output_mut(&mut self) -> Option<&mut (dyn AudioSink + 'static)> {
        self.dispatcher.sink_mut()
    }

    /// Replace the output; the previous one is closed.
    pub fn set_output<O>(&mut self, output: O)
    where
        O: AudioSink + 'static,
    {
        self.dispatcher.set_sink(output);
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    /// Drain and close the output, then hand back the synthesizer.
    pub fn end(mut self) -> anyhow::Result<S> {
        if let Some(out) = self.dispatcher.sink_mut() {
            out.drain()?;
        }
        self.dispatcher.clear();
        Ok(self.synth)
    }
}
