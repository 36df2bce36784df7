use super::SinkState;

/// Writes raw little-endian 16-bit PCM to any byte destination.
pub struct Stream<F> {
    state: SinkState,
    inner: F,
    bytes: Vec<u8>,
}

impl<F> Stream<F>
where
    F: std::io::Write,
{
    pub fn new(inner: F) -> Self {
        Stream {
            state: SinkState::new(),
            inner,
            bytes: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F> super::AudioSink for Stream<F>
where
    F: std::io::Write,
{
    fn name(&self) -> &'static str {
        "Stream"
    }

    fn state(&self) -> &SinkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SinkState {
        &mut self.state
    }

    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
        tracing::debug!("Stream::write: {}", samples.len());
        // the scratch buffer only ever grows to the largest chunk seen
        self.bytes.clear();
        self.bytes.reserve(samples.len() * 2);
        for s in samples {
            self.bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.inner.write_all(&self.bytes)?;
        Ok(())
    }
}

/// Writes each sample as a decimal line. Handy for eyeballing output on a
/// serial console or in a test.
pub struct Text<F> {
    state: SinkState,
    inner: F,
}

impl Text<std::io::Stdout> {
    pub fn stdout() -> Self {
        Text::new(std::io::stdout())
    }
}

impl<F> Text<F>
where
    F: std::io::Write,
{
    pub fn new(inner: F) -> Self {
        Text {
            state: SinkState::new(),
            inner,
        }
    }

    pub fn get_ref(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F> super::AudioSink for Text<F>
where
    F: std::io::Write,
{
    fn name(&self) -> &'static str {
        "Text"
    }

    fn state(&self) -> &SinkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SinkState {
        &mut self.state
    }

    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
        tracing::debug!("Text::write: {}", samples.len());
        for s in samples {
            writeln!(self.inner, "{}", s)?;
        }
        Ok(())
    }
}
