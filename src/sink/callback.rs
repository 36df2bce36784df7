use super::SinkState;

/// Hands every chunk straight to a user function.
///
/// No buffering or channel handling happens here: the function sees the
/// interleaved samples exactly as the engine produced them.
pub struct Callback<F> {
    state: SinkState,
    callback: F,
}

impl<F> Callback<F>
where
    F: FnMut(&[i16]),
{
    pub fn new(callback: F) -> Self {
        Callback {
            state: SinkState::new(),
            callback,
        }
    }
}

impl<F> super::AudioSink for Callback<F>
where
    F: FnMut(&[i16]),
{
    fn name(&self) -> &'static str {
        "Callback"
    }

    fn state(&self) -> &SinkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SinkState {
        &mut self.state
    }

    fn write(&mut self, samples: &[i16]) -> anyhow::Result<()> {
        tracing::debug!("Callback::write: {}", samples.len());
        (self.callback)(samples);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Callback;
    use crate::sink::{AudioFormat, AudioSink};

    #[test]
    fn forwards_unchanged() {
        let mut seen = vec![];
        {
            let mut sink = Callback::new(|s: &[i16]| seen.push(s.to_vec()));
            sink.open(16000, 2, AudioFormat::Linear16);
            sink.write(&[1, -1, 2, -2]).unwrap();
            sink.write(&[]).unwrap();
        }
        assert_eq!(seen, vec![vec![1, -1, 2, -2], vec![]]);
    }
}
