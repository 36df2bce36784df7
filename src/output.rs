use std::path::PathBuf;

use crate::config::BusProfile;
use crate::sink::{AudioSink, BusSink, Stream, System, Text};

/// An output chosen on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// decimal lines, on stdout or into a file
    Text(Option<PathBuf>),
    /// raw little-endian PCM on stdout
    Raw,
    /// raw little-endian PCM into a file
    File(PathBuf),
    /// the host's audio device, driven as a bus
    Bus,
}

impl std::str::FromStr for Output {
    type Err = anyhow::Error;

    fn from_str(spec: &str) -> anyhow::Result<Self> {
        if let Some(pos) = spec.find(':') {
            let (p1, p2) = spec.split_at(pos);
            Self::from_type_arg(p1, Some(&p2[1..]))
        } else {
            Self::from_type_arg(spec, None).or_else(|_| Self::from_type_arg("file", Some(spec)))
        }
    }
}

impl Output {
    fn from_type_arg(typ: &str, arg: Option<&str>) -> anyhow::Result<Self> {
        Ok(match (typ, arg) {
            ("text", None) => Output::Text(None),
            ("text", Some(fname)) => Output::Text(Some(fname.into())),
            ("raw", None) => Output::Raw,
            ("file", Some(fname)) if !fname.is_empty() => Output::File(fname.into()),
            ("file", _) => anyhow::bail!("file output expects value"),
            ("bus", None) | ("play", None) => Output::Bus,
            _ => anyhow::bail!("bad output value"),
        })
    }

    /// Build the sink for this output. `profile` only matters for `Bus`.
    pub fn to_sink(&self, profile: Option<BusProfile>) -> anyhow::Result<Box<dyn AudioSink>> {
        Ok(match *self {
            Output::Text(None) => Box::new(Text::stdout()),
            Output::Text(Some(ref fname)) => {
                let file = std::fs::File::create(fname)?;
                Box::new(Text::new(std::io::BufWriter::new(file)))
            }
            Output::Raw => Box::new(Stream::new(std::io::stdout())),
            Output::File(ref fname) => {
                let file = std::fs::File::create(fname)?;
                Box::new(Stream::new(std::io::BufWriter::new(file)))
            }
            Output::Bus => {
                let profile = profile.unwrap_or_default();
                Box::new(BusSink::with_config(
                    System::new(),
                    profile.port,
                    profile.config,
                    profile.pins,
                ))
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::Output;
    use crate::sink::{AudioFormat, AudioSink};
    use std::path::PathBuf;

    #[test]
    fn parse_outputs() {
        assert_eq!("text".parse::<Output>().unwrap(), Output::Text(None));
        assert_eq!(
            "text:out.txt".parse::<Output>().unwrap(),
            Output::Text(Some(PathBuf::from("out.txt")))
        );
        assert_eq!("raw".parse::<Output>().unwrap(), Output::Raw);
        assert_eq!("bus".parse::<Output>().unwrap(), Output::Bus);
        assert_eq!(
            "file:speech.pcm".parse::<Output>().unwrap(),
            Output::File(PathBuf::from("speech.pcm"))
        );
        // bare names fall back to files
        assert_eq!(
            "speech.pcm".parse::<Output>().unwrap(),
            Output::File(PathBuf::from("speech.pcm"))
        );
    }

    #[test]
    fn parse_errors() {
        assert!("file:".parse::<Output>().is_err());
        assert!("bus:1".parse::<Output>().is_err());
        assert!("loud:yes".parse::<Output>().is_err());
    }

    #[test]
    fn file_sink_writes_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pcm");
        {
            let mut sink = Output::File(path.clone()).to_sink(None).unwrap();
            sink.open(16000, 1, AudioFormat::Linear16);
            sink.write(&[1, 2, 3]).unwrap();
        }
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 0, 2, 0, 3, 0]);
    }
}
