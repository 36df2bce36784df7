use std::path::Path;
use std::str::FromStr;

use strict_yaml_rust::{StrictYaml, StrictYamlLoader};

use crate::sink::{BusConfig, BusMode, ChannelFormat, CommFormat, PinConfig, DEFAULT_PINS};

/// Everything needed to build a bus sink: which port, how the bus is
/// clocked and framed, and where it is wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusProfile {
    pub port: u8,
    pub config: BusConfig,
    pub pins: PinConfig,
}

impl Default for BusProfile {
    fn default() -> Self {
        BusProfile {
            port: 0,
            config: BusConfig::default(),
            pins: DEFAULT_PINS,
        }
    }
}

impl BusProfile {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.as_ref().display(), e))
    }

    /// Parse a profile document. Keys that are absent keep their defaults.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let datawhole = StrictYamlLoader::load_from_str(contents)?;
        let data = datawhole
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("could not get bus profile document"))?;
        Self::check_keys(
            data,
            &[
                "port",
                "mode",
                "bits-per-sample",
                "channel-format",
                "comm-format",
                "intr-alloc-flags",
                "dma-buf-count",
                "dma-buf-len",
                "use-apll",
                "pins",
            ],
        )?;

        let mut profile = BusProfile::default();
        let config = &mut profile.config;

        if let Some(port) = Self::get_num(data, "port")? {
            profile.port = port;
        }

        if let Some(modes) = Self::get_vec(data, "mode")? {
            config.mode = Self::parse_mode(modes)?;
        }

        if let Some(bits) = Self::get_num(data, "bits-per-sample")? {
            config.bits_per_sample = bits;
        }

        if let Some(fmt) = Self::get_str(data, "channel-format")? {
            config.channel_format = match fmt {
                "right-left" => ChannelFormat::RightLeft,
                "all-right" => ChannelFormat::AllRight,
                "all-left" => ChannelFormat::AllLeft,
                "only-right" => ChannelFormat::OnlyRight,
                "only-left" => ChannelFormat::OnlyLeft,
                _ => anyhow::bail!("unknown channel format {:?}", fmt),
            };
        }

        if let Some(formats) = Self::get_vec(data, "comm-format")? {
            config.comm_format = formats
                .iter()
                .map(Self::parse_comm_format)
                .collect::<anyhow::Result<_>>()?;
        }

        if let Some(flags) = Self::get_num(data, "intr-alloc-flags")? {
            config.intr_alloc_flags = flags;
        }
        if let Some(count) = Self::get_num(data, "dma-buf-count")? {
            config.dma_buf_count = count;
        }
        if let Some(len) = Self::get_num(data, "dma-buf-len")? {
            config.dma_buf_len = len;
        }
        if let Some(apll) = Self::get_num(data, "use-apll")? {
            config.use_apll = apll;
        }

        let pins = &data["pins"];
        if !pins.is_badvalue() {
            Self::check_keys(pins, &["bck", "ws", "data-out", "data-in"])?;
            let p = &mut profile.pins;
            Self::update_pin(&mut p.bck, pins, "bck")?;
            Self::update_pin(&mut p.ws, pins, "ws")?;
            Self::update_pin(&mut p.data_out, pins, "data-out")?;
            Self::update_pin(&mut p.data_in, pins, "data-in")?;
        }

        if config.channel_format.channels() != 2 {
            tracing::warn!(
                "bus profile uses {:?}; mono streams are still written as two-slot frames",
                config.channel_format
            );
        }

        Ok(profile)
    }

    fn parse_mode(modes: &[StrictYaml]) -> anyhow::Result<BusMode> {
        let mut mode = BusMode {
            master: false,
            transmit: false,
            receive: false,
            dac_built_in: false,
        };
        for m in modes.iter() {
            let m = m
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("bus modes must be strings"))?;
            match m {
                "master" => mode.master = true,
                "slave" => mode.master = false,
                "tx" => mode.transmit = true,
                "rx" => mode.receive = true,
                "dac-built-in" => mode.dac_built_in = true,
                _ => anyhow::bail!("unknown bus mode {:?}", m),
            }
        }
        Ok(mode)
    }

    fn parse_comm_format(data: &StrictYaml) -> anyhow::Result<CommFormat> {
        let f = data
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("comm formats must be strings"))?;
        Ok(match f {
            "i2s" => CommFormat::I2s,
            "i2s-msb" => CommFormat::I2sMsb,
            "i2s-lsb" => CommFormat::I2sLsb,
            "pcm" => CommFormat::Pcm,
            "pcm-short" => CommFormat::PcmShort,
            "pcm-long" => CommFormat::PcmLong,
            _ => anyhow::bail!("unknown comm format {:?}", f),
        })
    }

    fn update_pin(pin: &mut Option<u8>, data: &StrictYaml, k: &str) -> anyhow::Result<()> {
        match Self::get_str(data, k)? {
            None => {}
            Some("none") | Some("no-change") => *pin = None,
            Some(v) => {
                let n = v
                    .parse()
                    .map_err(|_| anyhow::anyhow!("bad pin number for {:?}: {:?}", k, v))?;
                *pin = Some(n);
            }
        }
        Ok(())
    }

    fn get_str<'a>(data: &'a StrictYaml, k: &str) -> anyhow::Result<Option<&'a str>> {
        let v = if data[k].is_badvalue() {
            Some(None)
        } else {
            data[k].as_str().map(Some)
        };
        v.ok_or_else(|| anyhow::anyhow!("bad value for {:?}, expected string", k))
    }

    fn get_vec<'a>(data: &'a StrictYaml, k: &str) -> anyhow::Result<Option<&'a Vec<StrictYaml>>> {
        let v = if data[k].is_badvalue() {
            Some(None)
        } else {
            data[k].as_vec().map(Some)
        };
        v.ok_or_else(|| anyhow::anyhow!("bad value for {:?}, expected list", k))
    }

    fn get_num<T>(data: &StrictYaml, k: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
    {
        match Self::get_str(data, k)? {
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| anyhow::anyhow!("bad value for {:?}: {:?}", k, v)),
            None => Ok(None),
        }
    }

    fn check_keys(data: &StrictYaml, keys: &[&str]) -> anyhow::Result<()> {
        let hash = data
            .as_hash()
            .ok_or_else(|| anyhow::anyhow!("expected yaml dictionary"))?;
        for k in hash.keys() {
            if let Some(k) = k.as_str() {
                if !keys.contains(&k) {
                    anyhow::bail!("unknown key {:?}", k);
                }
            } else {
                anyhow::bail!("unknown key {:?}", k);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::BusProfile;
    use crate::sink::{BusConfig, ChannelFormat, CommFormat, DEFAULT_PINS};
    use std::io::Write;

    #[test]
    fn missing_keys_keep_defaults() {
        let profile = BusProfile::parse("port: 0\n").unwrap();
        assert_eq!(profile, BusProfile::default());
        assert_eq!(profile.config, BusConfig::default());
        assert_eq!(profile.pins, DEFAULT_PINS);
    }

    #[test]
    fn full_profile() {
        let doc = "
port: 1
mode:
  - master
  - tx
  - dac-built-in
bits-per-sample: 16
channel-format: all-left
comm-format:
  - pcm
  - pcm-short
intr-alloc-flags: 2
dma-buf-count: 4
dma-buf-len: 128
use-apll: true
pins:
  bck: 14
  ws: 15
  data-out: none
";
        let profile = BusProfile::parse(doc).unwrap();
        assert_eq!(profile.port, 1);
        let config = &profile.config;
        assert!(config.mode.master && config.mode.transmit && config.mode.dac_built_in);
        assert!(!config.mode.receive);
        assert_eq!(config.channel_format, ChannelFormat::AllLeft);
        assert_eq!(config.comm_format, vec![CommFormat::Pcm, CommFormat::PcmShort]);
        assert_eq!(config.intr_alloc_flags, 2);
        assert_eq!(config.buffer_frames(), 512);
        assert!(config.use_apll);
        assert_eq!(profile.pins.bck, Some(14));
        assert_eq!(profile.pins.ws, Some(15));
        assert_eq!(profile.pins.data_out, None);
        assert_eq!(profile.pins.data_in, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(BusProfile::parse("volume: 11\n").is_err());
        assert!(BusProfile::parse("pins:\n  sda: 4\n").is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(BusProfile::parse("port: zero\n").is_err());
        assert!(BusProfile::parse("port: 300\n").is_err());
        assert!(BusProfile::parse("channel-format: surround\n").is_err());
        assert!(BusProfile::parse("mode:\n  - loud\n").is_err());
        assert!(BusProfile::parse("mode: master\n").is_err());
        assert!(BusProfile::parse("pins:\n  bck: -1\n").is_err());
    }

    #[test]
    fn open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 3").unwrap();
        writeln!(file, "dma-buf-len: 32").unwrap();
        let profile = BusProfile::open(file.path()).unwrap();
        assert_eq!(profile.port, 3);
        assert_eq!(profile.config.dma_buf_len, 32);
        assert_eq!(profile.config.dma_buf_count, 8);
    }

    #[test]
    fn missing_file() {
        assert!(BusProfile::open("/nonexistent/bus.yaml").is_err());
    }
}
