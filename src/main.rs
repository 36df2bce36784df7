use clap::clap_app;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let matches = clap_app!(
        speakout =>
            (@setting SubcommandRequiredElseHelp)
            (@subcommand say =>
             (@arg OUTPUT: -o --output +takes_value "set output (text, text:PATH, raw, file:PATH, bus)")
             (@arg BUSYAML: -b --bus +takes_value "bus profile for bus output")
             (@arg RATE: -r --rate +takes_value "sample rate in Hz")
             (@arg CHANNELS: -c --channels +takes_value "channels to synthesize")
             (@arg CHUNK: -k --chunk +takes_value "frames per streamed chunk")
             (@arg TEXT: +required "text to speak")
            )
    )
    .get_matches();

    if let Some(matches) = matches.subcommand_matches("say") {
        let output = matches
            .value_of("OUTPUT")
            .map(|s| s.parse::<speakout::Output>())
            .transpose()?
            .unwrap_or(speakout::Output::Text(None));
        let profile = matches
            .value_of("BUSYAML")
            .map(speakout::BusProfile::open)
            .transpose()?;
        let rate = matches
            .value_of("RATE")
            .map(|s| s.parse::<u32>())
            .transpose()?
            .unwrap_or(16000);
        let channels = matches
            .value_of("CHANNELS")
            .map(|s| s.parse::<u16>())
            .transpose()?
            .unwrap_or(1);
        let chunk = matches
            .value_of("CHUNK")
            .map(|s| s.parse::<usize>())
            .transpose()?
            .unwrap_or(256);
        let text = matches.value_of("TEXT").unwrap();

        // frames still sitting in the bus ring once synthesis returns
        let tail = profile
            .as_ref()
            .map(|p| p.config.buffer_frames())
            .unwrap_or_else(|| speakout::sink::BusConfig::default().buffer_frames());

        let sink = output.to_sink(profile)?;
        let tone = speakout::Tone::new(rate, channels).chunk_frames(chunk);
        let mut speaker = speakout::Speaker::with_output(tone, sink);
        speaker.say(text)?;

        if output == speakout::Output::Bus && rate > 0 {
            // let the ring play out before drain silences it
            std::thread::sleep(std::time::Duration::from_secs_f32(
                tail as f32 / rate as f32,
            ));
        }
        speaker.end()?;
    }

    Ok(())
}
