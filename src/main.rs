use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use greeir::{
    config::Config,
    gree::{Fan, Mode, Model, Phy, Swing, ThermostatState},
    modem::{DeviceError, FormatType, Lines, Receiver},
    smartir, GreeClimate,
};
use hexplay::HexViewBuilder;

/// Encodes and decodes Gree air conditioner IR commands.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// JSON configuration file, flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remote model (GENERIC, YAW1F, YBOFB, YAC1FB9, YT1F)
    #[arg(short, long)]
    model: Option<Model>,

    /// Number of times each command is sent
    #[arg(short, long)]
    repeat: Option<u8>,

    #[arg(long)]
    wifi_function: bool,

    #[arg(long)]
    check_checksum: bool,

    #[arg(long)]
    set_modes: bool,

    /// Capture format used on stdin/stdout
    #[arg(short, long, default_value = "hex")]
    format: FormatType,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a state and print one capture per repeat
    Encode {
        #[arg(long, default_value = "auto")]
        mode: Mode,
        #[arg(short, long, default_value_t = 24)]
        temperature: u8,
        #[arg(long, default_value = "auto")]
        fan: Fan,
        #[arg(long, default_value = "off")]
        swing: Swing,
        #[arg(long)]
        sleep: bool,
    },
    /// Decode captures read from stdin, one per line
    Decode,
    /// Feed captures from stdin through the driver and print the states it reports
    Listen,
    /// Print a SmartIR code file for the configured model
    Smartir,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
        config.wifi_function |= self.wifi_function;
        config.check_checksum |= self.check_checksum;
        config.set_modes |= self.set_modes;

        Ok(config.validate()?)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    log::debug!("using {:?}", config);

    match cli.command {
        Command::Encode {
            mode,
            temperature,
            fan,
            swing,
            sleep,
        } => {
            let state = ThermostatState {
                power: mode != Mode::Off,
                mode,
                target_temperature: temperature,
                fan,
                swing,
                sleep,
                wifi: false,
            };
            let output = Lines::new(cli.format, io::empty(), io::stdout());
            let mut climate = GreeClimate::new(config, output)?;
            climate.set_state(&state)?;
        }
        Command::Decode => decode(config, cli.format)?,
        Command::Listen => listen(config, cli.format)?,
        Command::Smartir => {
            let file = smartir::gen_smartir(config)?;
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
    }

    Ok(())
}

// Read captures from stdin, print the frame and the state it carries
fn decode(config: Config, format: FormatType) -> anyhow::Result<()> {
    let variant = config.model.variant();
    let phy = Phy::for_model(config.model);
    let mut input = Lines::new(format, io::stdin().lock(), io::sink());

    loop {
        let pulses = match input.recv() {
            Ok(pulses) => pulses,
            Err(DeviceError::EOF) => break,
            Err(DeviceError::FormatError(err)) => {
                log::warn!("skipping line: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let frame = match phy.decode(&pulses) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("{}", greeir::DecodeError::from(err));
                continue;
            }
        };

        let bytes = frame.to_bytes();
        println!("{}", HexViewBuilder::new(&bytes).row_width(8).finish());
        match frame.decode(variant, config.check_checksum) {
            Ok(state) => println!("{}", serde_json::to_string(&state)?),
            Err(err) => log::warn!("{}", err),
        }
        io::stdout().flush()?;
    }

    Ok(())
}

fn listen(config: Config, format: FormatType) -> anyhow::Result<()> {
    if !config.set_modes {
        log::warn!("set_modes is off, received states won't be reported");
    }

    let mut input = Lines::new(format, io::stdin().lock(), io::sink());
    let mut climate = GreeClimate::new(config, Lines::new(format, io::empty(), io::stdout()))?;
    climate.on_state_received(|state| match serde_json::to_string(state) {
        Ok(json) => println!("{}", json),
        Err(err) => log::error!("failed to serialize state: {}", err),
    });

    loop {
        match input.recv() {
            Ok(pulses) => {
                climate.on_receive(&pulses);
            }
            Err(DeviceError::EOF) => break,
            Err(DeviceError::FormatError(err)) => log::warn!("skipping line: {}", err),
            Err(err) => return Err(err.into()),
        }
    }

    log::info!(
        "diagnostics: {}",
        serde_json::to_string(climate.diagnostics())?
    );
    Ok(())
}
