use std::{fmt, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fugit::MillisDurationU32;
use i2c_power_switch::{
    config::{BusConfig, DEFAULT_DEVICE},
    linux::LinuxI2cBus,
    power::PowerSwitch,
    types::{Channel, PowerMask},
};
use inquire::{InquireError, Select};
use strum::IntoEnumIterator;

/// Power controller for the 16 channel I2C power switch.
#[derive(Parser, Debug)]
#[command(name = "powerctl", version)]
struct Cli {
    /// The i2c device that controls the power
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Address to the i2c register
    #[arg(long, default_value = "0x22", value_parser = parse_u8)]
    i2c_address: u8,

    /// Address to the power value register
    #[arg(long, default_value = "0x04", value_parser = parse_u8)]
    i2c_power_address: u8,

    /// Address to the IO value register
    #[arg(long, default_value = "0x8C", value_parser = parse_u8)]
    i2c_io_address: u8,

    /// Bus transaction timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u32>,

    /// Print verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current channel mask
    Read,
    /// Switch channels on
    Enable {
        #[arg(required = true, value_name = "CHANNEL")]
        channels: Vec<u8>,
    },
    /// Switch channels off
    Disable {
        #[arg(required = true, value_name = "CHANNEL")]
        channels: Vec<u8>,
    },
    /// Write a whole mask, e.g. `0x0005` for channels 1 and 3
    Set {
        #[arg(value_parser = parse_u16)]
        mask: u16,
    },
    /// Interactive menu
    Menu,
}

fn parse_number(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| format!("invalid number {s:?}: {err}"))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_number(s)?;
    u8::try_from(value).map_err(|_| format!("{s} does not fit in 8 bits"))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_number(s)?;
    u16::try_from(value).map_err(|_| format!("{s} does not fit in 16 bits"))
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Warn
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    PowerOn(Channel),
    PowerOff(Channel),
    AllOff,
    ShowMask,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::PowerOn(channel) => write!(f, "Power on {channel}"),
            MenuItem::PowerOff(channel) => write!(f, "Power off {channel}"),
            MenuItem::AllOff => write!(f, "Power OFF (all channels)"),
            MenuItem::ShowMask => write!(f, "Show current mask"),
            MenuItem::Quit => write!(f, "Quit"),
        }
    }
}

fn menu(switch: &PowerSwitch<LinuxI2cBus>) -> Result<()> {
    let mut items = vec![MenuItem::ShowMask, MenuItem::AllOff];
    items.extend(Channel::iter().map(MenuItem::PowerOn));
    items.extend(Channel::iter().map(MenuItem::PowerOff));
    items.push(MenuItem::Quit);

    loop {
        let choice = match Select::new("Select an action:", items.clone()).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Menu failed"),
        };

        let outcome = match choice {
            MenuItem::PowerOn(channel) => switch.enable(channel),
            MenuItem::PowerOff(channel) => switch.disable(channel),
            MenuItem::AllOff => switch.mask_set(PowerMask::EMPTY),
            MenuItem::ShowMask => switch
                .mask_read()
                .map(|mask| println!("Current mask: {mask}")),
            MenuItem::Quit => break,
        };

        // Keep the menu running, the user decides whether to retry.
        if let Err(err) = outcome {
            log::error!("{choice} failed: {err}");
        }
    }

    println!("Quitting...");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = BusConfig::new(&cli.device, cli.i2c_address)
        .with_data_register(cli.i2c_power_address)
        .with_io_direction_register(cli.i2c_io_address);
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(MillisDurationU32::millis(ms));
    }

    let switch = PowerSwitch::initialize(LinuxI2cBus::new(), &config)
        .context("Could not initialize power control system")?;

    match cli.command {
        Command::Read => {
            let mask = switch.mask_read().context("Could not read the channel mask")?;
            println!("Current mask: {mask}");
        }
        Command::Enable { channels } => {
            for id in channels {
                log::info!("Enabling channel {id}");
                switch
                    .enable(id)
                    .with_context(|| format!("Could not enable channel {id}"))?;
            }
        }
        Command::Disable { channels } => {
            for id in channels {
                log::info!("Disabling channel {id}");
                switch
                    .disable(id)
                    .with_context(|| format!("Could not disable channel {id}"))?;
            }
        }
        Command::Set { mask } => {
            let mask = PowerMask::from_bits(mask);
            log::info!("Setting channel mask: {mask}");
            switch
                .mask_set(mask)
                .with_context(|| format!("Could not set channel mask {mask}"))?;
        }
        Command::Menu => menu(&switch)?,
    }

    switch.deinitialize();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
