//! # sunxi_pwmctl
//!
//! Operator front end for the sunxi PWM register interface.
//!
//! # Usage
//!
//! ```bash
//! # Show both channels
//! sunxi_pwmctl status
//!
//! # 50 Hz servo pulse on channel 0, started immediately
//! sunxi_pwmctl set --channel 0 --period-ns 20000000 --duty-ns 1500000 --enable
//!
//! # Program every channel listed in a config file
//! sunxi_pwmctl apply --config /etc/sunxi-pwm/pwm.toml
//!
//! # Dry run against simulated registers, verbose
//! sunxi_pwmctl -s -v set --channel 1 --period-ns 1000000 --duty-ns 250000
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sunxi_common::config::{ConfigError, DeviceConfig, LogLevel, Polarity, PwmConfig};
use sunxi_common::consts::DEFAULT_CONFIG_PATH;
use sunxi_pwm::{
    Channel, MappedRegisters, PwmController, PwmError, PwmResult, RegisterIo, SimulatedRegisters,
    compute_clock,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// sunxi PWM control - program the SoC PWM block through /dev/mem
#[derive(Parser, Debug)]
#[command(name = "sunxi_pwmctl")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Register-level control of the sunxi PWM peripheral")]
#[command(long_about = None)]
struct Args {
    /// Physical memory device to map [default: /dev/mem, or the config file's]
    #[arg(long, value_name = "PATH", global = true)]
    mem: Option<PathBuf>,

    /// Physical address of the PWM register block, hex with 0x prefix or decimal
    /// [default: 0x01c20e00, or the config file's]
    #[arg(long, value_name = "ADDR", value_parser = parse_address, global = true)]
    base: Option<u64>,

    /// Operate on simulated registers instead of hardware
    #[arg(short = 's', long, global = true)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decoded state of one or both channels
    Status {
        /// Channel index (0 or 1); both when omitted
        #[arg(short, long)]
        channel: Option<u32>,
    },

    /// Configure period, duty cycle and polarity of a channel
    Set {
        /// Channel index (0 or 1)
        #[arg(short, long)]
        channel: u32,

        /// Period in nanoseconds
        #[arg(long)]
        period_ns: u64,

        /// Active time per period in nanoseconds
        #[arg(long)]
        duty_ns: u64,

        /// Active level; left unchanged when omitted
        #[arg(long, value_enum)]
        polarity: Option<PolarityArg>,

        /// Start the channel after configuring it
        #[arg(long)]
        enable: bool,
    },

    /// Start signal generation on a channel
    Enable {
        /// Channel index (0 or 1)
        #[arg(short, long)]
        channel: u32,
    },

    /// Stop signal generation on a channel
    Disable {
        /// Channel index (0 or 1)
        #[arg(short, long)]
        channel: u32,
    },

    /// Apply every channel from a TOML configuration file
    Apply {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolarityArg {
    Normal,
    Inversed,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Normal => Polarity::Normal,
            PolarityArg::Inversed => Polarity::Inversed,
        }
    }
}

fn parse_address(raw: &str) -> Result<u64, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => raw.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address '{raw}': {e}"))
}

fn main() {
    let args = Args::parse();

    let config = match &args.command {
        Command::Apply { config } => Some(PwmConfig::load_validated(config)),
        _ => None,
    };
    let level = config
        .as_ref()
        .and_then(|loaded| loaded.as_ref().ok())
        .map(|loaded| loaded.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    if let Err(e) = run(&args, config.transpose().map_err(PwmError::from)) {
        error!(code = e.code(), "sunxi_pwmctl failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: PwmResult<Option<PwmConfig>>) -> PwmResult<()> {
    let config = config?;

    let device = resolve_device(args, config.as_ref());

    if args.simulate {
        info!("Simulation mode: no hardware registers are touched");
        let mut pwm = PwmController::with_registers(SimulatedRegisters::new());
        execute(&mut pwm, &args.command, config.as_ref())
    } else {
        let mut pwm: PwmController<MappedRegisters> = PwmController::new();
        pwm.initialize(&device)?;
        execute(&mut pwm, &args.command, config.as_ref())
    }
}

/// Register block location: command-line flags win over the config file,
/// which wins over the hardware defaults.
fn resolve_device(args: &Args, config: Option<&PwmConfig>) -> DeviceConfig {
    let mut device = config
        .map(|config| config.device.clone())
        .unwrap_or_default();
    if let Some(mem) = &args.mem {
        device.mem_path = mem.clone();
    }
    if let Some(base) = args.base {
        device.base_address = base;
    }
    device
}

/// Program every channel of `config`.
///
/// All entries are checked before the first register write, so a file with
/// one unrepresentable period leaves the hardware untouched.
fn apply_config<R: RegisterIo>(pwm: &mut PwmController<R>, config: &PwmConfig) -> PwmResult<()> {
    let mut channels = Vec::with_capacity(config.channels.len());
    for entry in &config.channels {
        channels.push(Channel::try_from(u32::from(entry.index))?);
        compute_clock(entry.period_ns, entry.duty_ns)?;
    }

    for (entry, channel) in config.channels.iter().zip(channels) {
        pwm.apply(entry)?;
        println!("{}", pwm.channel_status(channel)?);
    }
    Ok(())
}

fn execute<R: RegisterIo>(
    pwm: &mut PwmController<R>,
    command: &Command,
    config: Option<&PwmConfig>,
) -> PwmResult<()> {
    match command {
        Command::Status { channel } => {
            let channels = match channel {
                Some(index) => vec![Channel::try_from(*index)?],
                None => Channel::ALL.to_vec(),
            };
            for channel in channels {
                println!("{}", pwm.channel_status(channel)?);
            }
        }
        Command::Set {
            channel,
            period_ns,
            duty_ns,
            polarity,
            enable,
        } => {
            let channel = Channel::try_from(*channel)?;
            if duty_ns > period_ns {
                warn!("duty {} ns exceeds period {} ns", duty_ns, period_ns);
            }
            if let Some(polarity) = polarity {
                pwm.set_polarity(channel, (*polarity).into())?;
            }
            let setting = pwm.set_config(channel, *period_ns, *duty_ns)?;
            info!(
                "ch{}: prescaler {} ({} Hz), {} / {} ticks",
                channel.index(),
                setting.prescaler,
                setting.frequency_hz(),
                setting.duty_ticks,
                setting.ticks
            );
            if *enable {
                pwm.enable(channel)?;
            }
            println!("{}", pwm.channel_status(channel)?);
        }
        Command::Enable { channel } => {
            let channel = Channel::try_from(*channel)?;
            pwm.enable(channel)?;
            println!("{}", pwm.channel_status(channel)?);
        }
        Command::Disable { channel } => {
            let channel = Channel::try_from(*channel)?;
            pwm.disable(channel)?;
            println!("{}", pwm.channel_status(channel)?);
        }
        Command::Apply { config: path } => {
            let config = config.ok_or(PwmError::Config(ConfigError::FileNotFound))?;
            info!(
                "Applying {} channel(s) for '{}' from {}",
                config.channels.len(),
                config.shared.service_name,
                path.display()
            );
            apply_config(pwm, config)?;
        }
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
