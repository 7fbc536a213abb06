use clap::Parser;
use serial_hil_tester::config::{Config, ConfigLoader};
use serial_hil_tester::port::list_ports;
use serial_hil_tester::runner::{run_suite, HardwareOpener, PortOpener, RunOptions};
use serial_hil_tester::sim::{SimBench, SIM_DUT_PORT, SIM_TESTER_PORT};
use serial_hil_tester::{default_cases, logging};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Runs the serial hardware-in-the-loop test suite against a DUT and a tester board.
///
/// Opens the device-under-test and tester serial ports, lets both boards boot,
/// then runs the scripted test cases (LED/LDR check, high limit, low limit) and
/// prints a pass/fail summary.
#[derive(Parser, Debug)]
#[command(name = "hil-tester", version)]
struct Args {
    /// Serial port of the device under test.
    #[arg(long)]
    dut: Option<String>,

    /// Serial port of the tester board.
    #[arg(long)]
    tester: Option<String>,

    /// Baud rate for both ports.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run against the built-in simulated bench instead of hardware.
    #[arg(long)]
    simulate: bool,

    /// Only run these cases (e.g. `--only TC2 --only TC3`).
    #[arg(long, value_name = "CASE")]
    only: Vec<String>,

    /// Also write the results as JSON to this file.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Exit with a failure status if any case fails.
    #[arg(long)]
    strict: bool,

    /// List the serial ports on this machine and exit.
    #[arg(long)]
    list_ports: bool,
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();

    if let Some(dut) = &args.dut {
        config.ports.dut = dut.clone();
    }
    if let Some(tester) = &args.tester {
        config.ports.tester = tester.clone();
    }
    if let Some(baud) = args.baud {
        config.ports.baud = baud;
    }
    Ok(config)
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init(&config.logging)?;

    if args.list_ports {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("No serial ports detected on this system");
        }
        for (name, kind) in ports {
            println!("  {name}  ({kind})");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut options = RunOptions {
        dut_port: config.ports.dut.clone(),
        tester_port: config.ports.tester.clone(),
        port: config.ports.port_configuration(),
        response_timeout: config.timing.response_timeout(),
        boot_settle: config.timing.boot_settle(),
        only: args.only.clone(),
    };

    let mut opener: Box<dyn PortOpener> = if args.simulate {
        options.dut_port = SIM_DUT_PORT.to_string();
        options.tester_port = SIM_TESTER_PORT.to_string();
        // Simulated boards are up as soon as they exist.
        options.boot_settle = Duration::ZERO;
        Box::new(SimBench::new().opener())
    } else {
        config.validate()?;
        Box::new(HardwareOpener)
    };

    println!(
        "Serial HIL tester v{} (DUT {}, tester {})",
        env!("CARGO_PKG_VERSION"),
        options.dut_port,
        options.tester_port
    );

    let report = run_suite(&options, &default_cases(), opener.as_mut());
    println!();
    print!("{}", report.render_summary());

    if let Some(path) = &args.json {
        report.write_json(path)?;
        println!("Report written to {}", path.display());
    }

    if args.strict && !report.is_success() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
