//! rustylbsd - runs the LED/Button peripheral on a Linux HCI device
//!
//! Usage: `rustylbsd [hci-index] [bond-file]`
//!
//! The board is simulated on stdin, one command per line:
//! `u` toggles the user button, `p` clicks the pairing button, `d` clicks
//! the bond delete button and `s <value>` pushes a sensor reading.

use anyhow::{bail, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use env_logger::Env;
use log::{debug, info, warn};
use rustylbs::gap::AdvertisingConfig;
use rustylbs::{
    AuthCallbacks, FileBondStore, HciHost, LeAddress, LedCapability, Peripheral,
    PeripheralConfig, PushMode,
};
use std::env;
use std::io::{self, BufRead};
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Log filter, in `env_logger` syntax; `info` when unset
const LOG_ENV: &str = "RUSTYLBS_LOG";
const DEFAULT_BOND_FILE: &str = "rustylbs-bonds.bin";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const RUN_LED_BLINK_INTERVAL: Duration = Duration::from_millis(1000);

/// LEDs shown in the log.
struct ConsoleLeds;

impl LedCapability for ConsoleLeds {
    fn set(&self, pin: u8, on: bool) {
        debug!("LED{} {}", pin, if on { "on" } else { "off" });
    }
}

/// Prints passkeys for the user to compare.
struct ConsoleDisplay;

impl AuthCallbacks for ConsoleDisplay {
    fn passkey_display(&self, peer: &LeAddress, passkey: u32) {
        println!("Passkey for {}: {:06}", peer, passkey);
    }

    fn pairing_cancelled(&self, peer: &LeAddress) {
        println!("Pairing cancelled by {}", peer);
    }
}

/// One line of board input.
#[derive(Debug, Clone, Copy)]
enum BoardInput {
    ToggleUser,
    ClickPairing,
    ClickBondDelete,
    Sensor(u32),
}

fn parse_input(line: &str) -> Result<BoardInput> {
    let mut words = line.split_whitespace();
    let input = match (words.next(), words.next()) {
        (Some("u"), None) => BoardInput::ToggleUser,
        (Some("p"), None) => BoardInput::ClickPairing,
        (Some("d"), None) => BoardInput::ClickBondDelete,
        (Some("s"), Some(value)) => BoardInput::Sensor(
            value
                .parse()
                .with_context(|| format!("invalid sensor value {:?}", value))?,
        ),
        _ => bail!("unknown command {:?} (u, p, d or s <value>)", line.trim()),
    };
    Ok(input)
}

fn spawn_stdin_reader(tx: Sender<BoardInput>) -> io::Result<()> {
    thread::Builder::new()
        .name("board-input".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Ok(input) => {
                        if tx.send(input).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("{}", err),
                }
            }
        })?;
    Ok(())
}

/// Tracks button levels and feeds edges to the peripheral, the way a
/// button driver interrupt would.
struct Buttons {
    state: u32,
}

impl Buttons {
    fn apply(&mut self, peripheral: &Peripheral, input: BoardInput) {
        let map = peripheral.config().buttons;
        match input {
            BoardInput::ToggleUser => {
                self.state ^= map.user;
                peripheral.on_button_change(self.state, map.user);
            }
            BoardInput::ClickPairing => self.click(peripheral, map.pairing),
            BoardInput::ClickBondDelete => self.click(peripheral, map.bond_delete),
            BoardInput::Sensor(value) => match peripheral.lbs().send_sensor_value(value) {
                Ok(true) => info!("Sensor value {} sent", value),
                Ok(false) => info!("Sensor notifications not enabled"),
                Err(err) => warn!("Sensor value not sent: {}", err),
            },
        }
    }

    fn click(&mut self, peripheral: &Peripheral, mask: Option<u32>) {
        let Some(mask) = mask else {
            warn!("Button not present on this board");
            return;
        };
        peripheral.on_button_change(self.state | mask, mask);
        peripheral.on_button_change(self.state & !mask, mask);
    }
}

fn load_config() -> PeripheralConfig {
    let mut config = PeripheralConfig::default();
    if let Ok(name) = env::var("RUSTYLBS_NAME") {
        config.advertising.device_name = name;
    }
    if env::var("RUSTYLBS_PUSH").is_ok_and(|mode| mode.eq_ignore_ascii_case("indicate")) {
        config.push_mode = PushMode::Indicate;
    }
    if env::var("RUSTYLBS_OPEN_SCAN_RSP").is_ok_and(|kind| kind.eq_ignore_ascii_case("manufacturer"))
    {
        let advertising: AdvertisingConfig = mem::take(&mut config.advertising);
        config.advertising = advertising.with_manufacturer_data();
    }
    config
}

fn run(host: &HciHost, peripheral: &Peripheral, input: &Receiver<BoardInput>) -> Result<()> {
    let leds = ConsoleLeds;
    let run_led = peripheral.config().leds.run_status;
    let mut buttons = Buttons { state: 0 };
    let mut run_led_on = false;
    let mut last_blink = Instant::now();

    loop {
        if let Some(packet) = host.next_packet(POLL_INTERVAL)? {
            for event in host.process(&packet, peripheral.lbs()) {
                peripheral.handle_event(&event);
            }
        }

        for board_input in input.try_iter() {
            buttons.apply(peripheral, board_input);
        }

        if last_blink.elapsed() >= RUN_LED_BLINK_INTERVAL {
            run_led_on = !run_led_on;
            leds.set(run_led, run_led_on);
            last_blink = Instant::now();
        }
    }
}

fn logger() -> env_logger::Builder {
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info"))
}

fn main() -> Result<()> {
    logger().init();

    let mut args = env::args().skip(1);
    let dev_id: u16 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid HCI device index {:?}", arg))?,
        None => 0,
    };
    let bond_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BOND_FILE));

    let config = load_config();

    let host = Arc::new(
        HciHost::open(dev_id, config.negotiation.mtu)
            .with_context(|| format!("cannot open hci{}", dev_id))?,
    );
    host.init().context("controller initialization failed")?;

    let bonds = Arc::new(
        FileBondStore::load(&bond_path)
            .with_context(|| format!("cannot load bonds from {}", bond_path.display()))?,
    );
    info!("Using bond file {}", bonds.path().display());

    let peripheral = Arc::new(Peripheral::new(
        config,
        host.clone(),
        bonds,
        Arc::new(ConsoleLeds),
        Arc::new(ConsoleDisplay),
    )?);
    peripheral
        .spawn_worker()
        .context("cannot start work queue thread")?;

    let (input_tx, input_rx) = unbounded();
    spawn_stdin_reader(input_tx).context("cannot start input thread")?;

    peripheral.boot();
    run(&host, &peripheral, &input_rx)
}
