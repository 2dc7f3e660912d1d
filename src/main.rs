use clap::Parser;
use fod_inscreen::callback::{CallbackError, InscreenCallback};
use fod_inscreen::properties::{LayeredProperties, MapProperties, PropertyFile, PropertyStore};
use fod_inscreen::sysfs::AttributePaths;
use fod_inscreen::vendor::logging::LoggingVendor;
use fod_inscreen::vendor::VendorFingerprint;
use fod_inscreen::SensorOverlayService;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fod-inscreen", about = "In-display fingerprint overlay service")]
struct Cli {
    /// build.prop style file to read overlay properties from
    #[arg(long)]
    props: Option<PathBuf>,

    /// Property override as key=value (repeatable)
    #[arg(long = "prop", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Use attribute files under this directory instead of /sys
    #[arg(long, conflicts_with = "discover")]
    sysfs_root: Option<PathBuf>,

    /// Locate the display and touch devices through udev
    #[arg(long)]
    discover: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    PositionX,
    PositionY,
    Size,
    Press,
    Release,
    Show,
    Hide,
    EnrollStart,
    EnrollFinish,
    Acquired(i32, i32),
    Error(i32, i32),
    DimAmount(i32),
    Boost,
    LongPress(bool),
    Callback(bool),
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or("empty command")?;
        let args: Vec<&str> = words.collect();

        let int = |i: usize| -> Result<i32, String> {
            let word = args.get(i).ok_or(format!("{}: missing argument", name))?;
            word.parse()
                .map_err(|_| format!("{}: '{}' is not an integer", name, word))
        };
        let switch = || -> Result<bool, String> {
            match args.first().copied() {
                Some("on") => Ok(true),
                Some("off") => Ok(false),
                _ => Err(format!("{}: expected on|off", name)),
            }
        };

        Ok(match name {
            "x" => Command::PositionX,
            "y" => Command::PositionY,
            "size" => Command::Size,
            "press" => Command::Press,
            "release" => Command::Release,
            "show" => Command::Show,
            "hide" => Command::Hide,
            "enroll-start" => Command::EnrollStart,
            "enroll-finish" => Command::EnrollFinish,
            "acquired" => Command::Acquired(int(0)?, int(1)?),
            "error" => Command::Error(int(0)?, int(1)?),
            "dim" => Command::DimAmount(int(0)?),
            "boost" => Command::Boost,
            "long-press" => Command::LongPress(switch()?),
            "callback" => Command::Callback(switch()?),
            "quit" => Command::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        })
    }
}

/// Prints finger presence to stdout.
struct StdoutCallback;

impl InscreenCallback for StdoutCallback {
    fn on_finger_down(&self) -> Result<(), CallbackError> {
        println!("callback: finger down");
        Ok(())
    }

    fn on_finger_up(&self) -> Result<(), CallbackError> {
        println!("callback: finger up");
        Ok(())
    }
}

fn load_properties(cli: &Cli) -> Result<Box<dyn PropertyStore>, Box<dyn std::error::Error>> {
    let mut overrides = MapProperties::new();
    for assignment in &cli.overrides {
        overrides.set_assignment(assignment)?;
    }

    let base: Box<dyn PropertyStore> = match &cli.props {
        Some(path) => {
            let file = PropertyFile::load(path)?;
            log::info!("loaded properties from {}", file.path().display());
            Box::new(file)
        }
        None => Box::new(MapProperties::new()),
    };

    if overrides.is_empty() {
        Ok(base)
    } else {
        Ok(Box::new(LayeredProperties::new(overrides, base)))
    }
}

fn resolve_paths(cli: &Cli) -> Result<AttributePaths, Box<dyn std::error::Error>> {
    if cli.discover {
        return discover_paths();
    }
    Ok(match &cli.sysfs_root {
        Some(root) => AttributePaths::with_root(root),
        None => AttributePaths::default(),
    })
}

#[cfg(target_os = "linux")]
fn discover_paths() -> Result<AttributePaths, Box<dyn std::error::Error>> {
    use fod_inscreen::discovery::udev_discovery::UdevDiscovery;
    use fod_inscreen::discovery::DeviceDiscovery;

    Ok(UdevDiscovery::find_fod_devices()?.attribute_paths())
}

#[cfg(not(target_os = "linux"))]
fn discover_paths() -> Result<AttributePaths, Box<dyn std::error::Error>> {
    Err("udev discovery is only available on Linux".into())
}

fn run(service: &SensorOverlayService, command: Command) -> bool {
    match command {
        Command::PositionX => println!("{}", service.position_x()),
        Command::PositionY => println!("{}", service.position_y()),
        Command::Size => println!("{}", service.size()),
        Command::Press => service.on_press(),
        Command::Release => service.on_release(),
        Command::Show => service.on_show_fod_view(),
        Command::Hide => service.on_hide_fod_view(),
        Command::EnrollStart => service.on_start_enroll(),
        Command::EnrollFinish => service.on_finish_enroll(),
        Command::Acquired(info, code) => println!("{}", service.handle_acquired(info, code)),
        Command::Error(error, code) => println!("{}", service.handle_error(error, code)),
        Command::DimAmount(brightness) => println!("{}", service.get_dim_amount(brightness)),
        Command::Boost => println!("{}", service.should_boost_brightness()),
        Command::LongPress(enabled) => service.set_long_press_enabled(enabled),
        Command::Callback(true) => service.set_callback(Some(Arc::new(StdoutCallback))),
        Command::Callback(false) => service.set_callback(None),
        Command::Quit => return false,
    }
    true
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let props = match load_properties(&cli) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Unable to load properties: {}", e);
            std::process::exit(1);
        }
    };

    let paths = match resolve_paths(&cli) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Unable to locate FoD attributes: {}", e);
            std::process::exit(1);
        }
    };

    let lookup = || -> Option<Arc<dyn VendorFingerprint>> { Some(LoggingVendor::new(true)) };
    let service = match SensorOverlayService::connect(&lookup, &*props, paths) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start service: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("stdin error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(command) => {
                if !run(&service, command) {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }
}
