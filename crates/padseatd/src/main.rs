mod cli;
mod configure;

use std::fs;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{select, tick, unbounded};
use thiserror::Error;

use padseat_device::{SdlBackend, SdlOptions};
use padseat_gun::{GunSource, NoGuns};
use padseat_workspace::{
    PlayerPreference, Settings, SettingsError, SettingsEvent, Workspace, WorkspaceError,
};
use padseatd::api::{ApiError, ApiTransport, Command as ApiCommand, Request, Response, UnixSocket};
use padseatd::{
    logging, print_debug, print_error, print_info, print_warning, InputContext, InputEvent,
    InputSink, PlayerSummary, Seat, SeatError, TickStatus,
};

use crate::cli::{Cli, Command};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub(crate) enum DaemonError {
    #[error(transparent)]
    Seat(#[from] SeatError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("no joystick at index {0}")]
    UnknownIndex(i32),
    #[error("player must be between 1 and {0}")]
    InvalidPlayer(usize),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

pub(crate) type Daemon = Seat<SdlBackend, Box<dyn GunSource>>;

#[cfg(all(target_os = "linux", feature = "evdev-guns"))]
fn gun_source() -> Box<dyn GunSource> {
    match padseat_gun::EvdevGunSource::new() {
        Ok(source) => Box::new(source),
        Err(e) => {
            print_warning!("light guns disabled: {e}");
            Box::new(NoGuns)
        }
    }
}

#[cfg(not(all(target_os = "linux", feature = "evdev-guns")))]
fn gun_source() -> Box<dyn GunSource> {
    Box::new(NoGuns)
}

fn load_settings(workspace: &Workspace) -> Settings {
    workspace.load_settings().unwrap_or_else(|e| {
        print_warning!("unable to read settings, using defaults: {e}");
        Settings::default()
    })
}

/// Size of the SDL input window, when keyboard or mouse input is wanted.
pub(crate) fn input_window(forced: bool, settings: &Settings) -> Option<(u32, u32)> {
    (forced || settings.gun.mouse_fallback)
        .then_some((settings.gun.screen.width, settings.gun.screen.height))
}

pub(crate) fn open_seat(
    workspace: &Workspace,
    settings: Settings,
    context: InputContext,
    window: Option<(u32, u32)>,
) -> Result<Daemon, DaemonError> {
    let backend = SdlBackend::new(SdlOptions {
        background_events: settings.input.background_events,
        window,
    })
    .map_err(SeatError::from)?;
    Ok(Seat::new(
        backend,
        workspace.config_store(),
        gun_source(),
        settings,
        context,
    ))
}

/// Logs every routed input at debug level.
struct LogSink;

impl InputSink for LogSink {
    fn input(&mut self, event: &InputEvent<'_>) {
        let actions = event
            .mapping
            .map(|m| m.mapped_to(&event.input).join(", "))
            .unwrap_or_default();
        match event.player {
            Some(slot) => print_debug!("player {} {} [{actions}]", slot + 1, event.input),
            None => print_debug!("device {} {} [{actions}]", event.device(), event.input),
        }
    }

    fn gun_moved(&mut self, index: usize, x: f32, y: f32) {
        print_debug!("gun {} at {x:.0}x{y:.0}", index + 1);
    }
}

fn print_players(players: &[Option<PlayerSummary>]) {
    let mut any = false;
    for player in players.iter().flatten() {
        any = true;
        let battery = if player.battery_level < 0 {
            String::from("wired")
        } else {
            format!("{}%", player.battery_level)
        };
        print_info!(
            "player {}: {} (index {}, guid {}, {battery})",
            player.slot + 1,
            player.name,
            player.index,
            player.guid
        );
    }
    if !any {
        print_info!("no players seated");
    }
}

fn run(workspace: &Workspace, window: bool) -> Result<(), DaemonError> {
    let (stop_tx, stop_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let context = InputContext::new();
    let settings = load_settings(workspace);
    let window = input_window(window, &settings);
    let mut seat = open_seat(workspace, settings, context.clone(), window)?;
    let events = context.subscribe();

    let (api_tx, api_rx) = unbounded::<ApiCommand>();
    let api = UnixSocket::new(workspace.socket_path());
    api.listen(context.clone(), api_tx)?;

    // The watcher reports over std mpsc, bridge it to crossbeam.
    let (_watcher, settings_std_rx) = workspace.start_settings_watcher()?;
    let (settings_tx, settings_rx) = unbounded::<SettingsEvent>();
    thread::spawn(move || {
        while let Ok(ev) = settings_std_rx.recv() {
            if settings_tx.send(ev).is_err() {
                break;
            }
        }
    });

    let ticker = tick(FRAME);
    let mut sink = LogSink;
    print_info!(
        "padseatd started: {} joystick(s), {} configured device(s)",
        seat.registry().device_count(),
        context.configured_count()
    );
    print_players(&context.players());

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(api_rx) -> msg => match msg {
                Ok(ApiCommand::Battery { guid, level }) => {
                    seat.update_battery(&guid, level);
                }
                Ok(ApiCommand::Rebuild) => seat.rebuild(),
                Err(_) => {
                    print_error!("api channel closed");
                    break;
                }
            },
            recv(settings_rx) -> msg => match msg {
                Ok(SettingsEvent::Changed(settings)) => seat.apply_settings(settings),
                Ok(SettingsEvent::Removed) => {
                    print_warning!("settings file removed, keeping current settings");
                }
                Ok(SettingsEvent::Error(e)) => print_error!("failed to reload settings: {e}"),
                Err(_) => {
                    print_error!("settings watcher stopped");
                    break;
                }
            },
            recv(ticker) -> _ => {
                if seat.tick(&mut sink) == TickStatus::Quit {
                    break;
                }
                for event in events.try_iter() {
                    print_debug!("{event:?}");
                }
            }
        }
    }

    let _ = fs::remove_file(workspace.socket_path());
    print_info!("padseatd stopped");
    Ok(())
}

fn list(workspace: &Workspace) -> Result<(), DaemonError> {
    let seat = open_seat(workspace, load_settings(workspace), InputContext::new(), None)?;
    for device in seat.context().devices() {
        let status = if device.configured {
            "configured"
        } else {
            "unconfigured"
        };
        let source = device.source.unwrap_or_else(|| String::from("-"));
        print_info!(
            "{:>3} {:<32} {:<34} {status} ({source})",
            device.index,
            device.name,
            device.guid
        );
    }
    print_players(&seat.context().players());
    Ok(())
}

fn players(workspace: &Workspace) -> Result<(), DaemonError> {
    match UnixSocket::new(workspace.socket_path()).request(&Request::Players)? {
        Response::Players(players) => print_players(&players),
        other => print_warning!("unexpected response: {other:?}"),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn export(workspace: &Workspace) -> Result<(), DaemonError> {
    let seat = open_seat(workspace, load_settings(workspace), InputContext::new(), None)?;
    println!("{}", seat.emulator_args().trim_end());
    Ok(())
}

fn assign(workspace: &Workspace, player: usize, index: i32) -> Result<(), DaemonError> {
    let mut settings = workspace.load_settings()?;
    if player == 0 || player > settings.input.max_players {
        return Err(DaemonError::InvalidPlayer(settings.input.max_players));
    }
    let seat = open_seat(workspace, settings.clone(), InputContext::new(), None)?;
    let entry = seat
        .registry()
        .joysticks()
        .find(|e| e.device.index == index)
        .ok_or(DaemonError::UnknownIndex(index))?;
    settings.set_preference(player, PlayerPreference::for_device(&entry.device));
    workspace.save_settings(&settings)?;
    print_info!("player {player} now prefers {}", entry.device.name);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::setup(cli.verbose, cli.no_color).expect("Unable to set up logger");

    let workspace = match Workspace::new(cli.workspace.as_deref(), cli.shared.as_deref()) {
        Ok(workspace) => workspace,
        Err(e) => {
            print_error!("failed to open workspace: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run => run(&workspace, cli.window),
        Command::List => list(&workspace),
        Command::Players => players(&workspace),
        Command::Export => export(&workspace),
        Command::Assign { player, device } => assign(&workspace, player, device),
        Command::Configure {
            device,
            no_hotkey,
            timeout,
        } => configure::run(
            &workspace,
            device,
            no_hotkey,
            cli.window,
            Duration::from_secs(timeout),
        ),
    };
    if let Err(e) = result {
        print_error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_opens_only_when_keys_or_mouse_are_needed() {
        let mut settings = Settings::default();
        assert_eq!(input_window(false, &settings), None);
        assert_eq!(input_window(true, &settings), Some((1920, 1080)));

        settings.gun.mouse_fallback = true;
        settings.gun.screen.width = 1280;
        settings.gun.screen.height = 720;
        assert_eq!(input_window(false, &settings), Some((1280, 720)));
    }

    #[test]
    fn window_flag_and_keyboard_device_parse() {
        let cli = Cli::parse_from(["padseatd", "--window", "configure", "--device", "-1"]);
        assert!(cli.window);
        assert_eq!(
            cli.command,
            Command::Configure {
                device: padseat_device::KEYBOARD_ID,
                no_hotkey: false,
                timeout: 10,
            }
        );
    }
}
