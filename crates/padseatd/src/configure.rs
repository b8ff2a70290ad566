use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, unbounded};

use padseat_device::{Input, KEYBOARD_ID};
use padseat_workspace::{ConfigSession, HotkeyFallback, Workspace};
use padseatd::{print_info, print_warning, InputContext, InputEvent, TickStatus};

use crate::{input_window, load_settings, open_seat, DaemonError, FRAME};

/// Walks through every action of one device and saves the result.
pub(crate) fn run(
    workspace: &Workspace,
    index: i32,
    no_hotkey: bool,
    window: bool,
    timeout: Duration,
) -> Result<(), DaemonError> {
    let (stop_tx, stop_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let settings = load_settings(workspace);
    // Key presses only reach a focused SDL window.
    let window = input_window(window || index == KEYBOARD_ID, &settings);
    let mut seat = open_seat(workspace, settings, InputContext::new(), window)?;
    let id = if index == KEYBOARD_ID {
        KEYBOARD_ID
    } else {
        seat.registry()
            .joysticks()
            .find(|e| e.device.index == index)
            .map(|e| e.device.id)
            .ok_or(DaemonError::UnknownIndex(index))?
    };
    if let Some(entry) = seat.registry().get(id) {
        print_info!("configuring {} ({})", entry.device.name, entry.device.guid);
    }

    let mut session = ConfigSession::new(id);
    let ticker = tick(FRAME);
    let mut prompted = None;
    let mut since = Instant::now();

    while let Some(step) = session.current() {
        if prompted != Some(step.name) {
            let hint = if step.skippable { ", wait to skip" } else { "" };
            print_info!("hold {}{hint}", step.label);
            prompted = Some(step.name);
            since = Instant::now();
        }

        select! {
            recv(stop_rx) -> _ => {
                print_warning!("configuration aborted, nothing saved");
                return Ok(());
            }
            recv(ticker) -> _ => {
                let mut offered: Vec<Input> = Vec::new();
                let mut sink = |event: &InputEvent<'_>| offered.push(event.input);
                if seat.tick(&mut sink) == TickStatus::Quit {
                    return Ok(());
                }
                for input in offered {
                    match session.offer(input) {
                        Ok(Some(name)) => print_info!("{name} = {input}"),
                        Ok(None) => {}
                        Err(e) => print_warning!("{e}"),
                    }
                    if session.is_complete() {
                        break;
                    }
                }
                if prompted == session.current().map(|s| s.name) && since.elapsed() >= timeout {
                    if step.skippable {
                        print_info!("skipped {}", step.label);
                        let _ = session.skip();
                    } else {
                        return Err(DaemonError::Timeout(step.label));
                    }
                }
            }
        }
    }

    let fallback = if no_hotkey {
        HotkeyFallback::Disabled
    } else {
        HotkeyFallback::UseSelect
    };
    let mapping = session.finish(fallback);
    seat.save_mapping(id, &mapping)?;
    print_info!("saved {} binding(s)", mapping.len());
    Ok(())
}
