#[macro_use]
mod logging;

mod bridge;
mod events;
mod io;
mod protocol;
mod settings;

use std::sync::{Arc, Mutex};

use bridge::{Bridge, BridgeNotice, ChannelState};
use io::ChannelNotification;
use tauri::{AppHandle, Emitter, Manager, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

// ============================================================================
// Platform-Aware Serial Commands
// ============================================================================
// USB serial is not available on mobile platforms. These wrapper functions
// delegate to real implementations on desktop or return stub responses
// elsewhere.

/// Serial port info (duplicated for mobile compatibility)
#[derive(Clone, serde::Serialize)]
pub struct SerialPortInfoCompat {
    pub port_name: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// List serial ports - returns empty on mobile, real list on desktop
#[tauri::command(rename_all = "snake_case")]
fn platform_list_serial_ports() -> Result<Vec<SerialPortInfoCompat>, String> {
    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    {
        io::serial::utils::list_serial_ports().map(|ports| {
            ports
                .into_iter()
                .map(|p| SerialPortInfoCompat {
                    port_name: p.port_name,
                    port_type: p.port_type,
                    manufacturer: p.manufacturer,
                    product: p.product,
                    serial_number: p.serial_number,
                    vid: p.vid,
                    pid: p.pid,
                })
                .collect()
        })
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Ok(vec![])
    }
}

// ============================================================================
// Bridge Commands
// ============================================================================

/// The transport bridge, shared by the command layer and window lifecycle.
struct BridgeState(Mutex<Bridge>);

/// Build the notification sink for an open channel. Connection events are
/// logged and forwarded to the webview; nothing waits on them.
fn notification_sink(app: AppHandle) -> io::NotificationSink {
    Arc::new(move |notification| {
        match &notification {
            ChannelNotification::Connected => tlog!("[channel] Board connected"),
            ChannelNotification::Disconnected => tlog!("[channel] Board disconnected"),
            ChannelNotification::DataReceived { bytes } => {
                tlog!(
                    "[channel] Board -> app: {} byte(s): {}",
                    bytes.len(),
                    String::from_utf8_lossy(bytes).trim_end()
                )
            }
        }
        let _ = app.emit("channel-notification", notification);
    })
}

/// Surface a bridge notice to the user: a webview event for in-UI toasts plus
/// a one-shot message dialog, the desktop analog of a mobile alert.
fn report_notice(app: &AppHandle, notice: &BridgeNotice) {
    let _ = app.emit("bridge-notice", notice.clone());

    match notice {
        BridgeNotice::ChannelUnavailable { detail } => {
            app.dialog()
                .message(format!("USB serial is unavailable: {}", detail))
                .kind(MessageDialogKind::Error)
                .title("USB error")
                .show(|_| {});
        }
        BridgeNotice::SendUnavailable => {
            app.dialog()
                .message("USB send is not available. Connect a board and bring the app to the foreground.")
                .kind(MessageDialogKind::Info)
                .title("Info")
                .show(|_| {});
        }
        BridgeNotice::UploadSent { bytes } => {
            app.dialog()
                .message(format!("Code sent over USB to the board ({} bytes).", bytes))
                .kind(MessageDialogKind::Info)
                .title("Sent")
                .show(|_| {});
        }
        BridgeNotice::UploadFailed { detail } => {
            app.dialog()
                .message(format!("Failed to send to the board: {}", detail))
                .kind(MessageDialogKind::Error)
                .title("USB error")
                .show(|_| {});
        }
    }
}

fn lock_bridge<'a>(state: &'a State<'_, BridgeState>) -> Result<std::sync::MutexGuard<'a, Bridge>, String> {
    state
        .0
        .lock()
        .map_err(|e| format!("Bridge state poisoned: {}", e))
}

/// The webview invokes this when it becomes active. Acquires the board
/// channel where the platform supports one.
#[tauri::command]
async fn bridge_foreground(
    app: AppHandle,
    state: State<'_, BridgeState>,
) -> Result<ChannelState, String> {
    let sink = notification_sink(app.clone());
    let notice = lock_bridge(&state)?.on_foreground(sink);
    if let Some(notice) = notice {
        report_notice(&app, &notice);
    }
    Ok(lock_bridge(&state)?.state())
}

/// The webview invokes this on pagehide/teardown. Idempotent.
#[tauri::command]
async fn bridge_background(state: State<'_, BridgeState>) -> Result<(), String> {
    lock_bridge(&state)?.on_background();
    Ok(())
}

/// One raw editor event from the Blockly page, exactly as posted.
#[tauri::command]
async fn editor_event(
    app: AppHandle,
    state: State<'_, BridgeState>,
    raw: String,
) -> Result<(), String> {
    let notice = lock_bridge(&state)?.on_editor_event(&raw);
    if let Some(notice) = notice {
        report_notice(&app, &notice);
    }
    Ok(())
}

#[tauri::command]
fn bridge_status(state: State<'_, BridgeState>) -> Result<ChannelState, String> {
    Ok(lock_bridge(&state)?.state())
}

// ============================================================================
// Application Entry
// ============================================================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_os::init())
        .plugin(tauri_plugin_dialog::init());

    let builder = builder
        .setup(|app| {
            let handle = app.handle().clone();

            let app_settings = match settings::read_settings(&handle) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("[setup] Failed to load settings, using defaults: {}", e);
                    settings::AppSettings::default()
                }
            };

            if let Err(e) =
                logging::init_file_logging(std::path::Path::new(&app_settings.log_dir))
            {
                eprintln!("[setup] Failed to start file logging: {}", e);
            }

            // Resolve the channel capability once; the bridge never does
            // platform checks itself.
            let provider = io::platform_provider();
            tlog!(
                "[setup] Channel capability: {}",
                if provider.is_some() {
                    "USB serial"
                } else {
                    "none on this platform"
                }
            );

            app.manage(BridgeState(Mutex::new(Bridge::new(
                provider,
                app_settings.channel_config(),
            ))));

            // Check for updates once the UI has settled
            let update_handle = handle.clone();
            tauri::async_runtime::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                match settings::check_for_updates(update_handle.clone()).await {
                    Ok(Some(update)) => {
                        tlog!("[setup] Update available: {}", update.version);
                        let _ = update_handle.emit("update-available", &update);
                    }
                    Ok(None) => {}
                    Err(e) => tlog!("[setup] Update check failed: {}", e),
                }
            });

            Ok(())
        })
        .on_window_event(|window, event| {
            // Closing the main window is the end of the foreground lifetime:
            // tear the channel down before the webview goes away.
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                if window.label() == "main" {
                    if let Some(state) = window.app_handle().try_state::<BridgeState>() {
                        if let Ok(mut bridge) = state.0.lock() {
                            bridge.on_background();
                        }
                    }
                    logging::stop_file_logging();
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            bridge_foreground,
            bridge_background,
            editor_event,
            bridge_status,
            // Serial port API (platform-aware: real on desktop, stub on mobile)
            platform_list_serial_ports,
            settings::load_settings,
            settings::save_settings,
            settings::validate_directory,
            settings::create_directory,
            settings::get_app_version,
            settings::check_for_updates,
        ]);

    builder
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
