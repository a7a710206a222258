//! keycat - records left clicks with screenshots and the keys held while
//! clicking.

use keycat::config::Settings;
use keycat::database::Database;
use keycat::events::{EventReceiver, FanoutReceiver, LoggingReceiver};
use keycat::store::ButtonRecorder;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("keycat=info")),
        )
        .init();

    println!("🔧 Opening database...");
    let db = Arc::new(Database::open()?);
    let settings = Settings::load(&db)?;
    println!("   ✓ Database ready ({} buttons stored)", db.button_count()?);
    println!("   ✓ Capture mode: {}", settings.capture_mode);

    let mut receiver = FanoutReceiver::new().with(Arc::new(LoggingReceiver));
    if settings.record_buttons {
        receiver = receiver.with(Arc::new(ButtonRecorder::new(Arc::clone(&db))));
    }

    run(settings, Arc::new(receiver))
}

#[cfg(windows)]
fn run(
    settings: Settings,
    receiver: Arc<dyn EventReceiver>,
) -> Result<(), Box<dyn std::error::Error>> {
    use keycat::capture::gdi::GdiScreenshotTaker;
    use keycat::monitor::*;
    use keycat::winapi_utils::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    let creator =
        build_mouse_event_creator(settings.capture_mode, Arc::new(GdiScreenshotTaker::new()));
    let state = Arc::new(KeyboardStateManager::new(Arc::clone(&receiver)));
    let dispatcher = InputDispatcher::new(state, MouseEventListener::new(creator, receiver));

    let rx = install_input_channel().ok_or("input channel already installed")?;
    let shutdown = Arc::new(AtomicBool::new(false));
    let quit = Arc::new(AtomicBool::new(false));

    let quit_ctrlc = Arc::clone(&quit);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        post_quit_message(&quit_ctrlc, 0);
    })?;

    let dispatch_handle = spawn_dispatch_thread(rx, dispatcher, Arc::clone(&shutdown));

    println!("🔧 Installing input hooks...");
    let keyboard_hook = HookGuard::install_keyboard_hook(Some(keyboard_hook_proc))?;
    let mouse_hook = HookGuard::install_mouse_hook(Some(mouse_hook_proc))?;
    println!("   ✓ Keyboard and mouse hooks installed");
    println!("🎯 keycat is recording. Press Ctrl+C to quit.");

    run_message_loop(&quit);

    // Unhook before stopping dispatch so nothing is queued after shutdown
    drop(mouse_hook);
    drop(keyboard_hook);
    shutdown.store(true, Ordering::SeqCst);

    match dispatch_handle.join() {
        Ok(stats) => println!(
            "📊 {} key taps, {} clicks, {} failures",
            stats.taps, stats.clicks, stats.failures
        ),
        Err(_) => tracing::error!("Dispatch thread panicked"),
    }

    println!("👋 keycat has exited.");
    Ok(())
}

#[cfg(not(windows))]
fn run(
    _settings: Settings,
    _receiver: Arc<dyn EventReceiver>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::error!("Global input hooks are only available on Windows");
    Err("unsupported platform".into())
}
