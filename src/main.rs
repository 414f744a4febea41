use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::{
    flush_thread_buffer, init_thread_stream, unregister_thread_stream,
};
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::{info, warn};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

fn main() -> AppExit {
    // Spans need MICROMEGAS_ENABLE_CPU_TRACING=true; logs and metrics always flow.
    let _telemetry_guard = match TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize telemetry: {e}");
            return AppExit::error();
        }
    };

    info!("adventure starting");

    // Bevy logs through `tracing`; capture them into the telemetry sink.
    // Must be installed before the app starts.
    let subscriber = Registry::default().with(TracingCaptureLayer {
        max_level: LevelFilter::Info,
    });
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        warn!("tracing subscriber not installed: {e}");
    }

    // Worker threads need their own telemetry streams. The pool must exist
    // before App::new() so that TaskPoolPlugin keeps it.
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                unregister_thread_stream();
            })
            .build()
    });

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Adventure".to_string(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(adventure::AdventurePlugin)
        .run()
}
