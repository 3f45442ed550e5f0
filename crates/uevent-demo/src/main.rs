//! Scene event runner
//!
//! This binary:
//! 1. Loads a scene of host objects and persistent listeners
//! 2. Reports listeners that will not resolve
//! 3. Fires the scene's events once each and optionally saves the result
//!
//! Environment:
//! - `UEVENT_SCENE` - Scene file (default: the bundled lobby scene)
//! - `UEVENT_PLAYING` - `false` to run like an editor: only `EditorAndRuntime` listeners fire
//! - `UEVENT_VISITOR` - Name passed to `on_enter`
//! - `UEVENT_SAVE` - Where to write the scene afterwards

mod objects;
mod scene;

use std::path::PathBuf;

use tracing::info;
use uevent::{Action1, Runtime};

use crate::scene::Scene;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uevent_demo=info".parse()?)
                .add_directive("uevent=info".parse()?),
        )
        .init();

    let scene_path = std::env::var("UEVENT_SCENE").map_or_else(
        |_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/lobby.json")),
        PathBuf::from,
    );
    let playing = std::env::var("UEVENT_PLAYING")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(true);
    let visitor = std::env::var("UEVENT_VISITOR").unwrap_or_else(|_| "Ada".to_owned());

    let runtime = Runtime::builder().with_inventory().playing(playing).shared();
    info!(
        "Runtime has {} object types, playing: {}",
        runtime.types().len(),
        playing
    );

    let mut scene = Scene::load(&scene_path, &runtime)?;
    scene.report();

    // Runtime listeners run after the persistent ones and are never saved.
    scene
        .events_mut()
        .on_enter
        .add_listener(Action1::<String>::new(|visitor: String| {
            info!("{} entered the scene", visitor);
        }));

    let events = scene.events_mut();
    events.on_enter.invoke(visitor)?;
    events.on_power.invoke(0.6)?;
    events.on_reset.invoke()?;

    if let Ok(path) = std::env::var("UEVENT_SAVE") {
        scene.save(&PathBuf::from(path))?;
    }

    Ok(())
}
