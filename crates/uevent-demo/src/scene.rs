//! Scene files: host objects plus the events wired between them.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uevent::{
    Event0, Event1, EventBase, InstanceId, ListenerStatus, ObjectRef, Objects, Runtime,
};

use crate::objects::{Door, Lamp, Speaker};

/// One saved host object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SavedObject {
    Door {
        id: InstanceId,
        name: String,
        #[serde(default)]
        open: bool,
    },
    Lamp {
        id: InstanceId,
        name: String,
        #[serde(default)]
        intensity: f32,
    },
    Speaker {
        id: InstanceId,
        name: String,
    },
}

impl SavedObject {
    pub fn id(&self) -> InstanceId {
        match self {
            Self::Door { id, .. } | Self::Lamp { id, .. } | Self::Speaker { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Door { name, .. } | Self::Lamp { name, .. } | Self::Speaker { name, .. } => {
                name.as_str()
            }
        }
    }

    fn spawn(&self, objects: &mut Objects) {
        match self {
            Self::Door { id, name, open } => {
                objects.spawn_with_id(*id, Door::new(name.clone(), *open));
            }
            Self::Lamp {
                id,
                name,
                intensity,
            } => {
                objects.spawn_with_id(*id, Lamp::new(name.clone(), *intensity));
            }
            Self::Speaker { id, name } => {
                objects.spawn_with_id(*id, Speaker::new(name.clone()));
            }
        }
    }

    /// Copy live state back in before saving.
    fn refresh(&mut self, objects: &Objects) {
        let Some(object) = objects.get(self.id()) else {
            return;
        };
        match self {
            Self::Door { open, .. } => {
                if let Some(now) = object.with(Door::is_open) {
                    *open = now;
                }
            }
            Self::Lamp { intensity, .. } => {
                if let Some(now) = object.with(Lamp::intensity) {
                    *intensity = now;
                }
            }
            Self::Speaker { .. } => {}
        }
    }
}

/// The events a scene exposes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneEvents {
    /// A visitor walks in; receives the visitor's name.
    pub on_enter: Event1<String>,
    /// Mains power changes; receives the new level.
    pub on_power: Event1<f32>,
    pub on_reset: Event0,
}

impl SceneEvents {
    fn bases_mut(&mut self) -> [(&'static str, &mut EventBase); 3] {
        [
            ("on_enter", self.on_enter.base_mut()),
            ("on_power", self.on_power.base_mut()),
            ("on_reset", self.on_reset.base_mut()),
        ]
    }

    fn bases(&self) -> [(&'static str, &EventBase); 3] {
        [
            ("on_enter", self.on_enter.base()),
            ("on_power", self.on_power.base()),
            ("on_reset", self.on_reset.base()),
        ]
    }
}

#[derive(Deserialize)]
struct SceneFile {
    objects: Vec<SavedObject>,
    #[serde(default)]
    events: SceneEvents,
}

#[derive(Serialize)]
struct SceneFileRef<'a> {
    objects: &'a [SavedObject],
    events: &'a SceneEvents,
}

/// A persistent listener that will not fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenListener {
    pub event: &'static str,
    pub index: usize,
    pub method: String,
    pub status: ListenerStatus,
}

/// A loaded scene.
pub struct Scene {
    objects: Objects,
    saved: Vec<SavedObject>,
    events: SceneEvents,
}

impl Scene {
    /// Parse a scene and bind its events to freshly spawned objects.
    pub fn from_json(json: &str, runtime: &Arc<Runtime>) -> eyre::Result<Self> {
        let file: SceneFile = serde_json::from_str(json).wrap_err("Malformed scene")?;

        let mut objects = Objects::new();
        for saved in &file.objects {
            if saved.id().get() <= 0 {
                eyre::bail!("Invalid object id {} ({})", saved.id(), saved.name());
            }
            if objects.contains(saved.id()) {
                eyre::bail!("Duplicate object id {} ({})", saved.id(), saved.name());
            }
            saved.spawn(&mut objects);
        }

        let mut events = file.events;
        for (name, event) in events.bases_mut() {
            event.set_runtime(Arc::clone(runtime));
            event.on_after_deserialize(&objects);
            debug!(
                "Loaded {} with {} persistent listeners",
                name,
                event.persistent_event_count()
            );
        }

        Ok(Self {
            objects,
            saved: file.objects,
            events,
        })
    }

    pub fn load(path: &Path, runtime: &Arc<Runtime>) -> eyre::Result<Self> {
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read scene {}", path.display()))?;
        let scene = Self::from_json(&json, runtime)?;
        info!(
            "Loaded scene {} ({} objects)",
            path.display(),
            scene.objects.len()
        );
        Ok(scene)
    }

    pub fn to_json(&mut self) -> eyre::Result<String> {
        for saved in &mut self.saved {
            saved.refresh(&self.objects);
        }
        let file = SceneFileRef {
            objects: &self.saved,
            events: &self.events,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn save(&mut self, path: &Path) -> eyre::Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!("Saved scene to {}", path.display());
        Ok(())
    }

    pub fn events(&self) -> &SceneEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut SceneEvents {
        &mut self.events
    }

    pub fn objects_mut(&mut self) -> &mut Objects {
        &mut self.objects
    }

    /// Reference to the object called `name`.
    pub fn object(&self, name: &str) -> Option<ObjectRef> {
        let saved = self.saved.iter().find(|saved| saved.name() == name)?;
        self.objects.get(saved.id())
    }

    /// Every persistent listener that does not currently resolve.
    pub fn broken_listeners(&self) -> Vec<BrokenListener> {
        let mut broken = Vec::new();
        for (name, event) in self.events.bases() {
            for index in 0..event.persistent_event_count() {
                let Some(status) = event.listener_status(index) else {
                    continue;
                };
                if !status.is_valid() {
                    broken.push(BrokenListener {
                        event: name,
                        index,
                        method: event
                            .persistent_method_name(index)
                            .unwrap_or_default()
                            .to_owned(),
                        status,
                    });
                }
            }
        }
        broken
    }

    /// Log every event and the listeners that will not fire.
    pub fn report(&self) {
        for (name, event) in self.events.bases() {
            info!(
                "{}: {} persistent listeners, signature {:?}",
                name,
                event.persistent_event_count(),
                event.parameter_types()
            );
        }
        for listener in self.broken_listeners() {
            warn!(
                "{}[{}] {:?} will not fire: {}",
                listener.event, listener.index, listener.method, listener.status
            );
        }
    }
}
