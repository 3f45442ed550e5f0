//! Host objects a scene can contain.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::info;
use uevent::{ObjectType, TypeBuilder};

#[derive(ObjectType)]
#[object(methods = Door::methods)]
pub struct Door {
    name: String,
    open: AtomicBool,
}

impl Door {
    pub fn new(name: impl Into<String>, open: bool) -> Self {
        Self {
            name: name.into(),
            open: AtomicBool::new(open),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn set_open(&self, open: bool) {
        let was = self.open.swap(open, Ordering::Relaxed);
        if was != open {
            info!("Door {} {}", self.name, if open { "opens" } else { "closes" });
        }
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder
            .method0("open", |door: &Self| door.set_open(true))
            .method0("close", |door: &Self| door.set_open(false))
            .method1("set_open", |door: &Self, open: bool| door.set_open(open));
    }
}

#[derive(ObjectType)]
#[object(methods = Lamp::methods)]
pub struct Lamp {
    name: String,
    intensity: Mutex<f32>,
}

impl Lamp {
    pub fn new(name: impl Into<String>, intensity: f32) -> Self {
        Self {
            name: name.into(),
            intensity: Mutex::new(intensity),
        }
    }

    pub fn intensity(&self) -> f32 {
        *self.intensity.lock()
    }

    fn set_intensity(&self, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        *self.intensity.lock() = intensity;
        info!("Lamp {} at {:.0}%", self.name, intensity * 100.0);
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder
            .method1("set_intensity", |lamp: &Self, intensity: f32| {
                lamp.set_intensity(intensity);
            })
            .method0("toggle", |lamp: &Self| {
                let next = if lamp.intensity() > 0.0 { 0.0 } else { 1.0 };
                lamp.set_intensity(next);
            });
    }
}

/// Says things; keeps a transcript.
#[derive(ObjectType)]
#[object(methods = Speaker::methods)]
pub struct Speaker {
    name: String,
    transcript: Mutex<Vec<String>>,
}

impl Speaker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().clone()
    }

    fn say(&self, line: String) {
        info!("{} says: {}", self.name, line);
        self.transcript.lock().push(line);
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder
            .method1("say", |speaker: &Self, line: String| speaker.say(line))
            .method1("greet", |speaker: &Self, visitor: String| {
                speaker.say(format!("Welcome, {visitor}"));
            })
            .object_method::<Door, _>("announce", |speaker: &Self, door: Option<&Door>| {
                let line = door.map_or_else(
                    || "Nothing to announce".to_owned(),
                    |door| {
                        let state = if door.is_open() { "open" } else { "closed" };
                        format!("The {} door is {state}", door.name())
                    },
                );
                speaker.say(line);
            });
    }
}
