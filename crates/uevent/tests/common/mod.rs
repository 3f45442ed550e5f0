//! Host objects shared by the integration tests.

use std::sync::Arc;

use parking_lot::Mutex;
use uevent::{ObjectRef, ObjectType, Runtime, TypeBuilder};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn lines(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// A runtime holding every derived type, independent of the global one.
pub fn runtime() -> Arc<Runtime> {
    Runtime::builder().with_inventory().shared()
}

/// Writes one line per call into a shared log, prefixed with its name.
#[derive(ObjectType)]
#[object(methods = Recorder::methods)]
pub struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }

    fn push(&self, line: impl AsRef<str>) {
        self.log.lock().push(format!("{}:{}", self.name, line.as_ref()));
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder
            .method0("ping", |recorder: &Self| recorder.push("ping"))
            .method1("int", |recorder: &Self, value: i32| {
                recorder.push(format!("int {value}"));
            })
            .method1("float", |recorder: &Self, value: f32| {
                recorder.push(format!("float {value}"));
            })
            .method1("text", |recorder: &Self, value: String| {
                recorder.push(format!("text {value}"));
            })
            .method1("flag", |recorder: &Self, value: bool| {
                recorder.push(format!("flag {value}"));
            })
            .method2("pair", |recorder: &Self, n: i32, s: String| {
                recorder.push(format!("pair {n} {s}"));
            })
            .method3("triple", |recorder: &Self, a: i32, b: f32, c: bool| {
                recorder.push(format!("triple {a} {b} {c}"));
            })
            .method4("quad", |recorder: &Self, a: u8, b: u8, c: u8, d: u8| {
                recorder.push(format!("quad {a}{b}{c}{d}"));
            })
            .object_ref_method::<Light, _>("shine", |recorder: &Self, light: &ObjectRef| {
                let kind = light
                    .get()
                    .map_or("none", |instance| instance.type_name());
                recorder.push(format!("shine {kind}"));
            })
            .object_method::<Light, _>("dim", |recorder: &Self, light: Option<&Light>| {
                let intensity = light.map(Light::intensity);
                recorder.push(format!("dim {intensity:?}"));
            });
    }
}

#[derive(ObjectType)]
#[object(methods = Light::methods)]
pub struct Light {
    intensity: Mutex<f32>,
}

impl Light {
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity: Mutex::new(intensity),
        }
    }

    pub fn intensity(&self) -> f32 {
        *self.intensity.lock()
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder.method1("set_intensity", |light: &Self, value: f32| {
            *light.intensity.lock() = value;
        });
    }
}

/// A light with a cone; binds wherever a `Light` is expected.
#[derive(ObjectType)]
#[object(methods = Spot::methods)]
pub struct Spot {
    light: Light,
    angle: f32,
}

impl Spot {
    pub fn new(intensity: f32, angle: f32) -> Self {
        Self {
            light: Light::new(intensity),
            angle,
        }
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    fn methods(builder: &mut TypeBuilder<Self>) {
        builder.inherit::<Light>(Self::light);
    }
}
