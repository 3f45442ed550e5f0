//! Dispatch behavior of typed events with both listener tiers.

mod common;

use std::sync::Arc;

use common::{Light, Log, Recorder, Spot, lines, runtime};
use parking_lot::Mutex;
use uevent::{
    Action0, Action1, Action2, Action3, Action4, CallState, Event0, Event1, Event2, Event3,
    Event4, EventError, ListenerStatus, ObjectRef, Objects, ParamType, Runtime,
};

fn sink(log: &Log, label: &'static str) -> impl Fn(String) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |line| log.lock().push(format!("{label}:{line}"))
}

#[test]
fn test_every_arity_delivers_its_arguments() {
    let log = Log::default();

    let mut e0 = Event0::new();
    let push = sink(&log, "e0");
    e0.add_listener(Action0::new(move || push("fired".into())));
    e0.invoke().unwrap();

    let mut e1 = Event1::<String>::new();
    let push = sink(&log, "e1");
    e1.add_listener(Action1::<String>::new(push));
    e1.invoke("one".into()).unwrap();

    let mut e2 = Event2::<i32, String>::new();
    let push = sink(&log, "e2");
    e2.add_listener(Action2::<i32, String>::new(move |a: i32, b: String| {
        push(format!("{a} {b}"));
    }));
    e2.invoke(2, "two".into()).unwrap();

    let mut e3 = Event3::<i32, f32, bool>::new();
    let push = sink(&log, "e3");
    e3.add_listener(Action3::<i32, f32, bool>::new(move |a: i32, b: f32, c: bool| {
        push(format!("{a} {b} {c}"));
    }));
    e3.invoke(3, 0.5, true).unwrap();

    let mut e4 = Event4::<u8, u8, u8, u8>::new();
    let push = sink(&log, "e4");
    e4.add_listener(Action4::<u8, u8, u8, u8>::new(move |a: u8, b: u8, c: u8, d: u8| {
        push(format!("{a}{b}{c}{d}"));
    }));
    e4.invoke(1, 2, 3, 4).unwrap();

    assert_eq!(
        lines(&log),
        vec!["e0:fired", "e1:one", "e2:2 two", "e3:3 0.5 true", "e4:1234"]
    );
}

#[test]
fn test_event_defined_listeners_for_every_arity() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut e2 = Event2::<i32, String>::with_runtime(Arc::clone(&runtime));
    let pair = runtime.action::<(i32, String)>(&target, "pair").unwrap();
    assert!(e2.add_persistent(&pair, CallState::RuntimeOnly).unwrap());

    let mut e3 = Event3::<i32, f32, bool>::with_runtime(Arc::clone(&runtime));
    let triple = runtime.action::<(i32, f32, bool)>(&target, "triple").unwrap();
    assert!(e3.add_persistent(&triple, CallState::RuntimeOnly).unwrap());

    let mut e4 = Event4::<u8, u8, u8, u8>::with_runtime(Arc::clone(&runtime));
    let quad = runtime.action::<(u8, u8, u8, u8)>(&target, "quad").unwrap();
    assert!(e4.add_persistent(&quad, CallState::RuntimeOnly).unwrap());

    e2.invoke(7, "seven".into()).unwrap();
    e3.invoke(-1, 1.5, false).unwrap();
    e4.invoke(9, 8, 7, 6).unwrap();

    assert_eq!(
        lines(&log),
        vec!["r:pair 7 seven", "r:triple -1 1.5 false", "r:quad 9876"]
    );
}

#[test]
fn test_persistent_listeners_run_before_runtime_listeners() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let p1 = ObjectRef::new(&objects.spawn(Recorder::new("p1", &log)));
    let p2 = ObjectRef::new(&objects.spawn(Recorder::new("p2", &log)));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));

    // Runtime listeners first, to show that order is by tier, not by insertion.
    let push = sink(&log, "r1");
    event.add_listener(Action1::<i32>::new(move |n: i32| push(n.to_string())));
    let push = sink(&log, "r2");
    event.add_listener(Action1::<i32>::new(move |n: i32| push(n.to_string())));

    for target in [&p1, &p2] {
        let action = runtime.action::<(i32,)>(target, "int").unwrap();
        event.add_persistent(&action, CallState::RuntimeOnly).unwrap();
    }

    event.invoke(5).unwrap();
    assert_eq!(lines(&log), vec!["p1:int 5", "p2:int 5", "r1:5", "r2:5"]);
}

#[test]
fn test_remove_listener_only_touches_runtime_tier() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));
    let action = runtime.action::<(i32,)>(&target, "int").unwrap();
    event.add_persistent(&action, CallState::RuntimeOnly).unwrap();
    event.add_listener(action.clone());

    event.invoke(1).unwrap();
    assert_eq!(lines(&log), vec!["r:int 1", "r:int 1"]);

    assert_eq!(event.remove_listener(&action), 1);
    assert_eq!(event.remove_listener(&action), 0);
    assert_eq!(event.persistent_event_count(), 1);

    event.invoke(2).unwrap();
    assert_eq!(lines(&log), vec!["r:int 1", "r:int 1", "r:int 2"]);
}

#[test]
fn test_remove_all_listeners_keeps_persistent_records() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    let ping = runtime.action::<()>(&target, "ping").unwrap();
    event.add_persistent(&ping, CallState::RuntimeOnly).unwrap();
    let push = sink(&log, "closure");
    event.add_listener(Action0::new(move || push("hit".into())));

    event.remove_all_listeners();
    event.invoke().unwrap();
    assert_eq!(lines(&log), vec!["r:ping"]);
}

#[test]
fn test_zero_listeners() {
    let mut event = Event2::<i32, String>::with_runtime(runtime());
    assert!(event.prepare_invoke().is_empty());
    event.invoke(1, "nobody".into()).unwrap();
    assert_eq!(event.persistent_event_count(), 0);
}

#[test]
fn test_callback_needs_persistent_listeners() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("p", &log)));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));
    let push = sink(&log, "r");
    event.add_listener(Action1::<i32>::new(move |n: i32| push(n.to_string())));
    assert!(event.to_callback().is_none());

    let int = runtime.action::<(i32,)>(&target, "int").unwrap();
    event.add_persistent(&int, CallState::RuntimeOnly).unwrap();
    let callback = event.to_callback().unwrap();
    assert!(callback.is_static());

    callback.call((3,)).unwrap();
    assert_eq!(lines(&log), vec!["p:int 3", "r:3"]);

    // The callback keeps the listeners it was built with.
    event.remove_all_listeners();
    callback.call((4,)).unwrap();
    assert_eq!(lines(&log), vec!["p:int 3", "r:3", "p:int 4", "r:4"]);
}

#[test]
fn test_cached_arguments_ignore_event_arguments() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));
    let int = runtime.action::<(i32,)>(&target, "int").unwrap();
    let float = runtime.action::<(f32,)>(&target, "float").unwrap();
    let text = runtime.action::<(String,)>(&target, "text").unwrap();
    let flag = runtime.action::<(bool,)>(&target, "flag").unwrap();
    let ping = runtime.action::<()>(&target, "ping").unwrap();

    assert!(event.add_int_persistent_listener(&int, 42).unwrap());
    assert!(event.add_float_persistent_listener(&float, 0.25).unwrap());
    assert!(event.add_string_persistent_listener(&text, "cached").unwrap());
    assert!(event.add_bool_persistent_listener(&flag, true).unwrap());
    assert!(event.add_void_persistent_listener(&ping).unwrap());

    event.invoke(7).unwrap();
    assert_eq!(
        lines(&log),
        vec![
            "r:int 42",
            "r:float 0.25",
            "r:text cached",
            "r:flag true",
            "r:ping"
        ]
    );
}

#[test]
fn test_object_listener_accepts_subtypes() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));
    let spot = objects.spawn(Spot::new(0.5, 30.0));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    let shine = runtime.object_action::<Light>(&target, "shine").unwrap();
    assert!(
        event
            .add_object_persistent_listener(&shine, ObjectRef::new(&spot))
            .unwrap()
    );

    let calls = event.prepare_invoke();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].signature(), vec![ParamType::object_of::<Spot>()]);

    event.invoke().unwrap();
    assert_eq!(lines(&log), vec!["r:shine Spot"]);
}

#[test]
fn test_object_listener_with_exact_type() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));
    let lamp = objects.spawn(Light::new(0.75));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    let dim = runtime.object_action::<Light>(&target, "dim").unwrap();
    event
        .add_object_persistent_listener(&dim, ObjectRef::new(&lamp))
        .unwrap();
    event.invoke().unwrap();

    // Destroying the argument leaves the listener in place with a dead reference.
    objects.destroy(lamp.id());
    event.invoke().unwrap();

    assert_eq!(lines(&log), vec!["r:dim Some(0.75)", "r:dim None"]);
}

#[test]
fn test_static_listeners_cannot_be_persisted() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let handle = objects.spawn(Recorder::new("r", &log));

    let mut event = Event0::with_runtime(runtime);
    event.add_persistent_listener();

    let free = Action0::new(|| {});
    let err = event.register_persistent_listener(0, &free).unwrap_err();
    assert!(matches!(err, EventError::StaticListener(_)));
    let err = event.register_void_persistent_listener(0, &free).unwrap_err();
    assert!(matches!(err, EventError::StaticListener(_)));

    // A closure over an object has a target but no method to persist.
    let bound = Action0::bound(&handle, |_: &Recorder| {});
    let err = event.register_void_persistent_listener(0, &bound).unwrap_err();
    assert!(matches!(err, EventError::NullArgument("method")));

    assert_eq!(event.persistent_event_count(), 1);
    assert_eq!(event.persistent_method_name(0), Some(""));
    assert!(event.persistent_target(0).is_some_and(ObjectRef::is_null));
    assert_eq!(event.listener_status(0), Some(ListenerStatus::Empty));
}

#[test]
fn test_unresolvable_registration_leaves_record_untouched() {
    let known = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));
    let ping = known.action::<()>(&target, "ping").unwrap();

    // The event's runtime has never heard of `Recorder`.
    let mut event = Event0::with_runtime(Runtime::builder().shared());
    assert!(!event.add_void_persistent_listener(&ping).unwrap());
    assert_eq!(event.persistent_event_count(), 1);
    assert_eq!(event.persistent_method_name(0), Some(""));

    event.invoke().unwrap();
    assert!(lines(&log).is_empty());
}

#[test]
fn test_out_of_range_index_fails_before_method_lookup() {
    let known = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));
    let ping = known.action::<()>(&target, "ping").unwrap();

    // Nothing resolves here, so only the index check can fail.
    let mut event = Event0::with_runtime(Runtime::builder().shared());
    let err = event.register_void_persistent_listener(0, &ping).unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 0, count: 0 }));

    event.add_persistent_listener();
    let err = event.register_void_persistent_listener(3, &ping).unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 3, count: 1 }));
    let err = event
        .register_event_persistent_listener(1, &target, "ping")
        .unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 1, count: 1 }));
    let err = event.register_persistent_listener(1, &ping).unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 1, count: 1 }));

    // A static call at a bad index reports the index.
    let free = Action0::new(|| {});
    let err = event.register_void_persistent_listener(2, &free).unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 2, count: 1 }));

    assert!(!event.register_void_persistent_listener(0, &ping).unwrap());
}

#[test]
fn test_destroyed_target_cannot_be_registered() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let handle = objects.spawn(Recorder::new("r", &log));
    let target = ObjectRef::new(&handle);
    let ping = runtime.action::<()>(&target, "ping").unwrap();
    objects.destroy(handle.id());

    let mut event = Event0::with_runtime(runtime);
    let err = event.add_void_persistent_listener(&ping).unwrap_err();
    assert!(matches!(err, EventError::InvalidTarget { .. }));
}

#[test]
fn test_destroyed_target_is_skipped_and_dispatch_continues() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let first = objects.spawn(Recorder::new("first", &log));
    let second = objects.spawn(Recorder::new("second", &log));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));
    for handle in [&first, &second] {
        let action = runtime
            .action::<(i32,)>(&ObjectRef::new(handle), "int")
            .unwrap();
        event.add_persistent(&action, CallState::RuntimeOnly).unwrap();
    }
    let push = sink(&log, "bound");
    event.add_listener(Action1::<i32>::bound(&first, move |_: &Recorder, n: i32| {
        push(n.to_string());
    }));

    // Resolve while both are alive, then destroy one.
    event.prepare_invoke();
    objects.destroy(first.id());

    event.invoke(3).unwrap();
    assert_eq!(lines(&log), vec!["second:int 3"]);
    assert_eq!(
        event.listener_status(0),
        Some(ListenerStatus::MissingTarget)
    );
    assert!(event.is_persistent_listener_valid(1));
}

#[test]
fn test_off_listeners_never_fire() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    let ping = runtime.action::<()>(&target, "ping").unwrap();
    event.add_persistent(&ping, CallState::Off).unwrap();

    assert!(event.prepare_invoke().is_empty());
    event.invoke().unwrap();
    assert!(lines(&log).is_empty());

    event
        .set_persistent_listener_state(0, CallState::RuntimeOnly)
        .unwrap();
    event.invoke().unwrap();
    assert_eq!(lines(&log), vec!["r:ping"]);

    let err = event
        .set_persistent_listener_state(4, CallState::Off)
        .unwrap_err();
    assert!(matches!(err, EventError::IndexOutOfRange { index: 4, count: 1 }));
}

#[test]
fn test_runtime_only_listeners_wait_for_play() {
    let runtime = Runtime::builder().with_inventory().playing(false).shared();
    let log = Log::default();
    let mut objects = Objects::new();
    let runtime_only = ObjectRef::new(&objects.spawn(Recorder::new("runtime", &log)));
    let always = ObjectRef::new(&objects.spawn(Recorder::new("always", &log)));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    let ping = runtime.action::<()>(&runtime_only, "ping").unwrap();
    event.add_persistent(&ping, CallState::RuntimeOnly).unwrap();
    let ping = runtime.action::<()>(&always, "ping").unwrap();
    event.add_persistent(&ping, CallState::EditorAndRuntime).unwrap();

    event.invoke().unwrap();
    assert_eq!(lines(&log), vec!["always:ping"]);

    // Play state is read when persistent calls are rebuilt.
    runtime.set_playing(true);
    event.dirty_persistent_calls();
    event.invoke().unwrap();
    assert_eq!(
        lines(&log),
        vec!["always:ping", "runtime:ping", "always:ping"]
    );
}

#[test]
fn test_erased_invoke_checks_arguments() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event2::<i32, String>::with_runtime(Arc::clone(&runtime));
    let pair = runtime.action::<(i32, String)>(&target, "pair").unwrap();
    event.add_persistent(&pair, CallState::RuntimeOnly).unwrap();

    let n = 1_i32;
    let err = event.invoke_erased(&[&n]).unwrap_err();
    assert!(matches!(
        err,
        EventError::ArgumentCount {
            expected: 2,
            actual: 1
        }
    ));

    let err = event.invoke_erased(&[&n, &n]).unwrap_err();
    assert!(matches!(err, EventError::ArgumentType { index: 1, .. }));

    let s = String::from("ok");
    event.invoke_erased(&[&n, &s]).unwrap();
    assert_eq!(lines(&log), vec!["r:pair 1 ok"]);
}

#[test]
fn test_remove_persistent_listeners_by_target_and_name() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let a = ObjectRef::new(&objects.spawn(Recorder::new("a", &log)));
    let b = ObjectRef::new(&objects.spawn(Recorder::new("b", &log)));

    let mut event = Event0::with_runtime(Arc::clone(&runtime));
    for target in [&a, &b, &a] {
        let ping = runtime.action::<()>(target, "ping").unwrap();
        event.add_persistent(&ping, CallState::RuntimeOnly).unwrap();
    }
    event.invoke().unwrap();

    assert_eq!(event.remove_persistent_listeners(&ObjectRef::null(), "ping"), 0);
    assert_eq!(event.remove_persistent_listeners(&a, ""), 0);
    assert_eq!(event.remove_persistent_listeners(&a, "ping"), 2);
    assert_eq!(event.persistent_event_count(), 1);

    event.invoke().unwrap();
    assert_eq!(lines(&log), vec!["a:ping", "b:ping", "a:ping", "b:ping"]);
}

#[test]
fn test_unregister_keeps_record_slot() {
    let runtime = runtime();
    let log = Log::default();
    let mut objects = Objects::new();
    let target = ObjectRef::new(&objects.spawn(Recorder::new("r", &log)));

    let mut event = Event1::<i32>::with_runtime(Arc::clone(&runtime));
    let int = runtime.action::<(i32,)>(&target, "int").unwrap();
    event.add_int_persistent_listener(&int, 9).unwrap();
    event.unregister_persistent_listener(0).unwrap();

    assert_eq!(event.persistent_event_count(), 1);
    assert_eq!(event.listener_status(0), Some(ListenerStatus::Empty));
    event.invoke(1).unwrap();
    assert!(lines(&log).is_empty());

    let removed = event.remove_persistent_listener(0).unwrap();
    assert_eq!(removed.arguments().int_argument(), 9);
    assert!(event.remove_persistent_listener(0).is_err());
}

#[test]
fn test_global_runtime_knows_derived_types() {
    let global = Runtime::global();
    let types = global.types();

    assert!(types.get_by_name("Recorder").is_some());
    let spot = types.get_by_name("Spot").unwrap();
    assert!(
        types
            .find_method(
                spot.type_id(),
                "set_intensity",
                &[ParamType::of::<f32>()]
            )
            .is_some()
    );
    assert!(types.is_assignable(spot.type_id(), core::any::TypeId::of::<Light>()));
}

#[test]
fn test_bound_closure_listener() {
    let mut objects = Objects::new();
    let handle = objects.spawn(Light::new(1.0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut event = Event1::<f32>::new();
    let sink = Arc::clone(&seen);
    event.add_listener(Action1::<f32>::bound(&handle, move |light: &Light, scale: f32| {
        sink.lock().push(light.intensity() * scale);
    }));

    event.invoke(0.5).unwrap();
    objects.destroy(handle.id());
    event.invoke(2.0).unwrap();

    assert_eq!(*seen.lock(), vec![0.5]);
}
