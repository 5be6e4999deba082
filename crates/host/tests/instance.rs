use ferris_host::{
    FieldStore, HostConfig, LoadError, NodeRef, PropertyError, PropertyMap, ReloadPolicy, ScriptInstance, Stage, Value,
    Vector2,
};
use ferris_runtime::RuntimeErrorKind;
use parking_lot::Mutex;
use std::sync::Arc;

const COUNTER: &str = "let mut counter: f32 = 1.0;
fn _process(delta: f32) {
    counter += 1.0;
}
";

#[test]
fn test_state_persists_across_dispatches() {
    let instance = ScriptInstance::load(COUNTER, FieldStore::new(), HostConfig::default()).unwrap();
    for _ in 0..5 {
        instance.dispatch("_process", &[Value::Float(0.016)]).unwrap();
    }
    assert_eq!(instance.global("counter"), Some(Value::Float(6.0)));
}

#[test]
fn test_immutable_assignment_rejected_at_load() {
    let src = "let counter = 0;\nfn _process(delta: f32) { counter += 1; }";
    let err = ScriptInstance::load(src, FieldStore::new(), HostConfig::default()).unwrap_err();
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].stage, Stage::TypeCheck);
    assert_eq!(diagnostics[0].code, "E303");
}

#[test]
fn test_missing_getter_names_field() {
    let instance = ScriptInstance::load(
        "fn _ready() { let hp = self.health; }",
        PropertyMap::new(),
        HostConfig::default(),
    )
    .unwrap();
    let err = instance.dispatch("_ready", &[]).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Property(PropertyError::NoGetter("health".to_string())));
    assert!(err.to_string().contains("health"));
}

#[test]
fn test_vector_property_round_trip() {
    let position = Arc::new(Mutex::new(Vector2::new(1.0, 1.0)));
    let (read, write) = (position.clone(), position.clone());
    let host = PropertyMap::new()
        .getter("position", move || Value::Vector2(*read.lock()))
        .setter("position", move |value| {
            *write.lock() = Vector2::try_from(value).map_err(|err| PropertyError::Rejected {
                name: "position".to_string(),
                reason: err.to_string(),
            })?;
            Ok(())
        });
    let src = "fn _process(delta: f32) {
    self.position = self.position + vec2(1.0, 0.0) * delta;
    self.position.y *= 2.0;
}";
    let instance = ScriptInstance::load(src, host, HostConfig::default()).unwrap();
    instance.dispatch("_process", &[Value::Float(2.0)]).unwrap();
    assert_eq!(*position.lock(), Vector2::new(3.0, 2.0));
    assert_eq!(instance.get_property("position"), Ok(Value::Vector2(Vector2::new(3.0, 2.0))));

    instance.set_property("position", Vector2::ZERO).unwrap();
    assert_eq!(*position.lock(), Vector2::ZERO);
}

#[test]
fn test_integer_literal_range() {
    let instance = ScriptInstance::load(
        "let low = -2147483647 - 1;\nlet high = 2147483647;",
        FieldStore::new(),
        HostConfig::default(),
    )
    .unwrap();
    assert_eq!(instance.global("low"), Some(Value::Int(i32::MIN)));
    assert_eq!(instance.global("high"), Some(Value::Int(i32::MAX)));

    let err = ScriptInstance::load("let low = -2147483648;", FieldStore::new(), HostConfig::default()).unwrap_err();
    assert_eq!(err.diagnostics()[0].stage, Stage::Lex);
    assert_eq!(err.diagnostics()[0].code, "E104");
}

#[test]
fn test_bare_self_is_the_host_node() {
    let host = PropertyMap::with_node(NodeRef { node: 7 });
    let instance = ScriptInstance::load("fn owner() -> Node { return self; }", host, HostConfig::default()).unwrap();
    assert_eq!(instance.dispatch("owner", &[]), Ok(Value::Node(NodeRef { node: 7 })));
}

#[test]
fn test_failed_reload_keeps_old_script() {
    let instance = ScriptInstance::load(COUNTER, FieldStore::new(), HostConfig::default()).unwrap();
    instance.dispatch("_process", &[Value::Float(0.1)]).unwrap();

    let err = instance.reload("fn _process(delta: f32) { let x: i32 = true; }").unwrap_err();
    assert!(matches!(err, LoadError::Compile(_)));
    let err = instance.reload("let broken = 1 / 0;\nfn _process(delta: f32) {}").unwrap_err();
    assert!(matches!(err, LoadError::Initialize(_)));

    instance.dispatch("_process", &[Value::Float(0.1)]).unwrap();
    assert_eq!(instance.global("counter"), Some(Value::Float(3.0)));
}

#[test]
fn test_reload_policies() {
    let edited = "let mut counter: f32 = 100.0;\nfn _process(delta: f32) { counter -= 1.0; }";

    let reset = ScriptInstance::load(COUNTER, FieldStore::new(), HostConfig::default()).unwrap();
    reset.dispatch("_process", &[Value::Float(0.1)]).unwrap();
    reset.reload(edited).unwrap();
    assert_eq!(reset.global("counter"), Some(Value::Float(100.0)));

    let config = HostConfig { reload_policy: ReloadPolicy::Preserve, ..HostConfig::default() };
    let preserve = ScriptInstance::load(COUNTER, FieldStore::new(), config).unwrap();
    preserve.dispatch("_process", &[Value::Float(0.1)]).unwrap();
    preserve.reload(edited).unwrap();
    assert_eq!(preserve.global("counter"), Some(Value::Float(2.0)));
    preserve.dispatch("_process", &[Value::Float(0.1)]).unwrap();
    assert_eq!(preserve.global("counter"), Some(Value::Float(1.0)));
}

#[test]
fn test_failed_dispatch_leaves_state_consistent() {
    let src = "let mut hp = 10;
fn damage(amount: i32) {
    hp -= amount;
    if hp < 0 { self.dead = true; }
}";
    let instance = ScriptInstance::load(src, FieldStore::new(), HostConfig::default()).unwrap();
    instance.dispatch("damage", &[Value::Int(4)]).unwrap();
    let err = instance.dispatch("damage", &[Value::Int(20)]).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Property(PropertyError::NoSetter("dead".to_string())));
    assert_eq!(instance.global("hp"), Some(Value::Int(6)));
}

#[test]
fn test_instances_are_independent_across_threads() {
    let instances: Vec<_> = (0..4)
        .map(|_| Arc::new(ScriptInstance::load(COUNTER, FieldStore::new(), HostConfig::default()).unwrap()))
        .collect();

    let handles: Vec<_> = instances
        .iter()
        .enumerate()
        .map(|(i, instance)| {
            let instance = Arc::clone(instance);
            std::thread::spawn(move || {
                for _ in 0..=i {
                    instance.dispatch("_process", &[Value::Float(0.016)]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (i, instance) in instances.iter().enumerate() {
        assert_eq!(instance.global("counter"), Some(Value::Float(2.0 + i as f32)));
    }
}

#[test]
fn test_bounce_demo() {
    let source = include_str!("../../../demos/bounce.ferris");
    let store = FieldStore::from_json(include_str!("../../../demos/bounce.props.json")).unwrap();
    let instance = ScriptInstance::load(source, store, HostConfig::default()).unwrap();
    instance.dispatch("_ready", &[]).unwrap();
    for _ in 0..200 {
        instance.dispatch("_process", &[Value::Float(0.016)]).unwrap();
    }
    assert_eq!(instance.global("bounces"), Some(Value::Int(1)));
    assert_eq!(instance.global("direction"), Some(Value::Float(-1.0)));
    match instance.get_property("position") {
        Ok(Value::Vector2(v)) => assert!(v.x > 0.0 && v.x < 200.0 && v.y == 50.0, "{:?}", v),
        other => panic!("expected a Vector2 position, got {:?}", other),
    }
}
