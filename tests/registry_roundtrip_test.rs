//! Save/load behaviour of a registry against a real backing file.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use livevar::{
    Color, ManualWatch, Quat, Registry, RegistryError, Var, VarBuilder, Vec2, Vec3, Vec4,
};
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    watch: Arc<ManualWatch>,
    registry: Arc<Registry>,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("live_vars.json");
    let watch = Arc::new(ManualWatch::new());
    let registry = Registry::with_watch(watch.clone());
    registry.set_filepath(&path).unwrap();
    Fixture {
        _dir: dir,
        path,
        watch,
        registry,
    }
}

fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn counter<T: livevar::VarType>(var: &Var<T>) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    var.set_callback(
        move || {
            inner.fetch_add(1, Ordering::SeqCst);
        },
        false,
    );
    hits
}

#[test]
fn test_every_type_survives_save_and_load() {
    let fx = fixture();
    let r = &fx.registry;

    let flag = r.var(true, "flag", "types");
    let count = r.var(-42_i32, "count", "types");
    let ratio = r.var(0.125_f32, "ratio", "types");
    let label = r.var("hello world".to_string(), "label", "types");
    let offset = r.var(Vec2::new(1.5, -2.0), "offset", "types");
    let position = r.var(Vec3::new(1.0, 2.0, 3.0), "position", "types");
    let weights = r.var(Vec4::new(0.1, 0.2, 0.3, 0.4), "weights", "types");
    let rotation = r.var(Quat::from_xyzw(0.0, 0.6, 0.0, 0.8), "rotation", "types");
    let tint = r.var(Color::new(0.25, 0.5, 1.0), "tint", "types");
    r.save().unwrap();

    flag.set(false);
    count.set(0);
    ratio.set(9.0);
    label.set(String::new());
    offset.set(Vec2::ZERO);
    position.set(Vec3::ZERO);
    weights.set(Vec4::ZERO);
    rotation.set(Quat::IDENTITY);
    tint.set(Color::BLACK);

    let report = r.load().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.applied, 9);

    assert!(flag.get());
    assert_eq!(count.get(), -42);
    assert_eq!(ratio.get(), 0.125);
    assert_eq!(label.get(), "hello world");
    assert_eq!(offset.get(), Vec2::new(1.5, -2.0));
    assert_eq!(position.get(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(weights.get(), Vec4::new(0.1, 0.2, 0.3, 0.4));
    assert_eq!(rotation.get(), Quat::from_xyzw(0.0, 0.6, 0.0, 0.8));
    assert_eq!(tint.get(), Color::new(0.25, 0.5, 1.0));
    assert!(r.is_loaded());
}

#[test]
fn test_saved_document_layout() {
    let fx = fixture();
    let _radius = fx.registry.var(12.5_f32, "radius", "disk");
    let _color = fx.registry.var(Color::new(1.0, 0.0, 0.0), "color", "disk");
    let _speed = VarBuilder::new("speed").register_in(&fx.registry, 3_i32);
    fx.registry.set_version(4);
    fx.registry.save().unwrap();

    let json = read_json(&fx.path);
    assert_eq!(json["disk"]["radius"], "12.5");
    assert_eq!(json["disk"]["color"]["r"], "1");
    assert_eq!(json["disk"]["color"]["g"], "0");
    assert!(json["disk"]["color"].get("a").is_none());
    assert_eq!(json["default"]["speed"], "3");
    assert_eq!(json["version"], "4");
}

#[test]
fn test_duplicate_name_keeps_first_registration() {
    let fx = fixture();
    let first = fx.registry.var(1.0_f32, "radius", "disk");
    let errors = fx.registry.error_count();

    let second = fx.registry.var(2.0_f32, "radius", "disk");
    assert!(first.is_registered());
    assert!(!second.is_registered());
    assert_eq!(fx.registry.error_count(), errors + 1);
    assert_eq!(fx.registry.len(), 1);

    fx.registry.save().unwrap();
    assert_eq!(read_json(&fx.path)["disk"]["radius"], "1");

    let err = VarBuilder::new("radius")
        .group("disk")
        .try_register_in(&fx.registry, 3.0_f32)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate { .. }));
}

#[test]
fn test_parse_failure_changes_nothing() {
    let fx = fixture();
    let radius = fx.registry.var(5.0_f32, "radius", "disk");
    let hits = counter(&radius);

    fs::write(&fx.path, "{ \"disk\": { \"radius\": ").unwrap();
    let err = fx.registry.load().unwrap_err();

    assert!(matches!(err, RegistryError::Document { .. }));
    assert_eq!(radius.get(), 5.0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    // The attempt still counts as a load
    assert!(fx.registry.is_loaded());
}

#[test]
fn test_partial_load_applies_the_rest() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");
    let speed = fx.registry.var(1_i32, "speed", "disk");
    let errors = fx.registry.error_count();

    fs::write(
        &fx.path,
        r#"{ "disk": { "radius": "2.5", "spin": "9", "speed": "7" } }"#,
    )
    .unwrap();
    let report = fx.registry.load().unwrap();

    assert_eq!(radius.get(), 2.5);
    assert_eq!(speed.get(), 7);
    assert_eq!(report.applied, 2);
    assert_eq!(
        report.missing_items,
        vec![("disk".to_string(), "spin".to_string())]
    );
    assert_eq!(fx.registry.error_count(), errors + 1);
}

#[test]
fn test_unknown_group_and_bad_value_are_skipped() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");
    let enabled = fx.registry.var(true, "enabled", "disk");

    fs::write(
        &fx.path,
        r#"{ "ghost": { "x": "1" }, "disk": { "radius": "wide", "enabled": "0" } }"#,
    )
    .unwrap();
    let report = fx.registry.load().unwrap();

    assert_eq!(report.missing_groups, vec!["ghost".to_string()]);
    assert_eq!(
        report.decode_failures,
        vec![("disk".to_string(), "radius".to_string())]
    );
    assert_eq!(radius.get(), 1.0);
    assert!(!enabled.get());
    assert!(fx.registry.is_loaded());
}

#[test]
fn test_load_notifies_even_when_value_is_equal() {
    let fx = fixture();
    let radius = fx.registry.var(3.0_f32, "radius", "disk");
    fx.registry.save().unwrap();
    let hits = counter(&radius);

    fx.registry.load().unwrap();
    fx.registry.load().unwrap();
    radius.set(3.0);

    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_dropped_variable_disappears_from_save() {
    let fx = fixture();
    let _radius = fx.registry.var(1.0_f32, "radius", "disk");
    {
        let _temp = fx.registry.var(1_i32, "temp", "scratch");
        fx.registry.save().unwrap();
        assert!(read_json(&fx.path).get("scratch").is_some());
    }

    fx.registry.save().unwrap();
    let json = read_json(&fx.path);
    assert!(json.get("scratch").is_none());
    assert_eq!(json["disk"]["radius"], "1");
    assert_eq!(fx.registry.group_names(), vec!["disk".to_string()]);
}

#[test]
fn test_file_edit_reloads_through_watch() {
    let fx = fixture();
    let radius = fx.registry.var(0.0_f32, "radius", "disk");
    radius.set(12.5);
    fx.registry.save().unwrap();
    let hits = counter(&radius);

    fs::write(&fx.path, r#"{ "disk": { "radius": "7.0" }, "version": "0" }"#).unwrap();
    assert!(fx.watch.trigger(&fx.path));
    assert!(fx.watch.trigger(&fx.path));
    assert_eq!(fx.registry.pending_reloads(), 2);

    let report = fx.registry.process_reloads().unwrap().expect("reload applied");
    assert_eq!(report.applied, 1);
    assert_eq!(radius.get(), 7.0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(fx.registry.process_reloads().unwrap().is_none());
}

#[test]
fn test_live_off_discards_queued_reloads() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");

    fs::write(&fx.path, r#"{ "disk": { "radius": "4" } }"#).unwrap();
    assert!(fx.watch.trigger(&fx.path));
    fx.registry.set_is_live(false).unwrap();

    assert!(!fx.watch.trigger(&fx.path));
    assert!(fx.registry.process_reloads().unwrap().is_none());
    assert_eq!(radius.get(), 1.0);

    fx.registry.set_is_live(true).unwrap();
    assert!(fx.watch.is_subscribed(&fx.path));
}

#[test]
fn test_unwatch_discards_queued_reloads() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");

    fs::write(&fx.path, r#"{ "disk": { "radius": "4" } }"#).unwrap();
    assert!(fx.watch.trigger(&fx.path));
    fx.registry.unwatch();

    assert!(!fx.watch.is_subscribed(&fx.path));
    assert!(fx.registry.process_reloads().unwrap().is_none());
    assert_eq!(radius.get(), 1.0);
    assert!(fx.registry.is_live());
}

#[test]
fn test_save_requires_existing_file() {
    let fx = fixture();
    let _radius = fx.registry.var(1.0_f32, "radius", "disk");
    fs::remove_file(&fx.path).unwrap();

    let err = fx.registry.save().unwrap_err();
    assert!(matches!(err, RegistryError::MissingBackingFile { .. }));
    assert!(!fx.path.exists());
}

#[test]
fn test_load_of_missing_file_is_skipped() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");
    fs::remove_file(&fx.path).unwrap();

    let report = fx.registry.load().unwrap();
    assert!(report.skipped);
    assert_eq!(radius.get(), 1.0);
}

#[test]
fn test_callback_may_create_variables_during_load() {
    let fx = fixture();
    let radius = fx.registry.var(1.0_f32, "radius", "disk");
    fx.registry.save().unwrap();

    let registry = fx.registry.clone();
    let created = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = created.clone();
    radius.set_callback(
        move || {
            let index = sink.lock().len();
            sink.lock()
                .push(registry.var(index as i32, format!("extra{index}"), "spawned"));
        },
        false,
    );

    fx.registry.load().unwrap();
    assert_eq!(created.lock().len(), 1);
    assert!(fx.registry.contains("spawned", "extra0"));
}

#[test]
fn test_load_races_with_set() {
    let fx = fixture();
    let radius = fx.registry.var(0.0_f32, "radius", "disk");
    fs::write(&fx.path, r#"{ "disk": { "radius": "-1" } }"#).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                fx.registry.load().unwrap();
            }
        });
        scope.spawn(|| {
            for i in 1..=200 {
                radius.set(i as f32);
            }
        });
    });

    let value = radius.get();
    assert!(value == -1.0 || (1.0..=200.0).contains(&value) && value.fract() == 0.0);
    assert_eq!(fx.registry.error_count(), 0);
}

#[test]
fn test_var_converts_into_value() {
    let fx = fixture();
    let radius = fx.registry.var(12.5_f32, "radius", "disk");
    let label = fx.registry.var("title".to_string(), "label", "disk");

    let r: f32 = (&radius).into();
    assert_eq!(r, 12.5);
    assert_eq!(String::from(&label), "title");
}
