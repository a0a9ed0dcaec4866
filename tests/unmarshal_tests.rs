//! Integration tests for struct unmarshalling.
//!
//! Loads a realistic layered configuration and binds it into a struct
//! covering every supported conversion.

use layerconf::bind::field_specs;
use layerconf::source::{self, EnvLoader, Loader};
use layerconf::{
    Binder, ConfigError, ErrorCode, FieldError, FieldPolicy, Unmarshal, UnmarshalError, ValueKind,
    load,
};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq)]
struct AppConf {
    debug: bool,
    name: String,
    name1: String,
    multiline: String,
    int: i64,
    float: f64,
    negative_float: f64,
    hex: i64,
    octal: i64,
    binary: i64,
    exp: f64,
    neg_exp: f64,
    b1: bool,
    b2: bool,
    b3: bool,
    b4: bool,
    b5: bool,
    b6: bool,
    b7: bool,
    duration1: Duration,
    duration2: Duration,
}

impl Unmarshal for AppConf {
    fn bind(b: &mut Binder<Self>) {
        b.field("debug", "APPDEBUG", |c| &mut c.debug).default("true");
        b.field("name", "key.name", |c| &mut c.name);
        b.field("name1", "key.name1", |c| &mut c.name1).default("name_f");
        b.field("multiline", "key.multiline", |c| &mut c.multiline);
        b.field("int", "test.int.value", |c| &mut c.int);
        b.field("float", "test.float.value", |c| &mut c.float);
        b.field("negative_float", "test.negative.value", |c| &mut c.negative_float);
        b.field("hex", "test.hex.number", |c| &mut c.hex);
        b.field("octal", "test.octal.number", |c| &mut c.octal);
        b.field("binary", "test.binary.number", |c| &mut c.binary);
        b.field("exp", "test.exponential.number", |c| &mut c.exp);
        b.field("neg_exp", "test.negative.exponential.number", |c| &mut c.neg_exp);
        b.field("b1", "test.bool.value1", |c| &mut c.b1);
        b.field("b2", "test.bool.value2", |c| &mut c.b2);
        b.field("b3", "test.bool.value3", |c| &mut c.b3);
        b.field("b4", "test.bool.value4", |c| &mut c.b4);
        b.field("b5", "test.bool.value5", |c| &mut c.b5);
        b.field("b6", "test.bool.value6", |c| &mut c.b6);
        b.field("b7", "test.bool.value7", |c| &mut c.b7);
        b.field("duration1", "test.duration.value1", |c| &mut c.duration1)
            .default("1h");
        b.field("duration2", "test.duration.value2", |c| &mut c.duration2);
    }
}

const FILE_CONF: &str = r#"
key.name = example
key.multiline = "first line
second line"

test.hex.number = 0xFF
test.octal.number = 0o17
test.binary.number = 0b1011
test.exponential.number = 1e3
test.negative.exponential.number = -2.5e-2

test.bool.value1 = true
test.bool.value2 = 1
test.bool.value3 = yes
test.bool.value4 = On
test.bool.value5 = f
test.bool.value6 = NO
test.bool.value7 = 0

test.duration.value2 = 1h30m
"#;

fn field_failures(err: ConfigError) -> UnmarshalError {
    match err {
        ConfigError::Unmarshal(failures) => failures,
        other => panic!("expected unmarshal error, got {:?}", other),
    }
}

fn loaders(dir: &TempDir) -> Vec<Box<dyn Loader>> {
    let path = dir.path().join("file.conf");
    fs::write(&path, FILE_CONF).unwrap();
    vec![
        source::file(path, true),
        Box::new(EnvLoader::from_vars("app", [("PATH", "/usr/bin")])),
        source::string(
            "\ntest.int.value = 7\ntest.float.value = 3.17\ntest.negative.value = -1.7\n",
        ),
    ]
}

#[test]
fn test_unmarshal_full_struct() {
    let temp = TempDir::new().unwrap();
    let config = load(loaders(&temp)).unwrap();

    let mut conf = AppConf::default();
    config.unmarshal(&mut conf).unwrap();

    assert_eq!(
        conf,
        AppConf {
            debug: true,
            name: "example".to_string(),
            name1: "name_f".to_string(),
            multiline: "first line\nsecond line".to_string(),
            int: 7,
            float: 3.17,
            negative_float: -1.7,
            hex: 255,
            octal: 15,
            binary: 11,
            exp: 1000.0,
            neg_exp: -0.025,
            b1: true,
            b2: true,
            b3: true,
            b4: true,
            b5: false,
            b6: false,
            b7: false,
            duration1: Duration::from_secs(3600),
            duration2: Duration::from_secs(5400),
        }
    );
}

#[test]
fn test_default_is_ignored_when_key_is_set() {
    let config = load([source::string("APPDEBUG = off\ntest.duration.value1 = 5m")]).unwrap();
    let mut conf = AppConf::default();
    config.unmarshal(&mut conf).unwrap();

    assert!(!conf.debug);
    assert_eq!(conf.duration1, Duration::from_secs(300));
    assert_eq!(conf.name1, "name_f");
}

#[test]
fn test_lenient_reports_every_failure_and_keeps_the_rest() {
    let config = load([source::string(
        "test.int.value = seven\ntest.bool.value1 = maybe\nkey.name = ok",
    )])
    .unwrap();
    let mut conf = AppConf {
        int: 99,
        ..AppConf::default()
    };

    let err = config.unmarshal(&mut conf).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidValue);
    let err = field_failures(err);

    assert_eq!(err.failures.len(), 2);
    match err.for_field("int") {
        Some(FieldError::Coercion(coercion)) => {
            assert_eq!(coercion.key, "test.int.value");
            assert_eq!(coercion.kind(), ValueKind::Int);
            assert_eq!(coercion.raw(), "seven");
        }
        other => panic!("expected coercion failure, got {:?}", other),
    }
    assert!(err.for_field("b1").is_some());
    // Failed fields are untouched; others are assigned.
    assert_eq!(conf.int, 99);
    assert_eq!(conf.name, "ok");
}

#[test]
fn test_all_or_nothing_leaves_target_untouched() {
    let config = load([source::string("key.name = new\ntest.hex.number = 0xZZ")]).unwrap();
    let mut conf = AppConf {
        name: "old".to_string(),
        ..AppConf::default()
    };

    let err = config
        .unmarshal_with(&mut conf, FieldPolicy::AllOrNothing)
        .unwrap_err();
    let err = field_failures(err);

    assert_eq!(err.failures.len(), 1);
    assert_eq!(conf.name, "old");
    assert!(!conf.debug);
}

#[test]
fn test_binding_table_lists_every_field() {
    let specs = field_specs::<AppConf>();
    assert_eq!(specs.len(), 21);
    assert_eq!(specs[0].key, "APPDEBUG");
    assert_eq!(specs[0].kind, ValueKind::Bool);
    assert_eq!(specs[0].default.as_deref(), Some("true"));

    let duration = specs.iter().find(|s| s.field == "duration1").unwrap();
    assert_eq!(duration.kind, ValueKind::Duration);
    assert_eq!(duration.default.as_deref(), Some("1h"));
}
