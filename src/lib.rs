//! Layered key/value configuration.
//!
//! Collects settings from files, the process environment and inline text,
//! merges them in order (later sources win) and exposes typed accessors
//! plus declarative unmarshalling into structs.
//!
//! ```no_run
//! use layerconf::{Binder, Unmarshal, source};
//!
//! #[derive(Default)]
//! struct AppConfig {
//!     debug: bool,
//!     workers: u32,
//! }
//!
//! impl Unmarshal for AppConfig {
//!     fn bind(b: &mut Binder<Self>) {
//!         b.field("debug", "APPDEBUG", |c| &mut c.debug).default("true");
//!         b.field("workers", "app.workers", |c| &mut c.workers).default("4");
//!     }
//! }
//!
//! let config = layerconf::load([
//!     source::file("app.conf", true),
//!     source::env(false, "APP"),
//! ])?;
//! let mut app = AppConfig::default();
//! config.unmarshal(&mut app)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bind;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod parse;
pub mod settings;
pub mod source;

pub use bind::{Binder, FieldPolicy, FieldSpec, Unmarshal};
pub use coerce::{FromSetting, ValueKind};
pub use config::{Config, ReloadOutcome, load};
pub use error::{
    CoercionError, ConfigError, ErrorCode, FieldError, InvalidValue, ParseError, ParseErrorKind,
    UnmarshalError,
};
pub use settings::{Lookup, Settings};
pub use source::{EnvLoader, FileLoader, Loader, PrefixScope, StringLoader, Table, WatchTarget};
