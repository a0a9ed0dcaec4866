//! Declarative field binding and unmarshalling.
//!
//! A destination type lists its fields once through a [`Binder`]; the
//! result is a binding table of `{field, key, default, kind, assign}`
//! records that [`Settings::unmarshal`](crate::Settings::unmarshal) walks.
//!
//! ```
//! use layerconf::{Binder, Unmarshal};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     timeout: Duration,
//! }
//!
//! impl Unmarshal for Server {
//!     fn bind(b: &mut Binder<Self>) {
//!         b.field("host", "server.host", |s| &mut s.host).default("localhost");
//!         b.field("port", "server.port", |s| &mut s.port).required();
//!         b.field("timeout", "server.timeout", |s| &mut s.timeout).default("30s");
//!     }
//! }
//! ```

use crate::coerce::{FromSetting, ValueKind};
use crate::error::{CoercionError, FieldError, InvalidValue, UnmarshalError};
use crate::settings::Settings;
use tracing::debug;

/// How field failures affect the rest of an unmarshal call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Assign every field that converts; report the others together.
    #[default]
    Lenient,
    /// Validate every field first; assign nothing if any fails.
    AllOrNothing,
}

/// Types that can be populated from [`Settings`].
pub trait Unmarshal: Sized + 'static {
    /// Declare the bound fields.
    fn bind(binder: &mut Binder<Self>);
}

type Assign<S> = Box<dyn Fn(&mut S, &str) -> Result<(), InvalidValue> + Send + Sync>;

struct Binding<S> {
    field: String,
    key: String,
    default: Option<String>,
    required: bool,
    kind: ValueKind,
    check: fn(&str) -> Result<(), InvalidValue>,
    assign: Assign<S>,
}

/// Builder for a type's binding table.
pub struct Binder<S> {
    bindings: Vec<Binding<S>>,
}

/// Options for the field just bound.
pub struct FieldOptions<'a, S> {
    binding: &'a mut Binding<S>,
}

impl<S> FieldOptions<'_, S> {
    /// Literal used when the key is not set. It goes through the same
    /// coercion as source values.
    pub fn default(self, literal: impl Into<String>) -> Self {
        self.binding.default = Some(literal.into());
        self
    }

    /// Report a missing key instead of leaving the field untouched.
    pub fn required(self) -> Self {
        self.binding.required = true;
        self
    }
}

/// Description of one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: String,
    pub key: String,
    pub default: Option<String>,
    pub required: bool,
    pub kind: ValueKind,
}

impl<S: 'static> Binder<S> {
    fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `name` to `key`, written through `access`.
    pub fn field<T: FromSetting + 'static>(
        &mut self,
        name: &str,
        key: &str,
        access: fn(&mut S) -> &mut T,
    ) -> FieldOptions<'_, S> {
        let index = self.bindings.len();
        self.bindings.push(Binding {
            field: name.to_string(),
            key: key.to_string(),
            default: None,
            required: false,
            kind: T::KIND,
            check: |raw| T::from_setting(raw).map(|_| ()),
            assign: Box::new(move |target: &mut S, raw: &str| {
                *access(target) = T::from_setting(raw)?;
                Ok(())
            }),
        });
        FieldOptions {
            binding: &mut self.bindings[index],
        }
    }

    /// Bind every field of a nested type under `prefix.`.
    ///
    /// Field names are reported as `name.<field>`.
    pub fn nest<N: Unmarshal>(&mut self, name: &str, prefix: &str, access: fn(&mut S) -> &mut N) {
        for inner in Binder::<N>::table().bindings {
            let inner_assign = inner.assign;
            self.bindings.push(Binding {
                field: format!("{}.{}", name, inner.field),
                key: if prefix.is_empty() {
                    inner.key
                } else {
                    format!("{}.{}", prefix, inner.key)
                },
                default: inner.default,
                required: inner.required,
                kind: inner.kind,
                check: inner.check,
                assign: Box::new(move |target: &mut S, raw: &str| {
                    inner_assign(access(target), raw)
                }),
            });
        }
    }

    /// The bindings declared so far.
    pub fn specs(&self) -> Vec<FieldSpec> {
        self.bindings
            .iter()
            .map(|b| FieldSpec {
                field: b.field.clone(),
                key: b.key.clone(),
                default: b.default.clone(),
                required: b.required,
                kind: b.kind,
            })
            .collect()
    }
}

impl<S: Unmarshal> Binder<S> {
    /// Build the binding table of `S`.
    pub fn table() -> Self {
        let mut binder = Self::new();
        S::bind(&mut binder);
        binder
    }
}

/// Field specs of an [`Unmarshal`] type.
pub fn field_specs<T: Unmarshal>() -> Vec<FieldSpec> {
    Binder::<T>::table().specs()
}

pub(crate) fn unmarshal<T: Unmarshal>(
    settings: &Settings,
    target: &mut T,
    policy: FieldPolicy,
) -> Result<(), UnmarshalError> {
    let binder = Binder::<T>::table();
    let mut failures = Vec::new();
    let mut staged: Vec<(&Binding<T>, &str)> = Vec::new();

    for binding in &binder.bindings {
        let raw = match (settings.raw(&binding.key), binding.default.as_deref()) {
            (Some(raw), _) => raw,
            (None, Some(default)) => default,
            (None, None) => {
                if binding.required {
                    failures.push(FieldError::Missing {
                        field: binding.field.clone(),
                        key: binding.key.clone(),
                    });
                }
                continue;
            }
        };

        let result = match policy {
            FieldPolicy::Lenient => (binding.assign)(target, raw),
            FieldPolicy::AllOrNothing => (binding.check)(raw).map(|()| staged.push((binding, raw))),
        };
        if let Err(source) = result {
            failures.push(coercion_failure(binding, source));
        }
    }

    if failures.is_empty() {
        for (binding, raw) in staged {
            if let Err(source) = (binding.assign)(target, raw) {
                failures.push(coercion_failure(binding, source));
            }
        }
    }

    debug!(
        "Unmarshalled {} field(s) with {} failure(s)",
        binder.bindings.len(),
        failures.len()
    );

    if failures.is_empty() {
        Ok(())
    } else {
        Err(UnmarshalError { failures })
    }
}

fn coercion_failure<S>(binding: &Binding<S>, source: InvalidValue) -> FieldError {
    FieldError::Coercion(CoercionError {
        field: binding.field.clone(),
        key: binding.key.clone(),
        source,
    })
}
