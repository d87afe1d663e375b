//! Structured introspection over the live object and type model of a managed
//! runtime attached in-process.
//!
//! Everything starts from a [`Domain`], which wraps the [`MetadataApi`]
//! exposed by the native-call bridge. From there raw handles become
//! [`Object`]s, [`Class`]es and [`ValueType`]s whose members are resolved
//! lazily from the runtime's own metadata.

mod macros;

pub(crate) use macros::{debug_log, trace_log};

pub mod api;
pub mod domain;
pub mod error;
pub mod heap;
pub mod rt;
pub mod telemetry;
pub mod value;

pub use api::{MetadataApi, RawValue};
pub use domain::Domain;
pub use error::{ApiError, ErrorKind, MemberKind, ReflectError, Result};
pub use heap::Handle;
pub use rt::class::Class;
pub use rt::field::{Field, HeldField};
pub use rt::method::{HeldMethod, Method, Parameter};
pub use rt::object::Object;
pub use rt::ty::{Type, TypeEnum};
pub use rt::value_type::ValueType;
pub use value::Value;

use tracing_log::log::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    /// Accept numeric values of a different width or kind when writing fields
    /// and passing arguments, converting them to the declared type.
    pub coerce_numbers: bool,
    /// Pointer width of the target process, 4 or 8.
    pub pointer_size: usize,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            coerce_numbers: true,
            pointer_size: size_of::<usize>(),
        }
    }
}

impl DomainConfig {
    pub const COERCE_NUMBERS_VAR: &'static str = "REFLECT_COERCE_NUMBERS";
    pub const POINTER_SIZE_VAR: &'static str = "REFLECT_POINTER_SIZE";

    /// Defaults, overridden by `REFLECT_COERCE_NUMBERS` and `REFLECT_POINTER_SIZE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(Self::COERCE_NUMBERS_VAR) {
            match raw.trim() {
                "1" | "true" => config.coerce_numbers = true,
                "0" | "false" => config.coerce_numbers = false,
                other => warn!("Ignoring {}={other}", Self::COERCE_NUMBERS_VAR),
            }
        }
        if let Some(raw) = lookup(Self::POINTER_SIZE_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(size @ (4 | 8)) => config.pointer_size = size,
                _ => warn!("Ignoring {}={raw}", Self::POINTER_SIZE_VAR),
            }
        }
        config
    }

    /// Rejects settings the value codec cannot honor. [`Domain::attach`]
    /// runs this before handing out a domain.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.pointer_size, 4 | 8) {
            return Err(ReflectError::InvalidConfig {
                reason: format!("pointer size must be 4 or 8, got {}", self.pointer_size),
            });
        }
        Ok(())
    }
}
