use crate::debug_log;
use crate::domain::Domain;
use crate::error::{MemberKind, ReflectError, Result};
use crate::heap::{Handle, copy_bytes};
use crate::rt::NativeStruct;
use crate::rt::class::Class;
use crate::rt::field::HeldField;
use crate::rt::object::Object;
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::sync::Arc;

/// An unboxed value-type payload.
///
/// The payload carries no header and no class pointer, so the class travels
/// alongside the handle. Field offsets from metadata count the header of the
/// boxed form and are rebased onto the payload start.
#[derive(Clone)]
pub struct ValueType {
    handle: Handle,
    class: Class,
    fields: OnceCell<IndexMap<String, HeldField>>,
}

impl ValueType {
    pub fn new(handle: Handle, class: Class) -> Result<Self> {
        let handle = handle.non_null()?;
        if !class.is_struct()? {
            return Err(ReflectError::NotAValueType {
                class: class.display_name(),
            });
        }
        Ok(Self {
            handle,
            class,
            fields: OnceCell::new(),
        })
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    /// Payload size in bytes.
    pub fn size(&self) -> Result<usize> {
        self.class.value_size()
    }

    /// Instance fields bound relative to the payload start.
    pub fn fields(&self) -> Result<&IndexMap<String, HeldField>> {
        self.fields.get_or_try_init(|| -> Result<_> {
            let header_size = self.domain().header_size();
            let mut held = IndexMap::new();
            for (name, field) in self.class.fields()? {
                if field.is_instance() {
                    let address = self.handle.add(field.offset()).sub(header_size);
                    held.insert(name.clone(), field.as_held(address)?);
                }
            }
            Ok(held)
        })
    }

    pub fn field(&self, name: &str) -> Result<&HeldField> {
        self.fields()?
            .get(name)
            .ok_or_else(|| ReflectError::MemberNotFound {
                class: self.class.display_name(),
                member: name.to_string(),
                kind: MemberKind::Field,
            })
    }

    /// Copies the payload into a freshly allocated boxed object of the same
    /// class. The result never shares a handle with this payload.
    pub fn boxed(&self) -> Result<Object> {
        let object = Object::from_class(&self.class)?;
        let domain = self.domain();
        copy_bytes(
            domain.api(),
            self.handle,
            object.handle().add(domain.header_size()),
            self.size()?,
        )?;
        debug_log!("Boxed payload {} into {}", self.handle, object.handle());
        Ok(object)
    }
}

impl NativeStruct for ValueType {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        self.class.domain()
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.class == other.class
    }
}

impl Eq for ValueType {}

impl std::fmt::Debug for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueType")
            .field("handle", &self.handle)
            .field("class", &self.class.handle())
            .finish_non_exhaustive()
    }
}
