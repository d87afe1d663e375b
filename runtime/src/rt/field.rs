use crate::domain::Domain;
use crate::error::{ReflectError, Result};
use crate::heap::Handle;
use crate::rt::class::Class;
use crate::rt::ty::Type;
use crate::rt::{FieldFlags, NativeStruct};
use crate::value::Value;
use std::sync::Arc;

/// A field as declared on its class.
///
/// For instance fields `offset` is relative to the start of a boxed instance,
/// header included. Static fields live in storage resolved by the runtime.
#[derive(Clone)]
pub struct Field {
    handle: Handle,
    domain: Arc<Domain>,
    name: String,
    flags: FieldFlags,
    offset: usize,
    ty: Type,
}

impl Field {
    pub fn new(domain: Arc<Domain>, handle: Handle) -> Result<Self> {
        let handle = handle.non_null()?;
        let api = domain.api();
        let name = api.field_get_name(handle)?;
        let flags = FieldFlags::new(api.field_get_flags(handle)?);
        let offset = api.field_get_offset(handle)?;
        let ty = Type::new(domain.clone(), api.field_get_type(handle)?)?;
        Ok(Self {
            handle,
            domain,
            name,
            flags,
            offset,
            ty,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn type_(&self) -> &Type {
        &self.ty
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_instance(&self) -> bool {
        !self.flags.is_static()
    }

    pub fn is_literal(&self) -> bool {
        self.flags.is_literal()
    }

    pub fn declaring_class(&self) -> Result<Class> {
        let class = self.domain.api().field_get_parent(self.handle)?;
        Class::new(self.domain.clone(), class)
    }

    /// Binds an instance field to the storage at `address`.
    pub fn as_held(&self, address: Handle) -> Result<HeldField> {
        self.check_storage()?;
        if self.is_static() {
            return Err(ReflectError::MemberBinding {
                member: self.name.clone(),
                expected: "an instance",
            });
        }
        Ok(HeldField {
            field: self.clone(),
            address: address.non_null()?,
        })
    }

    /// Binds a static field to the storage the runtime reserved for it.
    pub fn as_held_static(&self) -> Result<HeldField> {
        self.check_storage()?;
        if !self.is_static() {
            return Err(ReflectError::MemberBinding {
                member: self.name.clone(),
                expected: "a static",
            });
        }
        let address = self.domain.api().field_get_static_address(self.handle)?;
        Ok(HeldField {
            field: self.clone(),
            address: address.non_null()?,
        })
    }

    fn check_storage(&self) -> Result<()> {
        if self.is_literal() {
            return Err(ReflectError::NoStorage {
                field: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl NativeStruct for Field {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Field {}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A field bound to one concrete storage location.
#[derive(Clone, PartialEq, Eq)]
pub struct HeldField {
    field: Field,
    address: Handle,
}

impl HeldField {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn address(&self) -> Handle {
        self.address
    }

    /// Decodes the storage according to the declared type.
    pub fn value(&self) -> Result<Value> {
        Value::read(&self.field.domain, &self.field.ty, self.address)
    }

    pub fn set_value(&self, value: &Value) -> Result<()> {
        value.write(&self.field.domain, &self.field.ty, self.address)
    }
}

impl std::fmt::Debug for HeldField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldField")
            .field("name", &self.field.name)
            .field("address", &self.address)
            .finish()
    }
}
