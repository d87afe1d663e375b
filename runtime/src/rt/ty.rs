use crate::domain::Domain;
use crate::error::Result;
use crate::heap::Handle;
use crate::rt::NativeStruct;
use crate::rt::class::Class;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::unsync::OnceCell;
use std::sync::Arc;

/// Element-type codes the runtime attaches to every type.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum TypeEnum {
    End = 0x00,
    Void = 0x01,
    Boolean = 0x02,
    Char = 0x03,
    I1 = 0x04,
    U1 = 0x05,
    I2 = 0x06,
    U2 = 0x07,
    I4 = 0x08,
    U4 = 0x09,
    I8 = 0x0a,
    U8 = 0x0b,
    R4 = 0x0c,
    R8 = 0x0d,
    String = 0x0e,
    Ptr = 0x0f,
    ByRef = 0x10,
    ValueType = 0x11,
    Class = 0x12,
    Var = 0x13,
    Array = 0x14,
    GenericInst = 0x15,
    TypedByRef = 0x16,
    I = 0x18,
    U = 0x19,
    FnPtr = 0x1b,
    Object = 0x1c,
    SzArray = 0x1d,
    MVar = 0x1e,
    CModReqd = 0x1f,
    CModOpt = 0x20,
    Internal = 0x21,
    Modifier = 0x40,
    Sentinel = 0x41,
    Pinned = 0x45,
    Enum = 0x55,
}

impl TypeEnum {
    /// Kinds whose storage holds an object pointer.
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            TypeEnum::String
                | TypeEnum::Class
                | TypeEnum::Object
                | TypeEnum::Array
                | TypeEnum::SzArray
                | TypeEnum::Var
                | TypeEnum::MVar
        )
    }

    /// Storage size of fixed-width kinds; `None` for references, pointers and
    /// composite kinds whose size depends on the target or on a class.
    pub const fn primitive_size(self) -> Option<usize> {
        match self {
            TypeEnum::Boolean | TypeEnum::I1 | TypeEnum::U1 => Some(1),
            TypeEnum::Char | TypeEnum::I2 | TypeEnum::U2 => Some(2),
            TypeEnum::I4 | TypeEnum::U4 | TypeEnum::R4 => Some(4),
            TypeEnum::I8 | TypeEnum::U8 | TypeEnum::R8 => Some(8),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Type {
    handle: Handle,
    domain: Arc<Domain>,
    name: OnceCell<String>,
    kind: OnceCell<TypeEnum>,
}

impl Type {
    pub fn new(domain: Arc<Domain>, handle: Handle) -> Result<Self> {
        Ok(Self {
            handle: handle.non_null()?,
            domain,
            name: OnceCell::new(),
            kind: OnceCell::new(),
        })
    }

    pub fn name(&self) -> Result<&str> {
        self.name
            .get_or_try_init(|| -> Result<String> {
                Ok(self.domain.api().type_get_name(self.handle)?)
            })
            .map(String::as_str)
    }

    pub fn type_enum(&self) -> Result<TypeEnum> {
        self.kind
            .get_or_try_init(|| -> Result<TypeEnum> {
                let raw = self.domain.api().type_get_type_enum(self.handle)?;
                Ok(TypeEnum::try_from(raw)?)
            })
            .copied()
    }

    pub fn is_byref(&self) -> Result<bool> {
        Ok(self.domain.api().type_is_byref(self.handle)?)
    }

    /// The class backing this type.
    pub fn class(&self) -> Result<Class> {
        let class = self.domain.api().type_get_class(self.handle)?;
        Class::new(self.domain.clone(), class)
    }
}

impl NativeStruct for Type {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Type {}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Type")
            .field("handle", &self.handle)
            .field("name", &self.name.get())
            .finish_non_exhaustive()
    }
}
