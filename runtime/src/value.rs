use crate::api::RawValue;
use crate::domain::Domain;
use crate::error::{ReflectError, Result};
use crate::heap::{Handle, copy_bytes, read_bytes, write_bytes};
use crate::rt::NativeStruct;
use crate::rt::class::Class;
use crate::rt::object::Object;
use crate::rt::ty::{Type, TypeEnum};
use crate::rt::value_type::ValueType;
use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

/// A decoded field value, argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Boolean(bool),
    Char(u16),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    IntPtr(isize),
    UIntPtr(usize),
    Pointer(Handle),
    /// A reference; `None` is the null reference.
    Object(Option<Object>),
    ValueType(ValueType),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::IntPtr(_) => "intptr",
            Value::UIntPtr(_) => "uintptr",
            Value::Pointer(_) => "pointer",
            Value::Object(_) => "object",
            Value::ValueType(_) => "value type",
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Char(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            Value::IntPtr(v) => Some(v as i128),
            Value::UIntPtr(v) => Some(v as i128),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => object.as_ref(),
            _ => None,
        }
    }

    pub fn as_value_type(&self) -> Option<&ValueType> {
        match self {
            Value::ValueType(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn read(domain: &Arc<Domain>, ty: &Type, address: Handle) -> Result<Value> {
        let pointer_size = domain.config().pointer_size;
        match Layout::of(ty)? {
            Layout::Void => Ok(Value::Void),
            Layout::Scalar(kind) => {
                let bytes = read_bytes(domain.api(), address, kind.size(pointer_size))?;
                Ok(decode_scalar(kind, &bytes, pointer_size))
            }
            Layout::Reference => {
                let bytes = read_bytes(domain.api(), address, pointer_size)?;
                decode_reference(domain, &bytes)
            }
            Layout::Struct(class) => Ok(Value::ValueType(ValueType::new(address, class)?)),
            Layout::Enum(base) => Value::read(domain, &base, address),
        }
    }

    pub(crate) fn write(&self, domain: &Arc<Domain>, ty: &Type, address: Handle) -> Result<()> {
        match Layout::of(ty)? {
            Layout::Struct(class) => match self {
                Value::ValueType(value) if *value.class() == class => copy_bytes(
                    domain.api(),
                    value.handle(),
                    address,
                    class.value_size()?,
                ),
                _ => Err(self.mismatch(ty)),
            },
            Layout::Enum(base) => self.write(domain, &base, address),
            layout => {
                let raw = self.encode(domain, ty, &layout)?;
                write_bytes(domain.api(), address, &raw)
            }
        }
    }

    /// Representation handed to the native-call bridge.
    pub(crate) fn to_raw(&self, domain: &Arc<Domain>, ty: &Type) -> Result<RawValue> {
        match Layout::of(ty)? {
            Layout::Struct(class) => match self {
                Value::ValueType(value) if *value.class() == class => {
                    let bytes = read_bytes(domain.api(), value.handle(), class.value_size()?)?;
                    Ok(RawValue::from_vec(bytes))
                }
                _ => Err(self.mismatch(ty)),
            },
            Layout::Enum(base) => self.to_raw(domain, &base),
            layout => self.encode(domain, ty, &layout),
        }
    }

    /// Decodes a value returned by the native-call bridge. Value-type results
    /// are copied into a fresh boxed object and handed out unboxed.
    pub(crate) fn from_raw(domain: &Arc<Domain>, ty: &Type, raw: &[u8]) -> Result<Value> {
        let pointer_size = domain.config().pointer_size;
        match Layout::of(ty)? {
            Layout::Void => Ok(Value::Void),
            Layout::Scalar(kind) => {
                let bytes = truncated(ty, raw, kind.size(pointer_size))?;
                Ok(decode_scalar(kind, bytes, pointer_size))
            }
            Layout::Reference => decode_reference(domain, truncated(ty, raw, pointer_size)?),
            Layout::Struct(class) => {
                let bytes = truncated(ty, raw, class.value_size()?)?;
                let object = Object::from_class(&class)?;
                write_bytes(
                    domain.api(),
                    object.handle().add(domain.header_size()),
                    bytes,
                )?;
                Ok(Value::ValueType(object.unbox()?))
            }
            Layout::Enum(base) => Value::from_raw(domain, &base, raw),
        }
    }

    fn encode(&self, domain: &Arc<Domain>, ty: &Type, layout: &Layout) -> Result<RawValue> {
        let pointer_size = domain.config().pointer_size;
        match layout {
            Layout::Scalar(kind) => {
                let encoded = encode_scalar(*kind, self, pointer_size).or_else(|| {
                    if domain.config().coerce_numbers {
                        coerce(self, *kind)
                            .and_then(|value| encode_scalar(*kind, &value, pointer_size))
                    } else {
                        None
                    }
                });
                encoded.ok_or_else(|| self.mismatch(ty))
            }
            Layout::Reference => {
                let address = match self {
                    Value::Object(Some(object)) => object.handle().address(),
                    Value::Object(None) => 0,
                    _ => return Err(self.mismatch(ty)),
                };
                Ok(encode_pointer(address, pointer_size))
            }
            Layout::Void | Layout::Struct(_) | Layout::Enum(_) => Err(self.mismatch(ty)),
        }
    }

    fn mismatch(&self, ty: &Type) -> ReflectError {
        ReflectError::TypeMismatch {
            expected: ty.name().unwrap_or("<unknown type>").to_string(),
            found: self.kind_name(),
        }
    }
}

/// How values of a type are laid out in storage.
enum Layout {
    Void,
    Scalar(TypeEnum),
    Reference,
    Struct(Class),
    Enum(Type),
}

impl Layout {
    fn of(ty: &Type) -> Result<Layout> {
        let kind = ty.type_enum()?;
        match kind {
            TypeEnum::Void => Ok(Layout::Void),
            TypeEnum::Boolean
            | TypeEnum::Char
            | TypeEnum::I1
            | TypeEnum::U1
            | TypeEnum::I2
            | TypeEnum::U2
            | TypeEnum::I4
            | TypeEnum::U4
            | TypeEnum::I8
            | TypeEnum::U8
            | TypeEnum::R4
            | TypeEnum::R8
            | TypeEnum::I
            | TypeEnum::U
            | TypeEnum::Ptr
            | TypeEnum::FnPtr => Ok(Layout::Scalar(kind)),
            kind if kind.is_reference() => Ok(Layout::Reference),
            TypeEnum::ValueType | TypeEnum::GenericInst => {
                let class = ty.class()?;
                if class.is_enum()? {
                    match class.enum_base_type()? {
                        Some(base) => Ok(Layout::Enum(base)),
                        None => Err(unsupported(ty, kind)),
                    }
                } else if class.is_value_type()? {
                    Ok(Layout::Struct(class))
                } else {
                    Ok(Layout::Reference)
                }
            }
            _ => Err(unsupported(ty, kind)),
        }
    }
}

impl TypeEnum {
    fn size(self, pointer_size: usize) -> usize {
        self.primitive_size().unwrap_or(pointer_size)
    }
}

fn unsupported(ty: &Type, kind: TypeEnum) -> ReflectError {
    ReflectError::UnsupportedType {
        name: ty.name().unwrap_or("<unknown type>").to_string(),
        kind,
    }
}

fn truncated<'a>(ty: &Type, raw: &'a [u8], size: usize) -> Result<&'a [u8]> {
    raw.get(..size).ok_or_else(|| ReflectError::TypeMismatch {
        expected: ty.name().unwrap_or("<unknown type>").to_string(),
        found: "truncated value",
    })
}

fn decode_scalar(kind: TypeEnum, bytes: &[u8], pointer_size: usize) -> Value {
    match kind {
        TypeEnum::Boolean => Value::Boolean(bytes[0] != 0),
        TypeEnum::Char => Value::Char(LittleEndian::read_u16(bytes)),
        TypeEnum::I1 => Value::I8(bytes[0] as i8),
        TypeEnum::U1 => Value::U8(bytes[0]),
        TypeEnum::I2 => Value::I16(LittleEndian::read_i16(bytes)),
        TypeEnum::U2 => Value::U16(LittleEndian::read_u16(bytes)),
        TypeEnum::I4 => Value::I32(LittleEndian::read_i32(bytes)),
        TypeEnum::U4 => Value::U32(LittleEndian::read_u32(bytes)),
        TypeEnum::I8 => Value::I64(LittleEndian::read_i64(bytes)),
        TypeEnum::U8 => Value::U64(LittleEndian::read_u64(bytes)),
        TypeEnum::R4 => Value::F32(LittleEndian::read_f32(bytes)),
        TypeEnum::R8 => Value::F64(LittleEndian::read_f64(bytes)),
        TypeEnum::I => Value::IntPtr(LittleEndian::read_int(bytes, pointer_size) as isize),
        TypeEnum::U => Value::UIntPtr(LittleEndian::read_uint(bytes, pointer_size) as usize),
        _ => Value::Pointer(Handle::new(
            LittleEndian::read_uint(bytes, pointer_size) as usize,
        )),
    }
}

fn decode_reference(domain: &Arc<Domain>, bytes: &[u8]) -> Result<Value> {
    let address = LittleEndian::read_uint(bytes, bytes.len()) as usize;
    if address == 0 {
        return Ok(Value::Object(None));
    }
    Ok(Value::Object(Some(Object::new(
        domain.clone(),
        Handle::new(address),
    )?)))
}

fn encode_pointer(address: usize, pointer_size: usize) -> RawValue {
    let mut buf = [0u8; 8];
    LittleEndian::write_uint(&mut buf, address as u64, pointer_size);
    RawValue::from_slice(&buf[..pointer_size])
}

fn encode_scalar(kind: TypeEnum, value: &Value, pointer_size: usize) -> Option<RawValue> {
    let mut buf = [0u8; 8];
    let len = match (kind, value) {
        (TypeEnum::Boolean, Value::Boolean(v)) => {
            buf[0] = u8::from(*v);
            1
        }
        (TypeEnum::Char, Value::Char(v)) | (TypeEnum::U2, Value::U16(v)) => {
            LittleEndian::write_u16(&mut buf, *v);
            2
        }
        (TypeEnum::I1, Value::I8(v)) => {
            buf[0] = *v as u8;
            1
        }
        (TypeEnum::U1, Value::U8(v)) => {
            buf[0] = *v;
            1
        }
        (TypeEnum::I2, Value::I16(v)) => {
            LittleEndian::write_i16(&mut buf, *v);
            2
        }
        (TypeEnum::I4, Value::I32(v)) => {
            LittleEndian::write_i32(&mut buf, *v);
            4
        }
        (TypeEnum::U4, Value::U32(v)) => {
            LittleEndian::write_u32(&mut buf, *v);
            4
        }
        (TypeEnum::I8, Value::I64(v)) => {
            LittleEndian::write_i64(&mut buf, *v);
            8
        }
        (TypeEnum::U8, Value::U64(v)) => {
            LittleEndian::write_u64(&mut buf, *v);
            8
        }
        (TypeEnum::R4, Value::F32(v)) => {
            LittleEndian::write_f32(&mut buf, *v);
            4
        }
        (TypeEnum::R8, Value::F64(v)) => {
            LittleEndian::write_f64(&mut buf, *v);
            8
        }
        (TypeEnum::I, Value::IntPtr(v)) => {
            LittleEndian::write_int(&mut buf, *v as i64, pointer_size);
            pointer_size
        }
        (TypeEnum::U, Value::UIntPtr(v)) => {
            LittleEndian::write_uint(&mut buf, *v as u64, pointer_size);
            pointer_size
        }
        (TypeEnum::Ptr | TypeEnum::FnPtr, Value::Pointer(v)) => {
            LittleEndian::write_uint(&mut buf, v.address() as u64, pointer_size);
            pointer_size
        }
        _ => return None,
    };
    Some(RawValue::from_slice(&buf[..len]))
}

/// Converts a numeric value to `kind`; integers must fit, floats only widen or
/// narrow into float kinds.
fn coerce(value: &Value, kind: TypeEnum) -> Option<Value> {
    let int = value.as_integer();
    let float = value.as_float();
    match kind {
        TypeEnum::Char => int.and_then(|v| u16::try_from(v).ok()).map(Value::Char),
        TypeEnum::I1 => int.and_then(|v| i8::try_from(v).ok()).map(Value::I8),
        TypeEnum::U1 => int.and_then(|v| u8::try_from(v).ok()).map(Value::U8),
        TypeEnum::I2 => int.and_then(|v| i16::try_from(v).ok()).map(Value::I16),
        TypeEnum::U2 => int.and_then(|v| u16::try_from(v).ok()).map(Value::U16),
        TypeEnum::I4 => int.and_then(|v| i32::try_from(v).ok()).map(Value::I32),
        TypeEnum::U4 => int.and_then(|v| u32::try_from(v).ok()).map(Value::U32),
        TypeEnum::I8 => int.and_then(|v| i64::try_from(v).ok()).map(Value::I64),
        TypeEnum::U8 => int.and_then(|v| u64::try_from(v).ok()).map(Value::U64),
        TypeEnum::I => int.and_then(|v| isize::try_from(v).ok()).map(Value::IntPtr),
        TypeEnum::U => int.and_then(|v| usize::try_from(v).ok()).map(Value::UIntPtr),
        TypeEnum::R4 => int
            .map(|v| v as f32)
            .or(float.map(|v| v as f32))
            .map(Value::F32),
        TypeEnum::R8 => int.map(|v| v as f64).or(float).map(Value::F64),
        _ => None,
    }
}
