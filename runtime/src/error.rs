use crate::heap::Handle;
use crate::rt::ty::TypeEnum;
use num_enum::TryFromPrimitiveError;
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, ReflectError>;

/// Failure reported by the metadata API or by the memory accessor behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidHandle(Handle),
    Allocation { class: Handle, reason: String },
    NotBoxedValueType(Handle),
    StaticStorage(Handle),
    Memory { address: Handle, len: usize },
    Invocation { method: Handle, reason: String },
    Other(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidHandle(handle) => write!(f, "invalid handle {handle}"),
            ApiError::Allocation { class, reason } => {
                write!(f, "cannot allocate an instance of class {class}: {reason}")
            }
            ApiError::NotBoxedValueType(handle) => {
                write!(f, "object {handle} is not a boxed value type")
            }
            ApiError::StaticStorage(field) => {
                write!(f, "cannot resolve static storage of field {field}")
            }
            ApiError::Memory { address, len } => {
                write!(f, "cannot access {len} bytes at {address}")
            }
            ApiError::Invocation { method, reason } => {
                write!(f, "invocation of method {method} failed: {reason}")
            }
            ApiError::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The address does not correspond to a live structure.
    InvalidHandle,
    /// The entity has the wrong shape for the operation.
    Precondition,
    /// A name lookup missed.
    MemberNotFound,
    /// The runtime itself reported a failure.
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

impl Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Field => write!(f, "field"),
            MemberKind::Method => write!(f, "method"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReflectError {
    NullHandle,
    NoParent {
        class: String,
    },
    NotAValueType {
        class: String,
    },
    MemberNotFound {
        class: String,
        member: String,
        kind: MemberKind,
    },
    NoStorage {
        field: String,
    },
    MemberBinding {
        member: String,
        expected: &'static str,
    },
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },
    ArgumentType {
        method: String,
        position: usize,
        source: Box<ReflectError>,
    },
    TypeMismatch {
        expected: String,
        found: &'static str,
    },
    UnsupportedType {
        name: String,
        kind: TypeEnum,
    },
    UnknownTypeEnum(u8),
    InvalidConfig {
        reason: String,
    },
    /// The boxed size reported for a value type does not cover the header.
    InvalidLayout {
        class: String,
        instance_size: usize,
        header_size: usize,
    },
    Api(ApiError),
}

impl ReflectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReflectError::NullHandle
            | ReflectError::Api(ApiError::InvalidHandle(_))
            | ReflectError::Api(ApiError::Memory { .. }) => ErrorKind::InvalidHandle,
            ReflectError::NoParent { .. }
            | ReflectError::NotAValueType { .. }
            | ReflectError::NoStorage { .. }
            | ReflectError::MemberBinding { .. }
            | ReflectError::ArgumentCount { .. }
            | ReflectError::ArgumentType { .. }
            | ReflectError::TypeMismatch { .. }
            | ReflectError::InvalidConfig { .. } => ErrorKind::Precondition,
            ReflectError::MemberNotFound { .. } => ErrorKind::MemberNotFound,
            ReflectError::UnsupportedType { .. }
            | ReflectError::UnknownTypeEnum(_)
            | ReflectError::InvalidLayout { .. }
            | ReflectError::Api(_) => ErrorKind::Runtime,
        }
    }
}

impl From<ApiError> for ReflectError {
    fn from(value: ApiError) -> Self {
        ReflectError::Api(value)
    }
}

impl From<TryFromPrimitiveError<TypeEnum>> for ReflectError {
    fn from(value: TryFromPrimitiveError<TypeEnum>) -> Self {
        ReflectError::UnknownTypeEnum(value.number)
    }
}

impl Display for ReflectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReflectError::NullHandle => write!(f, "null handle"),
            ReflectError::NoParent { class } => write!(f, "class \"{class}\" has no parent"),
            ReflectError::NotAValueType { class } => {
                write!(f, "cannot unbox a non value type object of class \"{class}\"")
            }
            ReflectError::MemberNotFound {
                class,
                member,
                kind,
            } => write!(f, "{kind} \"{member}\" not found in class \"{class}\""),
            ReflectError::NoStorage { field } => {
                write!(f, "literal field \"{field}\" has no storage")
            }
            ReflectError::MemberBinding { member, expected } => {
                write!(f, "\"{member}\" is not {expected} member")
            }
            ReflectError::ArgumentCount {
                method,
                expected,
                actual,
            } => write!(
                f,
                "method \"{method}\" expects {expected} argument(s), received {actual}"
            ),
            ReflectError::ArgumentType {
                method,
                position,
                source,
            } => write!(
                f,
                "argument {position} of method \"{method}\" is invalid: {source}"
            ),
            ReflectError::TypeMismatch { expected, found } => {
                write!(f, "cannot convert a {found} value to \"{expected}\"")
            }
            ReflectError::UnsupportedType { name, kind } => {
                write!(f, "type \"{name}\" ({kind:?}) cannot be read or written")
            }
            ReflectError::UnknownTypeEnum(raw) => write!(f, "unknown type enum 0x{raw:02x}"),
            ReflectError::InvalidConfig { reason } => write!(f, "invalid domain config: {reason}"),
            ReflectError::InvalidLayout {
                class,
                instance_size,
                header_size,
            } => write!(
                f,
                "class \"{class}\" reports an instance size of {instance_size} bytes, \
                 below the {header_size} byte object header"
            ),
            ReflectError::Api(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ReflectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReflectError::ArgumentType { source, .. } => Some(source.as_ref()),
            ReflectError::Api(err) => Some(err),
            _ => None,
        }
    }
}
