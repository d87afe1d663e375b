use crate::error::ApiError;
use crate::heap::Handle;
use smallvec::SmallVec;

/// In-memory representation of a single argument or return value, as the
/// native-call bridge passes it to or receives it from the runtime.
pub type RawValue = SmallVec<[u8; 16]>;

pub type ApiResult<T> = Result<T, ApiError>;

/// Entry points of the target runtime plus raw access to its memory.
///
/// Implemented by the native-call bridge of the attached process. Every
/// method maps onto one runtime export; nothing here is cached, callers decide
/// what to memoize. Class, field, method and type arguments are the handles
/// previously returned by this same API.
pub trait MetadataApi: Send + Sync {
    fn read_memory(&self, address: Handle, buf: &mut [u8]) -> ApiResult<()>;
    fn write_memory(&self, address: Handle, bytes: &[u8]) -> ApiResult<()>;

    fn object_get_header_size(&self) -> usize;
    fn object_get_class(&self, object: Handle) -> ApiResult<Handle>;
    /// Allocates a zero-initialized instance without running any constructor.
    fn object_new(&self, class: Handle) -> ApiResult<Handle>;
    /// Address of the payload of a boxed value type.
    fn object_unbox(&self, object: Handle) -> ApiResult<Handle>;

    fn class_get_name(&self, class: Handle) -> ApiResult<String>;
    fn class_get_namespace(&self, class: Handle) -> ApiResult<String>;
    /// Null for the root of the hierarchy.
    fn class_get_parent(&self, class: Handle) -> ApiResult<Handle>;
    fn class_get_type(&self, class: Handle) -> ApiResult<Handle>;
    fn class_get_flags(&self, class: Handle) -> ApiResult<u32>;
    fn class_is_value_type(&self, class: Handle) -> ApiResult<bool>;
    fn class_is_enum(&self, class: Handle) -> ApiResult<bool>;
    fn class_get_instance_size(&self, class: Handle) -> ApiResult<usize>;
    fn class_enum_base_type(&self, class: Handle) -> ApiResult<Handle>;
    /// Declared fields, in declaration order.
    fn class_get_fields(&self, class: Handle) -> ApiResult<Vec<Handle>>;
    /// Declared methods, in declaration order.
    fn class_get_methods(&self, class: Handle) -> ApiResult<Vec<Handle>>;

    fn field_get_name(&self, field: Handle) -> ApiResult<String>;
    fn field_get_flags(&self, field: Handle) -> ApiResult<u32>;
    fn field_get_offset(&self, field: Handle) -> ApiResult<usize>;
    fn field_get_type(&self, field: Handle) -> ApiResult<Handle>;
    fn field_get_parent(&self, field: Handle) -> ApiResult<Handle>;
    fn field_get_static_address(&self, field: Handle) -> ApiResult<Handle>;

    fn method_get_name(&self, method: Handle) -> ApiResult<String>;
    fn method_get_flags(&self, method: Handle) -> ApiResult<u32>;
    fn method_get_class(&self, method: Handle) -> ApiResult<Handle>;
    fn method_get_return_type(&self, method: Handle) -> ApiResult<Handle>;
    fn method_get_parameter_count(&self, method: Handle) -> ApiResult<usize>;
    fn method_get_parameter_name(&self, method: Handle, position: usize) -> ApiResult<String>;
    fn method_get_parameter_type(&self, method: Handle, position: usize) -> ApiResult<Handle>;
    fn method_get_pointer(&self, method: Handle) -> ApiResult<Handle>;

    fn type_get_name(&self, ty: Handle) -> ApiResult<String>;
    fn type_get_type_enum(&self, ty: Handle) -> ApiResult<u8>;
    fn type_is_byref(&self, ty: Handle) -> ApiResult<bool>;
    fn type_get_class(&self, ty: Handle) -> ApiResult<Handle>;

    /// Invokes `method` on `receiver` (null for static methods). Returns
    /// `None` for methods returning void.
    fn runtime_invoke(
        &self,
        method: Handle,
        receiver: Handle,
        args: &[RawValue],
    ) -> ApiResult<Option<RawValue>>;
}
