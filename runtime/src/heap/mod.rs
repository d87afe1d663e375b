use crate::api::MetadataApi;
use crate::debug_log;
use crate::error::{ReflectError, Result};
use once_cell::sync::OnceCell;
use std::fmt::{Debug, Display, LowerHex};

/// Address of a structure living in the target process.
///
/// Two handles are equal iff their addresses are equal. The null handle never
/// wraps an entity and is never dereferenced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(usize);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub const fn new(address: usize) -> Self {
        Handle(address)
    }

    pub const fn address(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    pub const fn add(self, offset: usize) -> Self {
        Handle(self.0.wrapping_add(offset))
    }

    pub const fn sub(self, offset: usize) -> Self {
        Handle(self.0.wrapping_sub(offset))
    }

    /// Fails with [`ReflectError::NullHandle`] instead of handing out null.
    pub fn non_null(self) -> Result<Self> {
        if self.is_null() {
            Err(ReflectError::NullHandle)
        } else {
            Ok(self)
        }
    }
}

impl From<usize> for Handle {
    fn from(value: usize) -> Self {
        Handle(value)
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle(0x{:x})", self.0)
    }
}

impl LowerHex for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        LowerHex::fmt(&self.0, f)
    }
}

// The object layout is fixed for the lifetime of the process.
static OBJECT_HEADER_SIZE: OnceCell<usize> = OnceCell::new();

/// Size of the prefix preceding the first instance field of every boxed object.
pub fn object_header_size(api: &dyn MetadataApi) -> usize {
    *OBJECT_HEADER_SIZE.get_or_init(|| {
        let size = api.object_get_header_size();
        debug_log!("Resolved object header size: {size} bytes");
        size
    })
}

pub(crate) fn read_bytes(api: &dyn MetadataApi, address: Handle, len: usize) -> Result<Vec<u8>> {
    let address = address.non_null()?;
    let mut buf = vec![0u8; len];
    api.read_memory(address, &mut buf)?;
    Ok(buf)
}

pub(crate) fn write_bytes(api: &dyn MetadataApi, address: Handle, bytes: &[u8]) -> Result<()> {
    let address = address.non_null()?;
    api.write_memory(address, bytes)?;
    Ok(())
}

pub(crate) fn copy_bytes(
    api: &dyn MetadataApi,
    src: Handle,
    dest: Handle,
    len: usize,
) -> Result<()> {
    let bytes = read_bytes(api, src, len)?;
    write_bytes(api, dest, &bytes)
}
