use crate::domain::Domain;
use crate::heap::Handle;
use indexmap::IndexMap;
use std::sync::Arc;

pub mod class;
pub mod field;
pub mod method;
pub mod object;
pub mod ty;
pub mod value_type;

/// Capability shared by every entity wrapping a runtime structure.
pub trait NativeStruct {
    fn handle(&self) -> Handle;

    fn domain(&self) -> &Arc<Domain>;

    fn is_null(&self) -> bool {
        self.handle().is_null()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassFlags(u32);

impl ClassFlags {
    pub const INTERFACE: u32 = 0x0020;
    pub const ABSTRACT: u32 = 0x0080;
    pub const SEALED: u32 = 0x0100;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_interface(self) -> bool {
        self.0 & Self::INTERFACE != 0
    }

    pub const fn is_abstract(self) -> bool {
        self.0 & Self::ABSTRACT != 0
    }

    pub const fn is_sealed(self) -> bool {
        self.0 & Self::SEALED != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags(u32);

impl FieldFlags {
    pub const STATIC: u32 = 0x0010;
    pub const INIT_ONLY: u32 = 0x0020;
    pub const LITERAL: u32 = 0x0040;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_static(self) -> bool {
        self.0 & Self::STATIC != 0
    }

    pub const fn is_init_only(self) -> bool {
        self.0 & Self::INIT_ONLY != 0
    }

    /// Compile-time constant, no storage at all.
    pub const fn is_literal(self) -> bool {
        self.0 & Self::LITERAL != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodFlags(u32);

impl MethodFlags {
    pub const STATIC: u32 = 0x0010;
    pub const VIRTUAL: u32 = 0x0040;
    pub const ABSTRACT: u32 = 0x0400;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_static(self) -> bool {
        self.0 & Self::STATIC != 0
    }

    pub const fn is_virtual(self) -> bool {
        self.0 & Self::VIRTUAL != 0
    }

    pub const fn is_abstract(self) -> bool {
        self.0 & Self::ABSTRACT != 0
    }
}

/// Inserts under `name`, or under `name_1`, `name_2`, ... once the name is
/// taken, so overloads stay reachable in declaration order.
pub(crate) fn insert_unique<T>(map: &mut IndexMap<String, T>, name: &str, value: T) {
    if !map.contains_key(name) {
        map.insert(name.to_string(), value);
        return;
    }
    let mut suffix = 1;
    loop {
        let key = format!("{name}_{suffix}");
        if !map.contains_key(&key) {
            map.insert(key, value);
            return;
        }
        suffix += 1;
    }
}
