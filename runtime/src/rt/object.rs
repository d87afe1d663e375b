use crate::debug_log;
use crate::domain::Domain;
use crate::error::{MemberKind, ReflectError, Result};
use crate::heap::Handle;
use crate::rt::NativeStruct;
use crate::rt::class::Class;
use crate::rt::field::HeldField;
use crate::rt::method::HeldMethod;
use crate::rt::value_type::ValueType;
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::sync::Arc;

/// A boxed object living on the runtime's heap.
///
/// The runtime owns the memory. Two objects with the same handle compare
/// equal even when their caches were filled independently.
#[derive(Clone)]
pub struct Object {
    handle: Handle,
    domain: Arc<Domain>,
    class: OnceCell<Class>,
    base: OnceCell<Box<Object>>,
    fields: OnceCell<IndexMap<String, HeldField>>,
    methods: OnceCell<IndexMap<String, HeldMethod>>,
}

impl Object {
    pub fn new(domain: Arc<Domain>, handle: Handle) -> Result<Self> {
        Ok(Self::with_class_cell(domain, handle.non_null()?, OnceCell::new()))
    }

    /// Allocates a zero-initialized instance of `class`. No constructor runs;
    /// invoke `.ctor` through [`Object::methods`] when initialization matters.
    /// The class of the result is resolved from the runtime like any other
    /// object's.
    pub fn from_class(class: &Class) -> Result<Self> {
        let domain = class.domain();
        let handle = domain.api().object_new(class.handle())?;
        debug_log!("Allocated {} of class {}", handle, class.display_name());
        Self::new(domain.clone(), handle)
    }

    fn with_class_cell(domain: Arc<Domain>, handle: Handle, class: OnceCell<Class>) -> Self {
        Self {
            handle,
            domain,
            class,
            base: OnceCell::new(),
            fields: OnceCell::new(),
            methods: OnceCell::new(),
        }
    }

    pub fn class(&self) -> Result<&Class> {
        self.class
            .get_or_try_init(|| Class::class_of(&self.domain, self.handle))
    }

    /// The same object seen as an instance of its parent class.
    pub fn base(&self) -> Result<&Object> {
        self.base
            .get_or_try_init(|| -> Result<Box<Object>> {
                let class = self.class()?;
                let parent = class.parent()?.ok_or_else(|| ReflectError::NoParent {
                    class: class.display_name(),
                })?;
                Ok(Box::new(Self::with_class_cell(
                    self.domain.clone(),
                    self.handle,
                    OnceCell::with_value(parent.clone()),
                )))
            })
            .map(|base| &**base)
    }

    /// Instance fields of the class, bound at `handle + offset`.
    pub fn fields(&self) -> Result<&IndexMap<String, HeldField>> {
        self.fields.get_or_try_init(|| -> Result<_> {
            let mut held = IndexMap::new();
            for (name, field) in self.class()?.fields()? {
                if field.is_instance() {
                    held.insert(name.clone(), field.as_held(self.handle.add(field.offset()))?);
                }
            }
            Ok(held)
        })
    }

    pub fn field(&self, name: &str) -> Result<&HeldField> {
        match self.fields()?.get(name) {
            Some(field) => Ok(field),
            None => Err(ReflectError::MemberNotFound {
                class: self.class()?.display_name(),
                member: name.to_string(),
                kind: MemberKind::Field,
            }),
        }
    }

    /// Instance methods of the class, bound to this object as receiver.
    pub fn methods(&self) -> Result<&IndexMap<String, HeldMethod>> {
        self.methods.get_or_try_init(|| -> Result<_> {
            let mut held = IndexMap::new();
            for (name, method) in self.class()?.methods()? {
                if method.is_instance() {
                    held.insert(name.clone(), method.as_held(self.handle)?);
                }
            }
            Ok(held)
        })
    }

    pub fn method(&self, name: &str) -> Result<&HeldMethod> {
        match self.methods()?.get(name) {
            Some(method) => Ok(method),
            None => Err(ReflectError::MemberNotFound {
                class: self.class()?.display_name(),
                member: name.to_string(),
                kind: MemberKind::Method,
            }),
        }
    }

    /// Boxed size of this object, header included.
    pub fn size(&self) -> Result<usize> {
        self.class()?.instance_size()
    }

    pub fn is_instance_of(&self, class: &Class) -> Result<bool> {
        self.class()?.is_subclass_of(class)
    }

    /// The payload of a boxed value type. Fails for reference types instead of
    /// reinterpreting their memory.
    pub fn unbox(&self) -> Result<ValueType> {
        let class = self.class()?;
        if !class.is_struct()? {
            return Err(ReflectError::NotAValueType {
                class: class.display_name(),
            });
        }
        let payload = self.domain.api().object_unbox(self.handle)?;
        debug_log!("Unboxed {} into payload {}", self.handle, payload);
        ValueType::new(payload, class.clone())
    }
}

impl NativeStruct for Object {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Object {}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("handle", &self.handle)
            .field("class", &self.class.get().map(|class| class.handle()))
            .finish_non_exhaustive()
    }
}
