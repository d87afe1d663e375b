use crate::domain::Domain;
use crate::error::{MemberKind, ReflectError, Result};
use crate::heap::Handle;
use crate::rt::field::{Field, HeldField};
use crate::rt::method::{HeldMethod, Method};
use crate::rt::ty::Type;
use crate::rt::{ClassFlags, NativeStruct, insert_unique};
use crate::{debug_log, trace_log};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::fmt::{Display, Write};
use std::sync::Arc;

/// A runtime type as described by its class metadata.
///
/// Layout never changes while the process runs, so every attribute is
/// resolved at most once per descriptor. Descriptors are not pooled: two
/// `Class` values with the same handle are equal but cache independently.
#[derive(Clone)]
pub struct Class {
    handle: Handle,
    domain: Arc<Domain>,
    name: OnceCell<String>,
    namespace: OnceCell<String>,
    parent: OnceCell<Option<Box<Class>>>,
    flags: OnceCell<ClassFlags>,
    is_value_type: OnceCell<bool>,
    is_enum: OnceCell<bool>,
    fields: OnceCell<IndexMap<String, Field>>,
    methods: OnceCell<IndexMap<String, Method>>,
}

impl Class {
    pub fn new(domain: Arc<Domain>, handle: Handle) -> Result<Self> {
        Ok(Self {
            handle: handle.non_null()?,
            domain,
            name: OnceCell::new(),
            namespace: OnceCell::new(),
            parent: OnceCell::new(),
            flags: OnceCell::new(),
            is_value_type: OnceCell::new(),
            is_enum: OnceCell::new(),
            fields: OnceCell::new(),
            methods: OnceCell::new(),
        })
    }

    /// Runtime class of the object at `object`.
    pub fn class_of(domain: &Arc<Domain>, object: Handle) -> Result<Self> {
        let object = object.non_null()?;
        let class = domain.api().object_get_class(object)?;
        Self::new(domain.clone(), class)
    }

    pub fn name(&self) -> Result<&str> {
        self.name
            .get_or_try_init(|| -> Result<String> {
                Ok(self.domain.api().class_get_name(self.handle)?)
            })
            .map(String::as_str)
    }

    pub fn namespace(&self) -> Result<&str> {
        self.namespace
            .get_or_try_init(|| -> Result<String> {
                Ok(self.domain.api().class_get_namespace(self.handle)?)
            })
            .map(String::as_str)
    }

    /// `Namespace.Name`, or just the name for the global namespace.
    pub fn full_name(&self) -> Result<String> {
        let namespace = self.namespace()?;
        let name = self.name()?;
        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }

    /// The class one level up, `None` for the root of the hierarchy.
    pub fn parent(&self) -> Result<Option<&Class>> {
        self.parent
            .get_or_try_init(|| -> Result<Option<Box<Class>>> {
                let parent = self.domain.api().class_get_parent(self.handle)?;
                if parent.is_null() {
                    return Ok(None);
                }
                Ok(Some(Box::new(Class::new(self.domain.clone(), parent)?)))
            })
            .map(|parent| parent.as_deref())
    }

    /// This class followed by every ancestor up to the root.
    pub fn hierarchy(&self) -> Result<Vec<&Class>> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent()? {
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// True when `other` is this class or one of its ancestors.
    pub fn is_subclass_of(&self, other: &Class) -> Result<bool> {
        Ok(self.hierarchy()?.iter().any(|class| *class == other))
    }

    pub fn type_(&self) -> Result<Type> {
        let ty = self.domain.api().class_get_type(self.handle)?;
        Type::new(self.domain.clone(), ty)
    }

    pub fn flags(&self) -> Result<ClassFlags> {
        self.flags
            .get_or_try_init(|| -> Result<ClassFlags> {
                Ok(ClassFlags::new(
                    self.domain.api().class_get_flags(self.handle)?,
                ))
            })
            .copied()
    }

    pub fn is_value_type(&self) -> Result<bool> {
        self.is_value_type
            .get_or_try_init(|| -> Result<bool> {
                Ok(self.domain.api().class_is_value_type(self.handle)?)
            })
            .copied()
    }

    pub fn is_enum(&self) -> Result<bool> {
        self.is_enum
            .get_or_try_init(|| -> Result<bool> {
                Ok(self.domain.api().class_is_enum(self.handle)?)
            })
            .copied()
    }

    /// Value types other than enums: the classes that can be unboxed and boxed.
    pub fn is_struct(&self) -> Result<bool> {
        Ok(self.is_value_type()? && !self.is_enum()?)
    }

    pub fn is_interface(&self) -> Result<bool> {
        Ok(self.flags()?.is_interface())
    }

    pub fn is_abstract(&self) -> Result<bool> {
        Ok(self.flags()?.is_abstract())
    }

    /// Size of a boxed instance, header included.
    pub fn instance_size(&self) -> Result<usize> {
        Ok(self.domain.api().class_get_instance_size(self.handle)?)
    }

    /// Size of an unboxed payload: the instance size without the header.
    pub fn value_size(&self) -> Result<usize> {
        let instance_size = self.instance_size()?;
        let header_size = self.domain.header_size();
        instance_size
            .checked_sub(header_size)
            .ok_or_else(|| ReflectError::InvalidLayout {
                class: self.display_name(),
                instance_size,
                header_size,
            })
    }

    /// Underlying integral type of an enum, `None` for other classes.
    pub fn enum_base_type(&self) -> Result<Option<Type>> {
        if !self.is_enum()? {
            return Ok(None);
        }
        let ty = self.domain.api().class_enum_base_type(self.handle)?;
        Ok(Some(Type::new(self.domain.clone(), ty)?))
    }

    /// Declared fields, static and instance, in declaration order.
    pub fn fields(&self) -> Result<&IndexMap<String, Field>> {
        self.fields.get_or_try_init(|| self.resolve_fields())
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields()?
            .get(name)
            .ok_or_else(|| self.member_not_found(name, MemberKind::Field))
    }

    /// Declared methods in declaration order; overloads after the first are
    /// keyed `name_1`, `name_2`, ...
    pub fn methods(&self) -> Result<&IndexMap<String, Method>> {
        self.methods.get_or_try_init(|| self.resolve_methods())
    }

    pub fn method(&self, name: &str) -> Result<&Method> {
        self.methods()?
            .get(name)
            .ok_or_else(|| self.member_not_found(name, MemberKind::Method))
    }

    /// Static, non-literal fields bound to their static storage.
    pub fn static_fields(&self) -> Result<IndexMap<String, HeldField>> {
        let mut held = IndexMap::new();
        for (name, field) in self.fields()? {
            if field.is_static() && !field.is_literal() {
                held.insert(name.clone(), field.as_held_static()?);
            }
        }
        Ok(held)
    }

    pub fn static_methods(&self) -> Result<IndexMap<String, HeldMethod>> {
        let mut held = IndexMap::new();
        for (name, method) in self.methods()? {
            if method.is_static() {
                held.insert(name.clone(), method.as_held_static()?);
            }
        }
        Ok(held)
    }

    /// Multi-line declaration listing of this class and its members.
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        let kind = if self.is_enum()? {
            "enum"
        } else if self.is_value_type()? {
            "struct"
        } else if self.is_interface()? {
            "interface"
        } else {
            "class"
        };
        // Writing into a String cannot fail.
        let _ = write!(out, "{kind} {}", self.full_name()?);
        if let Some(parent) = self.parent()? {
            let _ = write!(out, " : {}", parent.full_name()?);
        }
        out.push_str("\n{\n");
        for field in self.fields()?.values() {
            let _ = write!(out, "    ");
            if field.is_literal() {
                out.push_str("const ");
            } else if field.is_static() {
                out.push_str("static ");
            }
            let _ = write!(out, "{} {};", field.type_().name()?, field.name());
            if !field.is_static() {
                let _ = write!(out, " // 0x{:x}", field.offset());
            }
            out.push('\n');
        }
        if !self.fields()?.is_empty() && !self.methods()?.is_empty() {
            out.push('\n');
        }
        for method in self.methods()?.values() {
            let _ = writeln!(out, "    {};", method.signature()?);
        }
        out.push('}');
        Ok(out)
    }

    #[hotpath::measure]
    fn resolve_fields(&self) -> Result<IndexMap<String, Field>> {
        let api = self.domain.api();
        let mut fields = IndexMap::new();
        for handle in api.class_get_fields(self.handle)? {
            let field = Field::new(self.domain.clone(), handle)?;
            trace_log!("Resolved field {} at 0x{:x}", field.name(), field.offset());
            fields.insert(field.name().to_string(), field);
        }
        debug_log!(
            "Resolved {} field(s) of class {}",
            fields.len(),
            self.name().unwrap_or("<unknown>")
        );
        Ok(fields)
    }

    #[hotpath::measure]
    fn resolve_methods(&self) -> Result<IndexMap<String, Method>> {
        let api = self.domain.api();
        let mut methods = IndexMap::new();
        for handle in api.class_get_methods(self.handle)? {
            let method = Method::new(self.domain.clone(), handle)?;
            let name = method.name().to_string();
            insert_unique(&mut methods, &name, method);
        }
        debug_log!(
            "Resolved {} method(s) of class {}",
            methods.len(),
            self.name().unwrap_or("<unknown>")
        );
        Ok(methods)
    }

    fn member_not_found(&self, member: &str, kind: MemberKind) -> ReflectError {
        ReflectError::MemberNotFound {
            class: self.display_name(),
            member: member.to_string(),
            kind,
        }
    }

    /// Name for error messages; falls back to the handle when the metadata
    /// itself cannot be read.
    pub(crate) fn display_name(&self) -> String {
        self.full_name()
            .unwrap_or_else(|_| format!("<class {}>", self.handle))
    }
}

impl NativeStruct for Class {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Class {}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("handle", &self.handle)
            .field("name", &self.name.get())
            .finish_non_exhaustive()
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.dump() {
            Ok(dump) => f.write_str(&dump),
            Err(_) => write!(f, "<class {}>", self.handle),
        }
    }
}
