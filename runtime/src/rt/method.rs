use crate::api::RawValue;
use crate::debug_log;
use crate::domain::Domain;
use crate::error::{ReflectError, Result};
use crate::heap::Handle;
use crate::rt::class::Class;
use crate::rt::ty::Type;
use crate::rt::{MethodFlags, NativeStruct};
use crate::value::Value;
use itertools::Itertools;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    position: usize,
    ty: Type,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn type_(&self) -> &Type {
        &self.ty
    }
}

/// A method as declared on its class.
#[derive(Clone)]
pub struct Method {
    handle: Handle,
    domain: Arc<Domain>,
    name: String,
    flags: MethodFlags,
    parameters: SmallVec<[Parameter; 4]>,
    return_type: Type,
}

impl Method {
    pub fn new(domain: Arc<Domain>, handle: Handle) -> Result<Self> {
        let handle = handle.non_null()?;
        let api = domain.api();
        let name = api.method_get_name(handle)?;
        let flags = MethodFlags::new(api.method_get_flags(handle)?);
        let return_type = Type::new(domain.clone(), api.method_get_return_type(handle)?)?;
        let count = api.method_get_parameter_count(handle)?;
        let mut parameters = SmallVec::with_capacity(count);
        for position in 0..count {
            parameters.push(Parameter {
                name: api.method_get_parameter_name(handle, position)?,
                position,
                ty: Type::new(
                    domain.clone(),
                    api.method_get_parameter_type(handle, position)?,
                )?,
            });
        }
        Ok(Self {
            handle,
            domain,
            name,
            flags,
            parameters,
            return_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_instance(&self) -> bool {
        !self.flags.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn class(&self) -> Result<Class> {
        let class = self.domain.api().method_get_class(self.handle)?;
        Class::new(self.domain.clone(), class)
    }

    /// Address of the compiled code, null for abstract methods.
    pub fn virtual_address(&self) -> Result<Handle> {
        Ok(self.domain.api().method_get_pointer(self.handle)?)
    }

    /// `ReturnType Name(ParamType param, ...)`
    pub fn signature(&self) -> Result<String> {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| Ok(format!("{} {}", parameter.ty.name()?, parameter.name)))
            .collect::<Result<Vec<String>>>()?;
        Ok(format!(
            "{}{} {}({})",
            if self.is_static() { "static " } else { "" },
            self.return_type.name()?,
            self.name,
            parameters.iter().join(", ")
        ))
    }

    /// Binds an instance method to `receiver`.
    pub fn as_held(&self, receiver: Handle) -> Result<HeldMethod> {
        if self.is_static() {
            return Err(ReflectError::MemberBinding {
                member: self.name.clone(),
                expected: "an instance",
            });
        }
        Ok(HeldMethod {
            method: self.clone(),
            receiver: receiver.non_null()?,
        })
    }

    pub fn as_held_static(&self) -> Result<HeldMethod> {
        if !self.is_static() {
            return Err(ReflectError::MemberBinding {
                member: self.name.clone(),
                expected: "a static",
            });
        }
        Ok(HeldMethod {
            method: self.clone(),
            receiver: Handle::NULL,
        })
    }
}

impl NativeStruct for Method {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Method {}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

/// A method bound to its receiver; static methods carry a null receiver.
#[derive(Clone, PartialEq, Eq)]
pub struct HeldMethod {
    method: Method,
    receiver: Handle,
}

impl HeldMethod {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn receiver(&self) -> Handle {
        self.receiver
    }

    /// Calls the method with `args` converted to the declared parameter types.
    /// Returns [`Value::Void`] for methods without a result.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        let method = &self.method;
        if args.len() != method.parameters.len() {
            return Err(ReflectError::ArgumentCount {
                method: method.name.clone(),
                expected: method.parameters.len(),
                actual: args.len(),
            });
        }

        let domain = &method.domain;
        let raw_args = method
            .parameters
            .iter()
            .zip(args)
            .map(|(parameter, arg)| {
                arg.to_raw(domain, &parameter.ty)
                    .map_err(|source| ReflectError::ArgumentType {
                        method: method.name.clone(),
                        position: parameter.position,
                        source: Box::new(source),
                    })
            })
            .collect::<Result<Vec<RawValue>>>()?;

        debug_log!(
            "Invoking {} on {} with {} argument(s)",
            method.name,
            self.receiver,
            raw_args.len()
        );
        let result = domain
            .api()
            .runtime_invoke(method.handle, self.receiver, &raw_args)?;
        match result {
            Some(raw) => Value::from_raw(domain, &method.return_type, &raw),
            None => Ok(Value::Void),
        }
    }
}

impl std::fmt::Debug for HeldMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldMethod")
            .field("name", &self.method.name)
            .field("receiver", &self.receiver)
            .finish()
    }
}
