#![allow(dead_code)]

use il2cpp_reflect::api::ApiResult;
use il2cpp_reflect::rt::{ClassFlags, FieldFlags, MethodFlags};
use il2cpp_reflect::{
    ApiError, Domain, DomainConfig, Handle, MetadataApi, RawValue, Result, TypeEnum,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const HEADER_SIZE: usize = 16;

const HEAP_BASE: usize = 0x1000_0000;
const CLASS_BASE: usize = 0x0100_0000;
const FIELD_BASE: usize = 0x0200_0000;
const METHOD_BASE: usize = 0x0300_0000;
const TYPE_BASE: usize = 0x0400_0000;
const CODE_BASE: usize = 0x0500_0000;
const STRIDE: usize = 0x10;

pub type MethodBody =
    Arc<dyn Fn(&FakeRuntime, Handle, &[RawValue]) -> ApiResult<Option<RawValue>> + Send + Sync>;

pub fn body(
    f: impl Fn(&FakeRuntime, Handle, &[RawValue]) -> ApiResult<Option<RawValue>>
    + Send
    + Sync
    + 'static,
) -> MethodBody {
    Arc::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Abstract,
    Interface,
    Struct,
    /// Enum over the given underlying type.
    Enum(Handle),
}

struct ClassDef {
    name: String,
    namespace: String,
    parent: Handle,
    ty: Handle,
    flags: u32,
    value_type: bool,
    is_enum: bool,
    enum_base: Handle,
    instance_size: usize,
    fields: Vec<Handle>,
    methods: Vec<Handle>,
}

struct FieldDef {
    name: String,
    flags: u32,
    offset: usize,
    ty: Handle,
    parent: Handle,
    static_address: Handle,
}

struct MethodDef {
    name: String,
    flags: u32,
    class: Handle,
    return_type: Handle,
    parameters: Vec<(String, Handle)>,
    pointer: Handle,
    body: Option<MethodBody>,
}

struct TypeDef {
    name: String,
    kind: TypeEnum,
    class: Handle,
}

#[derive(Default)]
struct State {
    heap: Vec<u8>,
    classes: Vec<ClassDef>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    types: Vec<TypeDef>,
}

fn index_of(handle: Handle, base: usize, len: usize) -> ApiResult<usize> {
    let address = handle.address();
    if address < base || (address - base) % STRIDE != 0 || (address - base) / STRIDE >= len {
        return Err(ApiError::InvalidHandle(handle));
    }
    Ok((address - base) / STRIDE)
}

impl State {
    fn class(&self, handle: Handle) -> ApiResult<&ClassDef> {
        Ok(&self.classes[index_of(handle, CLASS_BASE, self.classes.len())?])
    }

    fn class_mut(&mut self, handle: Handle) -> ApiResult<&mut ClassDef> {
        let index = index_of(handle, CLASS_BASE, self.classes.len())?;
        Ok(&mut self.classes[index])
    }

    fn field(&self, handle: Handle) -> ApiResult<&FieldDef> {
        Ok(&self.fields[index_of(handle, FIELD_BASE, self.fields.len())?])
    }

    fn method(&self, handle: Handle) -> ApiResult<&MethodDef> {
        Ok(&self.methods[index_of(handle, METHOD_BASE, self.methods.len())?])
    }

    fn ty(&self, handle: Handle) -> ApiResult<&TypeDef> {
        Ok(&self.types[index_of(handle, TYPE_BASE, self.types.len())?])
    }

    fn alloc(&mut self, size: usize) -> Handle {
        let start = self.heap.len().next_multiple_of(8);
        self.heap.resize(start + size.max(1), 0);
        Handle::new(HEAP_BASE + start)
    }

    fn range(&self, address: Handle, len: usize) -> ApiResult<std::ops::Range<usize>> {
        let start = address
            .address()
            .checked_sub(HEAP_BASE)
            .ok_or(ApiError::Memory { address, len })?;
        if start + len > self.heap.len() {
            return Err(ApiError::Memory { address, len });
        }
        Ok(start..start + len)
    }

    fn new_type(&mut self, name: &str, kind: TypeEnum, class: Handle) -> Handle {
        self.types.push(TypeDef {
            name: name.to_string(),
            kind,
            class,
        });
        Handle::new(TYPE_BASE + (self.types.len() - 1) * STRIDE)
    }

    /// Storage size and alignment of a field of type `ty`.
    fn layout_of(&self, ty: Handle) -> ApiResult<(usize, usize)> {
        let def = self.ty(ty)?;
        let size = match def.kind.primitive_size() {
            Some(size) => size,
            None => match def.kind {
                TypeEnum::ValueType | TypeEnum::GenericInst => {
                    let class = self.class(def.class)?;
                    if class.value_type {
                        class.instance_size - HEADER_SIZE
                    } else {
                        8
                    }
                }
                _ => 8,
            },
        };
        Ok((size, size.next_power_of_two().min(8)))
    }
}

/// In-memory stand-in for an attached runtime: metadata tables plus a byte
/// arena serving as the managed heap and static storage.
#[derive(Default)]
pub struct FakeRuntime {
    state: RwLock<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(self) -> Result<Arc<Domain>> {
        Domain::attach(self, DomainConfig::default())
    }

    pub fn attach_with(self, config: DomainConfig) -> Result<Arc<Domain>> {
        Domain::attach(self, config)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A type with no backing class, such as `System.Int32`.
    pub fn primitive(&self, name: &str, kind: TypeEnum) -> Handle {
        self.write().new_type(name, kind, Handle::NULL)
    }

    pub fn define_type(&self, name: &str, kind: TypeEnum, class: Handle) -> Handle {
        self.write().new_type(name, kind, class)
    }

    pub fn define_class(
        &self,
        namespace: &str,
        name: &str,
        parent: Option<Handle>,
        kind: ClassKind,
    ) -> Handle {
        let handle = {
            let mut state = self.write();
            let parent = parent.unwrap_or(Handle::NULL);
            let instance_size = match kind {
                ClassKind::Class | ClassKind::Abstract if !parent.is_null() => state
                    .class(parent)
                    .map(|parent| parent.instance_size)
                    .unwrap_or(HEADER_SIZE),
                _ => HEADER_SIZE,
            };
            let (flags, value_type, is_enum, enum_base) = match kind {
                ClassKind::Class => (0, false, false, Handle::NULL),
                ClassKind::Abstract => (ClassFlags::ABSTRACT, false, false, Handle::NULL),
                ClassKind::Interface => (
                    ClassFlags::INTERFACE | ClassFlags::ABSTRACT,
                    false,
                    false,
                    Handle::NULL,
                ),
                ClassKind::Struct => (ClassFlags::SEALED, true, false, Handle::NULL),
                ClassKind::Enum(base) => (ClassFlags::SEALED, true, true, base),
            };
            let handle = Handle::new(CLASS_BASE + state.classes.len() * STRIDE);
            let full_name = if namespace.is_empty() {
                name.to_string()
            } else {
                format!("{namespace}.{name}")
            };
            let type_kind = if value_type {
                TypeEnum::ValueType
            } else {
                TypeEnum::Class
            };
            let ty = state.new_type(&full_name, type_kind, handle);
            state.classes.push(ClassDef {
                name: name.to_string(),
                namespace: namespace.to_string(),
                parent,
                ty,
                flags,
                value_type,
                is_enum,
                enum_base,
                instance_size,
                fields: Vec::new(),
                methods: Vec::new(),
            });
            handle
        };
        if let ClassKind::Enum(base) = kind {
            self.add_field(handle, "value__", base, 0);
        }
        handle
    }

    pub fn class_type(&self, class: Handle) -> Handle {
        self.read().class(class).map(|def| def.ty).unwrap_or(Handle::NULL)
    }

    /// Declares a field. Instance fields are laid out after the ones already
    /// declared; static fields get fresh zeroed storage; literals get none.
    pub fn add_field(&self, class: Handle, name: &str, ty: Handle, flags: u32) -> Handle {
        let mut state = self.write();
        let (size, align) = state.layout_of(ty).unwrap_or((8, 8));
        let (offset, static_address) = if flags & FieldFlags::LITERAL != 0 {
            (0, Handle::NULL)
        } else if flags & FieldFlags::STATIC != 0 {
            (0, state.alloc(size))
        } else {
            match state.class_mut(class) {
                Ok(def) => {
                    let offset = def.instance_size.next_multiple_of(align);
                    def.instance_size = offset + size;
                    (offset, Handle::NULL)
                }
                Err(_) => (0, Handle::NULL),
            }
        };
        let handle = Handle::new(FIELD_BASE + state.fields.len() * STRIDE);
        state.fields.push(FieldDef {
            name: name.to_string(),
            flags,
            offset,
            ty,
            parent: class,
            static_address,
        });
        if let Ok(def) = state.class_mut(class) {
            def.fields.push(handle);
        }
        handle
    }

    pub fn add_method(
        &self,
        class: Handle,
        name: &str,
        flags: u32,
        return_type: Handle,
        parameters: &[(&str, Handle)],
        body: Option<MethodBody>,
    ) -> Handle {
        let mut state = self.write();
        let index = state.methods.len();
        let handle = Handle::new(METHOD_BASE + index * STRIDE);
        let pointer = if flags & MethodFlags::ABSTRACT != 0 {
            Handle::NULL
        } else {
            Handle::new(CODE_BASE + index * STRIDE)
        };
        state.methods.push(MethodDef {
            name: name.to_string(),
            flags,
            class,
            return_type,
            parameters: parameters
                .iter()
                .map(|(name, ty)| (name.to_string(), *ty))
                .collect(),
            pointer,
            body,
        });
        if let Ok(def) = state.class_mut(class) {
            def.methods.push(handle);
        }
        handle
    }

    pub fn field_offset(&self, field: Handle) -> usize {
        self.read().field(field).map(|def| def.offset).unwrap_or(0)
    }

    /// Overrides the boxed size reported for `class`.
    pub fn set_instance_size(&self, class: Handle, size: usize) {
        if let Ok(def) = self.write().class_mut(class) {
            def.instance_size = size;
        }
    }

    pub fn instance_size(&self, class: Handle) -> usize {
        self.read()
            .class(class)
            .map(|def| def.instance_size)
            .unwrap_or(0)
    }

    /// Writes `value` at `object + offset`; used by method bodies.
    pub fn store(&self, object: Handle, offset: usize, bytes: &[u8]) -> ApiResult<()> {
        self.write_memory(object.add(offset), bytes)
    }

    pub fn load(&self, object: Handle, offset: usize, len: usize) -> ApiResult<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_memory(object.add(offset), &mut buf)?;
        Ok(buf)
    }
}

impl MetadataApi for FakeRuntime {
    fn read_memory(&self, address: Handle, buf: &mut [u8]) -> ApiResult<()> {
        let state = self.read();
        let range = state.range(address, buf.len())?;
        buf.copy_from_slice(&state.heap[range]);
        Ok(())
    }

    fn write_memory(&self, address: Handle, bytes: &[u8]) -> ApiResult<()> {
        let mut state = self.write();
        let range = state.range(address, bytes.len())?;
        state.heap[range].copy_from_slice(bytes);
        Ok(())
    }

    fn object_get_header_size(&self) -> usize {
        HEADER_SIZE
    }

    fn object_get_class(&self, object: Handle) -> ApiResult<Handle> {
        let state = self.read();
        let range = state
            .range(object, 8)
            .map_err(|_| ApiError::InvalidHandle(object))?;
        let mut word = [0u8; 8];
        word.copy_from_slice(&state.heap[range]);
        let class = Handle::new(u64::from_le_bytes(word) as usize);
        state
            .class(class)
            .map_err(|_| ApiError::InvalidHandle(object))?;
        Ok(class)
    }

    fn object_new(&self, class: Handle) -> ApiResult<Handle> {
        let mut state = self.write();
        let def = state.class(class)?;
        if def.flags & (ClassFlags::ABSTRACT | ClassFlags::INTERFACE) != 0 {
            return Err(ApiError::Allocation {
                class,
                reason: format!("{} is abstract", def.name),
            });
        }
        let size = def.instance_size.max(HEADER_SIZE);
        let object = state.alloc(size);
        let range = state.range(object, 8)?;
        state.heap[range].copy_from_slice(&(class.address() as u64).to_le_bytes());
        Ok(object)
    }

    fn object_unbox(&self, object: Handle) -> ApiResult<Handle> {
        let class = self.object_get_class(object)?;
        if !self.read().class(class)?.value_type {
            return Err(ApiError::NotBoxedValueType(object));
        }
        Ok(object.add(HEADER_SIZE))
    }

    fn class_get_name(&self, class: Handle) -> ApiResult<String> {
        Ok(self.read().class(class)?.name.clone())
    }

    fn class_get_namespace(&self, class: Handle) -> ApiResult<String> {
        Ok(self.read().class(class)?.namespace.clone())
    }

    fn class_get_parent(&self, class: Handle) -> ApiResult<Handle> {
        Ok(self.read().class(class)?.parent)
    }

    fn class_get_type(&self, class: Handle) -> ApiResult<Handle> {
        Ok(self.read().class(class)?.ty)
    }

    fn class_get_flags(&self, class: Handle) -> ApiResult<u32> {
        Ok(self.read().class(class)?.flags)
    }

    fn class_is_value_type(&self, class: Handle) -> ApiResult<bool> {
        Ok(self.read().class(class)?.value_type)
    }

    fn class_is_enum(&self, class: Handle) -> ApiResult<bool> {
        Ok(self.read().class(class)?.is_enum)
    }

    fn class_get_instance_size(&self, class: Handle) -> ApiResult<usize> {
        Ok(self.read().class(class)?.instance_size)
    }

    fn class_enum_base_type(&self, class: Handle) -> ApiResult<Handle> {
        Ok(self.read().class(class)?.enum_base)
    }

    fn class_get_fields(&self, class: Handle) -> ApiResult<Vec<Handle>> {
        Ok(self.read().class(class)?.fields.clone())
    }

    fn class_get_methods(&self, class: Handle) -> ApiResult<Vec<Handle>> {
        Ok(self.read().class(class)?.methods.clone())
    }

    fn field_get_name(&self, field: Handle) -> ApiResult<String> {
        Ok(self.read().field(field)?.name.clone())
    }

    fn field_get_flags(&self, field: Handle) -> ApiResult<u32> {
        Ok(self.read().field(field)?.flags)
    }

    fn field_get_offset(&self, field: Handle) -> ApiResult<usize> {
        Ok(self.read().field(field)?.offset)
    }

    fn field_get_type(&self, field: Handle) -> ApiResult<Handle> {
        Ok(self.read().field(field)?.ty)
    }

    fn field_get_parent(&self, field: Handle) -> ApiResult<Handle> {
        Ok(self.read().field(field)?.parent)
    }

    fn field_get_static_address(&self, field: Handle) -> ApiResult<Handle> {
        let state = self.read();
        let def = state.field(field)?;
        if def.static_address.is_null() {
            return Err(ApiError::StaticStorage(field));
        }
        Ok(def.static_address)
    }

    fn method_get_name(&self, method: Handle) -> ApiResult<String> {
        Ok(self.read().method(method)?.name.clone())
    }

    fn method_get_flags(&self, method: Handle) -> ApiResult<u32> {
        Ok(self.read().method(method)?.flags)
    }

    fn method_get_class(&self, method: Handle) -> ApiResult<Handle> {
        Ok(self.read().method(method)?.class)
    }

    fn method_get_return_type(&self, method: Handle) -> ApiResult<Handle> {
        Ok(self.read().method(method)?.return_type)
    }

    fn method_get_parameter_count(&self, method: Handle) -> ApiResult<usize> {
        Ok(self.read().method(method)?.parameters.len())
    }

    fn method_get_parameter_name(&self, method: Handle, position: usize) -> ApiResult<String> {
        let state = self.read();
        let def = state.method(method)?;
        def.parameters
            .get(position)
            .map(|(name, _)| name.clone())
            .ok_or(ApiError::InvalidHandle(method))
    }

    fn method_get_parameter_type(&self, method: Handle, position: usize) -> ApiResult<Handle> {
        let state = self.read();
        let def = state.method(method)?;
        def.parameters
            .get(position)
            .map(|(_, ty)| *ty)
            .ok_or(ApiError::InvalidHandle(method))
    }

    fn method_get_pointer(&self, method: Handle) -> ApiResult<Handle> {
        Ok(self.read().method(method)?.pointer)
    }

    fn type_get_name(&self, ty: Handle) -> ApiResult<String> {
        Ok(self.read().ty(ty)?.name.clone())
    }

    fn type_get_type_enum(&self, ty: Handle) -> ApiResult<u8> {
        Ok(self.read().ty(ty)?.kind.into())
    }

    fn type_is_byref(&self, ty: Handle) -> ApiResult<bool> {
        self.read().ty(ty)?;
        Ok(false)
    }

    fn type_get_class(&self, ty: Handle) -> ApiResult<Handle> {
        Ok(self.read().ty(ty)?.class)
    }

    fn runtime_invoke(
        &self,
        method: Handle,
        receiver: Handle,
        args: &[RawValue],
    ) -> ApiResult<Option<RawValue>> {
        // Bodies reenter the API, so the lock must be released first.
        let body = self.read().method(method)?.body.clone();
        match body {
            Some(body) => body(self, receiver, args),
            None => Err(ApiError::Invocation {
                method,
                reason: "method has no body".to_string(),
            }),
        }
    }
}

/// Handles of the classes and types shared by most tests.
pub struct Corlib {
    pub void: Handle,
    pub boolean: Handle,
    pub byte: Handle,
    pub int32: Handle,
    pub int64: Handle,
    pub single: Handle,
    pub object: Handle,
    pub object_type: Handle,
    pub string: Handle,
    pub string_type: Handle,
}

impl Corlib {
    pub fn install(rt: &FakeRuntime) -> Self {
        let object = rt.define_class("System", "Object", None, ClassKind::Class);
        let string = rt.define_class("System", "String", Some(object), ClassKind::Class);
        let string_type = rt.define_type("System.String", TypeEnum::String, string);
        Self {
            void: rt.primitive("System.Void", TypeEnum::Void),
            boolean: rt.primitive("System.Boolean", TypeEnum::Boolean),
            byte: rt.primitive("System.Byte", TypeEnum::U1),
            int32: rt.primitive("System.Int32", TypeEnum::I4),
            int64: rt.primitive("System.Int64", TypeEnum::I8),
            single: rt.primitive("System.Single", TypeEnum::R4),
            object,
            object_type: rt.define_type("System.Object", TypeEnum::Object, object),
            string,
            string_type,
        }
    }
}

pub fn f32_arg(raw: &RawValue) -> f32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&raw[..4]);
    f32::from_le_bytes(bytes)
}

pub fn i32_arg(raw: &RawValue) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&raw[..4]);
    i32::from_le_bytes(bytes)
}

/// A small game-like scene: value types, an enum, a class referencing them,
/// and a two-level comparer hierarchy.
pub struct World {
    pub domain: Arc<Domain>,
    pub corlib: Corlib,
    pub vector2: Handle,
    pub team: Handle,
    pub player: Handle,
    /// `{ Int64 score; Byte level; Vector2 spawn; Player owner }`, padded
    /// between `level` and `spawn`.
    pub stats: Handle,
    pub string_comparer: Handle,
    pub ordinal_comparer: Handle,
}

pub const MAX_HEALTH: i32 = 100;

pub fn world() -> World {
    world_with(DomainConfig::default())
}

pub fn world_with(config: DomainConfig) -> World {
    il2cpp_reflect::telemetry::init_tracing();
    let rt = FakeRuntime::new();
    let corlib = Corlib::install(&rt);
    let value_type = rt.define_class("System", "ValueType", Some(corlib.object), ClassKind::Abstract);

    let vector2 = rt.define_class("UnityEngine", "Vector2", Some(value_type), ClassKind::Struct);
    let vector2_type = rt.class_type(vector2);
    let x = rt.add_field(vector2, "x", corlib.single, 0);
    let y = rt.add_field(vector2, "y", corlib.single, 0);
    let (x, y) = (rt.field_offset(x), rt.field_offset(y));
    rt.add_field(vector2, "kEpsilon", corlib.single, FieldFlags::STATIC | FieldFlags::LITERAL);
    rt.add_method(
        vector2,
        ".ctor",
        0,
        corlib.void,
        &[("x", corlib.single), ("y", corlib.single)],
        Some(body(move |rt, this, args| {
            rt.store(this, x, &args[0])?;
            rt.store(this, y, &args[1])?;
            Ok(None)
        })),
    );
    rt.add_method(
        vector2,
        "get_magnitude",
        0,
        corlib.single,
        &[],
        Some(body(move |rt, this, _| {
            let components = rt.load(this, x, 8)?;
            let x = f32_arg(&RawValue::from_slice(&components[..4]));
            let y = f32_arg(&RawValue::from_slice(&components[4..]));
            Ok(Some(RawValue::from_slice(&(x * x + y * y).sqrt().to_le_bytes())))
        })),
    );
    rt.add_method(
        vector2,
        "get_one",
        MethodFlags::STATIC,
        vector2_type,
        &[],
        Some(body(|_, _, _| {
            let mut raw = RawValue::from_slice(&1.0f32.to_le_bytes());
            raw.extend_from_slice(&1.0f32.to_le_bytes());
            Ok(Some(raw))
        })),
    );
    rt.add_method(
        vector2,
        "Dot",
        MethodFlags::STATIC,
        corlib.single,
        &[("lhs", vector2_type), ("rhs", vector2_type)],
        Some(body(|_, _, args| {
            let component = |raw: &RawValue, at: usize| f32_arg(&RawValue::from_slice(&raw[at..at + 4]));
            let dot = component(&args[0], 0) * component(&args[1], 0)
                + component(&args[0], 4) * component(&args[1], 4);
            Ok(Some(RawValue::from_slice(&dot.to_le_bytes())))
        })),
    );

    let team = rt.define_class("Game", "Team", None, ClassKind::Enum(corlib.int32));
    let team_type = rt.class_type(team);
    rt.add_field(team, "Red", team_type, FieldFlags::STATIC | FieldFlags::LITERAL);
    rt.add_field(team, "Blue", team_type, FieldFlags::STATIC | FieldFlags::LITERAL);

    let player = rt.define_class("Game", "Player", Some(corlib.object), ClassKind::Class);
    let player_type = rt.class_type(player);
    let name = rt.add_field(player, "name", corlib.string_type, 0);
    let health = rt.add_field(player, "health", corlib.int32, 0);
    rt.add_field(player, "position", vector2_type, 0);
    rt.add_field(player, "team", team_type, 0);
    rt.add_field(player, "target", player_type, 0);
    let count = rt.add_field(player, "count", corlib.int32, FieldFlags::STATIC);
    rt.add_field(player, "MaxHealth", corlib.int32, FieldFlags::STATIC | FieldFlags::LITERAL);
    let (name, health) = (rt.field_offset(name), rt.field_offset(health));
    let count = rt.field_get_static_address(count).unwrap_or(Handle::NULL);

    rt.add_method(
        player,
        ".ctor",
        0,
        corlib.void,
        &[],
        Some(body(move |rt, this, _| {
            rt.store(this, health, &MAX_HEALTH.to_le_bytes())?;
            let current = i32_arg(&RawValue::from_vec(rt.load(count, 0, 4)?));
            rt.store(count, 0, &(current + 1).to_le_bytes())?;
            Ok(None)
        })),
    );
    rt.add_method(
        player,
        "Damage",
        MethodFlags::VIRTUAL,
        corlib.void,
        &[("amount", corlib.int32)],
        Some(body(move |rt, this, args| {
            let current = i32_arg(&RawValue::from_vec(rt.load(this, health, 4)?));
            rt.store(this, health, &(current - i32_arg(&args[0])).to_le_bytes())?;
            Ok(None)
        })),
    );
    rt.add_method(
        player,
        "Damage",
        MethodFlags::VIRTUAL,
        corlib.void,
        &[("amount", corlib.int32), ("critical", corlib.boolean)],
        Some(body(move |rt, this, args| {
            let factor = if args[1][0] != 0 { 2 } else { 1 };
            let current = i32_arg(&RawValue::from_vec(rt.load(this, health, 4)?));
            rt.store(
                this,
                health,
                &(current - factor * i32_arg(&args[0])).to_le_bytes(),
            )?;
            Ok(None)
        })),
    );
    rt.add_method(
        player,
        "get_Health",
        0,
        corlib.int32,
        &[],
        Some(body(move |rt, this, _| {
            Ok(Some(RawValue::from_vec(rt.load(this, health, 4)?)))
        })),
    );
    rt.add_method(
        player,
        "get_Count",
        MethodFlags::STATIC,
        corlib.int32,
        &[],
        Some(body(move |rt, _, _| Ok(Some(RawValue::from_vec(rt.load(count, 0, 4)?))))),
    );
    rt.add_method(
        player,
        "GetName",
        0,
        corlib.string_type,
        &[],
        Some(body(move |rt, this, _| {
            Ok(Some(RawValue::from_vec(rt.load(this, name, 8)?)))
        })),
    );

    let stats = rt.define_class("Game", "Stats", Some(value_type), ClassKind::Struct);
    rt.add_field(stats, "score", corlib.int64, 0);
    rt.add_field(stats, "level", corlib.byte, 0);
    rt.add_field(stats, "spawn", vector2_type, 0);
    rt.add_field(stats, "owner", player_type, 0);

    let string_comparer = rt.define_class("System", "StringComparer", Some(corlib.object), ClassKind::Abstract);
    rt.add_method(
        string_comparer,
        "Compare",
        MethodFlags::VIRTUAL | MethodFlags::ABSTRACT,
        corlib.int32,
        &[("x", corlib.string_type), ("y", corlib.string_type)],
        None,
    );
    let ordinal_comparer = rt.define_class(
        "System",
        "OrdinalComparer",
        Some(string_comparer),
        ClassKind::Class,
    );
    rt.add_field(ordinal_comparer, "_ignoreCase", corlib.boolean, 0);

    World {
        domain: rt
            .attach_with(config)
            .unwrap_or_else(|err| panic!("cannot attach the scene: {err}")),
        corlib,
        vector2,
        team,
        player,
        stats,
        string_comparer,
        ordinal_comparer,
    }
}
