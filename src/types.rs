//! Builtin type registry and the parameterized-type cache.
//!
//! ## Builtins
//!
//! - Integral: `bool`, `varint`, `varlong`, `byte`, `ubyte`, `short`, `ushort`,
//!   `int`, `uint`, `long`, `ulong`
//! - Floating point: `float`, `double`
//! - Other simple types: `position`, `angle`, `metadata`, `nbt`, `slot`
//! - Parameterized: `string [length] [utf8|utf16]`, `bytes [length|remaining]`,
//!   `uuid [binary|hex|hyphenated]`, `array <length> <elem>`, `bool_optional <elem>`
//!
//! Parameterized builtins always produce an instance from the [`TypeCache`],
//! so two structurally equal applications share one [`ParamId`].

use crate::ast::{Literal, TypeArg};
use crate::error::CompileError;
use crate::lexer::Position;
use crate::namespace::ScopeId;
use std::collections::HashMap;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Varint,
    Varlong,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Position,
    Angle,
    Metadata,
    Nbt,
    Slot,
    String,
    Bytes,
    Uuid,
    Array,
    BoolOptional,
}

impl Builtin {
    pub const ALL: [Builtin; 23] = [
        Builtin::Bool,
        Builtin::Varint,
        Builtin::Varlong,
        Builtin::Byte,
        Builtin::UByte,
        Builtin::Short,
        Builtin::UShort,
        Builtin::Int,
        Builtin::UInt,
        Builtin::Long,
        Builtin::ULong,
        Builtin::Float,
        Builtin::Double,
        Builtin::Position,
        Builtin::Angle,
        Builtin::Metadata,
        Builtin::Nbt,
        Builtin::Slot,
        Builtin::String,
        Builtin::Bytes,
        Builtin::Uuid,
        Builtin::Array,
        Builtin::BoolOptional,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Varint => "varint",
            Builtin::Varlong => "varlong",
            Builtin::Byte => "byte",
            Builtin::UByte => "ubyte",
            Builtin::Short => "short",
            Builtin::UShort => "ushort",
            Builtin::Int => "int",
            Builtin::UInt => "uint",
            Builtin::Long => "long",
            Builtin::ULong => "ulong",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Position => "position",
            Builtin::Angle => "angle",
            Builtin::Metadata => "metadata",
            Builtin::Nbt => "nbt",
            Builtin::Slot => "slot",
            Builtin::String => "string",
            Builtin::Bytes => "bytes",
            Builtin::Uuid => "uuid",
            Builtin::Array => "array",
            Builtin::BoolOptional => "bool_optional",
        }
    }

    /// Look up a builtin by its (case-folded) name.
    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Builtin::Bool
                | Builtin::Varint
                | Builtin::Varlong
                | Builtin::Byte
                | Builtin::UByte
                | Builtin::Short
                | Builtin::UShort
                | Builtin::Int
                | Builtin::UInt
                | Builtin::Long
                | Builtin::ULong
        )
    }

    /// Values an integral builtin can carry on the wire. `ulong` is capped at
    /// `i64::MAX` since literals are `i64`.
    pub fn int_range(self) -> Option<RangeInclusive<i64>> {
        let range = match self {
            Builtin::Bool => 0..=1,
            Builtin::Byte => i64::from(i8::MIN)..=i64::from(i8::MAX),
            Builtin::UByte => 0..=i64::from(u8::MAX),
            Builtin::Short => i64::from(i16::MIN)..=i64::from(i16::MAX),
            Builtin::UShort => 0..=i64::from(u16::MAX),
            Builtin::Int | Builtin::Varint => i64::from(i32::MIN)..=i64::from(i32::MAX),
            Builtin::UInt => 0..=i64::from(u32::MAX),
            Builtin::Long | Builtin::Varlong => i64::MIN..=i64::MAX,
            Builtin::ULong => 0..=i64::MAX,
            _ => return None,
        };
        Some(range)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Builtin::Float | Builtin::Double)
    }

    /// Builtins that are always applied through the cache.
    pub fn is_parameterized(self) -> bool {
        matches!(
            self,
            Builtin::String | Builtin::Bytes | Builtin::Uuid | Builtin::Array | Builtin::BoolOptional
        )
    }

    /// Validate the arguments following this builtin's name and build the type.
    /// `pos` is the position of the whole type application.
    pub fn construct<R>(self, params: &[TypeArg], pos: &Position, resolver: &mut R) -> Result<TypeRef, CompileError>
    where
        R: TypeResolver + ?Sized,
    {
        let name = self.name();
        let param = match self {
            Builtin::String => {
                if params.len() > 2 {
                    return Err(CompileError::arity(pos, name, "expected `string [length] [encoding]`"));
                }
                let length = match params.first() {
                    Some(arg) => length_arg(arg, name, false, resolver)?,
                    None => Length::Prefixed(Builtin::Varint),
                };
                let encoding = match params.get(1) {
                    Some(arg) => {
                        let word = word_arg(arg, name)?;
                        StringEncoding::from_name(&word).ok_or_else(|| {
                            CompileError::arity(arg.pos(), name, format!("unknown encoding `{}`", word))
                        })?
                    }
                    None => StringEncoding::Utf8,
                };
                ParamType::String { length, encoding }
            }
            Builtin::Bytes => {
                if params.len() > 1 {
                    return Err(CompileError::arity(pos, name, "expected `bytes [length]`"));
                }
                let length = match params.first() {
                    Some(arg) => length_arg(arg, name, true, resolver)?,
                    None => Length::Prefixed(Builtin::Varint),
                };
                ParamType::Bytes { length }
            }
            Builtin::Uuid => {
                if params.len() > 1 {
                    return Err(CompileError::arity(pos, name, "expected `uuid [encoding]`"));
                }
                let encoding = match params.first() {
                    Some(arg) => {
                        let word = word_arg(arg, name)?;
                        UuidEncoding::from_name(&word).ok_or_else(|| {
                            CompileError::arity(arg.pos(), name, format!("unknown encoding `{}`", word))
                        })?
                    }
                    None => UuidEncoding::Binary,
                };
                ParamType::Uuid { encoding }
            }
            Builtin::Array => {
                let [length, elem] = params else {
                    return Err(CompileError::arity(pos, name, "expected `array <length> <elem>`"));
                };
                let length = length_arg(length, name, false, resolver)?;
                let elem = resolver.resolve_arg(elem)?;
                ParamType::Array { length, elem }
            }
            Builtin::BoolOptional => {
                let [elem] = params else {
                    return Err(CompileError::arity(pos, name, "expected `bool_optional <elem>`"));
                };
                let elem = resolver.resolve_arg(elem)?;
                ParamType::BoolOptional { elem }
            }
            simple => {
                if !params.is_empty() {
                    return Err(CompileError::arity(pos, name, "expected no arguments"));
                }
                return Ok(TypeRef::Builtin(simple));
            }
        };
        Ok(TypeRef::Param(resolver.cache().parameterize(param)))
    }
}

/// Length argument: literal count, integer-type prefix, or (for `bytes`) `remaining`.
fn length_arg<R>(arg: &TypeArg, type_name: &str, allow_remaining: bool, resolver: &mut R) -> Result<Length, CompileError>
where
    R: TypeResolver + ?Sized,
{
    match arg {
        TypeArg::Value(value) => match value.literal {
            Literal::Number(n) => u64::try_from(n)
                .map(Length::Fixed)
                .map_err(|_| CompileError::arity(&value.pos, type_name, format!("negative length {}", n))),
            Literal::String(_) => Err(CompileError::arity(&value.pos, type_name, "length must be an integer or integer type")),
        },
        TypeArg::Name(id) if id.name == REMAINING => {
            if allow_remaining {
                Ok(Length::Remaining)
            } else {
                Err(CompileError::arity(&id.pos, type_name, "`remaining` is only valid for bytes"))
            }
        }
        other => match resolver.resolve_arg(other)? {
            TypeRef::Builtin(b) if b.is_integer() => Ok(Length::Prefixed(b)),
            _ => Err(CompileError::arity(other.pos(), type_name, "length must be an integer or integer type")),
        },
    }
}

/// Bare word argument (encoding names); identifiers and string literals both work.
fn word_arg(arg: &TypeArg, type_name: &str) -> Result<String, CompileError> {
    match arg {
        TypeArg::Name(id) if id.is_local() => Ok(id.name.clone()),
        TypeArg::Value(value) => match &value.literal {
            Literal::String(s) => Ok(s.to_ascii_lowercase()),
            Literal::Number(_) => Err(CompileError::arity(&value.pos, type_name, "expected an encoding name")),
        },
        other => Err(CompileError::arity(other.pos(), type_name, "expected an encoding name")),
    }
}

/// Sentinel length for `bytes`: read to the end of the stream.
pub const REMAINING: &str = "remaining";

/// Resolves nested type arguments in the scope a type spec appears in.
pub trait TypeResolver {
    fn resolve_arg(&mut self, arg: &TypeArg) -> Result<TypeRef, CompileError>;
    fn cache(&mut self) -> &mut TypeCache;
}

/// Canonical id of a parameterized type instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub(crate) u32);

impl ParamId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference to any compiled type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(Builtin),
    Param(ParamId),
    Struct(ScopeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    Fixed(u64),
    /// Prefixed by a value of this integer type.
    Prefixed(Builtin),
    /// Everything up to the end of the stream.
    Remaining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    Utf8,
    Utf16,
}

impl StringEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "utf8" => Some(StringEncoding::Utf8),
            "utf16" => Some(StringEncoding::Utf16),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StringEncoding::Utf8 => "utf8",
            StringEncoding::Utf16 => "utf16",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidEncoding {
    Binary,
    Hex,
    Hyphenated,
}

impl UuidEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "binary" | "bin" => Some(UuidEncoding::Binary),
            "hex" => Some(UuidEncoding::Hex),
            "hyphenated" | "rfc" => Some(UuidEncoding::Hyphenated),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UuidEncoding::Binary => "binary",
            UuidEncoding::Hex => "hex",
            UuidEncoding::Hyphenated => "hyphenated",
        }
    }
}

/// A builtin constructor applied to concrete arguments. Also the cache key:
/// the variant identifies the constructor, the fields are the argument tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    String { length: Length, encoding: StringEncoding },
    Bytes { length: Length },
    Uuid { encoding: UuidEncoding },
    Array { length: Length, elem: TypeRef },
    /// Boolean-gated array of at most one element.
    BoolOptional { elem: TypeRef },
}

impl ParamType {
    pub fn constructor(&self) -> Builtin {
        match self {
            ParamType::String { .. } => Builtin::String,
            ParamType::Bytes { .. } => Builtin::Bytes,
            ParamType::Uuid { .. } => Builtin::Uuid,
            ParamType::Array { .. } => Builtin::Array,
            ParamType::BoolOptional { .. } => Builtin::BoolOptional,
        }
    }

    pub fn length(&self) -> Option<Length> {
        match self {
            ParamType::String { length, .. } | ParamType::Bytes { length } | ParamType::Array { length, .. } => {
                Some(*length)
            }
            ParamType::BoolOptional { .. } => Some(Length::Prefixed(Builtin::Bool)),
            ParamType::Uuid { .. } => None,
        }
    }

    pub fn elem(&self) -> Option<TypeRef> {
        match self {
            ParamType::Array { elem, .. } | ParamType::BoolOptional { elem } => Some(*elem),
            _ => None,
        }
    }
}

/// Memoizes parameterized types: one [`ParamId`] per distinct [`ParamType`].
///
/// Owned by a single compilation, never shared between runs.
#[derive(Debug, Default, Clone)]
pub struct TypeCache {
    instances: Vec<ParamType>,
    index: HashMap<ParamType, ParamId>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical instance for `ty`, creating it on first use.
    pub fn parameterize(&mut self, ty: ParamType) -> ParamId {
        if let Some(&id) = self.index.get(&ty) {
            log::trace!("type cache hit: {:?} -> {:?}", ty, id);
            return id;
        }
        let id = ParamId(self.instances.len() as u32);
        log::trace!("type cache miss: {:?} -> {:?}", ty, id);
        self.instances.push(ty.clone());
        self.index.insert(ty, id);
        id
    }

    pub fn get(&self, id: ParamId) -> &ParamType {
        &self.instances[id.index()]
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &ParamType)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, ty)| (ParamId(i as u32), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_round_trip() {
        for b in Builtin::ALL {
            assert_eq!(Builtin::from_name(b.name()), Some(b));
        }
        assert_eq!(Builtin::from_name("packet"), None);
    }

    #[test]
    fn bool_counts_as_integer() {
        assert!(Builtin::Bool.is_integer());
        assert!(Builtin::ULong.is_integer());
        assert!(!Builtin::Float.is_integer());
        assert!(!Builtin::String.is_integer());
    }

    #[test]
    fn integer_ranges_follow_wire_width() {
        assert_eq!(Builtin::Byte.int_range(), Some(-128..=127));
        assert_eq!(Builtin::UByte.int_range(), Some(0..=255));
        assert_eq!(Builtin::Varint.int_range(), Builtin::Int.int_range());
        assert_eq!(Builtin::ULong.int_range().map(|r| *r.start()), Some(0));
        assert_eq!(Builtin::Double.int_range(), None);
        for b in Builtin::ALL {
            assert_eq!(b.int_range().is_some(), b.is_integer(), "{}", b.name());
        }
    }

    #[test]
    fn cache_returns_same_id_for_equal_keys() {
        let mut cache = TypeCache::new();
        let a = cache.parameterize(ParamType::Array {
            length: Length::Fixed(3),
            elem: TypeRef::Builtin(Builtin::Byte),
        });
        let b = cache.parameterize(ParamType::Array {
            length: Length::Fixed(3),
            elem: TypeRef::Builtin(Builtin::Byte),
        });
        let c = cache.parameterize(ParamType::Array {
            length: Length::Fixed(4),
            elem: TypeRef::Builtin(Builtin::Byte),
        });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn constructor_identity_is_part_of_the_key() {
        let mut cache = TypeCache::new();
        let opt = cache.parameterize(ParamType::BoolOptional {
            elem: TypeRef::Builtin(Builtin::Position),
        });
        let arr = cache.parameterize(ParamType::Array {
            length: Length::Prefixed(Builtin::Bool),
            elem: TypeRef::Builtin(Builtin::Position),
        });
        assert_ne!(opt, arr);
        assert_eq!(cache.get(opt).constructor(), Builtin::BoolOptional);
    }

    #[test]
    fn encodings_by_name() {
        assert_eq!(StringEncoding::from_name("utf16"), Some(StringEncoding::Utf16));
        assert_eq!(StringEncoding::from_name("latin1"), None);
        assert_eq!(UuidEncoding::from_name("rfc"), Some(UuidEncoding::Hyphenated));
        assert_eq!(UuidEncoding::from_name("bin"), Some(UuidEncoding::Binary));
    }
}
