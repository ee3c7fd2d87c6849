//! Reader for the Ruby Marshal 4.8 binary object format.
//!
//! Gem repositories publish their specs indexes as a gzipped Marshal dump of
//! an array of `[name, version, platform]` tuples. This module decodes the
//! full object graph into [`Value`] trees; the mapping to package
//! identifiers lives in the parent module.
//!
//! # Format Overview
//!
//! ```text
//! 04 08            version header (major 4, minor 8)
//! <tag> <payload>  root object
//! ```
//!
//! Every value starts with a one-byte tag. Integers and lengths use Ruby's
//! packed "long" encoding. Non-immediate objects are appended to a link
//! table as they are read so later `@` tags can reference them by index;
//! symbols have their own table referenced by `;` tags.

use std::rc::Rc;

use super::error::FormatError;

/// Supported major version.
pub const MAJOR_VERSION: u8 = 4;

/// Highest supported minor version.
pub const MINOR_VERSION: u8 = 8;

/// Nesting limit for values. Specs indexes nest three levels deep.
const MAX_DEPTH: usize = 64;

const TYPE_NIL: u8 = b'0';
const TYPE_TRUE: u8 = b'T';
const TYPE_FALSE: u8 = b'F';
const TYPE_FIXNUM: u8 = b'i';
const TYPE_EXTENDED: u8 = b'e';
const TYPE_UCLASS: u8 = b'C';
const TYPE_OBJECT: u8 = b'o';
const TYPE_USERDEF: u8 = b'u';
const TYPE_USRMARSHAL: u8 = b'U';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BIGNUM: u8 = b'l';
const TYPE_STRING: u8 = b'"';
const TYPE_REGEXP: u8 = b'/';
const TYPE_ARRAY: u8 = b'[';
const TYPE_HASH: u8 = b'{';
const TYPE_HASH_DEF: u8 = b'}';
const TYPE_STRUCT: u8 = b'S';
const TYPE_MODULE_OLD: u8 = b'M';
const TYPE_CLASS: u8 = b'c';
const TYPE_MODULE: u8 = b'm';
const TYPE_SYMBOL: u8 = b':';
const TYPE_SYMLINK: u8 = b';';
const TYPE_IVAR: u8 = b'I';
const TYPE_LINK: u8 = b'@';

/// Interned symbol name.
pub type Symbol = Rc<str>;

/// A decoded Marshal value.
///
/// Heap values are reference counted because the format allows any object
/// to be referenced again later in the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    True,
    False,
    Integer(i64),
    /// Arbitrary precision integer as little-endian magnitude bytes.
    Bignum {
        negative: bool,
        magnitude: Vec<u8>,
    },
    Float(f64),
    /// Raw string bytes; the encoding ivar is not retained.
    String(Vec<u8>),
    Symbol(Symbol),
    Regexp {
        source: Vec<u8>,
        options: u8,
    },
    Array(Vec<Rc<Value>>),
    Hash {
        entries: Vec<(Rc<Value>, Rc<Value>)>,
        default: Option<Rc<Value>>,
    },
    Object {
        class: Symbol,
        ivars: Vec<(Symbol, Rc<Value>)>,
    },
    Struct {
        class: Symbol,
        members: Vec<(Symbol, Rc<Value>)>,
    },
    /// Object serialized through `marshal_dump`.
    UserMarshal {
        class: Symbol,
        data: Rc<Value>,
    },
    /// Object serialized through `_dump`.
    UserDefined {
        class: Symbol,
        data: Vec<u8>,
    },
    Class(Vec<u8>),
    Module(Vec<u8>),
}

impl Value {
    /// String bytes, if this is a string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Array elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Rc<Value>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up an instance variable on a plain object (`name` includes the `@`).
    pub fn ivar(&self, name: &str) -> Option<&Rc<Value>> {
        match self {
            Value::Object { ivars, .. } => ivars
                .iter()
                .find(|(key, _)| key.as_ref() == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Class name for class-tagged values.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Value::Object { class, .. }
            | Value::Struct { class, .. }
            | Value::UserMarshal { class, .. }
            | Value::UserDefined { class, .. } => Some(class),
            _ => None,
        }
    }
}

/// Decode a complete Marshal stream, returning its root value.
///
/// Bytes after the root value are ignored.
pub fn load(input: &[u8]) -> Result<Rc<Value>, FormatError> {
    let mut reader = Reader::new(input);
    reader.read_header()?;
    reader.read_value()
}

/// Cursor over a Marshal byte stream.
struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
    symbols: Vec<Symbol>,
    /// Link table; `None` marks an object whose payload is still being read.
    objects: Vec<Option<Rc<Value>>>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            symbols: Vec::new(),
            objects: Vec::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn read_header(&mut self) -> Result<(), FormatError> {
        let major = self.read_byte()?;
        let minor = self.read_byte()?;
        if major != MAJOR_VERSION || minor > MINOR_VERSION {
            return Err(FormatError::UnsupportedVersion { major, minor });
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, FormatError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or(FormatError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if len > self.remaining() {
            return Err(FormatError::UnexpectedEof {
                offset: self.input.len(),
            });
        }
        let input = self.input;
        let slice = &input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Packed long: small values live in the tag byte itself, larger ones
    /// follow as up to four little-endian bytes.
    fn read_long(&mut self) -> Result<i64, FormatError> {
        let c = self.read_byte()? as i8;
        let value = match c {
            0 => 0,
            5..=127 => (c - 5) as i64,
            -128..=-5 => (c + 5) as i64,
            1..=4 => {
                let mut x: i64 = 0;
                for i in 0..c as u32 {
                    x |= (self.read_byte()? as i64) << (8 * i);
                }
                x
            }
            -4..=-1 => {
                let mut x: i64 = -1;
                for i in 0..(-c) as u32 {
                    x &= !(0xff << (8 * i));
                    x |= (self.read_byte()? as i64) << (8 * i);
                }
                x
            }
        };
        Ok(value)
    }

    fn read_len(&mut self) -> Result<usize, FormatError> {
        let offset = self.pos;
        let length = self.read_long()?;
        usize::try_from(length).map_err(|_| FormatError::InvalidLength { length, offset })
    }

    fn read_bytes(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.read_len()?;
        self.read_slice(len)
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len() - 1
    }

    fn fill(&mut self, index: usize, value: Value) -> Rc<Value> {
        let value = Rc::new(value);
        self.objects[index] = Some(Rc::clone(&value));
        value
    }

    fn register(&mut self, value: Value) -> Rc<Value> {
        let index = self.reserve();
        self.fill(index, value)
    }

    /// Read a symbol in any of its encodings: literal, back-reference, or
    /// literal wrapped with encoding ivars.
    fn read_symbol(&mut self) -> Result<Symbol, FormatError> {
        let offset = self.pos;
        match self.read_byte()? {
            TYPE_SYMBOL => self.read_symbol_body(false),
            TYPE_SYMLINK => self.read_symlink(),
            TYPE_IVAR => {
                let inner_offset = self.pos;
                match self.read_byte()? {
                    TYPE_SYMBOL => self.read_symbol_body(true),
                    tag => Err(FormatError::UnexpectedShape {
                        entry: None,
                        reason: format!(
                            "expected symbol at offset {}, found tag 0x{:02x}",
                            inner_offset, tag
                        ),
                    }),
                }
            }
            tag => Err(FormatError::UnexpectedShape {
                entry: None,
                reason: format!(
                    "expected symbol at offset {}, found tag 0x{:02x}",
                    offset, tag
                ),
            }),
        }
    }

    fn read_symbol_body(&mut self, with_ivars: bool) -> Result<Symbol, FormatError> {
        let bytes = self.read_bytes()?;
        let symbol: Symbol = Rc::from(String::from_utf8_lossy(bytes).as_ref());
        self.symbols.push(Rc::clone(&symbol));
        if with_ivars {
            self.skip_ivars()?;
        }
        Ok(symbol)
    }

    fn read_symlink(&mut self) -> Result<Symbol, FormatError> {
        let offset = self.pos;
        let index = self.read_len()?;
        self.symbols
            .get(index)
            .cloned()
            .ok_or(FormatError::InvalidLink { index, offset })
    }

    fn read_ivars(&mut self) -> Result<Vec<(Symbol, Rc<Value>)>, FormatError> {
        let count = self.read_len()?;
        let mut ivars = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let key = self.read_symbol()?;
            let value = self.read_value()?;
            ivars.push((key, value));
        }
        Ok(ivars)
    }

    /// Ivars attached to strings and symbols only carry the encoding.
    fn skip_ivars(&mut self) -> Result<(), FormatError> {
        self.read_ivars().map(drop)
    }

    fn read_value(&mut self) -> Result<Rc<Value>, FormatError> {
        let mut ivars_pending = false;
        self.read_value_inner(&mut ivars_pending)
    }

    fn read_value_inner(&mut self, ivars_pending: &mut bool) -> Result<Rc<Value>, FormatError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormatError::DepthExceeded { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = self.read_tagged(ivars_pending);
        self.depth -= 1;
        result
    }

    /// Dispatch on the tag byte. Keep the arms small; this frame is paid
    /// once per nesting level.
    fn read_tagged(&mut self, ivars_pending: &mut bool) -> Result<Rc<Value>, FormatError> {
        let offset = self.pos;
        let tag = self.read_byte()?;

        match tag {
            TYPE_NIL => Ok(Rc::new(Value::Nil)),
            TYPE_TRUE => Ok(Rc::new(Value::True)),
            TYPE_FALSE => Ok(Rc::new(Value::False)),
            TYPE_FIXNUM => Ok(Rc::new(Value::Integer(self.read_long()?))),
            TYPE_LINK => self.read_link(),
            TYPE_SYMBOL => {
                let symbol = self.read_symbol_body(*ivars_pending)?;
                *ivars_pending = false;
                Ok(Rc::new(Value::Symbol(symbol)))
            }
            TYPE_SYMLINK => Ok(Rc::new(Value::Symbol(self.read_symlink()?))),
            TYPE_IVAR => self.read_with_ivars(),
            TYPE_EXTENDED | TYPE_UCLASS => {
                self.read_symbol()?;
                self.read_value_inner(ivars_pending)
            }
            TYPE_STRING => {
                let bytes = self.read_bytes()?.to_vec();
                Ok(self.register(Value::String(bytes)))
            }
            TYPE_FLOAT => self.read_float(offset),
            TYPE_BIGNUM => self.read_bignum(offset),
            TYPE_REGEXP => self.read_regexp(ivars_pending),
            TYPE_ARRAY => self.read_array(),
            TYPE_HASH => self.read_hash(false),
            TYPE_HASH_DEF => self.read_hash(true),
            TYPE_OBJECT => self.read_object(),
            TYPE_STRUCT => self.read_struct(),
            TYPE_USRMARSHAL => self.read_user_marshal(),
            TYPE_USERDEF => self.read_user_defined(ivars_pending),
            TYPE_CLASS => {
                let name = self.read_bytes()?.to_vec();
                Ok(self.register(Value::Class(name)))
            }
            TYPE_MODULE | TYPE_MODULE_OLD => {
                let name = self.read_bytes()?.to_vec();
                Ok(self.register(Value::Module(name)))
            }
            tag => Err(FormatError::UnknownTag { tag, offset }),
        }
    }

    fn read_link(&mut self) -> Result<Rc<Value>, FormatError> {
        let offset = self.pos;
        let index = self.read_len()?;
        match self.objects.get(index) {
            Some(Some(value)) => Ok(Rc::clone(value)),
            _ => Err(FormatError::InvalidLink { index, offset }),
        }
    }

    /// `I` wrapper: ivars follow the wrapped value unless it consumed them.
    fn read_with_ivars(&mut self) -> Result<Rc<Value>, FormatError> {
        let mut pending = true;
        let value = self.read_value_inner(&mut pending)?;
        if pending {
            self.skip_ivars()?;
        }
        Ok(value)
    }

    fn read_float(&mut self, offset: usize) -> Result<Rc<Value>, FormatError> {
        let bytes = self.read_bytes()?;
        let value = parse_float(bytes).ok_or(FormatError::InvalidFloat { offset })?;
        Ok(self.register(Value::Float(value)))
    }

    fn read_bignum(&mut self, offset: usize) -> Result<Rc<Value>, FormatError> {
        let negative = match self.read_byte()? {
            b'-' => true,
            b'+' => false,
            _ => {
                return Err(FormatError::UnexpectedShape {
                    entry: None,
                    reason: format!("invalid bignum sign at offset {}", offset + 1),
                })
            }
        };
        let shorts = self.read_len()?;
        let len = shorts
            .checked_mul(2)
            .ok_or(FormatError::UnexpectedEof { offset: self.pos })?;
        let magnitude = self.read_slice(len)?.to_vec();
        Ok(self.register(Value::Bignum {
            negative,
            magnitude,
        }))
    }

    fn read_regexp(&mut self, ivars_pending: &mut bool) -> Result<Rc<Value>, FormatError> {
        let source = self.read_bytes()?.to_vec();
        let options = self.read_byte()?;
        if *ivars_pending {
            self.skip_ivars()?;
            *ivars_pending = false;
        }
        Ok(self.register(Value::Regexp { source, options }))
    }

    fn read_array(&mut self) -> Result<Rc<Value>, FormatError> {
        let len = self.read_len()?;
        let index = self.reserve();
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.read_value()?);
        }
        Ok(self.fill(index, Value::Array(items)))
    }

    fn read_hash(&mut self, with_default: bool) -> Result<Rc<Value>, FormatError> {
        let len = self.read_len()?;
        let index = self.reserve();
        let mut entries = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            let key = self.read_value()?;
            let value = self.read_value()?;
            entries.push((key, value));
        }
        let default = if with_default {
            Some(self.read_value()?)
        } else {
            None
        };
        Ok(self.fill(index, Value::Hash { entries, default }))
    }

    fn read_object(&mut self) -> Result<Rc<Value>, FormatError> {
        let class = self.read_symbol()?;
        let index = self.reserve();
        let ivars = self.read_ivars()?;
        Ok(self.fill(index, Value::Object { class, ivars }))
    }

    fn read_struct(&mut self) -> Result<Rc<Value>, FormatError> {
        let class = self.read_symbol()?;
        let index = self.reserve();
        let members = self.read_ivars()?;
        Ok(self.fill(index, Value::Struct { class, members }))
    }

    fn read_user_marshal(&mut self) -> Result<Rc<Value>, FormatError> {
        let class = self.read_symbol()?;
        let index = self.reserve();
        let data = self.read_value()?;
        Ok(self.fill(index, Value::UserMarshal { class, data }))
    }

    /// Registered after its payload, unlike containers.
    fn read_user_defined(&mut self, ivars_pending: &mut bool) -> Result<Rc<Value>, FormatError> {
        let class = self.read_symbol()?;
        let data = self.read_bytes()?.to_vec();
        if *ivars_pending {
            self.skip_ivars()?;
            *ivars_pending = false;
        }
        Ok(self.register(Value::UserDefined { class, data }))
    }
}

/// Floats are stored as their textual form; older writers append raw
/// mantissa bytes after a NUL.
fn parse_float(bytes: &[u8]) -> Option<f64> {
    let text = match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    };
    match text {
        b"nan" => Some(f64::NAN),
        b"inf" => Some(f64::INFINITY),
        b"-inf" => Some(f64::NEG_INFINITY),
        _ => std::str::from_utf8(text).ok()?.parse().ok(),
    }
}


#[cfg(test)]
mod tests {
    use super::writer::MarshalWriter;
    use super::*;

    /// `Marshal.dump([["a", "1.0", ""]])` from Ruby 3.x.
    const RUBY_SINGLE_ENTRY: &[u8] = &[
        0x04, 0x08, 0x5b, 0x06, 0x5b, 0x08, 0x49, 0x22, 0x06, 0x61, 0x06, 0x3a, 0x06, 0x45, 0x54,
        0x49, 0x22, 0x08, 0x31, 0x2e, 0x30, 0x06, 0x3b, 0x00, 0x54, 0x49, 0x22, 0x00, 0x06, 0x3b,
        0x00, 0x54,
    ];

    /// `Marshal.dump(Gem::Version.new("1.0"))`.
    const RUBY_GEM_VERSION: &[u8] = &[
        0x04, 0x08, 0x55, 0x3a, 0x11, 0x47, 0x65, 0x6d, 0x3a, 0x3a, 0x56, 0x65, 0x72, 0x73, 0x69,
        0x6f, 0x6e, 0x5b, 0x06, 0x49, 0x22, 0x08, 0x31, 0x2e, 0x30, 0x06, 0x3a, 0x06, 0x45, 0x54,
    ];

    fn long_stream(n: i64) -> Vec<u8> {
        let mut writer = MarshalWriter::new();
        writer.raw(b"i").long(n);
        writer.finish()
    }

    #[test]
    fn test_load_ruby_single_entry() {
        let root = load(RUBY_SINGLE_ENTRY).unwrap();
        let entries = root.as_array().unwrap();
        assert_eq!(entries.len(), 1);

        let tuple = entries[0].as_array().unwrap();
        assert_eq!(tuple.len(), 3);
        assert_eq!(tuple[0].as_bytes(), Some(&b"a"[..]));
        assert_eq!(tuple[1].as_bytes(), Some(&b"1.0"[..]));
        assert_eq!(tuple[2].as_bytes(), Some(&b""[..]));
    }

    #[test]
    fn test_writer_matches_ruby_output() {
        let mut writer = MarshalWriter::new();
        writer.array(1).array(3).string("a").string("1.0").string("");
        assert_eq!(writer.finish(), RUBY_SINGLE_ENTRY);

        let mut writer = MarshalWriter::new();
        writer.gem_version("1.0");
        assert_eq!(writer.finish(), RUBY_GEM_VERSION);
    }

    #[test]
    fn test_load_gem_version() {
        let root = load(RUBY_GEM_VERSION).unwrap();
        assert_eq!(root.class_name(), Some("Gem::Version"));
        match root.as_ref() {
            Value::UserMarshal { data, .. } => {
                let items = data.as_array().unwrap();
                assert_eq!(items[0].as_bytes(), Some(&b"1.0"[..]));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_packed_long_boundaries() {
        for n in [
            0i64, 1, -1, 122, 123, -123, -124, 255, 256, -256, -257, 65535, 65536, 1 << 24,
            (1 << 30) - 1, -(1 << 30),
        ] {
            let bytes = long_stream(n);
            assert_eq!(*load(&bytes).unwrap(), Value::Integer(n), "value {}", n);
        }
    }

    #[test]
    fn test_known_long_encodings() {
        // 300 => "i\x02\x2c\x01", -300 => "i\xfe\xd4\xfe"
        assert_eq!(*load(&[4, 8, b'i', 0x02, 0x2c, 0x01]).unwrap(), Value::Integer(300));
        assert_eq!(*load(&[4, 8, b'i', 0xfe, 0xd4, 0xfe]).unwrap(), Value::Integer(-300));
    }

    #[test]
    fn test_object_links_resolve() {
        // a = "x"; Marshal.dump([a, a])
        let mut writer = MarshalWriter::new();
        writer.array(2).string("x").raw(b"@").long(1);
        let root = load(&writer.finish()).unwrap();
        let items = root.as_array().unwrap();
        assert_eq!(items[1].as_bytes(), Some(&b"x"[..]));
        assert!(Rc::ptr_eq(&items[0], &items[1]));
    }

    #[test]
    fn test_link_to_unfinished_object_is_rejected() {
        // a = []; a << a
        let bytes = [4, 8, b'[', 0x06, b'@', 0x00];
        assert!(matches!(
            load(&bytes),
            Err(FormatError::InvalidLink { index: 0, .. })
        ));
    }

    #[test]
    fn test_symbol_links_resolve() {
        let mut writer = MarshalWriter::new();
        writer.array(2).symbol("ruby").symbol("ruby");
        let root = load(&writer.finish()).unwrap();
        let items = root.as_array().unwrap();
        assert_eq!(*items[1], Value::Symbol(Rc::from("ruby")));
    }

    #[test]
    fn test_object_with_ivars() {
        let mut writer = MarshalWriter::new();
        writer
            .raw(b"o")
            .symbol("Gem::Platform")
            .long(3)
            .symbol("@cpu")
            .string("x86_64")
            .symbol("@os")
            .string("linux")
            .symbol("@version")
            .nil();
        let root = load(&writer.finish()).unwrap();
        assert_eq!(root.class_name(), Some("Gem::Platform"));
        assert_eq!(
            root.ivar("@os").and_then(|v| v.as_bytes().map(<[u8]>::to_vec)),
            Some(b"linux".to_vec())
        );
        assert_eq!(root.ivar("@version").map(|v| (**v).clone()), Some(Value::Nil));
    }

    #[test]
    fn test_hash_with_default() {
        let mut writer = MarshalWriter::new();
        writer
            .raw(b"}")
            .long(1)
            .symbol("k")
            .raw(b"i")
            .long(7)
            .raw(b"i")
            .long(0);
        let root = load(&writer.finish()).unwrap();
        match root.as_ref() {
            Value::Hash { entries, default } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(*entries[0].1, Value::Integer(7));
                assert_eq!(default.as_deref(), Some(&Value::Integer(0)));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_float_and_bignum() {
        let mut writer = MarshalWriter::new();
        writer.array(3);
        writer.raw(b"f").long(3).raw(b"1.5");
        writer.raw(b"f").long(4).raw(b"-inf");
        writer.raw(b"l-").long(1).raw(&[0x01, 0x00]);
        let root = load(&writer.finish()).unwrap();
        let items = root.as_array().unwrap();
        assert_eq!(*items[0], Value::Float(1.5));
        assert_eq!(*items[1], Value::Float(f64::NEG_INFINITY));
        assert_eq!(
            *items[2],
            Value::Bignum {
                negative: true,
                magnitude: vec![1, 0]
            }
        );
    }

    #[test]
    fn test_user_defined_registers_after_payload() {
        // [u(Foo, "1.2"), @1] links back to the user-defined object itself.
        let mut writer = MarshalWriter::new();
        writer
            .array(2)
            .raw(b"u")
            .symbol("Foo")
            .long(3)
            .raw(b"1.2")
            .raw(b"@")
            .long(1);
        let root = load(&writer.finish()).unwrap();
        let items = root.as_array().unwrap();
        assert_eq!(items[1].class_name(), Some("Foo"));
    }

    #[test]
    fn test_binary_string_without_ivars() {
        let mut writer = MarshalWriter::new();
        writer.binary_string(&[0xff, 0x00]);
        assert_eq!(*load(&writer.finish()).unwrap(), Value::String(vec![0xff, 0x00]));
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(
            load(&[4, 9, b'0']),
            Err(FormatError::UnsupportedVersion { major: 4, minor: 9 })
        ));
        assert!(matches!(
            load(&[3, 8, b'0']),
            Err(FormatError::UnsupportedVersion { major: 3, .. })
        ));
        assert!(matches!(load(&[4]), Err(FormatError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let truncated = &RUBY_SINGLE_ENTRY[..RUBY_SINGLE_ENTRY.len() - 5];
        assert!(matches!(
            load(truncated),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_tag() {
        assert!(matches!(
            load(&[4, 8, b'Z']),
            Err(FormatError::UnknownTag { tag: b'Z', offset: 2 })
        ));
    }

    #[test]
    fn test_rejects_negative_length() {
        assert!(matches!(
            load(&[4, 8, b'[', 0xfa]),
            Err(FormatError::InvalidLength { length: -1, .. })
        ));
    }

    #[test]
    fn test_huge_declared_length_does_not_allocate() {
        // Array claiming 2^30 elements with nothing behind it.
        let mut writer = MarshalWriter::new();
        writer.array(1 << 30);
        assert!(matches!(
            load(&writer.finish()),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    fn nested_arrays(levels: usize) -> Vec<u8> {
        let mut bytes = vec![4, 8];
        bytes.extend(std::iter::repeat([b'[', 0x06]).take(levels).flatten());
        bytes.push(b'0');
        bytes
    }

    #[test]
    fn test_depth_limit() {
        assert!(matches!(
            load(&nested_arrays(MAX_DEPTH)),
            Err(FormatError::DepthExceeded { limit: MAX_DEPTH })
        ));
    }

    #[test]
    fn test_nesting_at_limit_fits_small_stack() {
        // Same stack size as a spawned thread's default.
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let at_limit = load(&nested_arrays(MAX_DEPTH - 1)).map(|_| ());
                let past_limit = load(&nested_arrays(MAX_DEPTH + 200)).map(|_| ());
                (at_limit, past_limit)
            })
            .unwrap();

        let (at_limit, past_limit) = handle.join().unwrap();
        assert!(at_limit.is_ok());
        assert!(matches!(past_limit, Err(FormatError::DepthExceeded { .. })));
    }

    #[test]
    fn test_parse_float_forms() {
        assert_eq!(parse_float(b"2.5"), Some(2.5));
        assert_eq!(parse_float(b"1.0\0\x12\x34"), Some(1.0));
        assert!(parse_float(b"nan").unwrap().is_nan());
        assert_eq!(parse_float(b"abc"), None);
    }
}
