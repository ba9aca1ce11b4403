//! PDF object model used by the validator
//!
//! The validator never parses PDF syntax itself (that is the job of the
//! reader it collaborates with); it works on already-decoded objects. The
//! model mirrors ISO 32000-1 Section 7.3: null, booleans, numbers, strings,
//! names, arrays, dictionaries, streams and indirect references.
//!
//! Equality on [`PdfObject`] is structural equality of the *raw* objects:
//! references compare as references, without resolution. The revision diff
//! auditor leans on this to detect byte-level changes between revisions.

use std::collections::HashMap;
use std::fmt;

/// Identifier of an indirect object: object number plus generation number.
///
/// This is the key under which objects live in the cross-reference tables,
/// and the currency of the revision diff auditor's allow-sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectId {
    /// Creates a new object identifier
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// PDF Name object - unique atomic symbols (e.g. `/Type`, `/Sig`).
///
/// Stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfName(pub String);

impl PdfName {
    /// Creates a new name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name without the leading slash
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// PDF String object - arbitrary binary data.
///
/// Signature `/Contents` entries arrive here with the ASCII-hex wrapping
/// already stripped by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString(pub Vec<u8>);

impl PdfString {
    /// Creates a new string from raw bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decodes the string as UTF-8, replacing invalid sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

/// PDF Array object - ordered collection of objects
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

impl PdfArray {
    /// Creates an empty array
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an object
    pub fn push(&mut self, obj: PdfObject) {
        self.0.push(obj);
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the array is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the element at `index`, if any
    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    /// Iterates over the elements
    pub fn iter(&self) -> impl Iterator<Item = &PdfObject> {
        self.0.iter()
    }
}

impl FromIterator<PdfObject> for PdfArray {
    fn from_iter<I: IntoIterator<Item = PdfObject>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// PDF Dictionary object - name-keyed mapping.
///
/// Keys are stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub HashMap<PdfName, PdfObject>);

impl PdfDictionary {
    /// Creates an empty dictionary
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Inserts a key-value pair
    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) {
        self.0.insert(PdfName::new(key), value);
    }

    /// Returns the raw value for `key`, without resolving references
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.0.get(&PdfName::new(key))
    }

    /// Returns true if `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&PdfName::new(key))
    }

    /// Iterates over the keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the `/Type` entry as a string, if present and a name
    pub fn get_type(&self) -> Option<&str> {
        match self.get("Type") {
            Some(PdfObject::Name(n)) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Returns the value for `key` as an integer
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(PdfObject::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value for `key` as a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(PdfObject::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value for `key` as a name string
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(PdfObject::Name(n)) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Returns the value for `key` as a string object
    pub fn get_string(&self, key: &str) -> Option<&PdfString> {
        match self.get(key) {
            Some(PdfObject::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the value for `key` as an array
    pub fn get_array(&self, key: &str) -> Option<&PdfArray> {
        match self.get(key) {
            Some(PdfObject::Array(a)) => Some(a),
            _ => None,
        }
    }

    /// Returns the value for `key` as a dictionary
    pub fn get_dict(&self, key: &str) -> Option<&PdfDictionary> {
        match self.get(key) {
            Some(PdfObject::Dictionary(d)) => Some(d),
            _ => None,
        }
    }
}

/// PDF Stream object - dictionary plus raw binary data.
///
/// The data is the decoded stream payload; the DSS consumes it as DER.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    /// Stream dictionary (Length and friends)
    pub dict: PdfDictionary,
    /// Decoded stream data
    pub data: Vec<u8>,
}

impl PdfStream {
    /// Creates a stream carrying `data`, with a matching `/Length` entry
    pub fn new(data: Vec<u8>) -> Self {
        let mut dict = PdfDictionary::new();
        dict.insert("Length", PdfObject::Integer(data.len() as i64));
        Self { dict, data }
    }
}

/// A decoded PDF object
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Real (floating-point) number
    Real(f64),
    /// String data
    String(PdfString),
    /// Name object
    Name(PdfName),
    /// Array of objects
    Array(PdfArray),
    /// Dictionary
    Dictionary(PdfDictionary),
    /// Stream: dictionary plus binary data
    Stream(PdfStream),
    /// Indirect object reference
    Reference(ObjectId),
}

impl PdfObject {
    /// Convenience constructor for a name object
    pub fn name(name: impl Into<String>) -> Self {
        PdfObject::Name(PdfName::new(name))
    }

    /// Convenience constructor for a string object
    pub fn string(data: impl Into<Vec<u8>>) -> Self {
        PdfObject::String(PdfString::new(data.into()))
    }

    /// Convenience constructor for an indirect reference
    pub fn reference(number: u32, generation: u16) -> Self {
        PdfObject::Reference(ObjectId::new(number, generation))
    }

    /// Returns the object as a dictionary, if it is one
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Returns the object as an array, if it is one
    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the referenced object id, if this is a reference
    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            PdfObject::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the object as an integer, if it is one
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value of an integer or real object
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfObject::Integer(i) => Some(*i as f64),
            PdfObject::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns true if this is the null object
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }
}
