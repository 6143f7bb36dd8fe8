use std::fmt;
use std::ops::Index;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// JSON schema primitive types supported for tool parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// Maps a textual Rust type annotation to its JSON schema type.
    ///
    /// Only the outer type is inspected: `Vec<i64>` is an array, with no
    /// `items` schema for the element type. Anything unrecognized, including
    /// `Option<T>` and `serde_json::Value`, falls back to string.
    pub fn from_annotation(annotation: &str) -> Self {
        let mut ty = annotation.trim();
        loop {
            if let Some(rest) = ty.strip_prefix('&') {
                ty = rest.trim_start();
            } else if let Some(rest) = ty.strip_prefix('\'') {
                ty = rest
                    .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
                    .trim_start();
            } else if let Some(rest) = ty.strip_prefix("mut ") {
                ty = rest.trim_start();
            } else {
                break;
            }
        }
        let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
        let ty = compact.as_str();

        if ty.starts_with('[') {
            return ParamType::Array;
        }

        let path = ty.split('<').next().unwrap_or(ty);
        let base = path.rsplit("::").next().unwrap_or(path);
        match base {
            "String" | "str" | "char" | "string" => ParamType::String,
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" | "integer" => ParamType::Integer,
            "f32" | "f64" | "number" => ParamType::Number,
            "bool" | "boolean" => ParamType::Boolean,
            "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" | "array" => {
                ParamType::Array
            }
            "HashMap" | "BTreeMap" | "Map" | "IndexMap" | "object" => ParamType::Object,
            _ => ParamType::String,
        }
    }
}

/// One declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSignature {
    pub name: String,
    /// Type annotation as written, e.g. `"i64"` or `"Vec<String>"`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Source text of the default value. Parameters without one are required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParamSignature {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn param_type(&self) -> ParamType {
        self.annotation
            .as_deref()
            .map(ParamType::from_annotation)
            .unwrap_or(ParamType::String)
    }
}

/// Static description of a callable: name, documentation and parameters in
/// declaration order.
///
/// Build one with the builder methods, the [`signature!`](crate::signature)
/// macro, or by deserializing a tool file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSignature>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    /// Sets the documentation string.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Appends a required, annotated parameter.
    pub fn param(mut self, name: impl Into<String>, annotation: impl Into<String>) -> Self {
        self.params.push(ParamSignature {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: None,
        });
        self
    }

    /// Appends an annotated parameter that has a default value.
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        annotation: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSignature {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: Some(default.into()),
        });
        self
    }

    /// Appends a parameter without a type annotation.
    pub fn untyped_param(mut self, name: impl Into<String>, default: Option<String>) -> Self {
        self.params.push(ParamSignature {
            name: name.into(),
            annotation: None,
            default,
        });
        self
    }

    /// First line of the documentation, or `"Function {name}"` when there is
    /// no usable documentation.
    pub fn description(&self) -> String {
        self.doc
            .as_deref()
            .map(str::trim)
            .and_then(|doc| doc.lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Function {}", self.name))
    }
}

/// Builds a [`Signature`] from a Rust function declaration.
///
/// Nothing is executed: the macro reads doc comments, parameter names, type
/// annotations and `= default` markers as written.
///
/// ```
/// use ollama_runner::signature;
///
/// let sig = signature! {
///     /// Add two numbers.
///     fn add(a: i64, b: i64 = 0) -> i64
/// };
/// assert_eq!(sig.name, "add");
/// assert!(sig.params[0].is_required());
/// assert!(!sig.params[1].is_required());
/// ```
#[macro_export]
macro_rules! signature {
    (@params $sig:ident; ) => {};
    (@params $sig:ident; $pname:ident : $pty:ty = $default:expr $(, $($rest:tt)*)?) => {
        $sig = $sig.param_with_default(stringify!($pname), stringify!($pty), stringify!($default));
        $crate::signature!(@params $sig; $($($rest)*)?);
    };
    (@params $sig:ident; $pname:ident : $pty:ty $(, $($rest:tt)*)?) => {
        $sig = $sig.param(stringify!($pname), stringify!($pty));
        $crate::signature!(@params $sig; $($($rest)*)?);
    };
    (@params $sig:ident; $pname:ident = $default:expr $(, $($rest:tt)*)?) => {
        $sig = $sig.untyped_param(stringify!($pname), Some(stringify!($default).to_string()));
        $crate::signature!(@params $sig; $($($rest)*)?);
    };
    (@params $sig:ident; $pname:ident $(, $($rest:tt)*)?) => {
        $sig = $sig.untyped_param(stringify!($pname), None);
        $crate::signature!(@params $sig; $($($rest)*)?);
    };
    ($(#[doc = $doc:literal])* $vis:vis fn $name:ident ( $($params:tt)* ) $(-> $ret:ty)? $(;)?) => {{
        let docs: &[&str] = &[$($doc),*];
        #[allow(unused_mut)]
        let mut sig = $crate::ollama::tools::Signature::new(stringify!($name));
        if !docs.is_empty() {
            let lines: Vec<&str> = docs
                .iter()
                .map(|line| line.strip_prefix(' ').unwrap_or(*line))
                .collect();
            sig = sig.doc(lines.join("\n"));
        }
        $crate::signature!(@params sig; $($params)*);
        sig
    }};
}

/// Schema for a single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// Parameter schemas keyed by name, kept in declaration order.
///
/// Inserting an existing name replaces its schema in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(String, PropertySchema)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, schema: PropertySchema) {
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertySchema)> {
        self.0.iter().map(|(key, schema)| (key.as_str(), schema))
    }
}

impl Index<&str> for Properties {
    type Output = PropertySchema;

    fn index(&self, name: &str) -> &PropertySchema {
        match self.get(name) {
            Some(schema) => schema,
            None => panic!("no property named '{name}'"),
        }
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, schema)| (key, schema)))
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of parameter schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Properties, A::Error> {
                let mut properties = Properties::new();
                while let Some((name, schema)) = map.next_entry::<String, PropertySchema>()? {
                    properties.insert(name, schema);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// Object schema describing a function's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Properties,
    /// Parameters without a default, in declaration order.
    pub required: Vec<String>,
}

/// Function descriptor inside a [`ToolSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

/// Tool declaration in the chat function-calling format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

/// Infers the tool schema for one callable.
pub fn infer_tool(signature: &Signature) -> ToolSchema {
    let mut properties = Properties::new();
    let mut required = Vec::new();

    for param in &signature.params {
        properties.insert(
            param.name.clone(),
            PropertySchema {
                kind: param.param_type().as_str().to_string(),
                description: param.name.clone(),
            },
        );
        if param.is_required() && !required.contains(&param.name) {
            required.push(param.name.clone());
        }
    }

    ToolSchema {
        kind: "function".to_string(),
        function: FunctionSchema {
            name: signature.name.clone(),
            description: signature.description(),
            parameters: ParametersSchema {
                kind: "object".to_string(),
                properties,
                required,
            },
        },
    }
}

/// Tool call emitted by a model in a decision response.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool/function name.
    pub name: String,
    /// Arguments payload.
    pub args: Value,
}

/// Extracts tool calls from a raw `/api/chat` response body.
///
/// Arguments sent as a JSON-encoded string are decoded when possible.
pub fn parse_tool_calls(response: &Value) -> Vec<ToolCall> {
    let mut tool_calls = Vec::new();
    if let Some(calls) = response["message"]["tool_calls"].as_array() {
        for call in calls {
            let name = call["function"]["name"].as_str().unwrap_or("").to_string();
            let args = match &call["function"]["arguments"] {
                Value::String(raw) => {
                    serde_json::from_str(raw).unwrap_or(Value::String(raw.clone()))
                }
                other => other.clone(),
            };
            if !name.is_empty() {
                tool_calls.push(ToolCall { name, args });
            }
        }
    }
    tool_calls
}
