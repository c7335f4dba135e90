/// Value held by one component. Values of different variants never compare
/// equal, so `Int(1)` does not match `Float(1.0)`.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for ComponentValue {
    fn from(value: bool) -> Self {
        ComponentValue::Bool(value)
    }
}

impl From<i64> for ComponentValue {
    fn from(value: i64) -> Self {
        ComponentValue::Int(value)
    }
}

impl From<f64> for ComponentValue {
    fn from(value: f64) -> Self {
        ComponentValue::Float(value)
    }
}

impl From<&str> for ComponentValue {
    fn from(value: &str) -> Self {
        ComponentValue::Text(value.to_string())
    }
}

impl From<String> for ComponentValue {
    fn from(value: String) -> Self {
        ComponentValue::Text(value)
    }
}

impl From<Vec<u8>> for ComponentValue {
    fn from(value: Vec<u8>) -> Self {
        ComponentValue::Bytes(value)
    }
}
