use std::borrow::Cow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn to_field_string(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(value) => Cow::Borrowed(value.as_str()),
            FieldValue::Integer(value) => Cow::Owned(value.to_string()),
            FieldValue::Number(value) => Cow::Owned(format_number(*value)),
            FieldValue::Bool(true) => Cow::Borrowed("true"),
            FieldValue::Bool(false) => Cow::Borrowed("false"),
            FieldValue::Null => Cow::Borrowed(""),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // -0.0 prints as "0"
        return format!("{}", value as i64);
    }
    value.to_string()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// `None` means the record has no such field, which is distinct from an empty value.
pub trait FieldAccessor<T> {
    fn field_text<'a>(&self, record: &'a T, field: &str) -> Option<Cow<'a, str>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFields;

impl FieldAccessor<Record> for RecordFields {
    fn field_text<'a>(&self, record: &'a Record, field: &str) -> Option<Cow<'a, str>> {
        record.get(field).map(FieldValue::to_field_string)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FnAccessor<F>(pub F);

impl<T, F> FieldAccessor<T> for FnAccessor<F>
where
    F: Fn(&T, &str) -> Option<String>,
{
    fn field_text<'a>(&self, record: &'a T, field: &str) -> Option<Cow<'a, str>> {
        (self.0)(record, field).map(Cow::Owned)
    }
}
