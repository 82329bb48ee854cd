use std::fmt::Display;

use thiserror::Error;

use crate::types::{LiteralTag, Type};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListError {
    #[error("invalid list: cannot add a {found} value to a list of {expected}")]
    Heterogeneous { expected: Type, found: Type },
    #[error("invalid list: a list needs at least one element")]
    Empty,
}

/// Bare word carrying its own literal tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub text: String,
    pub tag: LiteralTag,
}

impl Literal {
    pub fn new(text: impl Into<String>, tag: LiteralTag) -> Self {
        Literal {
            text: text.into(),
            tag,
        }
    }

    pub fn default_tagged(text: impl Into<String>) -> Self {
        Literal::new(text, LiteralTag::Default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    String(String),
    Int(i64),
    Float(f64),
    Tuple(Tuple),
    List(List),
}

/// Ordered, heterogeneous sequence of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuple {
    values: Vec<Value>,
}

/// Homogeneous, non-empty sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element: Type,
    values: Vec<Value>,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Literal(literal) => Type::Literal(literal.tag),
            Value::String(_) => Type::STRING,
            Value::Int(_) => Type::INT,
            Value::Float(_) => Type::FLOAT,
            Value::Tuple(tuple) => tuple.ty(),
            Value::List(list) => list.ty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Literal(literal) => Some(&literal.text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Wraps anything that is not already a tuple into a one-element tuple.
    pub fn into_tuple(self) -> Tuple {
        match self {
            Value::Tuple(tuple) => tuple,
            value => Tuple::from(vec![value]),
        }
    }

    fn is_singleton_tuple(&self) -> bool {
        matches!(self, Value::Tuple(tuple) if tuple.len() == 1)
    }

    /// Converts this value to `target` following the implicit-cast lattice.
    ///
    /// Returns `None` when `self.ty().castable(target)` is false, or when a
    /// literal's text does not parse as the target number. The result has
    /// the structure of `target`, with singleton tuples wrapped or unwrapped
    /// to match.
    pub fn cast(&self, target: &Type) -> Option<Value> {
        match (self, target) {
            (Value::Tuple(tuple), _) if tuple.len() == 1 && target.arity() != Some(1) => {
                return tuple.values[0].cast(target);
            }
            (value, Type::Tuple(types)) if types.len() == 1 && !value.is_singleton_tuple() => {
                return Some(Value::Tuple(Tuple::from(vec![value.cast(&types[0])?])));
            }
            _ => {}
        }

        if self.ty().is(target) {
            return Some(self.conform(target));
        }

        match (self, target) {
            (Value::Tuple(tuple), Type::Tuple(types)) if tuple.len() == 1 => {
                let inner = tuple.values[0].cast(&types[0])?;
                Some(Value::Tuple(Tuple::from(vec![inner])))
            }
            (Value::Int(n), Type::Literal(LiteralTag::Float)) => Some(Value::Float(*n as f64)),
            (Value::Int(_) | Value::Float(_), Type::Literal(LiteralTag::String)) => {
                Some(Value::String(self.to_string()))
            }
            (Value::Literal(literal), Type::Literal(LiteralTag::String))
                if literal.tag != LiteralTag::String =>
            {
                Some(Value::String(literal.text.clone()))
            }
            (Value::Literal(literal), Type::Literal(LiteralTag::Float))
                if literal.tag == LiteralTag::Int =>
            {
                literal.text.parse().ok().map(Value::Float)
            }
            _ => None,
        }
    }
}

impl Value {
    /// Reshapes a value whose type already `is` `target` so that its
    /// nesting follows `target` exactly.
    fn conform(&self, target: &Type) -> Value {
        match (self, target) {
            (Value::Tuple(tuple), Type::Tuple(types)) if tuple.len() == types.len() => {
                Value::Tuple(Tuple::from(
                    tuple
                        .values
                        .iter()
                        .zip(types)
                        .map(|(value, ty)| value.conform(ty))
                        .collect::<Vec<_>>(),
                ))
            }
            (Value::Tuple(tuple), _) if tuple.len() == 1 => tuple.values[0].conform(target),
            (_, Type::Tuple(types)) if types.len() == 1 => {
                Value::Tuple(Tuple::from(vec![self.conform(&types[0])]))
            }
            (Value::List(list), Type::List(element)) => {
                let values = list.values.iter().map(|value| value.conform(element));
                List::try_from(values.collect::<Vec<_>>())
                    .map(Value::List)
                    .unwrap_or_else(|_| self.clone())
            }
            _ => self.clone(),
        }
    }
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ty(&self) -> Type {
        Type::tuple(self.values.iter().map(Value::ty))
    }

    /// When the tuple holds nothing but another tuple, returns that tuple.
    pub fn collapse(mut self) -> Tuple {
        if let [Value::Tuple(inner)] = self.values.as_mut_slice() {
            return std::mem::take(inner);
        }
        self
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Tuple { values }
    }
}

impl List {
    pub fn new(first: Value) -> Self {
        List {
            element: first.ty(),
            values: vec![first],
        }
    }

    pub fn can_contain(&self, value: &Value) -> bool {
        value.ty().is(&self.element)
    }

    pub fn push(&mut self, value: Value) -> Result<(), ListError> {
        if !self.can_contain(&value) {
            return Err(ListError::Heterogeneous {
                expected: self.element.clone(),
                found: value.ty(),
            });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn element_type(&self) -> &Type {
        &self.element
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn ty(&self) -> Type {
        Type::list(self.element.clone())
    }
}

impl TryFrom<Vec<Value>> for List {
    type Error = ListError;

    fn try_from(values: Vec<Value>) -> Result<Self, Self::Error> {
        let mut values = values.into_iter();
        let mut list = List::new(values.next().ok_or(ListError::Empty)?);
        for value in values {
            list.push(value)?;
        }
        Ok(list)
    }
}

fn write_spaced(f: &mut std::fmt::Formatter<'_>, values: &[Value]) -> std::fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Literal(literal) => write!(f, "{}", literal.text),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => {
                if n.is_finite() && *n == n.trunc() {
                    write!(f, "{n}.0")
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Tuple(tuple) => write!(f, "{tuple}"),
            Value::List(list) => write!(f, "{list}"),
        }
    }
}

impl Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        write_spaced(f, &self.values)?;
        write!(f, ")")
    }
}

impl Display for List {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        write_spaced(f, &self.values)?;
        write!(f, "]")
    }
}
