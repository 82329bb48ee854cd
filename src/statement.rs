use std::{any::Any, fmt};

use thiserror::Error;

use crate::{
    axis::Axis,
    types::Type,
    value::{Tuple, Value},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("unsupported keyword `{0}`")]
    UnsupportedKeyword(String),
    #[error("unsupported property `{0}`")]
    UnsupportedModifier(String),
    #[error("{keyword} statement is not compatible with {modifier} property")]
    Incompatible { keyword: String, modifier: String },
    #[error("{subject} expects argument one of:\n{}\n; got {found}", shapes(.expected))]
    InvalidArgument {
        subject: String,
        expected: Vec<Type>,
        found: Type,
    },
    #[error("color component {0} is out of range 0..=255")]
    ColorOutOfRange(i64),
    /// A value did not have the shape it was selected for.
    #[error("internal error: {0}")]
    Internal(String),
}

fn shapes(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

pub trait Colorable {
    fn color(&self) -> Option<Rgba>;
    fn set_color(&mut self, color: Rgba);
}

pub trait Labelable {
    fn label(&self) -> Option<&str>;
    fn set_label(&mut self, label: String);
}

pub trait Rangeable {
    fn range(&self) -> Option<(f64, f64)>;
    fn set_range(&mut self, min: f64, max: f64);
}

/// A concrete statement kind, bound from a keyword and its arguments.
///
/// Capabilities are opt-in: a declaration overrides the accessor of every
/// capability it implements, and modifiers query for them instead of
/// knowing the concrete type.
pub trait Declaration: fmt::Debug + fmt::Display {
    fn keyword(&self) -> &'static str;

    fn unpack_args(&mut self, args: &Tuple) -> Result<(), BindError>;

    fn colorable(&self) -> Option<&dyn Colorable> {
        None
    }

    fn colorable_mut(&mut self) -> Option<&mut dyn Colorable> {
        None
    }

    fn labelable(&self) -> Option<&dyn Labelable> {
        None
    }

    fn labelable_mut(&mut self) -> Option<&mut dyn Labelable> {
        None
    }

    fn rangeable(&self) -> Option<&dyn Rangeable> {
        None
    }

    fn rangeable_mut(&mut self) -> Option<&mut dyn Rangeable> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

type Constructor = fn() -> Box<dyn Declaration>;

fn new_axis() -> Box<dyn Declaration> {
    Box::new(Axis::default())
}

const REGISTRY: &[(&str, Constructor)] = &[("axis", new_axis)];

pub fn resolve(keyword: &str) -> Result<Box<dyn Declaration>, BindError> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, construct)| construct())
        .ok_or_else(|| BindError::UnsupportedKeyword(keyword.to_string()))
}

/// Structural overload resolution: casts `argument` to the first shape it
/// fits and returns that shape's index along with the cast value.
pub fn select_shape(
    subject: &str,
    argument: &Value,
    shapes: &[Type],
) -> Result<(usize, Value), BindError> {
    shapes
        .iter()
        .enumerate()
        .find_map(|(i, shape)| argument.cast(shape).map(|value| (i, value)))
        .ok_or_else(|| BindError::InvalidArgument {
            subject: subject.to_string(),
            expected: shapes.to_vec(),
            found: argument.ty(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Literal;

    #[test]
    fn registry_resolves_axis() {
        let declaration = resolve("axis").unwrap();
        assert_eq!(declaration.keyword(), "axis");
        assert!(declaration.as_any().downcast_ref::<Axis>().is_some());
    }

    #[test]
    fn reserved_keywords_without_a_declaration_are_rejected() {
        for keyword in ["plot", "default", "overwrite", "ow", "nope"] {
            assert_eq!(
                resolve(keyword).unwrap_err(),
                BindError::UnsupportedKeyword(keyword.to_string())
            );
        }
    }

    #[test]
    fn first_matching_shape_wins() {
        let shapes = [
            Type::tuple([Type::FLOAT]),
            Type::tuple([Type::INT]),
            Type::tuple([Type::STRING]),
        ];
        let argument = Value::Tuple(Tuple::from(vec![Value::Int(2)]));
        let (index, value) = select_shape("test", &argument, &shapes).unwrap();
        assert_eq!(index, 0);
        assert_eq!(value, Value::Tuple(Tuple::from(vec![Value::Float(2.0)])));
    }

    #[test]
    fn no_matching_shape_names_all_of_them() {
        let argument = Value::Literal(Literal::default_tagged("x")).into_tuple();
        let err = select_shape(
            "demo property",
            &Value::Tuple(argument),
            &[Type::tuple([Type::INT, Type::INT]), Type::FLOAT],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "demo property expects argument one of:\n(int, int)\nfloat\n; got (default)"
        );

        let err = select_shape("demo", &Value::Float(1.0), &[Type::INT, Type::DEFAULT]).unwrap_err();
        assert_eq!(
            err,
            BindError::InvalidArgument {
                subject: "demo".into(),
                expected: vec![Type::INT, Type::DEFAULT],
                found: Type::FLOAT,
            }
        );
    }

    #[test]
    fn rgba_display() {
        assert_eq!(Rgba::opaque(1, 2, 3).to_string(), "rgba(1, 2, 3, 255)");
    }
}
