use std::{fmt, str::FromStr};

use log::trace;

use crate::{
    statement::{BindError, Declaration, Rgba, select_shape},
    types::Type,
    value::{Tuple, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Color,
    Label,
    Range,
}

impl Property {
    pub fn name(self) -> &'static str {
        match self {
            Property::Color => "color",
            Property::Label => "label",
            Property::Range => "range",
        }
    }

    fn shapes(self) -> Vec<Type> {
        match self {
            Property::Color => vec![
                Type::tuple([Type::INT, Type::INT, Type::INT]),
                Type::tuple([Type::INT, Type::INT, Type::INT, Type::INT]),
            ],
            Property::Label => vec![Type::STRING],
            Property::Range => vec![Type::tuple([Type::FLOAT, Type::FLOAT])],
        }
    }

    /// Casts `arguments` to the first shape this property accepts.
    fn select(self, arguments: &Tuple) -> Result<Value, BindError> {
        let subject = format!("{} property", self.name());
        let argument = Value::Tuple(arguments.clone());
        select_shape(&subject, &argument, &self.shapes()).map(|(_, value)| value)
    }
}

impl FromStr for Property {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "color" => Ok(Property::Color),
            "label" => Ok(Property::Label),
            "range" => Ok(Property::Range),
            other => Err(BindError::UnsupportedModifier(other.to_string())),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional property attached to a statement with `|`.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub name: String,
    pub arguments: Tuple,
}

impl Modifier {
    pub fn new(name: impl Into<String>, arguments: Tuple) -> Self {
        Modifier {
            name: name.into(),
            arguments,
        }
    }

    /// Type-checks the arguments and hands them to the matching capability
    /// of `declaration`.
    pub fn apply(&self, declaration: &mut dyn Declaration) -> Result<(), BindError> {
        let property: Property = self.name.parse()?;
        let keyword = declaration.keyword();
        let incompatible = || BindError::Incompatible {
            keyword: keyword.to_string(),
            modifier: self.name.clone(),
        };

        match property {
            Property::Color => {
                let colorable = declaration.colorable_mut().ok_or_else(incompatible)?;
                let color = to_rgba(&property.select(&self.arguments)?)?;
                colorable.set_color(color);
            }
            Property::Label => {
                let labelable = declaration.labelable_mut().ok_or_else(incompatible)?;
                let label = property.select(&self.arguments)?;
                let label = label.as_str().ok_or_else(|| internal(property, &label))?;
                labelable.set_label(label.to_string());
            }
            Property::Range => {
                let rangeable = declaration.rangeable_mut().ok_or_else(incompatible)?;
                let bounds = property.select(&self.arguments)?.into_tuple();
                match bounds.values() {
                    [min, max] => {
                        let (Some(min), Some(max)) = (min.as_float(), max.as_float()) else {
                            return Err(internal(property, &Value::Tuple(bounds.clone())));
                        };
                        rangeable.set_range(min, max);
                    }
                    _ => return Err(internal(property, &Value::Tuple(bounds.clone()))),
                }
            }
        }
        trace!("applied {property} to {keyword}");
        Ok(())
    }
}

/// A selected value that does not have the shape it was cast to.
fn internal(property: Property, value: &Value) -> BindError {
    BindError::Internal(format!("{property} arguments {value} do not fit their shape"))
}

fn to_rgba(value: &Value) -> Result<Rgba, BindError> {
    let tuple = value.clone().into_tuple();
    let mut channels = [255u8; 4];
    for (channel, component) in channels.iter_mut().zip(tuple.values()) {
        let n = component
            .as_int()
            .ok_or_else(|| internal(Property::Color, value))?;
        *channel = u8::try_from(n).map_err(|_| BindError::ColorOutOfRange(n))?;
    }
    let [r, g, b, a] = channels;
    Ok(Rgba { r, g, b, a })
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "| {} {}", self.name, self.arguments)
    }
}
