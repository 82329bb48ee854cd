use std::{any::Any, fmt};

use crate::{
    statement::{BindError, Colorable, Declaration, Labelable, Rangeable, Rgba, select_shape},
    types::Type,
    value::{Tuple, Value},
};

/// `axis <target> [range] [label]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub target: String,
    pub label: Option<String>,
    pub range: Option<(f64, f64)>,
    pub color: Option<Rgba>,
}

fn bounds() -> Type {
    Type::tuple([Type::FLOAT, Type::FLOAT])
}

/// Admissible argument shapes. Order breaks ties.
fn shapes() -> Vec<Type> {
    vec![
        Type::tuple([Type::DEFAULT]),
        Type::tuple([Type::DEFAULT, bounds()]),
        Type::tuple([Type::DEFAULT, Type::STRING]),
        Type::tuple([Type::DEFAULT, bounds(), Type::STRING]),
        Type::tuple([Type::DEFAULT, Type::STRING, bounds()]),
    ]
}

fn as_bounds(tuple: &Tuple) -> Option<(f64, f64)> {
    match tuple.values() {
        [min, max] => Some((min.as_float()?, max.as_float()?)),
        _ => None,
    }
}

impl Declaration for Axis {
    fn keyword(&self) -> &'static str {
        "axis"
    }

    fn unpack_args(&mut self, args: &Tuple) -> Result<(), BindError> {
        let shapes = shapes();
        let (_, unpacked) = select_shape("axis statement", &Value::Tuple(args.clone()), &shapes)?;
        let unpacked = unpacked.into_tuple();

        let mismatch = || {
            BindError::Internal(format!("axis arguments {unpacked} do not fit their shape"))
        };
        let (target, rest) = unpacked.values().split_first().ok_or_else(mismatch)?;
        self.target = target.as_str().ok_or_else(mismatch)?.to_string();

        for value in rest {
            match value {
                Value::String(label) => self.set_label(label.clone()),
                Value::Tuple(tuple) => {
                    let (min, max) = as_bounds(tuple).ok_or_else(mismatch)?;
                    self.set_range(min, max);
                }
                _ => return Err(mismatch()),
            }
        }
        Ok(())
    }

    fn colorable(&self) -> Option<&dyn Colorable> {
        Some(self)
    }

    fn colorable_mut(&mut self) -> Option<&mut dyn Colorable> {
        Some(self)
    }

    fn labelable(&self) -> Option<&dyn Labelable> {
        Some(self)
    }

    fn labelable_mut(&mut self) -> Option<&mut dyn Labelable> {
        Some(self)
    }

    fn rangeable(&self) -> Option<&dyn Rangeable> {
        Some(self)
    }

    fn rangeable_mut(&mut self) -> Option<&mut dyn Rangeable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Colorable for Axis {
    fn color(&self) -> Option<Rgba> {
        self.color
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = Some(color);
    }
}

impl Labelable for Axis {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }
}

impl Rangeable for Axis {
    fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    fn set_range(&mut self, min: f64, max: f64) {
        self.range = Some((min, max));
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis {}", self.target)?;
        if let Some((min, max)) = self.range {
            write!(f, " [{min} {max}]")?;
        }
        if let Some(label) = &self.label {
            write!(f, " {label:?}")?;
        }
        if let Some(color) = self.color {
            write!(f, " {color}")?;
        }
        Ok(())
    }
}
