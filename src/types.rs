use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralTag {
    String,
    Int,
    Float,
    Default,
}

impl Display for LiteralTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralTag::String => write!(f, "string"),
            LiteralTag::Int => write!(f, "int"),
            LiteralTag::Float => write!(f, "float"),
            LiteralTag::Default => write!(f, "default"),
        }
    }
}

/// Shape of a value.
///
/// `PartialEq` is plain structural equality. Use [`Type::is`] for the
/// language's notion of type equality, where a one-element tuple stands for
/// its component.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Literal(LiteralTag),
    Tuple(Vec<Type>),
    List(Box<Type>),
}

impl Type {
    pub const STRING: Type = Type::Literal(LiteralTag::String);
    pub const INT: Type = Type::Literal(LiteralTag::Int);
    pub const FLOAT: Type = Type::Literal(LiteralTag::Float);
    pub const DEFAULT: Type = Type::Literal(LiteralTag::Default);

    pub fn tuple(types: impl IntoIterator<Item = Type>) -> Self {
        Type::Tuple(types.into_iter().collect())
    }

    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    /// Number of components when this is a tuple type.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Type::Tuple(types) => Some(types.len()),
            _ => None,
        }
    }

    /// Symmetric type equality.
    pub fn is(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Literal(lhs), Type::Literal(rhs)) => lhs == rhs,
            (Type::List(lhs), Type::List(rhs)) => lhs.is(rhs),
            (Type::Tuple(lhs), Type::Tuple(rhs)) if lhs.len() == rhs.len() => {
                lhs.iter().zip(rhs).all(|(lhs, rhs)| lhs.is(rhs))
            }
            (Type::Tuple(lhs), _) if lhs.len() == 1 => lhs[0].is(other),
            (_, Type::Tuple(rhs)) if rhs.len() == 1 => self.is(&rhs[0]),
            _ => false,
        }
    }

    /// Whether a value of this type may be implicitly converted to `target`.
    ///
    /// Holds for every `target` this type [`is`](Type::is).
    pub fn castable(&self, target: &Type) -> bool {
        if target.is(self) || target.is(&Type::tuple([self.clone()])) {
            return true;
        }

        match self {
            Type::Literal(LiteralTag::String) => false,
            Type::Literal(LiteralTag::Int) => target.is(&Type::STRING) || target.is(&Type::FLOAT),
            Type::Literal(LiteralTag::Float | LiteralTag::Default) => target.is(&Type::STRING),
            Type::Tuple(types) => types.len() == 1 && types[0].castable(target),
            Type::List(_) => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Literal(tag) => write!(f, "{tag}"),
            Type::Tuple(types) => {
                write!(f, "(")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            Type::List(element) => write!(f, "[{element}]"),
        }
    }
}
