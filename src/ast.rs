use std::fmt;

use crate::{modifier::Modifier, statement::Declaration, value::Tuple};

/// Parsed file: figures in source order.
#[derive(Debug, Default)]
pub struct Ast {
    pub body: Vec<Figure>,
}

/// Statements between two `---` delimiters.
#[derive(Debug, Default)]
pub struct Figure {
    pub statements: Vec<Statement>,
}

/// A bound statement. `declaration` already has the arguments unpacked and
/// every modifier applied.
#[derive(Debug)]
pub struct Statement {
    pub keyword: String,
    pub arguments: Tuple,
    pub modifiers: Vec<Modifier>,
    pub declaration: Box<dyn Declaration>,
}

impl Statement {
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.declaration.as_any().downcast_ref()
    }
}

/// Backend driven by [`Ast::eval`].
pub trait Renderer {
    type Error;

    fn begin_figure(&mut self, _index: usize, _figure: &Figure) -> Result<(), Self::Error> {
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), Self::Error>;

    fn end_figure(&mut self, _index: usize, _figure: &Figure) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Ast {
    pub fn eval<R: Renderer>(&self, renderer: &mut R) -> Result<(), R::Error> {
        for (index, figure) in self.body.iter().enumerate() {
            figure.eval(index, renderer)?;
        }
        Ok(())
    }
}

impl Figure {
    pub fn eval<R: Renderer>(&self, index: usize, renderer: &mut R) -> Result<(), R::Error> {
        renderer.begin_figure(index, self)?;
        for statement in &self.statements {
            statement.eval(renderer)?;
        }
        renderer.end_figure(index, self)
    }
}

impl Statement {
    pub fn eval<R: Renderer>(&self, renderer: &mut R) -> Result<(), R::Error> {
        renderer.statement(self)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, figure) in self.body.iter().enumerate() {
            writeln!(f, "figure {index}")?;
            write!(f, "{figure}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} {}", self.keyword, self.arguments)?;
        for modifier in &self.modifiers {
            writeln!(f, "    {modifier}")?;
        }
        writeln!(f, "    => {}", self.declaration)
    }
}
