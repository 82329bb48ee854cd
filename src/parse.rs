use std::ops::Range;

use log::{debug, trace};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    ast::{Ast, Figure, Statement},
    cursor::Cursor,
    lex::{Bracket, Token, TokenKind},
    modifier::Modifier,
    report::{ErrorClass, Report},
    statement::{BindError, resolve},
    value::{List, ListError, Literal, Tuple, Value},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unterminated container: missing {0}")]
    UnterminatedContainer(char),
    #[error("unexpected {0} without an opening bracket")]
    StrayCloser(char),
    #[error("mismatched bracket: expected {expected}, found {found}")]
    MismatchedCloser { expected: char, found: char },
    #[error(transparent)]
    List(#[from] ListError),
    #[error("cannot parse {0} as a number")]
    InvalidLiteral(String),
    #[error("cannot resolve variable ${0}")]
    UnresolvedVariable(String),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParseErrorKind {
    pub fn class(&self) -> ErrorClass {
        match self {
            ParseErrorKind::Bind(
                BindError::UnsupportedKeyword(_) | BindError::UnsupportedModifier(_),
            ) => ErrorClass::Syntax,
            ParseErrorKind::Bind(BindError::Internal(_)) => ErrorClass::Internal,
            ParseErrorKind::Bind(_) => ErrorClass::Type,
            ParseErrorKind::Internal(_) => ErrorClass::Internal,
            _ => ErrorClass::Syntax,
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(plank::parse))]
pub struct ParseError {
    pub kind: ParseErrorKind,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    report: Report,
}

impl ParseError {
    pub fn line(&self) -> usize {
        self.report.line()
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

/// Values collected between a pair of brackets.
enum Container {
    Tuple(Tuple),
    List(Option<List>),
}

impl Container {
    fn open(bracket: Bracket) -> Self {
        match bracket {
            Bracket::OpenSquare => Container::List(None),
            _ => Container::Tuple(Tuple::new()),
        }
    }

    fn push(&mut self, value: Value) -> Result<(), ListError> {
        match self {
            Container::Tuple(tuple) => tuple.push(value),
            Container::List(Some(list)) => list.push(value)?,
            Container::List(list @ None) => *list = Some(List::new(value)),
        }
        Ok(())
    }

    fn close(self) -> Result<Value, ListError> {
        match self {
            Container::Tuple(tuple) => Ok(Value::Tuple(tuple)),
            Container::List(list) => list.map(Value::List).ok_or(ListError::Empty),
        }
    }
}

/// Recursive-descent parser over the output of [`crate::Lexer`].
///
/// ```text
/// top    = figure { figure-delim figure } ;
/// figure = statement { stmt-delim statement } ;
/// stmt   = keyword [ argument ] { mod-delim property } ;
/// prop   = identifier [ argument ] ;
/// arg    = term { term } ;
/// term   = literal | "(" { term } ")" | "[" { term } "]" ;
/// ```
pub struct Parser<'t, 'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    cursor: Cursor<'t, 'de>,
}

impl<'t, 'de> Parser<'t, 'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str, tokens: &'t [Token<'de>]) -> Self {
        Parser {
            filename,
            whole,
            cursor: Cursor::new(tokens),
        }
    }

    pub fn parse(mut self) -> Result<Ast, ParseError> {
        let mut ast = Ast::default();
        if self.cursor.is_at_end() {
            return Ok(ast);
        }

        loop {
            ast.body.push(self.parse_figure()?);
            match self.cursor.advance() {
                None => break,
                Some(token) if token.kind == TokenKind::FigureDelimiter => {}
                Some(token) => {
                    return Err(self.error(
                        token,
                        ParseErrorKind::Internal(format!("figure ended on {token}")),
                    ));
                }
            }
        }

        debug!("parsed {} figures", ast.body.len());
        Ok(ast)
    }

    fn parse_figure(&mut self) -> Result<Figure, ParseError> {
        let mut figure = Figure::default();
        loop {
            figure.statements.push(self.parse_statement()?);
            if self.cursor.current_kind() != Some(TokenKind::StatementDelimiter) {
                break;
            }
            self.cursor.advance();
        }
        Ok(figure)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Keyword, "keyword")?;
        let mut declaration =
            resolve(&keyword.literal).map_err(|e| self.error(keyword, e.into()))?;

        let arguments = self.parse_argument()?;
        declaration
            .unpack_args(&arguments)
            .map_err(|e| self.error(keyword, e.into()))?;

        let mut modifiers = Vec::new();
        while self.cursor.current_kind() == Some(TokenKind::ModifierDelimiter) {
            self.cursor.advance();
            let (modifier, name) = self.parse_property()?;
            modifier
                .apply(&mut *declaration)
                .map_err(|e| self.error(name, e.into()))?;
            trace!("bound `{modifier}` to {}", keyword.literal);
            modifiers.push(modifier);
        }

        Ok(Statement {
            keyword: keyword.literal.to_string(),
            arguments,
            modifiers,
            declaration,
        })
    }

    /// Returns the modifier with the token that named it.
    fn parse_property(&mut self) -> Result<(Modifier, &'t Token<'de>), ParseError> {
        let name = self.expect(TokenKind::Identifier, "modifier name")?;
        let arguments = self.parse_argument()?;
        Ok((Modifier::new(name.literal.to_string(), arguments), name))
    }

    /// Terms up to the next structural delimiter. A lone tuple stands for
    /// the whole argument.
    fn parse_argument(&mut self) -> Result<Tuple, ParseError> {
        let mut tuple = Tuple::new();
        while let Some(kind) = self.cursor.current_kind() {
            if kind.is_delimiter() {
                break;
            }
            tuple.push(self.parse_term()?);
        }
        Ok(tuple.collapse())
    }

    fn parse_term(&mut self) -> Result<Value, ParseError> {
        let Some(token) = self.cursor.advance() else {
            return Err(self.error_at_end(ParseErrorKind::UnexpectedEnd {
                expected: "argument",
            }));
        };

        match token.kind {
            TokenKind::Identifier => Ok(Value::Literal(Literal::default_tagged(
                token.literal.to_string(),
            ))),
            TokenKind::String => Ok(Value::String(token.literal.to_string())),
            TokenKind::Int => token
                .literal
                .parse()
                .map(Value::Int)
                .map_err(|_| self.error(token, ParseErrorKind::InvalidLiteral(token.literal.to_string()))),
            TokenKind::Float => token
                .literal
                .parse()
                .map(Value::Float)
                .map_err(|_| self.error(token, ParseErrorKind::InvalidLiteral(token.literal.to_string()))),
            TokenKind::Variable => Err(self.error(
                token,
                ParseErrorKind::UnresolvedVariable(token.literal.to_string()),
            )),
            TokenKind::WeakDelimiter(bracket) if bracket.is_open() => {
                self.parse_container(token, bracket)
            }
            TokenKind::WeakDelimiter(bracket) => Err(self.error(
                token,
                ParseErrorKind::StrayCloser(bracket.as_char()),
            )),
            TokenKind::Keyword => Err(self.error(
                token,
                ParseErrorKind::UnexpectedToken {
                    expected: "argument",
                    found: token.to_string(),
                },
            )),
            TokenKind::ModifierDelimiter
            | TokenKind::StatementDelimiter
            | TokenKind::FigureDelimiter => Err(self.error(
                token,
                ParseErrorKind::Internal(format!("{token} in term position")),
            )),
        }
    }

    /// `opener` has already been consumed.
    fn parse_container(
        &mut self,
        opener: &'t Token<'de>,
        bracket: Bracket,
    ) -> Result<Value, ParseError> {
        let closer = bracket.counterpart();
        let mut container = Container::open(bracket);

        loop {
            let Some(token) = self.cursor.current() else {
                return Err(self.error(
                    opener,
                    ParseErrorKind::UnterminatedContainer(closer.as_char()),
                ));
            };
            match token.kind {
                kind if kind.is_delimiter() => {
                    return Err(self.error(
                        token,
                        ParseErrorKind::UnterminatedContainer(closer.as_char()),
                    ));
                }
                TokenKind::WeakDelimiter(found) if found == closer => {
                    self.cursor.advance();
                    break;
                }
                TokenKind::WeakDelimiter(found) if !found.is_open() => {
                    return Err(self.error(
                        token,
                        ParseErrorKind::MismatchedCloser {
                            expected: closer.as_char(),
                            found: found.as_char(),
                        },
                    ));
                }
                _ => {
                    let value = self.parse_term()?;
                    container
                        .push(value)
                        .map_err(|e| self.error(token, e.into()))?;
                }
            }
        }

        container.close().map_err(|e| self.error(opener, e.into()))
    }

    fn expect(
        &mut self,
        expected: TokenKind,
        name: &'static str,
    ) -> Result<&'t Token<'de>, ParseError> {
        match self.cursor.current() {
            Some(token) if token.kind == expected => {
                self.cursor.advance();
                Ok(token)
            }
            Some(token) => Err(self.error(
                token,
                ParseErrorKind::UnexpectedToken {
                    expected: name,
                    found: token.to_string(),
                },
            )),
            None => Err(self.error_at_end(ParseErrorKind::UnexpectedEnd { expected: name })),
        }
    }

    fn error(&self, token: &Token<'de>, kind: ParseErrorKind) -> ParseError {
        self.build(kind, token.line, token.words.clone(), token.span)
    }

    /// Points just after the last token.
    fn error_at_end(&self, kind: ParseErrorKind) -> ParseError {
        match self.cursor.last() {
            Some(token) => {
                let end = token.span.offset() + token.span.len();
                let focus = token.words.end..token.words.end;
                self.build(kind, token.line, focus, SourceSpan::from(end..end))
            }
            None => self.build(kind, 0, 0..0, SourceSpan::from(0..0)),
        }
    }

    fn build(
        &self,
        kind: ParseErrorKind,
        line: usize,
        focus: Range<usize>,
        span: SourceSpan,
    ) -> ParseError {
        let words = self
            .whole
            .lines()
            .nth(line)
            .unwrap_or_default()
            .split_whitespace();
        let report = Report::new(kind.class(), kind.to_string(), line, words, focus);

        ParseError {
            src: NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string()),
            span,
            report,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{Lexer, axis::Axis, types::Type};

    fn parse(source: &str) -> Result<Ast, ParseError> {
        let tokens = Lexer::new(None, source)
            .tokenize()
            .unwrap_or_else(|e| panic!("{}", e.report()));
        Parser::new(None, source, &tokens).parse()
    }

    fn parse_err(source: &str) -> ParseError {
        match parse(source) {
            Ok(ast) => panic!("expected an error, got\n{ast}"),
            Err(e) => e,
        }
    }

    /// Parses `words` in argument position, without binding it to a statement.
    fn argument(words: &str) -> Result<Tuple, ParseErrorKind> {
        let source = format!("axis {words}");
        let tokens = Lexer::new(None, &source)
            .tokenize()
            .unwrap_or_else(|e| panic!("{}", e.report()));
        let mut parser = Parser::new(None, &source, &tokens);
        parser.cursor.advance();
        parser.parse_argument().map_err(|e| e.kind)
    }

    fn target(name: &str) -> Value {
        Value::Literal(Literal::default_tagged(name))
    }

    fn axis(statement: &Statement) -> &Axis {
        statement.downcast_ref::<Axis>().unwrap()
    }

    #[test]
    fn single_statement() {
        let ast = parse("axis x").unwrap();
        assert_eq!(ast.body.len(), 1);
        let statements = &ast.body[0].statements;
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].keyword, "axis");
        assert_eq!(statements[0].arguments, Tuple::from(vec![target("x")]));
        assert_eq!(axis(&statements[0]).target, "x");
    }

    #[test]
    fn empty_source_has_no_figures() {
        assert!(parse("").unwrap().body.is_empty());
        assert!(parse("# only a comment").unwrap().body.is_empty());
    }

    #[test]
    fn statements_and_figures() {
        let ast = parse("axis x ;; axis y\naxis z\n---\naxis w").unwrap();
        assert_eq!(ast.body.len(), 2);
        let targets: Vec<Vec<&str>> = ast
            .body
            .iter()
            .map(|figure| {
                figure
                    .statements
                    .iter()
                    .map(|s| axis(s).target.as_str())
                    .collect()
            })
            .collect();
        assert_eq!(targets, vec![vec!["x", "y", "z"], vec!["w"]]);
    }

    #[test]
    fn arguments_keep_their_order() {
        let ast = parse("axis x \"time\" (0.0 2.5)").unwrap();
        let statement = &ast.body[0].statements[0];
        assert_eq!(
            statement.arguments,
            Tuple::from(vec![
                target("x"),
                Value::String("time".into()),
                Value::Tuple(Tuple::from(vec![Value::Float(0.0), Value::Float(2.5)])),
            ])
        );
        let axis = axis(statement);
        assert_eq!(axis.label.as_deref(), Some("time"));
        assert_eq!(axis.range, Some((0.0, 2.5)));
    }

    #[test]
    fn a_lone_tuple_is_the_whole_argument() {
        assert_eq!(argument("(x 1)"), Ok(Tuple::from(vec![target("x"), Value::Int(1)])));
        assert_eq!(argument("(x)"), Ok(Tuple::from(vec![target("x")])));
        assert_eq!(argument("x"), Ok(Tuple::from(vec![target("x")])));
        assert_eq!(
            argument("(x) 1"),
            Ok(Tuple::from(vec![
                Value::Tuple(Tuple::from(vec![target("x")])),
                Value::Int(1)
            ]))
        );
    }

    #[test]
    fn nested_containers() {
        let tuple = argument("[(1 a) (2 b)]").unwrap();
        let [Value::List(list)] = tuple.values() else {
            panic!("expected a list, got {tuple}");
        };
        assert_eq!(list.values().len(), 2);
        assert!(list.element_type().is(&Type::tuple([Type::INT, Type::DEFAULT])));
    }

    #[test]
    fn homogeneous_list() {
        let tuple = argument("[1 2 3]").unwrap();
        assert_eq!(tuple.ty().to_string(), "([int])");
    }

    #[rstest]
    #[case("[1 'a']", ParseErrorKind::List(ListError::Heterogeneous { expected: Type::INT, found: Type::STRING }))]
    #[case("[]", ParseErrorKind::List(ListError::Empty))]
    #[case("([)]", ParseErrorKind::MismatchedCloser { expected: ']', found: ')' })]
    #[case("(1 | x)", ParseErrorKind::UnterminatedContainer(')'))]
    #[case("$width", ParseErrorKind::UnresolvedVariable("width".into()))]
    #[case("99999999999999999999", ParseErrorKind::InvalidLiteral("99999999999999999999".into()))]
    #[case("x axis", ParseErrorKind::UnexpectedToken { expected: "argument", found: "keyword(axis)".into() })]
    fn invalid_arguments(#[case] words: &str, #[case] expected: ParseErrorKind) {
        assert_eq!(argument(words), Err(expected));
    }

    #[rstest]
    #[case("plot x", ParseErrorKind::Bind(BindError::UnsupportedKeyword("plot".into())))]
    #[case("axis x | width 3", ParseErrorKind::Bind(BindError::UnsupportedModifier("width".into())))]
    #[case("axis x |", ParseErrorKind::UnexpectedEnd { expected: "modifier name" })]
    #[case("axis x | 5", ParseErrorKind::UnexpectedToken { expected: "modifier name", found: "int(5)".into() })]
    #[case("axis x\n---", ParseErrorKind::UnexpectedEnd { expected: "keyword" })]
    #[case("---\naxis x", ParseErrorKind::UnexpectedToken { expected: "keyword", found: "figure_delimiter(---)".into() })]
    fn syntax_errors(#[case] source: &str, #[case] expected: ParseErrorKind) {
        let err = parse_err(source);
        assert_eq!(err.kind, expected);
        assert_eq!(err.report().class(), ErrorClass::Syntax);
    }

    #[test]
    fn statement_arguments_are_type_checked() {
        let err = parse_err("axis 5");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Bind(BindError::InvalidArgument { .. })
        ));
        assert_eq!(err.report().class(), ErrorClass::Type);
    }

    #[rstest]
    #[case(BindError::UnsupportedKeyword("plot".into()), ErrorClass::Syntax)]
    #[case(BindError::UnsupportedModifier("width".into()), ErrorClass::Syntax)]
    #[case(BindError::ColorOutOfRange(256), ErrorClass::Type)]
    #[case(BindError::Internal("axis arguments (1) do not fit their shape".into()), ErrorClass::Internal)]
    fn bind_error_classes(#[case] err: BindError, #[case] class: ErrorClass) {
        assert_eq!(ParseErrorKind::Bind(err).class(), class);
    }

    #[test]
    fn modifiers_are_applied_in_order() {
        let ast = parse("axis x | label first | color 1 2 3 | label second").unwrap();
        let statement = &ast.body[0].statements[0];
        let names: Vec<_> = statement.modifiers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["label", "color", "label"]);
        assert_eq!(axis(statement).label.as_deref(), Some("second"));
    }

    #[test]
    fn type_error_report_points_at_the_modifier() {
        let err = parse_err("axis x | range (0 1)");
        assert_eq!(err.line(), 1);
        assert_eq!(err.span(), SourceSpan::from(9..14));
        let report = err.report().to_string();
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0].len(), 39);
        assert!(lines[0].contains(" Type error "));
        assert_eq!(lines[1], "axis x | range (0 1)");
        assert_eq!(lines[2], "---------^^^^^------ (line 1)");
        assert_eq!(lines[4], "range property expects argument one of:");
    }

    #[test]
    fn end_of_input_points_past_the_line() {
        let err = parse_err("axis x |");
        assert_eq!(err.span(), SourceSpan::from(8..8));
        let report = err.report().to_string();
        assert_eq!(report.lines().nth(2), Some("---------^ (line 1)"));
    }
}
