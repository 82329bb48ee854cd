use plank::{
    Ast, ErrorClass, Error, Figure, Renderer, Statement,
    axis::Axis,
    lex::LexErrorKind,
    parse::ParseErrorKind,
    statement::{BindError, Rgba},
    value::{Literal, Tuple, Value},
};
use rstest::rstest;

fn parse(source: &str) -> Ast {
    plank::parse(Some("test.plank"), source).unwrap_or_else(|e| panic!("{}", e.report()))
}

fn parse_err(source: &str) -> Error {
    match plank::parse(Some("test.plank"), source) {
        Ok(ast) => panic!("expected an error, got\n{ast}"),
        Err(e) => e,
    }
}

fn only_axis(ast: &Ast) -> &Axis {
    assert_eq!(ast.body.len(), 1);
    assert_eq!(ast.body[0].statements.len(), 1);
    ast.body[0].statements[0].downcast_ref::<Axis>().unwrap()
}

#[test]
fn color_modifier_end_to_end() {
    let ast = parse("axis x | color (255 0 0)");
    let statement = &ast.body[0].statements[0];
    assert_eq!(statement.keyword, "axis");
    assert_eq!(statement.modifiers.len(), 1);
    assert_eq!(statement.modifiers[0].name, "color");

    let axis = only_axis(&ast);
    assert_eq!(axis.target, "x");
    assert_eq!(
        axis.color,
        Some(Rgba {
            r: 255,
            g: 0,
            b: 0,
            a: 255
        })
    );
}

#[rstest]
#[case("axis x", vec![Value::Literal(Literal::default_tagged("x"))])]
#[case("axis x 'time'", vec![Value::Literal(Literal::default_tagged("x")), Value::String("time".into())])]
#[case(
    "axis speed (-1.0 .5) \"m/s\"",
    vec![
        Value::Literal(Literal::default_tagged("speed")),
        Value::Tuple(Tuple::from(vec![Value::Float(-1.0), Value::Float(0.5)])),
        Value::String("m/s".into()),
    ]
)]
fn single_line_statements_keep_their_arguments(#[case] source: &str, #[case] expected: Vec<Value>) {
    let ast = parse(source);
    assert_eq!(ast.body.len(), 1);
    let statements = &ast.body[0].statements;
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].keyword, "axis");
    assert_eq!(statements[0].arguments, Tuple::from(expected));
}

#[rstest]
#[case("axis (x) 'time'", Some("time"), None, None)]
#[case("axis x ('time')", Some("time"), None, None)]
#[case("axis x ((0.0 1.0))", None, Some((0.0, 1.0)), None)]
#[case("axis x | color (1) 2 3", None, None, Some(Rgba::opaque(1, 2, 3)))]
#[case("axis x | range (0.0) 1.0", None, Some((0.0, 1.0)), None)]
fn parenthesised_components_bind_like_bare_ones(
    #[case] source: &str,
    #[case] label: Option<&str>,
    #[case] range: Option<(f64, f64)>,
    #[case] color: Option<Rgba>,
) {
    let ast = parse(source);
    let axis = only_axis(&ast);
    assert_eq!(axis.target, "x");
    assert_eq!(axis.label.as_deref(), label);
    assert_eq!(axis.range, range);
    assert_eq!(axis.color, color);
}

#[test]
fn a_multi_line_file() {
    let source = "\
# velocity plot
axis t 'time (s)'
axis v
  | label velocity
  | range (0.0 10.0) ;;
---
axis x | color 0 128 255 64
";
    let ast = parse(source);
    assert_eq!(ast.body.len(), 2);

    let first = &ast.body[0].statements;
    assert_eq!(first.len(), 2);
    let t = first[0].downcast_ref::<Axis>().unwrap();
    assert_eq!(t.label.as_deref(), Some("time (s)"));
    let v = first[1].downcast_ref::<Axis>().unwrap();
    assert_eq!(v.label.as_deref(), Some("velocity"));
    assert_eq!(v.range, Some((0.0, 10.0)));

    let x = ast.body[1].statements[0].downcast_ref::<Axis>().unwrap();
    assert_eq!(x.color, Some(Rgba { r: 0, g: 128, b: 255, a: 64 }));
}

#[derive(Default)]
struct Outline(Vec<String>);

impl Renderer for Outline {
    type Error = std::convert::Infallible;

    fn begin_figure(&mut self, index: usize, figure: &Figure) -> Result<(), Self::Error> {
        self.0
            .push(format!("figure {index} ({} statements)", figure.statements.len()));
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), Self::Error> {
        self.0.push(statement.declaration.to_string());
        Ok(())
    }
}

#[test]
fn renderer_sees_bound_statements() {
    let ast = parse("axis x | color 1 2 3\naxis y 'why'\n---\naxis z");
    let mut outline = Outline::default();
    ast.eval(&mut outline).unwrap();
    assert_eq!(
        outline.0,
        [
            "figure 0 (2 statements)",
            "axis x rgba(1, 2, 3, 255)",
            "axis y \"why\"",
            "figure 1 (1 statements)",
            "axis z",
        ]
    );
}

#[test]
fn lexical_errors_surface_with_their_report() {
    let err = parse_err("axis (5 .2");
    assert!(matches!(
        &err,
        Error::Lex(e) if e.kind == LexErrorKind::MissingClosing(')')
    ));
    assert_eq!(err.report().class(), ErrorClass::Lexical);
    assert!(err.report().to_string().starts_with("== Lexical error ==\n"));
}

#[rstest]
#[case("axis x | color (255 0 0 0 0)", ErrorClass::Type)]
#[case("axis x | color (300 0 0)", ErrorClass::Type)]
#[case("axis 1", ErrorClass::Type)]
#[case("axis x | shade 3", ErrorClass::Syntax)]
#[case("default x", ErrorClass::Syntax)]
#[case("axis x [1 'a']", ErrorClass::Syntax)]
#[case("axis x |", ErrorClass::Syntax)]
fn parse_errors_are_classified(#[case] source: &str, #[case] class: ErrorClass) {
    let err = parse_err(source);
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
    assert_eq!(err.report().class(), class);
}

#[test]
fn color_out_of_range_names_the_component() {
    let Error::Parse(err) = parse_err("axis x | color 10 20 256") else {
        panic!("expected a parse error");
    };
    assert_eq!(err.kind, ParseErrorKind::Bind(BindError::ColorOutOfRange(256)));
    assert_eq!(err.line(), 1);
}

#[test]
fn errors_report_the_right_line() {
    let err = parse_err("axis x\naxis y\naxis 3");
    assert_eq!(err.report().line(), 3);
    let rendered = err.report().to_string();
    let lines: Vec<_> = rendered.lines().collect();
    assert_eq!(lines[1], "axis 3");
    assert_eq!(lines[2], "^^^^-- (line 3)");
}
