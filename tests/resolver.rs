#[cfg(test)]
mod resolver_tests {
    use rox as lox;

    use lox::ast::{Expr, ExprId, Stmt};
    use lox::interpreter::Interpreter;
    use lox::resolver::Resolver;
    use lox::runner::parse_source;

    fn resolve(source: &str) -> (Vec<Stmt>, Interpreter<Vec<u8>>, Vec<String>) {
        let statements = parse_source(source).expect("clean parse");
        let mut interpreter = Interpreter::new(Vec::new());

        let errors: Vec<String> = match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        };

        (statements, interpreter, errors)
    }

    fn errors(source: &str) -> Vec<String> {
        resolve(source).2
    }

    /// Ids of every `print <variable>;` in source order, descending into blocks.
    fn printed_variable_ids(statements: &[Stmt], out: &mut Vec<ExprId>) {
        for stmt in statements {
            match stmt {
                Stmt::Print(Expr::Variable { id, .. }) => out.push(*id),
                Stmt::Block(inner) => printed_variable_ids(inner, out),
                Stmt::While { body, .. } => printed_variable_ids(std::slice::from_ref(body.as_ref()), out),
                Stmt::Function(declaration) => printed_variable_ids(&declaration.body, out),
                _ => {}
            }
        }
    }

    fn depths(source: &str) -> Vec<Option<usize>> {
        let (statements, interpreter, errors) = resolve(source);
        assert!(errors.is_empty(), "resolve errors: {:?}", errors);

        let mut ids = Vec::new();
        printed_variable_ids(&statements, &mut ids);
        ids.into_iter().map(|id| interpreter.local_depth(id)).collect()
    }

    #[test]
    fn globals_get_no_side_table_entry() {
        assert_eq!(depths("var a = 1; print a;"), [None]);
    }

    #[test]
    fn locals_record_hop_counts() {
        let source = "
            {
                var k = 0;
                print k;
                {
                    print k;
                    {
                        print k;
                    }
                }
            }
        ";

        assert_eq!(depths(source), [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn for_loop_body_sits_two_scopes_inside_the_loop_variable() {
        // initializer block → increment wrapper block → body block
        assert_eq!(
            depths("for (var j = 0; j < 3; j = j + 1) { print j; }"),
            [Some(2)]
        );
    }

    #[test]
    fn parameters_and_captured_locals() {
        let source = "
            fun outer(a) {
                var b = 1;
                fun inner() {
                    print a;
                    print b;
                }
                print a;
            }
        ";

        assert_eq!(depths(source), [Some(1), Some(1), Some(0)]);
    }

    #[test]
    fn duplicate_local_is_rejected() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            ["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn duplicate_global_is_allowed() {
        assert!(errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn local_read_in_own_initializer() {
        assert_eq!(
            errors("var a = 1; { var a = a; }"),
            ["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn top_level_return_is_rejected() {
        assert_eq!(
            errors("return 1;"),
            ["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn initializer_cannot_return_a_value() {
        assert_eq!(
            errors("class Foo { init() { return \"x\"; } }"),
            ["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(errors("class Foo { init() { return; } }").is_empty());
    }

    #[test]
    fn this_outside_class_is_rejected() {
        assert_eq!(
            errors("print this;"),
            ["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            errors("fun notAMethod() { print this; }").len(),
            1
        );
    }

    #[test]
    fn class_cannot_inherit_from_itself() {
        assert_eq!(
            errors("class Oops < Oops {}"),
            ["[line 1] Error at 'Oops': A class can't inherit from itself."]
        );
    }

    #[test]
    fn super_misuse() {
        assert_eq!(
            errors("print super.x;"),
            ["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            errors("class A { f() { super.f(); } }"),
            ["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn every_error_is_collected() {
        let found = errors("return;\n{ var a; var a; }\nprint this;");

        assert_eq!(found.len(), 3);
        assert!(found[0].starts_with("[line 1]"));
        assert!(found[1].starts_with("[line 2]"));
        assert!(found[2].starts_with("[line 3]"));
    }
}
