#[cfg(test)]
mod parser_tests {
    use rox as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "scan errors: {:?}", errors);
        Parser::new(tokens).parse()
    }

    fn printed(source: &str) -> String {
        let statements = parse(source).expect("expected a clean parse");
        statements
            .iter()
            .map(AstPrinter::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn errors(source: &str) -> Vec<String> {
        parse(source)
            .expect_err("expected parse errors")
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn binary_operators_associate_left() {
        assert_eq!(printed("1 - 2 - 3;"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(printed("8 / 4 / 2;"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn precedence_climbs_from_assignment_to_unary() {
        assert_eq!(
            printed("a = b or c and !d == 1 < 2 + 3 * -4;"),
            "(assign a (or (var b) (and (var c) (== (! (var d)) (< 1.0 (+ 2.0 (* 3.0 (- 4.0))))))))"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), "(assign a (assign b 1.0))");
    }

    #[test]
    fn property_assignment_becomes_set() {
        assert_eq!(printed("obj.field = 3;"), "(= (var obj) field 3.0)");
    }

    #[test]
    fn calls_and_gets_chain() {
        assert_eq!(
            printed("make()(1).name;"),
            "(. (call (call (var make)) 1.0) name)"
        );
    }

    #[test]
    fn for_without_clauses_loops_on_true() {
        assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn for_with_expression_initializer() {
        assert_eq!(
            printed("for (i = 0; i < 2;) print i;"),
            "(block (assign i 0.0) (while (< (var i) 2.0) (print (var i))))"
        );
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let statements = parse("class B < A { init(x) { this.x = x; } get() { return this.x; } }")
            .expect("clean parse");

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected a class");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        let method_names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(method_names, ["init", "get"]);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn identical_variable_references_get_distinct_ids() {
        let statements = parse("a; a;").expect("clean parse");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn missing_expression_reports_location() {
        assert_eq!(errors("print ;"), ["[line 1] Error at ';': Expect expression."]);
        assert_eq!(errors("print 1"), ["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn invalid_assignment_target() {
        assert_eq!(
            errors("1 + 2 = 3;"),
            ["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn synchronize_reports_independent_errors() {
        let found = errors("var = 1;\nprint 2;\nvar x = ;\nfun f( { }\nprint 3;");

        assert_eq!(
            found,
            [
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
                "[line 4] Error at '{': Expect parameter name.",
            ]
        );
    }

    #[test]
    fn errors_inside_blocks_resume_in_the_block() {
        let found = errors("{\n  var a = ;\n  print a;\n  print ;\n}");

        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("[line 2]"));
        assert!(found[1].starts_with("[line 4]"));
    }

    #[test]
    fn too_many_arguments_is_reported_without_aborting() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});\nprint ;", args.join(", "));

        let found = errors(&source);

        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("Can't have more than 255 arguments."));
        assert!(found[1].starts_with("[line 2]"));
    }

    #[test]
    fn too_many_parameters_is_reported() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let found = errors(&source);

        assert_eq!(
            found,
            ["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }

    #[test]
    fn super_requires_a_method_name() {
        assert_eq!(
            errors("super;"),
            ["[line 1] Error at ';': Expect '.' after 'super'."]
        );
    }
}
