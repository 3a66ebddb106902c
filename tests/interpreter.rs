#[cfg(test)]
mod interpreter_tests {
    use rox as lox;

    use lox::interpreter::Interpreter;
    use lox::resolver::Resolver;
    use lox::runner::{parse_source, run_source, Failure};

    /// Runs `source` and returns everything it printed.
    fn interpret(source: &str) -> Result<String, Failure> {
        let mut interpreter = Interpreter::new(Vec::new());
        run_source(&mut interpreter, source)?;
        Ok(String::from_utf8(interpreter.into_output()).expect("utf-8 output"))
    }

    fn assert_interpreted(expected: &str, source: &str) {
        match interpret(source) {
            Ok(output) => assert_eq!(output, expected, "program:\n{}", source),
            Err(failure) => panic!("program failed: {}\n{}", failure, source),
        }
    }

    fn assert_evaluated(expected: &str, expr: &str) {
        assert_interpreted(&format!("{}\n", expected), &format!("print {};", expr));
    }

    fn runtime_error(source: &str) -> String {
        match interpret(source) {
            Err(Failure::Runtime(error)) => error.to_string(),
            Err(other) => panic!("expected a runtime error, got {}", other),
            Ok(output) => panic!("expected a runtime error, program printed {:?}", output),
        }
    }

    #[test]
    fn test_arithmetic_and_formatting() {
        assert_evaluated("42", "2 * 25 - 8");
        assert_evaluated("42", "(42)");
        assert_evaluated("42.1", "42.1");
        assert_evaluated("42", "84 / 2");
        assert_evaluated("-42", "-42");
        assert_evaluated("2.5", "5 / 2");
        assert_evaluated("42", "\"4\" + \"2\"");
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_evaluated("true", "1 > 0");
        assert_evaluated("false", "0 > 0");
        assert_evaluated("true", "0 >= 0");
        assert_evaluated("true", "0 < 1");
        assert_evaluated("true", "0 <= 0");
        assert_evaluated("true", "nil == nil");
        assert_evaluated("false", "nil == false");
        assert_evaluated("true", "nil != 1");
        assert_evaluated("false", "\"1\" == 1");
        assert_evaluated("true", "\"a\" == \"a\"");
    }

    #[test]
    fn test_truthiness() {
        assert_evaluated("false", "!42");
        assert_evaluated("false", "!0");
        assert_evaluated("false", "!\"\"");
        assert_evaluated("true", "!nil");
        assert_evaluated("true", "!false");
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_interpreted(
            "hi\nyes\nnil\n",
            "print \"hi\" or 2; print nil or \"yes\"; print nil and boom();",
        );
    }

    #[test]
    fn test_stringify() {
        assert_evaluated("nil", "nil");
        assert_evaluated("foo", "\"foo\"");
        assert_evaluated("<native fn>", "clock");
        assert_interpreted("<fn f>\n", "fun f() {} print f;");
        assert_interpreted("Bagel\nBagel instance\n", "class Bagel {} print Bagel; print Bagel();");
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_evaluated("true", "clock() > 1000000000");
    }

    #[test]
    fn test_blocks_shadow_and_restore() {
        let source = r#"
            var a = "global a";
            var b = "global b";
            {
                var a = "outer a";
                {
                    var a = "inner a";
                    print a;
                    print b;
                }
                print a;
            }
            print a;
        "#;

        assert_interpreted("inner a\nglobal b\nouter a\nglobal a\n", source);
    }

    #[test]
    fn test_uninitialized_vars_are_nil() {
        assert_interpreted("nil\n", "var a; print a;");
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_interpreted("2\n2\n", "var a = 1; print a = 2; print a;");
    }

    #[test]
    fn test_control_flow() {
        assert_interpreted(
            "true\nfalse\n",
            "if (true) print \"true\"; else print \"false\"; if (nil) print \"true\"; else print \"false\";",
        );
        assert_interpreted(
            "0\n1\n2\n",
            "var a = 0; while (a < 3) { print a; a = a + 1; }",
        );
        assert_interpreted(
            "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n",
            "var a = 0; var temp; for (var b = 1; a < 50; b = temp + b) { print a; temp = a; a = b; }",
        );
    }

    #[test]
    fn test_recursion() {
        let source = "
            fun fib(n) {
                if (n <= 1) return n;
                return fib(n - 2) + fib(n - 1);
            }
            for (var i = 0; i < 7; i = i + 1) print fib(i);
        ";

        assert_interpreted("0\n1\n1\n2\n3\n5\n8\n", source);
    }

    #[test]
    fn test_return_unwinds_only_to_the_call() {
        let source = r#"
            fun find() {
                for (var i = 0; i < 10; i = i + 1) {
                    while (true) {
                        if (i == 3) return i;
                        i = i + 1;
                    }
                }
                return "unreachable";
            }
            print find();
            print "after";
        "#;

        assert_interpreted("3\nafter\n", source);
    }

    #[test]
    fn test_closures_share_captured_state() {
        let source = "
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
        ";

        assert_interpreted("1\n2\n", source);
    }

    #[test]
    fn test_independent_closures() {
        let source = "
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var a = makeCounter();
            var b = makeCounter();
            a(); a();
            print a();
            print b();
        ";

        assert_interpreted("3\n1\n", source);
    }

    #[test]
    fn test_closure_binding_is_lexical() {
        let source = r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_interpreted("global\nglobal\n", source);
    }

    #[test]
    fn test_shadowing_waits_for_declaration() {
        assert_interpreted("1\n", "var foo = 1; { print foo; var foo = 2; }");
    }

    #[test]
    fn test_fields_and_methods() {
        assert_interpreted("bar\n", "class Bagel {} var b = Bagel(); b.foo = \"bar\"; print b.foo;");
        assert_interpreted(
            "The German chocolate cake is delicious!\n",
            r#"
            class Cake {
                taste() {
                    var adjective = "delicious";
                    print "The " + this.flavor + " cake is " + adjective + "!";
                }
            }
            var cake = Cake();
            cake.flavor = "German chocolate";
            cake.taste();
            "#,
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_interpreted(
            "field\n",
            "class A { m() { return \"method\"; } } var a = A(); a.m = \"field\"; print a.m;",
        );
    }

    #[test]
    fn test_bound_methods_keep_their_receiver() {
        let source = r#"
            class Person {
                sayName() { print this.name; }
            }
            var jane = Person();
            jane.name = "Jane";
            var bill = Person();
            bill.name = "Bill";
            bill.sayName = jane.sayName;
            bill.sayName();
        "#;

        assert_interpreted("Jane\n", source);
    }

    #[test]
    fn test_this_inside_nested_function() {
        let source = "
            class Thing {
                getCallback() {
                    fun localFunction() { print this; }
                    return localFunction;
                }
            }
            var callback = Thing().getCallback();
            callback();
        ";

        assert_interpreted("Thing instance\n", source);
    }

    #[test]
    fn test_initializer() {
        let source = "
            class Point {
                init(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }
            print Point(1, 2).sum();
        ";

        assert_interpreted("3\n", source);
    }

    #[test]
    fn test_init_returns_this() {
        let source = "
            class Foo {
                init() { print this; }
            }
            var foo = Foo();
            print foo.init();
        ";

        assert_interpreted("Foo instance\nFoo instance\nFoo instance\n", source);
        assert_interpreted(
            "early\n",
            "class Foo { init() { print \"early\"; return; print \"never\"; } } Foo();",
        );
    }

    #[test]
    fn test_class_can_name_itself_in_methods() {
        let source = "
            class Node {
                make() { return Node(); }
            }
            print Node().make();
        ";

        assert_interpreted("Node instance\n", source);
    }

    #[test]
    fn test_inheritance() {
        assert_interpreted(
            "A\n",
            "class A { f() { return \"A\"; } } class B < A {} print B().f();",
        );
    }

    #[test]
    fn test_super_calls() {
        let source = r#"
            class Doughnut {
                cook() { print "Fry until golden brown."; }
            }
            class BostonCream < Doughnut {
                cook() {
                    super.cook();
                    print "Pipe full of custard and coat with chocolate.";
                }
            }
            BostonCream().cook();
        "#;

        assert_interpreted(
            "Fry until golden brown.\nPipe full of custard and coat with chocolate.\n",
            source,
        );
    }

    #[test]
    fn test_super_is_bound_where_the_method_is_declared() {
        let source = r#"
            class A { method() { print "A method"; } }
            class B < A {
                method() { print "B method"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
        "#;

        assert_interpreted("A method\n", source);
    }

    #[test]
    fn test_runtime_type_errors() {
        assert_eq!(runtime_error("-true;"), "Operand must be a number.\n[line 1]");
        assert_eq!(runtime_error("12 > true;"), "Operands must be numbers.\n[line 1]");
        assert_eq!(runtime_error("false * 23;"), "Operands must be numbers.\n[line 1]");
        assert_eq!(
            runtime_error("\n\nfalse + 23;"),
            "Operands must be two numbers or two strings.\n[line 3]"
        );
        assert_eq!(
            runtime_error("\"a\" + 1;"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(runtime_error("print nope;"), "Undefined variable 'nope'.\n[line 1]");
        assert_eq!(runtime_error("nope = 1;"), "Undefined variable 'nope'.\n[line 1]");
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            runtime_error("fun f() {} f(1);"),
            "Expected 0 arguments but got 1.\n[line 1]"
        );
        assert_eq!(
            runtime_error("class A { init(a, b) {} } A(1);"),
            "Expected 2 arguments but got 1.\n[line 1]"
        );
        assert_eq!(
            runtime_error("\"not callable\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {} A().missing;"),
            "Undefined property 'missing'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var s = \"str\"; s.length;"),
            "Only instances have properties.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var s = \"str\"; s.length = 3;"),
            "Only instances have fields.\n[line 1]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = \"nope\"; class Subclass < NotAClass {}"),
            "Superclass must be a class.\n[line 1]"
        );
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let mut interpreter = Interpreter::new(Vec::new());
        let result = run_source(&mut interpreter, "print 1; print -\"x\"; print 2;");

        assert!(matches!(result, Err(Failure::Runtime(_))));
        assert_eq!(interpreter.output().as_slice(), b"1\n");
    }

    #[test]
    fn test_runtime_error_inside_call_restores_environment() {
        let mut interpreter = Interpreter::new(Vec::new());

        let failed = run_source(
            &mut interpreter,
            "var a = \"global\"; fun f() { var a = \"local\"; { nope(); } }  f();",
        );
        assert!(failed.is_err());

        run_source(&mut interpreter, "print a;").expect("globals still reachable");
        assert_eq!(interpreter.output().as_slice(), b"global\n");
    }

    #[test]
    fn test_reinterpreting_a_resolved_program_is_idempotent() {
        let statements = parse_source(
            "fun add(a, b) { return a + b; } { var x = 1; print add(x, 2); }",
        )
        .expect("clean parse");

        let mut interpreter = Interpreter::new(Vec::new());
        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .expect("resolves");

        interpreter.interpret(&statements).expect("first run");
        interpreter.interpret(&statements).expect("second run");

        assert_eq!(interpreter.output().as_slice(), b"3\n3\n");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let mut interpreter = Interpreter::new(Vec::new());
        let result = run_source(&mut interpreter, "print \"ran\"; class Oops < Oops {}");

        assert!(matches!(result, Err(Failure::Static(_))));
        assert!(interpreter.output().is_empty());
    }
}
