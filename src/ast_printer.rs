use crate::ast::{Expr, LiteralValue, Stmt};

/// Renders syntax trees in parenthesized prefix form, e.g. `(* (- 1.0) 2.0)`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → "3.0"
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => format!("(var {})", name.lexeme),

            Expr::Assign { name, value, .. } => {
                format!("(assign {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = vec!["call".into(), Self::print(callee)];
                parts.extend(arguments.iter().map(Self::print));
                format!("({})", parts.join(" "))
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::wrap("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(declaration) => {
                let params: Vec<&str> = declaration
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect();
                let head: String = format!("fun {} ({})", declaration.name.lexeme, params.join(" "));
                Self::wrap(&head, &declaration.body)
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut parts: Vec<String> = vec![format!("class {}", name.lexeme)];

                if let Some(Expr::Variable { name: super_name, .. }) = superclass {
                    parts.push(format!("< {}", super_name.lexeme));
                }

                parts.extend(
                    methods
                        .iter()
                        .map(|m| Self::print_stmt(&Stmt::Function(m.clone()))),
                );

                format!("({})", parts.join(" "))
            }
        }
    }

    fn wrap(head: &str, statements: &[Stmt]) -> String {
        let mut parts: Vec<String> = vec![head.to_string()];
        parts.extend(statements.iter().map(Self::print_stmt));
        format!("({})", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn printed(src: &str) -> Vec<String> {
        let (tokens, errors) = Scanner::new(src).scan_tokens();
        assert!(errors.is_empty());

        let statements = Parser::new(tokens).parse().expect("parse failed");
        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    #[test]
    fn prints_precedence_as_nesting() {
        assert_eq!(printed("-123 * (45.67);"), ["(* (- 123.0) (group 45.67))"]);
        assert_eq!(printed("1 + 2 * 3;"), ["(+ 1.0 (* 2.0 3.0))"]);
    }

    #[test]
    fn prints_statements() {
        assert_eq!(printed("var a = 1;"), ["(var a 1.0)"]);
        assert_eq!(printed("print a = b;"), ["(print (assign a (var b)))"]);
        assert_eq!(
            printed("if (a) print 1; else print 2;"),
            ["(if (var a) (print 1.0) (print 2.0))"]
        );
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            ["(fun add (a b) (return (+ (var a) (var b))))"]
        );
    }

    #[test]
    fn prints_classes_and_properties() {
        assert_eq!(
            printed("class B < A { go() { this.x = super.go(); } }"),
            ["(class B < A (fun go () (= this x (call (super go)))))"]
        );
        assert_eq!(printed("a.b.c(1, 2);"), ["(call (. (. (var a) b) c) 1.0 2.0)"]);
    }

    #[test]
    fn for_loop_prints_its_desugaring() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            ["(block (var i 0.0) (while (< (var i) 3.0) (block (print (var i)) (assign i (+ (var i) 1.0)))))"]
        );
    }
}
