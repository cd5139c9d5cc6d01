//! Recursive-descent parser: turns a [`Token`] stream into a [`Program`].
//! There is no error recovery — the first malformed construct unwinds a
//! single positional [`SourceError`] all the way out.

use std::rc::Rc;

use crate::ast::{
    Block, DeclareInit, Expression, Identifier, IdentifierName, LoopGuard, LoopUpdate, Operator,
    Program, Statement, Type,
};
use crate::error::{ErrorKind, SourceError, SourceResult};
use crate::tokenizer::{Keyword, Literal, Token, TokenKind};

pub fn parse(tokens: Vec<Token>) -> SourceResult<Program> {
    Parser::new(tokens).parse_program()
}

fn operator_for(kw: Keyword) -> Option<Operator> {
    use Keyword::*;
    Some(match kw {
        SumOf => Operator::Sum,
        DiffOf => Operator::Diff,
        ProduktOf => Operator::Produkt,
        QuoshuntOf => Operator::Quoshunt,
        ModOf => Operator::Mod,
        BiggrOf => Operator::Biggr,
        SmallrOf => Operator::Smallr,
        BothOf => Operator::Both,
        EitherOf => Operator::Either,
        WonOf => Operator::Won,
        BothSaem => Operator::BothSaem,
        Diffrint => Operator::Diffrint,
        Not => Operator::Not,
        AllOf => Operator::All,
        AnyOf => Operator::Any,
        Smoosh => Operator::Smoosh,
        _ => return None,
    })
}

fn literals_equal(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (Literal::Bool(x), Literal::Bool(y)) => x == y,
        (Literal::Int(x), Literal::Int(y)) => x == y,
        (Literal::Float(x), Literal::Float(y)) => ((x - y).abs() as f32) < f32::EPSILON,
        (Literal::Str(x), Literal::Str(y)) => x == y,
        _ => false,
    }
}

const IF_ENDERS: &[Keyword] = &[Keyword::Mebbe, Keyword::NoWai, Keyword::Oic];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always ends in EOF"))
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        self.current().is_keyword(kw)
    }

    fn accept_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, expected: &str) -> SourceResult<Token> {
        if self.check_keyword(kw) {
            Ok(self.advance())
        } else {
            Err(self.error_expected_token(expected))
        }
    }

    fn error_expected_token(&self, expected: &str) -> SourceError {
        let tok = self.current();
        SourceError::new(ErrorKind::ParseExpectedToken, tok.file.clone(), tok.line)
            .with_image(tok.image.clone())
            .with_expected(expected)
    }

    fn expect_identifier_text(&mut self) -> SourceResult<(String, Rc<str>, usize)> {
        let tok = self.current().clone();
        if tok.kind == TokenKind::Identifier {
            self.advance();
            Ok((tok.image, tok.file, tok.line))
        } else {
            Err(
                SourceError::new(ErrorKind::ParseExpectedIdentifier, tok.file, tok.line)
                    .with_image(tok.image),
            )
        }
    }

    fn at_newline(&self) -> bool {
        self.current().kind == TokenKind::Newline
    }

    fn at_block_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn expect_end_of_statement(&mut self) -> SourceResult<()> {
        if self.at_newline() {
            self.advance();
            Ok(())
        } else if self.at_block_end() {
            Ok(())
        } else {
            let tok = self.current();
            Err(
                SourceError::new(ErrorKind::ParseExpectedEndOfStatement, tok.file.clone(), tok.line)
                    .with_image(tok.image.clone()),
            )
        }
    }

    fn parse_type(&mut self) -> SourceResult<Type> {
        let tok = self.current().clone();
        let ty = match tok.kind {
            TokenKind::Keyword(Keyword::Noob) => Type::Noob,
            TokenKind::Keyword(Keyword::Troof) => Type::Troof,
            TokenKind::Keyword(Keyword::Numbr) => Type::Numbr,
            TokenKind::Keyword(Keyword::Numbar) => Type::Numbar,
            TokenKind::Keyword(Keyword::Yarn) => Type::Yarn,
            TokenKind::Keyword(Keyword::Bukkit) => Type::Bukkit,
            _ => {
                return Err(
                    SourceError::new(ErrorKind::ParseExpectedType, tok.file, tok.line)
                        .with_image(tok.image),
                )
            }
        };
        self.advance();
        Ok(ty)
    }

    fn parse_identifier(&mut self) -> SourceResult<Identifier> {
        let tok = self.current().clone();
        let (name, file, line) = if self.accept_keyword(Keyword::Srs) {
            let inner = self.parse_expression()?;
            (IdentifierName::Indirect(Box::new(inner)), tok.file.clone(), tok.line)
        } else {
            let (text, file, line) = self.expect_identifier_text()?;
            (IdentifierName::Direct(text), file, line)
        };
        let slot = if self.accept_keyword(Keyword::Slot) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Identifier { name, slot, file, line })
    }

    fn parse_program(mut self) -> SourceResult<Program> {
        self.expect_keyword(Keyword::Hai, "HAI")?;
        let version_tok = self.current().clone();
        let version = match version_tok.kind {
            TokenKind::FloatLiteral | TokenKind::IntegerLiteral => {
                self.advance();
                version_tok.image
            }
            _ => return Err(self.error_expected_token("a version number")),
        };
        self.expect_end_of_statement()?;
        let file = version_tok.file.clone();
        let body = self.parse_block(&[Keyword::Kthxbye])?;
        self.expect_keyword(Keyword::Kthxbye, "KTHXBYE")?;
        Ok(Program { version, body, file })
    }

    fn parse_block(&mut self, enders: &[Keyword]) -> SourceResult<Block> {
        let mut statements = vec![];
        while !self.at_block_end() && !enders.iter().any(|k| self.check_keyword(*k)) {
            statements.push(self.parse_statement()?);
        }
        Ok(Block(statements))
    }

    fn parse_statement(&mut self) -> SourceResult<Statement> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Keyword(Keyword::Visible) => self.parse_print(),
            TokenKind::Keyword(Keyword::Gimmeh) => self.parse_input(),
            TokenKind::Keyword(Keyword::ORly) => self.parse_if(),
            TokenKind::Keyword(Keyword::Wtf) => self.parse_switch(),
            TokenKind::Keyword(Keyword::Gtfo) => {
                self.advance();
                self.expect_end_of_statement()?;
                Ok(Statement::Break { file: tok.file, line: tok.line })
            }
            TokenKind::Keyword(Keyword::FoundYr) => self.parse_return(),
            TokenKind::Keyword(Keyword::ImInYr) => self.parse_loop(),
            TokenKind::Keyword(Keyword::HowIz) => self.parse_func_def(),
            TokenKind::Keyword(Keyword::OhHaiIm) => self.parse_alt_array_def(),
            TokenKind::Keyword(Keyword::CanHas) => self.parse_import(),
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Srs) => {
                self.parse_identifier_led_statement()
            }
            TokenKind::Eof => Err(SourceError::new(
                ErrorKind::ParseExpectedStatement,
                tok.file,
                tok.line,
            )
            .with_image(tok.image)),
            _ => {
                let expr = self.parse_expression()?;
                let (file, line) = expr.position();
                self.expect_end_of_statement()?;
                Ok(Statement::ExpressionStatement { expr, file, line })
            }
        }
    }

    fn parse_identifier_led_statement(&mut self) -> SourceResult<Statement> {
        let target = self.parse_identifier()?;
        if self.check_keyword(Keyword::IsNowA) {
            let tok = self.advance();
            let target_type = self.parse_type()?;
            self.expect_end_of_statement()?;
            Ok(Statement::Cast { target, target_type, file: tok.file, line: tok.line })
        } else if self.check_keyword(Keyword::RNoob) {
            let tok = self.advance();
            self.expect_end_of_statement()?;
            Ok(Statement::Deallocate { target, file: tok.file, line: tok.line })
        } else if self.check_keyword(Keyword::R) {
            let tok = self.advance();
            let value = self.parse_expression()?;
            self.expect_end_of_statement()?;
            Ok(Statement::Assign { target, value, file: tok.file, line: tok.line })
        } else if self.check_keyword(Keyword::HasA) {
            self.parse_declare(target)
        } else {
            let expr = self.parse_expression_tail_from_identifier(target)?;
            let (file, line) = expr.position();
            self.expect_end_of_statement()?;
            Ok(Statement::ExpressionStatement { expr, file, line })
        }
    }

    fn parse_declare(&mut self, scope: Identifier) -> SourceResult<Statement> {
        let tok = self.advance(); // HAS A
        let (target, _, _) = self.expect_identifier_text()?;
        let init = if self.accept_keyword(Keyword::Itz) {
            if self.accept_keyword(Keyword::A) {
                let ty = self.parse_type()?;
                let parent = if ty == Type::Bukkit && self.accept_keyword(Keyword::Liek) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                Some(DeclareInit::Typed(ty, parent))
            } else {
                Some(DeclareInit::Value(self.parse_expression()?))
            }
        } else {
            None
        };
        self.expect_end_of_statement()?;
        Ok(Statement::Declare { scope, target, init, file: tok.file, line: tok.line })
    }

    fn parse_expression_tail_from_identifier(&mut self, ident: Identifier) -> SourceResult<Expression> {
        if self.check_keyword(Keyword::Iz) {
            let tok = self.advance();
            let (name, _, _) = self.expect_identifier_text()?;
            let args = self.parse_call_args()?;
            Ok(Expression::FunctionCall {
                caller: Box::new(ident),
                name,
                args,
                file: tok.file,
                line: tok.line,
            })
        } else {
            Ok(Expression::Identifier(ident))
        }
    }

    fn parse_call_args(&mut self) -> SourceResult<Vec<Expression>> {
        let mut args = vec![];
        if self.accept_keyword(Keyword::Yr) {
            args.push(self.parse_expression()?);
            while self.accept_keyword(Keyword::An) {
                self.expect_keyword(Keyword::Yr, "YR")?;
                args.push(self.parse_expression()?);
            }
        }
        self.expect_keyword(Keyword::Mkay, "MKAY")?;
        Ok(args)
    }

    fn parse_expression(&mut self) -> SourceResult<Expression> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::StringLiteral | TokenKind::IntegerLiteral | TokenKind::FloatLiteral | TokenKind::BooleanLiteral => {
                self.advance();
                let value = tok.literal.expect("literal token carries a parsed literal");
                Ok(Expression::Constant(crate::ast::Constant { value, file: tok.file, line: tok.line }))
            }
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Srs) => {
                let ident = self.parse_identifier()?;
                self.parse_expression_tail_from_identifier(ident)
            }
            TokenKind::Keyword(Keyword::It) => {
                self.advance();
                Ok(Expression::ImplicitVariable { file: tok.file, line: tok.line })
            }
            TokenKind::Keyword(Keyword::Maek) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.accept_keyword(Keyword::A);
                let target = self.parse_type()?;
                Ok(Expression::Cast { expr: Box::new(expr), target, file: tok.file, line: tok.line })
            }
            TokenKind::Keyword(Keyword::IDuz) => {
                self.advance();
                let command = Box::new(self.parse_expression()?);
                Ok(Expression::SystemCommand { command, file: tok.file, line: tok.line })
            }
            TokenKind::Keyword(kw) if operator_for(kw).is_some() => {
                let op = operator_for(kw).unwrap();
                self.advance();
                self.parse_operator_operands(op, tok.file, tok.line)
            }
            _ => Err(
                SourceError::new(ErrorKind::ParseExpectedExpression, tok.file, tok.line)
                    .with_image(tok.image),
            ),
        }
    }

    fn parse_operator_operands(&mut self, op: Operator, file: Rc<str>, line: usize) -> SourceResult<Expression> {
        use crate::ast::Arity;
        let operands = match op.arity() {
            Arity::Unary => vec![self.parse_expression()?],
            Arity::Binary => {
                let a = self.parse_expression()?;
                self.accept_keyword(Keyword::An);
                let b = self.parse_expression()?;
                vec![a, b]
            }
            Arity::Nary => {
                let mut v = vec![self.parse_expression()?];
                while self.accept_keyword(Keyword::An) {
                    v.push(self.parse_expression()?);
                }
                self.expect_keyword(Keyword::Mkay, "MKAY")?;
                v
            }
        };
        Ok(Expression::Operator { op, operands, file, line })
    }

    fn parse_print(&mut self) -> SourceResult<Statement> {
        let tok = self.advance();
        let mut parts = vec![self.parse_expression()?];
        while !self.at_newline() && !self.at_block_end() && !self.check_keyword(Keyword::Bang) {
            parts.push(self.parse_expression()?);
        }
        let suppress_newline = self.accept_keyword(Keyword::Bang);
        self.expect_end_of_statement()?;
        Ok(Statement::Print { parts, suppress_newline, file: tok.file, line: tok.line })
    }

    fn parse_input(&mut self) -> SourceResult<Statement> {
        let tok = self.advance();
        let target = self.parse_identifier()?;
        self.expect_end_of_statement()?;
        Ok(Statement::Input { target, file: tok.file, line: tok.line })
    }

    fn parse_if(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // O RLY ?
        self.expect_end_of_statement()?;
        self.expect_keyword(Keyword::YaRly, "YA RLY")?;
        self.expect_end_of_statement()?;
        let then_block = self.parse_block(IF_ENDERS)?;

        let mut else_ifs = vec![];
        while self.check_keyword(Keyword::Mebbe) {
            self.advance();
            let cond = self.parse_expression()?;
            self.expect_end_of_statement()?;
            let block = self.parse_block(IF_ENDERS)?;
            else_ifs.push((cond, block));
        }

        let else_block = if self.accept_keyword(Keyword::NoWai) {
            self.expect_end_of_statement()?;
            Some(self.parse_block(&[Keyword::Oic])?)
        } else {
            None
        };

        self.expect_keyword(Keyword::Oic, "OIC")?;
        self.expect_end_of_statement()?;
        Ok(Statement::IfThenElse { then_block, else_ifs, else_block, file: tok.file, line: tok.line })
    }

    fn parse_switch(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // WTF ?
        self.expect_end_of_statement()?;

        let mut cases: Vec<(Literal, Block)> = vec![];
        while self.check_keyword(Keyword::Omg) {
            self.advance();
            let lit_tok = self.current().clone();
            let literal = match &lit_tok.literal {
                Some(l) => l.clone(),
                None => {
                    return Err(SourceError::new(
                        ErrorKind::ParseExpectedExpression,
                        lit_tok.file,
                        lit_tok.line,
                    )
                    .with_image(lit_tok.image)
                    .with_expected("a literal"))
                }
            };
            if let Literal::Str(s) = &literal {
                if s.contains(":{") {
                    return Err(SourceError::new(
                        ErrorKind::ParseInterpolatedSwitchCase,
                        lit_tok.file.clone(),
                        lit_tok.line,
                    )
                    .with_image(lit_tok.image.clone()));
                }
            }
            if cases.iter().any(|(seen, _)| literals_equal(seen, &literal)) {
                return Err(SourceError::new(
                    ErrorKind::ParseLiteralReuse,
                    lit_tok.file.clone(),
                    lit_tok.line,
                )
                .with_image(lit_tok.image.clone()));
            }
            self.advance();
            self.expect_end_of_statement()?;
            let block = self.parse_block(&[Keyword::Omg, Keyword::Omgwtf, Keyword::Oic])?;
            cases.push((literal, block));
        }

        let default = if self.accept_keyword(Keyword::Omgwtf) {
            self.expect_end_of_statement()?;
            Some(self.parse_block(&[Keyword::Oic])?)
        } else {
            None
        };

        self.expect_keyword(Keyword::Oic, "OIC")?;
        self.expect_end_of_statement()?;
        Ok(Statement::Switch { cases, default, file: tok.file, line: tok.line })
    }

    fn parse_return(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // FOUND YR
        let value = Some(self.parse_expression()?);
        self.expect_end_of_statement()?;
        Ok(Statement::Return { value, file: tok.file, line: tok.line })
    }

    fn parse_loop(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // IM IN YR
        let (name, _, _) = self.expect_identifier_text()?;

        let update = if self.accept_keyword(Keyword::UppinYr) {
            Some(LoopUpdate::Uppin(self.parse_identifier()?))
        } else if self.accept_keyword(Keyword::NerfinYr) {
            Some(LoopUpdate::Nerfin(self.parse_identifier()?))
        } else if matches!(self.current().kind, TokenKind::Identifier | TokenKind::Keyword(Keyword::Srs)) {
            self.parse_loop_call_update()?
        } else {
            None
        };

        let guard = if self.accept_keyword(Keyword::Wile) {
            Some(LoopGuard::Wile(self.parse_expression()?))
        } else if self.accept_keyword(Keyword::Til) {
            Some(LoopGuard::Til(self.parse_expression()?))
        } else {
            None
        };

        self.expect_end_of_statement()?;
        let body = self.parse_block(&[Keyword::ImOuttaYr])?;
        let close_tok = self.expect_keyword(Keyword::ImOuttaYr, "IM OUTTA YR")?;
        let (close_name, _, _) = self.expect_identifier_text()?;
        if close_name != name {
            return Err(SourceError::new(
                ErrorKind::ParseMismatchedLoopName,
                close_tok.file,
                close_tok.line,
            )
            .with_image(close_name)
            .with_expected(name));
        }
        self.expect_end_of_statement()?;
        Ok(Statement::Loop { name, update, guard, body, file: tok.file, line: tok.line })
    }

    /// `<caller> IZ <name> YR <var> MKAY`, the function-call form of a
    /// loop's update clause. Strictly unary: an `AN` before `MKAY` means
    /// the author reached for the general call grammar here, which this
    /// position doesn't support.
    fn parse_loop_call_update(&mut self) -> SourceResult<Option<LoopUpdate>> {
        let caller = self.parse_identifier()?;
        self.expect_keyword(Keyword::Iz, "IZ")?;
        let (name, _, _) = self.expect_identifier_text()?;
        self.expect_keyword(Keyword::Yr, "YR")?;
        let var = self.parse_identifier()?;
        if self.check_keyword(Keyword::An) {
            let tok = self.current().clone();
            return Err(SourceError::new(ErrorKind::ParseExpectedUnaryFunction, tok.file, tok.line)
                .with_image(tok.image));
        }
        self.expect_keyword(Keyword::Mkay, "MKAY")?;
        Ok(Some(LoopUpdate::Call { caller, name, var }))
    }

    fn parse_func_def(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // HOW IZ
        let (caller, _, _) = self.expect_identifier_text()?;
        let (name, _, _) = self.expect_identifier_text()?;

        let mut params = vec![];
        if self.accept_keyword(Keyword::Yr) {
            let (p, _, _) = self.expect_identifier_text()?;
            params.push(p);
            while self.accept_keyword(Keyword::An) {
                self.expect_keyword(Keyword::Yr, "YR")?;
                let (p, _, _) = self.expect_identifier_text()?;
                params.push(p);
            }
        }

        self.expect_end_of_statement()?;
        let body = self.parse_block(&[Keyword::IfUSaySo])?;
        self.expect_keyword(Keyword::IfUSaySo, "IF U SAY SO")?;
        self.expect_end_of_statement()?;
        Ok(Statement::FuncDef { caller, name, params, body, file: tok.file, line: tok.line })
    }

    fn parse_alt_array_def(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // OH HAI IM
        let (name, _, _) = self.expect_identifier_text()?;
        let parent = if self.accept_keyword(Keyword::Liek) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.expect_end_of_statement()?;
        let body = self.parse_block(&[Keyword::Kthx])?;
        self.expect_keyword(Keyword::Kthx, "KTHX")?;
        self.expect_end_of_statement()?;
        Ok(Statement::AltArrayDef { name, parent, body, file: tok.file, line: tok.line })
    }

    fn parse_import(&mut self) -> SourceResult<Statement> {
        let tok = self.advance(); // CAN HAS
        let (name, _, _) = self.expect_identifier_text()?;
        self.accept_keyword(Keyword::Question);
        self.expect_end_of_statement()?;
        Ok(Statement::Import { name, file: tok.file, line: tok.line })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::tokenizer::Tokenizer;

    fn parse_source(src: &str) -> SourceResult<Program> {
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new(src, file).lex().expect("lex should succeed");
        let tokens = Tokenizer::new(lexemes).tokenize().expect("tokenize should succeed");
        parse(tokens)
    }

    #[test]
    fn parses_hello_world() {
        let program = parse_source("HAI 1.2\nVISIBLE \"HELLO WORLD\"\nKTHXBYE\n").unwrap();
        assert_eq!(program.version, "1.2");
        assert_eq!(program.body.0.len(), 1);
        assert!(matches!(program.body.0[0], Statement::Print { .. }));
    }

    #[test]
    fn parses_if_else() {
        let src = "HAI 1.2\nBOTH SAEM 1 AN 1\nO RLY?\nYA RLY\nVISIBLE \"Y\"\nNO WAI\nVISIBLE \"N\"\nOIC\nKTHXBYE\n";
        let program = parse_source(src).unwrap();
        assert_eq!(program.body.0.len(), 2);
        match &program.body.0[1] {
            Statement::IfThenElse { then_block, else_block, .. } => {
                assert_eq!(then_block.0.len(), 1);
                assert!(else_block.is_some());
            }
            other => panic!("expected if/then/else, got {other:?}"),
        }
    }

    #[test]
    fn loop_name_mismatch_is_an_error() {
        let src = "HAI 1.2\nIM IN YR L\nIM OUTTA YR M\nKTHXBYE\n";
        let err = parse_source(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseMismatchedLoopName);
    }

    #[test]
    fn switch_rejects_duplicate_literal() {
        let src = "HAI 1.2\nWTF?\nOMG 1\nOMG 1\nOIC\nKTHXBYE\n";
        let err = parse_source(src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseLiteralReuse);
    }

    #[test]
    fn parses_function_call_as_expression() {
        let src = "HAI 1.2\nHOW IZ I FIB YR N\nFOUND YR N\nIF U SAY SO\nI IZ FIB YR 10 MKAY\nKTHXBYE\n";
        let program = parse_source(src).unwrap();
        assert!(matches!(program.body.0[0], Statement::FuncDef { .. }));
        match &program.body.0[1] {
            Statement::ExpressionStatement { expr: Expression::FunctionCall { name, args, .. }, .. } => {
                assert_eq!(name, "FIB");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected a function call statement, got {other:?}"),
        }
    }
}
