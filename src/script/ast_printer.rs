use std::fmt::{Debug, Display};
use std::io::Write as IOWrite;

use super::ast::*;
use super::Program;

const INDENT: usize = 2;

const PREFIX_ROOT_ID: &'static str = "Root";
const PREFIX_BLOCK_STMT_ID: &'static str = "SBl ";
const PREFIX_FUNCTION_STMT_ID: &'static str = "SFun";
const PREFIX_VARIABLE_STMT_ID: &'static str = "SVar";
const PREFIX_IF_STMT_ID: &'static str = "SIf ";
const PREFIX_FOR_STMT_ID: &'static str = "SFor";
const PREFIX_RETURN_STMT_ID: &'static str = "SRet";
const PREFIX_EXPR_STMT_ID: &'static str = "SExp";
const PREFIX_IDENTIFIER_EXPR_ID: &'static str = "EIdt";
const PREFIX_BINARY_EXPR_ID: &'static str = "EBin";
const PREFIX_ASSIGNMENT_EXPR_ID: &'static str = "EAsi";
const PREFIX_UPDATE_EXPR_ID: &'static str = "EUpd";
const PREFIX_CALL_EXPR_ID: &'static str = "ECll";
const PREFIX_MEMBER_EXPR_ID: &'static str = "EMem";
const PREFIX_ARRAY_EXPR_ID: &'static str = "EArr";
const PREFIX_OBJECT_EXPR_ID: &'static str = "EObj";
const PREFIX_INT_LITERAL_EXPR_ID: &'static str = "EInt";

/// One line of output. The line is appended to the buffer once the KV is
/// dropped, so a line is built as a single chained expression.
struct KV<'a> {
    buffer: &'a mut String,
    prefix: Option<(&'static str, u32)>,
    indent: usize,
    temp_key: &'a mut String,
    temp_val: &'a mut String,
}

impl<'a> KV<'a> {
    fn new(buffer: &'a mut String, temp_key: &'a mut String, temp_val: &'a mut String, indent: usize) -> Self {
        temp_key.clear();
        temp_val.clear();
        KV{
            buffer,
            prefix: None,
            indent,
            temp_key,
            temp_val
        }
    }

    fn with_id(mut self, prefix: &'static str, id: u32) -> Self {
        self.prefix = Some((prefix, id));
        self
    }

    fn with_s_key(self, key: &str) -> Self {
        self.temp_key.push_str(key);
        self
    }

    fn with_s_val(self, val: &str) -> Self {
        self.temp_val.push_str(val);
        self
    }

    fn with_disp_val<D: Display>(self, val: &D) -> Self {
        self.temp_val.push_str(&format!("{}", val));
        self
    }

    fn with_debug_val<D: Debug>(self, val: &D) -> Self {
        self.temp_val.push_str(&format!("{:?}", val));
        self
    }
}

impl<'a> Drop for KV<'a> {
    fn drop(&mut self) {
        if let Some((prefix, id)) = &self.prefix {
            self.buffer.push_str(&format!("{}[{:04}]", prefix, id));
        } else {
            self.buffer.push_str("          ");
        }

        for _ in 0..self.indent * INDENT {
            self.buffer.push(' ');
        }

        self.buffer.push_str("- ");
        self.buffer.push_str(self.temp_key);
        if self.temp_val.is_empty() {
            self.buffer.push(':');
        } else {
            self.buffer.push_str(": ");
            self.buffer.push_str(&self.temp_val);
        }
        self.buffer.push('\n');
    }
}

pub(crate) struct ASTWriter {
    buffer: String,
    temp1: String,
    temp2: String,
}

impl ASTWriter {
    pub(crate) fn new() -> Self {
        Self{
            buffer: String::with_capacity(4096),
            temp1: String::with_capacity(256),
            temp2: String::with_capacity(256),
        }
    }

    pub(crate) fn write_ast<W: IOWrite>(&mut self, w: &mut W, program: &Program) -> std::io::Result<()> {
        let heap = &program.heap;
        let root = &heap[program.root];
        self.kv(0).with_id(PREFIX_ROOT_ID, root.this.index).with_s_key("Program");
        for statement_id in &root.statements {
            self.write_stmt(heap, *statement_id, 1);
        }

        w.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    //--------------------------------------------------------------------------
    // Statements
    //--------------------------------------------------------------------------

    fn write_stmt(&mut self, heap: &Heap, stmt_id: StatementId, indent: usize) {
        let indent2 = indent + 1;
        let indent3 = indent2 + 1;

        match &heap[stmt_id] {
            Statement::Block(stmt) => {
                self.kv(indent).with_id(PREFIX_BLOCK_STMT_ID, stmt.this.0.index)
                    .with_s_key("Block");
                for stmt_id in &stmt.statements {
                    self.write_stmt(heap, *stmt_id, indent2);
                }
            },
            Statement::Function(stmt) => {
                self.kv(indent).with_id(PREFIX_FUNCTION_STMT_ID, stmt.this.0.index)
                    .with_s_key("FunctionDeclaration");
                self.kv(indent2).with_s_key("Name").with_disp_val(&stmt.identifier);
                self.kv(indent2).with_s_key("Parameters");
                for parameter in &stmt.parameters {
                    self.kv(indent3).with_s_key("Parameter").with_disp_val(parameter);
                }
                self.kv(indent2).with_s_key("Body");
                self.write_stmt(heap, stmt.body.upcast(), indent3);
            },
            Statement::Variable(stmt) => {
                self.kv(indent).with_id(PREFIX_VARIABLE_STMT_ID, stmt.this.0.index)
                    .with_s_key("VariableDeclaration");
                let indent4 = indent3 + 1;
                for declarator in &stmt.declarations {
                    self.kv(indent2).with_s_key("Declarator");
                    self.kv(indent3).with_s_key("Name").with_disp_val(&declarator.identifier);
                    self.kv(indent3).with_s_key("Initializer");
                    self.write_expr(heap, declarator.initializer, indent4);
                }
            },
            Statement::If(stmt) => {
                self.kv(indent).with_id(PREFIX_IF_STMT_ID, stmt.this.0.index)
                    .with_s_key("If");
                self.kv(indent2).with_s_key("Test");
                self.write_expr(heap, stmt.test, indent3);
                self.kv(indent2).with_s_key("Consequent");
                self.write_stmt(heap, stmt.consequent, indent3);
            },
            Statement::For(stmt) => {
                self.kv(indent).with_id(PREFIX_FOR_STMT_ID, stmt.this.0.index)
                    .with_s_key("For");
                self.kv(indent2).with_s_key("Init");
                self.write_stmt(heap, stmt.init, indent3);
                self.kv(indent2).with_s_key("Test");
                self.write_expr(heap, stmt.test, indent3);
                self.kv(indent2).with_s_key("Update");
                self.write_expr(heap, stmt.update, indent3);
                self.kv(indent2).with_s_key("Body");
                self.write_stmt(heap, stmt.body, indent3);
            },
            Statement::Return(stmt) => {
                self.kv(indent).with_id(PREFIX_RETURN_STMT_ID, stmt.this.0.index)
                    .with_s_key("Return");
                match stmt.argument {
                    Some(argument) => {
                        self.kv(indent2).with_s_key("Argument");
                        self.write_expr(heap, argument, indent3);
                    },
                    None => {
                        self.kv(indent2).with_s_key("Argument").with_s_val("None");
                    }
                }
            },
            Statement::Expression(stmt) => {
                self.kv(indent).with_id(PREFIX_EXPR_STMT_ID, stmt.this.0.index)
                    .with_s_key("ExpressionStatement");
                self.write_expr(heap, stmt.expression, indent2);
            },
        }
    }

    //--------------------------------------------------------------------------
    // Expressions
    //--------------------------------------------------------------------------

    fn write_expr(&mut self, heap: &Heap, expr_id: ExpressionId, indent: usize) {
        let indent2 = indent + 1;
        let indent3 = indent2 + 1;

        match &heap[expr_id] {
            Expression::Identifier(expr) => {
                self.kv(indent).with_id(PREFIX_IDENTIFIER_EXPR_ID, expr.this.0.index)
                    .with_s_key("Identifier").with_disp_val(&expr.identifier);
            },
            Expression::Binary(expr) => {
                self.kv(indent).with_id(PREFIX_BINARY_EXPR_ID, expr.this.0.index)
                    .with_s_key("BinaryExpr");
                self.kv(indent2).with_s_key("Operation").with_debug_val(&expr.operation);
                self.kv(indent2).with_s_key("Left");
                self.write_expr(heap, expr.left, indent3);
                self.kv(indent2).with_s_key("Right");
                self.write_expr(heap, expr.right, indent3);
            },
            Expression::Assignment(expr) => {
                self.kv(indent).with_id(PREFIX_ASSIGNMENT_EXPR_ID, expr.this.0.index)
                    .with_s_key("AssignmentExpr");
                self.kv(indent2).with_s_key("Operation").with_debug_val(&expr.operation);
                self.kv(indent2).with_s_key("Left");
                self.write_expr(heap, expr.left, indent3);
                self.kv(indent2).with_s_key("Right");
                self.write_expr(heap, expr.right, indent3);
            },
            Expression::Update(expr) => {
                self.kv(indent).with_id(PREFIX_UPDATE_EXPR_ID, expr.this.0.index)
                    .with_s_key("UpdateExpr");
                self.kv(indent2).with_s_key("Operation").with_debug_val(&expr.operation);
                self.kv(indent2).with_s_key("Argument");
                self.write_expr(heap, expr.argument, indent3);
            },
            Expression::Call(expr) => {
                self.kv(indent).with_id(PREFIX_CALL_EXPR_ID, expr.this.0.index)
                    .with_s_key("CallExpr");
                self.kv(indent2).with_s_key("Callee").with_disp_val(&expr.callee);
                self.kv(indent2).with_s_key("Arguments");
                for argument in &expr.arguments {
                    self.write_expr(heap, *argument, indent3);
                }
            },
            Expression::Member(expr) => {
                self.kv(indent).with_id(PREFIX_MEMBER_EXPR_ID, expr.this.0.index)
                    .with_s_key("MemberExpr");
                self.kv(indent2).with_s_key("Object");
                self.write_expr(heap, expr.object, indent3);
                self.kv(indent2).with_s_key("Property");
                self.write_expr(heap, expr.property, indent3);
            },
            Expression::Array(expr) => {
                self.kv(indent).with_id(PREFIX_ARRAY_EXPR_ID, expr.this.0.index)
                    .with_s_key("ArrayExpr");
                for element in &expr.elements {
                    self.write_expr(heap, *element, indent2);
                }
            },
            Expression::Object(expr) => {
                self.kv(indent).with_id(PREFIX_OBJECT_EXPR_ID, expr.this.0.index)
                    .with_s_key("ObjectExpr");
                let indent4 = indent3 + 1;
                for property in &expr.properties {
                    self.kv(indent2).with_s_key("Property");
                    self.kv(indent3).with_s_key("Key");
                    self.write_expr(heap, property.key, indent4);
                    self.kv(indent3).with_s_key("Value");
                    self.write_expr(heap, property.value, indent4);
                }
            },
            Expression::IntLiteral(expr) => {
                self.kv(indent).with_id(PREFIX_INT_LITERAL_EXPR_ID, expr.this.0.index)
                    .with_s_key("IntLiteral").with_disp_val(&expr.value);
            },
        }
    }

    fn kv(&mut self, indent: usize) -> KV {
        KV::new(&mut self.buffer, &mut self.temp1, &mut self.temp2, indent)
    }
}
