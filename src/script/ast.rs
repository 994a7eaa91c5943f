use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

use super::arena::{Arena, Id};
use super::input_source::InputSpan;

/// Helper macro that defines a type alias for a AST element ID. In this case
/// only used to alias the `Id<T>` types.
macro_rules! define_aliased_ast_id {
    // Variant where we just defined the alias, without any indexing
    ($name:ident, $parent:ty) => {
        pub type $name = $parent;
    };
    // Variant where we define the type, and the Index and IndexMut traits
    (
        $name:ident, $parent:ty,
        index($indexed_type:ty, $indexed_arena:ident)
    ) => {
        define_aliased_ast_id!($name, $parent);
        impl Index<$name> for Heap {
            type Output = $indexed_type;
            fn index(&self, index: $name) -> &Self::Output {
                &self.$indexed_arena[index]
            }
        }

        impl IndexMut<$name> for Heap {
            fn index_mut(&mut self, index: $name) -> &mut Self::Output {
                &mut self.$indexed_arena[index]
            }
        }
    };
    // Variant where we define type, Index(Mut) traits and an allocation function
    (
        $name:ident, $parent:ty,
        index($indexed_type:ty, $indexed_arena:ident),
        alloc($fn_name:ident)
    ) => {
        define_aliased_ast_id!($name, $parent, index($indexed_type, $indexed_arena));
        impl Heap {
            pub(crate) fn $fn_name(&mut self, f: impl FnOnce($name) -> $indexed_type) -> $name {
                self.$indexed_arena.alloc_with_id(|id| f(id))
            }
        }
    };
}

/// Helper macro that defines a wrapper type for a particular variant of an AST
/// element ID, together with indexing into the heap and an allocation
/// function.
macro_rules! define_new_ast_id {
    (
        $name:ident, $parent:ty,
        index($indexed_type:ty, $wrapper_type:path, $indexed_arena:ident),
        alloc($fn_name:ident)
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name (pub(crate) $parent);

        impl $name {
            pub fn upcast(self) -> $parent { self.0 }
        }

        impl Index<$name> for Heap {
            type Output = $indexed_type;
            fn index(&self, index: $name) -> &Self::Output {
                if let $wrapper_type(v) = &self.$indexed_arena[index.0] {
                    v
                } else {
                    unreachable!()
                }
            }
        }

        impl IndexMut<$name> for Heap {
            fn index_mut(&mut self, index: $name) -> &mut Self::Output {
                if let $wrapper_type(v) = &mut self.$indexed_arena[index.0] {
                    v
                } else {
                    unreachable!()
                }
            }
        }

        impl Heap {
            pub(crate) fn $fn_name(&mut self, f: impl FnOnce($name) -> $indexed_type) -> $name {
                $name(
                    self.$indexed_arena.alloc_with_id(|id| {
                        $wrapper_type(f($name(id)))
                    })
                )
            }
        }
    }
}

define_aliased_ast_id!(RootId, Id<Root>, index(Root, roots), alloc(alloc_root));

define_aliased_ast_id!(StatementId, Id<Statement>, index(Statement, statements));
define_new_ast_id!(BlockStatementId, StatementId, index(BlockStatement, Statement::Block, statements), alloc(alloc_block_statement));
define_new_ast_id!(FunctionDeclarationId, StatementId, index(FunctionDeclaration, Statement::Function, statements), alloc(alloc_function_declaration));
define_new_ast_id!(VariableDeclarationId, StatementId, index(VariableDeclaration, Statement::Variable, statements), alloc(alloc_variable_declaration));
define_new_ast_id!(IfStatementId, StatementId, index(IfStatement, Statement::If, statements), alloc(alloc_if_statement));
define_new_ast_id!(ForStatementId, StatementId, index(ForStatement, Statement::For, statements), alloc(alloc_for_statement));
define_new_ast_id!(ReturnStatementId, StatementId, index(ReturnStatement, Statement::Return, statements), alloc(alloc_return_statement));
define_new_ast_id!(ExpressionStatementId, StatementId, index(ExpressionStatement, Statement::Expression, statements), alloc(alloc_expression_statement));

define_aliased_ast_id!(ExpressionId, Id<Expression>, index(Expression, expressions));
define_new_ast_id!(IdentifierExpressionId, ExpressionId, index(IdentifierExpression, Expression::Identifier, expressions), alloc(alloc_identifier_expression));
define_new_ast_id!(BinaryExpressionId, ExpressionId, index(BinaryExpression, Expression::Binary, expressions), alloc(alloc_binary_expression));
define_new_ast_id!(AssignmentExpressionId, ExpressionId, index(AssignmentExpression, Expression::Assignment, expressions), alloc(alloc_assignment_expression));
define_new_ast_id!(UpdateExpressionId, ExpressionId, index(UpdateExpression, Expression::Update, expressions), alloc(alloc_update_expression));
define_new_ast_id!(CallExpressionId, ExpressionId, index(CallExpression, Expression::Call, expressions), alloc(alloc_call_expression));
define_new_ast_id!(MemberExpressionId, ExpressionId, index(MemberExpression, Expression::Member, expressions), alloc(alloc_member_expression));
define_new_ast_id!(ArrayExpressionId, ExpressionId, index(ArrayExpression, Expression::Array, expressions), alloc(alloc_array_expression));
define_new_ast_id!(ObjectExpressionId, ExpressionId, index(ObjectExpression, Expression::Object, expressions), alloc(alloc_object_expression));
define_new_ast_id!(IntLiteralExpressionId, ExpressionId, index(IntLiteralExpression, Expression::IntLiteral, expressions), alloc(alloc_int_literal_expression));

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Heap {
    // Root arena, the entry point of a parsed program. Its statements refer
    // to the other arenas.
    pub(crate) roots: Arena<Root>,
    pub(crate) statements: Arena<Statement>,
    pub(crate) expressions: Arena<Expression>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap {
            roots: Arena::new(),
            statements: Arena::new(),
            expressions: Arena::new(),
        }
    }

    /// Height of every statement and expression, where a leaf has height 1.
    /// Children are always allocated before their parents, so a single pass
    /// in allocation order sees every child first. Returns `None` when a
    /// node refers to a node that is not below it.
    fn heights(&self) -> Option<(Vec<usize>, Vec<usize>)> {
        let mut expression_heights = Vec::with_capacity(self.expressions.len());
        for expression in self.expressions.iter() {
            let mut height = 1;
            for child in expression.children() {
                height = height.max(expression_heights.get(child.index as usize)? + 1);
            }
            expression_heights.push(height);
        }

        let mut statement_heights = Vec::with_capacity(self.statements.len());
        for statement in self.statements.iter() {
            let (statements, expressions) = statement.children();
            let mut height = 1;
            for child in statements {
                height = height.max(statement_heights.get(child.index as usize)? + 1);
            }
            for child in expressions {
                height = height.max(expression_heights.get(child.index as usize)? + 1);
            }
            statement_heights.push(height);
        }

        Some((statement_heights, expression_heights))
    }

    /// Finds a node whose subtree is deeper than `max_depth`, returning the
    /// span of the first one in allocation order.
    pub(crate) fn find_too_deep(&self, max_depth: usize) -> Option<InputSpan> {
        let (statement_heights, expression_heights) = self.heights()?;
        let expression = expression_heights.iter()
            .position(|height| *height > max_depth)
            .map(|index| self.expressions.iter().nth(index).map(|e| e.span()));
        let statement = statement_heights.iter()
            .position(|height| *height > max_depth)
            .map(|index| self.statements.iter().nth(index).map(|s| s.span()));
        expression.or(statement).flatten()
    }

    /// Checks the invariants the parser guarantees and the interpreter relies
    /// on: every node knows its own id, every child was allocated before its
    /// parent, function bodies are blocks, `root` exists and no subtree is
    /// deeper than `max_depth`.
    pub(crate) fn validate(&self, root: RootId, max_depth: usize) -> Result<(), String> {
        for (index, expression) in self.expressions.iter().enumerate() {
            if expression.this().index as usize != index {
                return Err(format!("expression {} is labelled as {}", index, expression.this().index));
            }
            if let Some(child) = expression.children().iter().find(|c| c.index as usize >= index) {
                return Err(format!("expression {} refers to expression {} that is not below it", index, child.index));
            }
        }

        let expression_count = self.expressions.len();
        for (index, statement) in self.statements.iter().enumerate() {
            if statement.this().index as usize != index {
                return Err(format!("statement {} is labelled as {}", index, statement.this().index));
            }
            let (statements, expressions) = statement.children();
            if let Some(child) = statements.iter().find(|c| c.index as usize >= index) {
                return Err(format!("statement {} refers to statement {} that is not below it", index, child.index));
            }
            if let Some(child) = expressions.iter().find(|c| c.index as usize >= expression_count) {
                return Err(format!("statement {} refers to missing expression {}", index, child.index));
            }
            if let Statement::Function(declaration) = statement {
                if !matches!(self.statements[declaration.body.upcast()], Statement::Block(_)) {
                    return Err(format!("body of function '{}' is not a block", declaration.identifier.value));
                }
            }
        }

        if root.index as usize >= self.roots.len() {
            return Err(format!("root {} does not exist", root.index));
        }
        let statement_count = self.statements.len();
        if let Some(child) = self[root].statements.iter().find(|c| c.index as usize >= statement_count) {
            return Err(format!("root refers to missing statement {}", child.index));
        }

        if let Some(span) = self.find_too_deep(max_depth) {
            return Err(format!("node at {}:{} is nested deeper than {}", span.begin.line + 1, span.begin.column + 1, max_depth));
        }
        Ok(())
    }
}

pub trait SyntaxElement {
    fn span(&self) -> InputSpan;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Identifier {
    pub span: InputSpan,
    pub value: String,
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Root {
    pub this: RootId,
    pub span: InputSpan,
    pub statements: Vec<StatementId>,
}

impl SyntaxElement for Root {
    fn span(&self) -> InputSpan {
        self.span
    }
}

//------------------------------------------------------------------------------
// Statements
//------------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum Statement {
    Block(BlockStatement),
    Function(FunctionDeclaration),
    Variable(VariableDeclaration),
    If(IfStatement),
    For(ForStatement),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Block(_) => "block statement",
            Statement::Function(_) => "function declaration",
            Statement::Variable(_) => "variable declaration",
            Statement::If(_) => "if statement",
            Statement::For(_) => "for statement",
            Statement::Return(_) => "return statement",
            Statement::Expression(_) => "expression statement",
        }
    }
}

impl Statement {
    /// Direct children of the statement, in evaluation order.
    fn children(&self) -> (Vec<StatementId>, Vec<ExpressionId>) {
        match self {
            Statement::Block(stmt) => (stmt.statements.clone(), Vec::new()),
            Statement::Function(stmt) => (vec![stmt.body.upcast()], Vec::new()),
            Statement::Variable(stmt) => {
                (Vec::new(), stmt.declarations.iter().map(|d| d.initializer).collect())
            },
            Statement::If(stmt) => (vec![stmt.consequent], vec![stmt.test]),
            Statement::For(stmt) => (vec![stmt.init, stmt.body], vec![stmt.test, stmt.update]),
            Statement::Return(stmt) => (Vec::new(), stmt.argument.into_iter().collect()),
            Statement::Expression(stmt) => (Vec::new(), vec![stmt.expression]),
        }
    }

    fn this(&self) -> StatementId {
        match self {
            Statement::Block(stmt) => stmt.this.upcast(),
            Statement::Function(stmt) => stmt.this.upcast(),
            Statement::Variable(stmt) => stmt.this.upcast(),
            Statement::If(stmt) => stmt.this.upcast(),
            Statement::For(stmt) => stmt.this.upcast(),
            Statement::Return(stmt) => stmt.this.upcast(),
            Statement::Expression(stmt) => stmt.this.upcast(),
        }
    }
}

impl SyntaxElement for Statement {
    fn span(&self) -> InputSpan {
        match self {
            Statement::Block(stmt) => stmt.span,
            Statement::Function(stmt) => stmt.span,
            Statement::Variable(stmt) => stmt.span,
            Statement::If(stmt) => stmt.span,
            Statement::For(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
            Statement::Expression(stmt) => stmt.span,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct BlockStatement {
    pub this: BlockStatementId,
    pub span: InputSpan, // from the opening to the closing curly brace
    pub statements: Vec<StatementId>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct FunctionDeclaration {
    pub this: FunctionDeclarationId,
    pub span: InputSpan,
    pub identifier: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatementId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct VariableDeclaration {
    pub this: VariableDeclarationId,
    pub span: InputSpan,
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct VariableDeclarator {
    pub span: InputSpan,
    pub identifier: Identifier,
    pub initializer: ExpressionId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct IfStatement {
    pub this: IfStatementId,
    pub span: InputSpan,
    pub test: ExpressionId,
    pub consequent: StatementId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ForStatement {
    pub this: ForStatementId,
    pub span: InputSpan,
    pub init: StatementId,
    pub test: ExpressionId,
    pub update: ExpressionId,
    pub body: StatementId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ReturnStatement {
    pub this: ReturnStatementId,
    pub span: InputSpan,
    pub argument: Option<ExpressionId>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ExpressionStatement {
    pub this: ExpressionStatementId,
    pub span: InputSpan,
    pub expression: ExpressionId,
}

//------------------------------------------------------------------------------
// Expressions
//------------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum Expression {
    Identifier(IdentifierExpression),
    Binary(BinaryExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Call(CallExpression),
    Member(MemberExpression),
    Array(ArrayExpression),
    Object(ObjectExpression),
    IntLiteral(IntLiteralExpression),
}

impl Expression {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Identifier(_) => "identifier",
            Expression::Binary(_) => "binary expression",
            Expression::Assignment(_) => "assignment expression",
            Expression::Update(_) => "update expression",
            Expression::Call(_) => "call expression",
            Expression::Member(_) => "member expression",
            Expression::Array(_) => "array expression",
            Expression::Object(_) => "object expression",
            Expression::IntLiteral(_) => "integer literal",
        }
    }
}

impl Expression {
    fn children(&self) -> Vec<ExpressionId> {
        match self {
            Expression::Identifier(_) | Expression::IntLiteral(_) => Vec::new(),
            Expression::Binary(expr) => vec![expr.left, expr.right],
            Expression::Assignment(expr) => vec![expr.left, expr.right],
            Expression::Update(expr) => vec![expr.argument],
            Expression::Call(expr) => expr.arguments.clone(),
            Expression::Member(expr) => vec![expr.object, expr.property],
            Expression::Array(expr) => expr.elements.clone(),
            Expression::Object(expr) => {
                expr.properties.iter().flat_map(|p| vec![p.key, p.value]).collect()
            },
        }
    }

    fn this(&self) -> ExpressionId {
        match self {
            Expression::Identifier(expr) => expr.this.upcast(),
            Expression::Binary(expr) => expr.this.upcast(),
            Expression::Assignment(expr) => expr.this.upcast(),
            Expression::Update(expr) => expr.this.upcast(),
            Expression::Call(expr) => expr.this.upcast(),
            Expression::Member(expr) => expr.this.upcast(),
            Expression::Array(expr) => expr.this.upcast(),
            Expression::Object(expr) => expr.this.upcast(),
            Expression::IntLiteral(expr) => expr.this.upcast(),
        }
    }
}

impl SyntaxElement for Expression {
    fn span(&self) -> InputSpan {
        match self {
            Expression::Identifier(expr) => expr.identifier.span,
            Expression::Binary(expr) => expr.span,
            Expression::Assignment(expr) => expr.span,
            Expression::Update(expr) => expr.span,
            Expression::Call(expr) => expr.span,
            Expression::Member(expr) => expr.span,
            Expression::Array(expr) => expr.span,
            Expression::Object(expr) => expr.span,
            Expression::IntLiteral(expr) => expr.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equality,
    Inequality,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::Equality => "==",
            BinaryOperator::Inequality => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AssignmentOperator {
    Set,
}

impl AssignmentOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignmentOperator::Set => "=",
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct IdentifierExpression {
    pub this: IdentifierExpressionId,
    pub identifier: Identifier,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct BinaryExpression {
    pub this: BinaryExpressionId,
    pub span: InputSpan,
    pub left: ExpressionId,
    pub operation: BinaryOperator,
    pub right: ExpressionId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AssignmentExpression {
    pub this: AssignmentExpressionId,
    pub span: InputSpan,
    pub left: ExpressionId,
    pub operation: AssignmentOperator,
    pub right: ExpressionId,
}

/// Postfix `++` or `--` applied to an identifier or an array element.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct UpdateExpression {
    pub this: UpdateExpressionId,
    pub span: InputSpan,
    pub operation: UpdateOperator,
    pub argument: ExpressionId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CallExpression {
    pub this: CallExpressionId,
    pub span: InputSpan,
    pub callee: Identifier,
    pub arguments: Vec<ExpressionId>,
}

/// Indexing of an array, as in `subject[index]`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct MemberExpression {
    pub this: MemberExpressionId,
    pub span: InputSpan,
    pub object: ExpressionId,
    pub property: ExpressionId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ArrayExpression {
    pub this: ArrayExpressionId,
    pub span: InputSpan,
    pub elements: Vec<ExpressionId>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ObjectExpression {
    pub this: ObjectExpressionId,
    pub span: InputSpan,
    pub properties: Vec<Property>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Property {
    pub span: InputSpan,
    pub key: ExpressionId,
    pub value: ExpressionId,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct IntLiteralExpression {
    pub this: IntLiteralExpressionId,
    pub span: InputSpan,
    pub value: i64,
}
