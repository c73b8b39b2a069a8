//! Two-pass type checker (`spec.md` §4.3).
//!
//! Pass 1 collects every struct/class/enum declaration (crate- and
//! module-wide, so forward references and mutual recursion both resolve)
//! into the `TypeRegistry`. Pass 2 binds field/variant types inside each
//! declaration's own generic scope. The remaining linear walk over
//! statements performs ordinary, top-to-bottom type checking, since `spec.md`
//! gives variables no forward visibility the way it gives types.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::checker::error::CheckError;
use crate::checker::symbols::{SymbolTable, TypeRegistry};
use crate::checker::types::{FieldInfo, Primitive, RecordDef, RecordKind, TypeSymbol, VariantInfo};
use crate::diagnostics::{Category, Diagnostics, Span};
use crate::parser::ast::*;
use crate::parser::interner::{Interner, Symbol};

/// Resolved type of every checked expression, keyed by its span. Spans are
/// unique across one `CompilationUnit` except for synthesized/error nodes,
/// which all resolve to `TypeSymbol::Primitive(Error)` anyway, so collisions
/// there are harmless.
pub type ExprTypes = FxHashMap<(u32, u32, u32), TypeSymbol>;

pub struct CheckOutput {
    pub registry: TypeRegistry,
    pub expr_types: ExprTypes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    None,
    Identity,
    ImplicitWidening,
    Explicit,
}

fn conversion_kind(from: &TypeSymbol, to: &TypeSymbol) -> Conversion {
    if from == to {
        return Conversion::Identity;
    }
    use Primitive::*;
    if let (TypeSymbol::Primitive(f), TypeSymbol::Primitive(t)) = (from, to) {
        if matches!((f, t), (Char, Int) | (Int, Float) | (Char, Float)) {
            return Conversion::ImplicitWidening;
        }
        if f.is_numeric() && t.is_numeric() {
            return Conversion::Explicit;
        }
    }
    Conversion::None
}

fn assignable(from: &TypeSymbol, to: &TypeSymbol) -> bool {
    matches!(conversion_kind(from, to), Conversion::Identity | Conversion::ImplicitWidening)
}

/// A raw declaration captured during pass 1, before its field/variant types
/// are resolved.
enum RawDecl<'a> {
    Record { kind: RecordKind, name: Symbol, qualified_name: String, generics: Vec<Symbol>, fields: &'a [FieldDecl] },
    Enum { name: Symbol, qualified_name: String, generics: Vec<Symbol>, variants: &'a [VariantDecl] },
}

pub struct TypeChecker<'a> {
    diagnostics: &'a mut Diagnostics,
    interner: &'a Interner,
    symbols: SymbolTable,
    registry: TypeRegistry,
    module_path: Vec<String>,
    loop_depth: usize,
    /// Symbol-table depth at entry to each currently-open counted paralloop
    /// body, innermost last (`spec.md` §4.3/§4.4 "outer variable").
    counted_paralloop_entry_depths: Vec<usize>,
    expr_types: ExprTypes,
}

impl<'a> TypeChecker<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics, interner: &'a Interner) -> Self {
        Self {
            diagnostics,
            interner,
            symbols: SymbolTable::new(),
            registry: TypeRegistry::new(),
            module_path: Vec::new(),
            loop_depth: 0,
            counted_paralloop_entry_depths: Vec::new(),
            expr_types: FxHashMap::default(),
        }
    }

    pub fn check(mut self, unit: &CompilationUnit) -> CheckOutput {
        let mut raws = Vec::new();
        self.collect_decls(&unit.statements, &mut raws);
        self.bind_decls(&raws);
        for stmt in &unit.statements {
            self.check_statement(stmt);
        }
        CheckOutput { registry: self.registry, expr_types: self.expr_types }
    }

    fn name_str(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    fn qualify(&self, name: &str) -> String {
        if self.module_path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.module_path.join("."), name)
        }
    }

    fn report(&mut self, category: Category, span: Span, err: CheckError) {
        self.diagnostics.error(category, span, err.to_string());
    }

    // ---- Pass 1: collect declarations (recurses into modules) ----

    fn collect_decls<'b>(&mut self, statements: &'b [Statement], out: &mut Vec<RawDecl<'b>>) {
        for stmt in statements {
            match stmt {
                Statement::RecordDecl { kind, name, name_span, generics, fields, .. } => {
                    let kind = match kind {
                        crate::parser::ast::RecordKind::Struct => RecordKind::Struct,
                        crate::parser::ast::RecordKind::Class => RecordKind::Class,
                    };
                    let qualified = self.qualify(&self.name_str(*name));
                    out.push(RawDecl::Record { kind, name: *name, qualified_name: qualified, generics: generics.clone(), fields });
                    self.check_no_duplicate_decl(*name_span, &out[out.len() - 1]);
                }
                Statement::EnumDecl { name, name_span, generics, variants, .. } => {
                    let qualified = self.qualify(&self.name_str(*name));
                    out.push(RawDecl::Enum { name: *name, qualified_name: qualified, generics: generics.clone(), variants });
                    self.check_no_duplicate_decl(*name_span, &out[out.len() - 1]);
                }
                Statement::Module { name, body, .. } => {
                    self.module_path.push(self.name_str(*name));
                    self.collect_decls(body, out);
                    self.module_path.pop();
                }
                _ => {}
            }
        }
    }

    fn check_no_duplicate_decl(&mut self, span: Span, decl: &RawDecl<'_>) {
        let qualified = match decl {
            RawDecl::Record { qualified_name, .. } => qualified_name,
            RawDecl::Enum { qualified_name, .. } => qualified_name,
        };
        if self.registry.lookup_qualified(qualified).is_some() {
            self.report(Category::Type, span, CheckError::DuplicateDecl { name: qualified.clone() });
            return;
        }
        // Reserve a zero-field/variant placeholder now so sibling declarations
        // can reference it by name during pass 2, then `bind_decls` fills it in.
        let placeholder = match decl {
            RawDecl::Record { kind, name, qualified_name, generics, .. } => Rc::new(RecordDef {
                kind: *kind,
                name: *name,
                qualified_name: qualified_name.clone(),
                generics: generics.clone(),
                fields: Default::default(),
                variants: Default::default(),
            }),
            RawDecl::Enum { name, qualified_name, generics, .. } => Rc::new(RecordDef {
                kind: RecordKind::Enum,
                name: *name,
                qualified_name: qualified_name.clone(),
                generics: generics.clone(),
                fields: Default::default(),
                variants: Default::default(),
            }),
        };
        self.registry.register(qualified.clone(), placeholder);
    }

    // ---- Pass 2: resolve field/variant types in each declaration's own generic scope ----

    fn bind_decls(&mut self, raws: &[RawDecl<'_>]) {
        for raw in raws {
            match raw {
                RawDecl::Record { qualified_name, generics, fields, .. } => {
                    let def = self.registry.lookup_qualified(qualified_name).cloned();
                    let Some(def) = def else { continue };
                    let mut seen = FxHashMap::default();
                    let mut resolved = Vec::with_capacity(fields.len());
                    for f in fields.iter() {
                        let ty = self.resolve_type_ref(&f.ty, generics);
                        let field_name = self.name_str(f.name);
                        if seen.insert(field_name.clone(), ()).is_some() {
                            self.report(Category::Type, f.span, CheckError::DuplicateField { owner: qualified_name.clone(), name: field_name });
                        }
                        resolved.push(FieldInfo { name: f.name, ty });
                    }
                    *def.fields.borrow_mut() = resolved;
                }
                RawDecl::Enum { qualified_name, generics, variants, .. } => {
                    let def = self.registry.lookup_qualified(qualified_name).cloned();
                    let Some(def) = def else { continue };
                    let mut seen = FxHashMap::default();
                    let mut resolved = Vec::with_capacity(variants.len());
                    for v in variants.iter() {
                        let payload = v.payload.as_ref().map(|t| self.resolve_type_ref(t, generics));
                        let variant_name = self.name_str(v.name);
                        if seen.insert(variant_name.clone(), ()).is_some() {
                            self.report(Category::Type, v.span, CheckError::DuplicateVariant { owner: qualified_name.clone(), name: variant_name });
                        }
                        resolved.push(VariantInfo { name: v.name, payload });
                    }
                    *def.variants.borrow_mut() = resolved;
                }
            }
        }
    }

    /// Resolves a syntactic `TypeRef` to a semantic `TypeSymbol`, rejecting
    /// open (unapplied) generic types — valid in variable declarations, cast
    /// targets, and field/payload positions per `spec.md` §4.3, which are the
    /// only call sites this method has.
    fn resolve_type_ref(&mut self, ty: &TypeRef, generic_scope: &[Symbol]) -> TypeSymbol {
        match ty {
            TypeRef::Array { element, .. } => TypeSymbol::Array(Box::new(self.resolve_type_ref(element, generic_scope))),
            TypeRef::Named { name, args, span } => {
                if let Some(index) = generic_scope.iter().position(|g| g == name) {
                    return TypeSymbol::GenericParam { name: *name, index };
                }
                let name_str = self.name_str(*name);
                if args.is_empty() {
                    if let Some(prim) = self.registry.primitive(self.interner, &name_str) {
                        return prim;
                    }
                }
                match self.registry.resolve(&self.module_path, &name_str).cloned() {
                    Some(def) => {
                        if def.generics.is_empty() {
                            if !args.is_empty() {
                                self.report(Category::Type, *span, CheckError::ArityMismatch { name: name_str, expected: 0, actual: args.len() });
                                return TypeSymbol::Primitive(Primitive::Error);
                            }
                            TypeSymbol::User(def)
                        } else if args.is_empty() {
                            self.report(Category::Type, *span, CheckError::OpenGeneric { name: name_str });
                            TypeSymbol::Primitive(Primitive::Error)
                        } else if args.len() != def.generics.len() {
                            self.report(Category::Type, *span, CheckError::ArityMismatch { name: name_str, expected: def.generics.len(), actual: args.len() });
                            TypeSymbol::Primitive(Primitive::Error)
                        } else {
                            let resolved_args = args.iter().map(|a| self.resolve_type_ref(a, generic_scope)).collect();
                            TypeSymbol::Constructed { def, args: resolved_args }
                        }
                    }
                    None => {
                        self.report(Category::Type, *span, CheckError::UnknownType { name: name_str });
                        TypeSymbol::Primitive(Primitive::Error)
                    }
                }
            }
        }
    }

    // ---- statement walk ----

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Block { statements, .. } => {
                self.symbols.push_scope();
                for s in statements {
                    self.check_statement(s);
                }
                self.symbols.pop_scope();
            }
            Statement::Expr { expr, .. } => {
                self.check_expr(expr);
            }
            Statement::VarDecl { name, name_span, declared_type, flux, init, .. } => {
                let init_ty = self.check_expr(init);
                let ty = match declared_type {
                    Some(tref) => {
                        let declared = self.resolve_type_ref(tref, &[]);
                        if !declared.is_error() && !init_ty.is_error() && !assignable(&init_ty, &declared) {
                            self.report(
                                Category::Type,
                                init.span(),
                                CheckError::InvalidConversion {
                                    from: init_ty.display(&|s| self.name_str(s)),
                                    to: declared.display(&|s| self.name_str(s)),
                                },
                            );
                        }
                        declared
                    }
                    None => init_ty,
                };
                if !self.symbols.declare(*name, ty, *flux) {
                    let n = self.name_str(*name);
                    self.report(Category::Type, *name_span, CheckError::DuplicateDecl { name: n });
                }
            }
            Statement::Assign { target, target_span, op, value, .. } => {
                let value_ty = self.check_expr(value);
                let var = self.symbols.lookup(*target).cloned();
                let Some(var) = var else {
                    let n = self.name_str(*target);
                    self.report(Category::Type, *target_span, CheckError::UndefinedName { name: n });
                    return;
                };
                if !var.mutable {
                    let n = self.name_str(*target);
                    self.report(Category::Type, *target_span, CheckError::AssignImmutable { name: n });
                }
                self.check_paralloop_outer_assign(*target, &var, *op, value, *target_span);
                match op {
                    AssignOp::Assign => {
                        if !var.ty.is_error() && !value_ty.is_error() && !assignable(&value_ty, &var.ty) {
                            self.report(
                                Category::Type,
                                value.span(),
                                CheckError::InvalidConversion { from: value_ty.display(&|s| self.name_str(s)), to: var.ty.display(&|s| self.name_str(s)) },
                            );
                        }
                    }
                    AssignOp::AddAssign | AssignOp::SubAssign | AssignOp::MulAssign | AssignOp::DivAssign => {
                        let op_name = match op {
                            AssignOp::AddAssign => "+=",
                            AssignOp::SubAssign => "-=",
                            AssignOp::MulAssign => "*=",
                            AssignOp::DivAssign => "/=",
                            AssignOp::Assign => unreachable!(),
                        };
                        if !var.ty.is_numeric() {
                            self.report(
                                Category::Type,
                                *target_span,
                                CheckError::InvalidOperand { op: op_name, detail: format!("'{}' is not numeric", var.ty.display(&|s| self.name_str(s))) },
                            );
                        } else if !value_ty.is_error() && !assignable(&value_ty, &var.ty) {
                            self.report(
                                Category::Type,
                                value.span(),
                                CheckError::InvalidConversion { from: value_ty.display(&|s| self.name_str(s)), to: var.ty.display(&|s| self.name_str(s)) },
                            );
                        }
                    }
                }
            }
            Statement::Return { value, span } => {
                if let Some(v) = value {
                    self.check_expr(v);
                }
                if !self.counted_paralloop_entry_depths.is_empty() {
                    self.report(Category::Type, *span, CheckError::ParalloopForbidden { keyword: "return" });
                }
            }
            Statement::Throw { value, span } => {
                self.check_expr(value);
                if !self.counted_paralloop_entry_depths.is_empty() {
                    self.report(Category::Type, *span, CheckError::ParalloopForbidden { keyword: "throw" });
                }
            }
            Statement::If { cond, then_branch, else_branch, .. } => {
                let cond_ty = self.check_expr(cond);
                if !cond_ty.is_error() && !cond_ty.is_bool() {
                    self.report(Category::Type, cond.span(), CheckError::InvalidOperand { op: "if", detail: "condition must be bool".to_string() });
                }
                self.check_statement(then_branch);
                if let Some(e) = else_branch {
                    self.check_statement(e);
                }
            }
            Statement::Loop { parallel, cond_or_count, iter_var, body, .. } => {
                let cond_ty = self.check_expr(cond_or_count);
                let is_counted = *parallel && cond_ty.is_integer_like() && cond_ty.is_numeric();
                if !cond_ty.is_error() && !cond_ty.is_bool() && !(cond_ty == TypeSymbol::Primitive(Primitive::Int)) {
                    self.report(Category::Type, cond_or_count.span(), CheckError::InvalidOperand { op: "loop", detail: "condition must be int or bool".to_string() });
                }
                if let Some((iter_name, iter_span)) = iter_var {
                    if cond_ty != TypeSymbol::Primitive(Primitive::Int) {
                        self.report(Category::Type, *iter_span, CheckError::ParalloopRequiresInt);
                    }
                    self.symbols.push_scope();
                    self.symbols.declare(*iter_name, TypeSymbol::Primitive(Primitive::Int), false);
                    self.check_loop_body(is_counted, body);
                    self.symbols.pop_scope();
                } else {
                    self.check_loop_body(is_counted, body);
                }
            }
            Statement::Break { span } => {
                if self.loop_depth == 0 {
                    self.report(Category::Type, *span, CheckError::OutsideLoop { keyword: "break" });
                }
            }
            Statement::Continue { span } => {
                if self.loop_depth == 0 {
                    self.report(Category::Type, *span, CheckError::OutsideLoop { keyword: "continue" });
                }
            }
            // Declarations and imports contribute nothing to the executable
            // statement walk beyond what pass 1/2 already did.
            Statement::RecordDecl { .. } | Statement::EnumDecl { .. } | Statement::Import { .. } => {}
            Statement::Module { name, body, .. } => {
                self.module_path.push(self.name_str(*name));
                for s in body {
                    self.check_statement(s);
                }
                self.module_path.pop();
            }
        }
    }

    fn check_loop_body(&mut self, is_counted: bool, body: &Statement) {
        if is_counted && !self.counted_paralloop_entry_depths.is_empty() {
            self.report(Category::Type, body.span(), CheckError::NestedCountedParalloop);
        }
        self.loop_depth += 1;
        if is_counted {
            self.counted_paralloop_entry_depths.push(self.symbols.depth());
        }
        self.check_statement(body);
        if is_counted {
            self.counted_paralloop_entry_depths.pop();
        }
        self.loop_depth -= 1;
    }

    /// Inside a counted paralloop body, an assignment to a variable declared
    /// *outside* that body is only legal as a `+=` reduction into an `int`,
    /// and the right-hand side must not read the variable being reduced
    /// (`spec.md` §4.3/§4.4).
    fn check_paralloop_outer_assign(
        &mut self,
        target: Symbol,
        var: &crate::checker::symbols::VariableSymbol,
        op: AssignOp,
        value: &Expr,
        target_span: Span,
    ) {
        let Some(&entry_depth) = self.counted_paralloop_entry_depths.last() else { return };
        if var.scope_depth > entry_depth {
            return; // declared inside this iteration's own body: not an "outer" variable.
        }
        let is_valid_reduction = op == AssignOp::AddAssign && var.ty == TypeSymbol::Primitive(Primitive::Int) && !contains_name(value, target);
        if !is_valid_reduction {
            let n = self.name_str(target);
            self.report(Category::Type, target_span, CheckError::ParalloopInvalidReduction { name: n });
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> TypeSymbol {
        let ty = self.infer_expr(expr);
        let span = expr.span();
        self.expr_types.insert((span.line, span.col, span.len), ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &Expr) -> TypeSymbol {
        match expr {
            Expr::Literal { value, .. } => match value {
                Literal::Int(_) => TypeSymbol::Primitive(Primitive::Int),
                Literal::Float(_) => TypeSymbol::Primitive(Primitive::Float),
                Literal::Bool(_) => TypeSymbol::Primitive(Primitive::Bool),
                Literal::Char(_) => TypeSymbol::Primitive(Primitive::Char),
                Literal::Str(_) => TypeSymbol::Primitive(Primitive::String),
            },
            Expr::Name { name, span } => match self.symbols.lookup(*name) {
                Some(v) => v.ty.clone(),
                None => {
                    let n = self.name_str(*name);
                    self.report(Category::Type, *span, CheckError::UndefinedName { name: n });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            },
            Expr::Paren { inner, .. } => self.check_expr(inner),
            Expr::Error { .. } => TypeSymbol::Primitive(Primitive::Error),
            Expr::Unary { op, operand, span } => {
                let ty = self.check_expr(operand);
                if ty.is_error() {
                    return ty;
                }
                match op {
                    UnaryOp::Plus | UnaryOp::Neg => {
                        if ty.is_numeric() {
                            ty
                        } else {
                            self.report(Category::Type, *span, CheckError::InvalidOperand { op: "unary +/-", detail: "operand must be numeric".to_string() });
                            TypeSymbol::Primitive(Primitive::Error)
                        }
                    }
                    UnaryOp::Not => {
                        if ty.is_bool() {
                            ty
                        } else {
                            self.report(Category::Type, *span, CheckError::InvalidOperand { op: "!", detail: "operand must be bool".to_string() });
                            TypeSymbol::Primitive(Primitive::Error)
                        }
                    }
                    UnaryOp::BitNot => {
                        if ty.is_integer_like() {
                            TypeSymbol::Primitive(Primitive::Int)
                        } else {
                            self.report(Category::Type, *span, CheckError::InvalidOperand { op: "~", detail: "operand must be int or char".to_string() });
                            TypeSymbol::Primitive(Primitive::Error)
                        }
                    }
                }
            }
            Expr::Binary { op, left, right, span } => self.check_binary(*op, left, right, *span),
            Expr::Cast { target, operand, span } => {
                let operand_ty = self.check_expr(operand);
                let target_ty = self.resolve_type_ref(target, &[]);
                if !operand_ty.is_error() && !target_ty.is_error() && conversion_kind(&operand_ty, &target_ty) == Conversion::None {
                    self.report(
                        Category::Type,
                        *span,
                        CheckError::InvalidConversion { from: operand_ty.display(&|s| self.name_str(s)), to: target_ty.display(&|s| self.name_str(s)) },
                    );
                }
                target_ty
            }
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> TypeSymbol {
        let lty = self.check_expr(left);
        let rty = self.check_expr(right);
        if lty.is_error() || rty.is_error() {
            return TypeSymbol::Primitive(Primitive::Error);
        }
        use BinaryOp::*;
        match op {
            Add if lty == TypeSymbol::Primitive(Primitive::String) || rty == TypeSymbol::Primitive(Primitive::String) => {
                TypeSymbol::Primitive(Primitive::String)
            }
            Add | Sub | Mul | Div | Mod => {
                if lty.is_numeric() && rty.is_numeric() {
                    if lty == TypeSymbol::Primitive(Primitive::Float) || rty == TypeSymbol::Primitive(Primitive::Float) {
                        TypeSymbol::Primitive(Primitive::Float)
                    } else {
                        TypeSymbol::Primitive(Primitive::Int)
                    }
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "both operands must be numeric".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
            // Unlike `/`, `/^` has no float form: both operands must already be `int`.
            IntDiv => {
                if lty == TypeSymbol::Primitive(Primitive::Int) && rty == TypeSymbol::Primitive(Primitive::Int) {
                    TypeSymbol::Primitive(Primitive::Int)
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "both operands must be int".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
            Shl | Shr | UShl | UShr | BitAnd | BitOr | Xor | XorAnd => {
                if lty.is_integer_like() && rty.is_integer_like() {
                    TypeSymbol::Primitive(Primitive::Int)
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "both operands must be int or char".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
            Lt | LtEq | Gt | GtEq => {
                if lty.is_numeric() && rty.is_numeric() {
                    TypeSymbol::Primitive(Primitive::Bool)
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "both operands must be numeric".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
            Eq | NotEq => {
                if assignable(&lty, &rty) || assignable(&rty, &lty) {
                    TypeSymbol::Primitive(Primitive::Bool)
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "operands are not comparable".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
            // `!&`/`!|` are grouped with the bitwise-and/or precedence tiers
            // but are logical nand/nor by type rule, matching `&&`/`||`.
            And | Or | BitNand | BitNor => {
                if lty.is_bool() && rty.is_bool() {
                    TypeSymbol::Primitive(Primitive::Bool)
                } else {
                    self.report(Category::Type, span, CheckError::InvalidOperand { op: op_name(op), detail: "both operands must be bool".to_string() });
                    TypeSymbol::Primitive(Primitive::Error)
                }
            }
        }
    }
}

fn op_name(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        IntDiv => "/^",
        Shl => "<<",
        Shr => ">>",
        UShl => "+<<",
        UShr => "+>>",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        Eq => "==",
        NotEq => "!=",
        BitAnd => "&",
        BitOr => "|",
        BitNand => "!&",
        BitNor => "!|",
        Xor => "^",
        XorAnd => "^&",
        And => "&&",
        Or => "||",
    }
}

fn substitute_generics(ty: &TypeSymbol, args: &[TypeSymbol]) -> TypeSymbol {
    match ty {
        TypeSymbol::GenericParam { index, .. } => args.get(*index).cloned().unwrap_or_else(|| ty.clone()),
        TypeSymbol::Array(elem) => TypeSymbol::Array(Box::new(substitute_generics(elem, args))),
        TypeSymbol::Constructed { def, args: inner } => {
            TypeSymbol::Constructed { def: def.clone(), args: inner.iter().map(|a| substitute_generics(a, args)).collect() }
        }
        other => other.clone(),
    }
}

fn contains_name(expr: &Expr, target: Symbol) -> bool {
    match expr {
        Expr::Name { name, .. } => *name == target,
        Expr::Paren { inner, .. } | Expr::Unary { operand: inner, .. } => contains_name(inner, target),
        Expr::Binary { left, right, .. } => contains_name(left, target) || contains_name(right, target),
        Expr::Cast { operand, .. } => contains_name(operand, target),
        Expr::Literal { .. } | Expr::Error { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::{Category, Diagnostics};
    use crate::parser::parse_source;

    fn type_errors(source: &str) -> usize {
        let mut diagnostics = Diagnostics::new();
        let (unit, interner) = parse_source(source, &mut diagnostics);
        crate::checker::check(&unit, &interner, &mut diagnostics);
        diagnostics.iter().filter(|d| d.category == Category::Type).count()
    }

    #[test]
    fn int_div_on_two_ints_is_accepted() {
        assert_eq!(type_errors("flux a = 7 /^ 2;\nreturn 0;\n"), 0);
    }

    #[test]
    fn int_div_on_floats_is_a_type_error() {
        assert_eq!(type_errors("flux a = 1.0 /^ 2.0;\nreturn 0;\n"), 1);
    }

    #[test]
    fn int_div_on_one_float_operand_is_a_type_error() {
        assert_eq!(type_errors("flux a = 1.0 /^ 2;\nreturn 0;\n"), 1);
    }

    #[test]
    fn plain_div_on_floats_stays_accepted() {
        assert_eq!(type_errors("flux a = 1.0 / 2.0;\nreturn 0;\n"), 0);
    }
}
