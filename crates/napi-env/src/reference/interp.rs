//! Tree-walking evaluator.
//!
//! Bindings live in `Env` heap objects chained through `parent`; the global
//! scope is the global object itself (`scope == None`). `let` and `const`
//! are function scoped, and `const` bindings are non-writable.

use std::rc::Rc;

use super::ast::{
    AssignOp, BinaryOp, Expr, FunctionDef, LogicalOp, MemberKey, Program, Stmt, UnaryOp, VarKind,
};
use super::heap::{FunctionKind, HeapObject, ObjectKind, Property};
use super::ops::Hint;
use super::parser::parse_program;
use super::realm::ErrorKind;
use super::value::{ObjectId, PropKey, Val};
use super::{JsResult, ReferenceEnv, Thrown};
use crate::status::PropertyAttributes;

enum Completion {
    Normal,
    Return(Val),
    Break,
    Continue,
}

type Scope = Option<ObjectId>;

impl ReferenceEnv {
    pub(crate) fn compile(&self, source: &str) -> JsResult<Rc<Program>> {
        parse_program(source)
            .map(Rc::new)
            .map_err(|err| self.throw_kind(ErrorKind::SyntaxError, &err.to_string()))
    }

    /// Run global code; the result is the completion value of the last
    /// expression statement.
    pub(crate) fn run_program(&self, program: &Program, source_url: &str) -> JsResult<Val> {
        self.state.borrow_mut().source_urls.push(Rc::from(source_url));
        let result = self.run_global(program);
        self.state.borrow_mut().source_urls.pop();
        result
    }

    fn run_global(&self, program: &Program) -> JsResult<Val> {
        self.hoist(&program.body, None)?;
        let mut last = Val::Undefined;
        for stmt in &program.body {
            match self.exec_stmt(stmt, None, &mut last)? {
                Completion::Normal => {}
                Completion::Return(_) | Completion::Break | Completion::Continue => break,
            }
        }
        Ok(last)
    }

    pub(crate) fn call_script(
        &self,
        def: &Rc<FunctionDef>,
        closure: Scope,
        this: Val,
        args: &[Val],
    ) -> JsResult<Val> {
        let env = self.alloc(HeapObject::new(
            None,
            ObjectKind::Env {
                parent: closure,
                this,
            },
        ));
        self.with_object_mut(env, |obj| {
            for (index, param) in def.params.iter().enumerate() {
                let value = args.get(index).cloned().unwrap_or(Val::Undefined);
                obj.props.insert(PropKey::str(param), Property::data(value));
            }
        });
        let scope = Some(env);
        self.hoist(&def.body, scope)?;
        let mut last = Val::Undefined;
        for stmt in &def.body {
            match self.exec_stmt(stmt, scope, &mut last)? {
                Completion::Return(value) => return Ok(value),
                Completion::Normal | Completion::Break | Completion::Continue => {}
            }
        }
        Ok(Val::Undefined)
    }

    pub(crate) fn make_closure(&self, def: &Rc<FunctionDef>, scope: Scope) -> Val {
        let kind = FunctionKind::Script {
            def: def.clone(),
            env: scope,
        };
        self.create_function_object(kind, def.name.as_deref().unwrap_or(""), def.params.len())
    }

    // ============ BINDINGS ============

    fn declare(&self, scope: Scope, name: &str, value: Val, attributes: PropertyAttributes) {
        let target = scope.unwrap_or_else(|| self.realm().global);
        self.with_object_mut(target, |obj| {
            obj.props
                .insert(PropKey::str(name), Property { value, attributes });
        });
    }

    /// `var` names and function declarations, not descending into functions.
    fn hoist(&self, body: &[Stmt], scope: Scope) -> JsResult<()> {
        for stmt in body {
            match stmt {
                Stmt::Var {
                    kind: VarKind::Var,
                    decls,
                } => {
                    let target = scope.unwrap_or_else(|| self.realm().global);
                    self.with_object_mut(target, |obj| {
                        for (name, _) in decls {
                            obj.props
                                .entry(PropKey::str(name))
                                .or_insert_with(|| Property::data(Val::Undefined));
                        }
                    });
                }
                Stmt::Function(def) => {
                    let closure = self.make_closure(def, scope);
                    let name = def.name.as_deref().unwrap_or("");
                    self.declare(scope, name, closure, PropertyAttributes::ALL);
                }
                Stmt::If {
                    consequent,
                    alternate,
                    ..
                } => {
                    self.hoist(std::slice::from_ref(consequent.as_ref()), scope)?;
                    if let Some(alternate) = alternate {
                        self.hoist(std::slice::from_ref(alternate.as_ref()), scope)?;
                    }
                }
                Stmt::While { body, .. } => {
                    self.hoist(std::slice::from_ref(body.as_ref()), scope)?;
                }
                Stmt::Block(body) => self.hoist(body, scope)?,
                Stmt::Try {
                    block,
                    handler,
                    finalizer,
                    ..
                } => {
                    self.hoist(block, scope)?;
                    if let Some(handler) = handler {
                        self.hoist(handler, scope)?;
                    }
                    if let Some(finalizer) = finalizer {
                        self.hoist(finalizer, scope)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Env record holding `name`, or the global object when it has it.
    fn find_binding(&self, scope: Scope, name: &str) -> JsResult<Option<ObjectId>> {
        let key = PropKey::str(name);
        let mut current = scope;
        while let Some(env) = current {
            let (found, parent) = self.with_object(env, |obj| {
                let parent = match &obj.kind {
                    ObjectKind::Env { parent, .. } => *parent,
                    _ => None,
                };
                (obj.props.contains_key(&key), parent)
            });
            if found {
                return Ok(Some(env));
            }
            current = parent;
        }
        let global = self.realm().global;
        Ok(self.has(global, &key)?.then_some(global))
    }

    fn lookup(&self, scope: Scope, name: &str) -> JsResult<Val> {
        match self.find_binding(scope, name)? {
            Some(holder) => {
                let holder_val = Val::Object(holder);
                self.get_from(holder, &PropKey::str(name), &holder_val)
            }
            None => Err(self.throw_kind(
                ErrorKind::ReferenceError,
                &format!("{name} is not defined"),
            )),
        }
    }

    fn assign(&self, scope: Scope, name: &str, value: Val) -> JsResult<()> {
        let global = self.realm().global;
        let holder = self.find_binding(scope, name)?.unwrap_or(global);
        let key = PropKey::str(name);
        if holder != global {
            let writable = self.with_object(holder, |obj| {
                obj.props.get(&key).is_none_or(|p| p.attributes.writable())
            });
            if !writable {
                return Err(self.type_error("Assignment to constant variable."));
            }
        }
        self.set_on(holder, key, value, &Val::Object(holder))
    }

    fn resolve_this(&self, scope: Scope) -> Val {
        let mut current = scope;
        while let Some(env) = current {
            let (this, parent) = self.with_object(env, |obj| match &obj.kind {
                ObjectKind::Env { parent, this } => (Some(this.clone()), *parent),
                _ => (None, None),
            });
            if let Some(this) = this {
                return this;
            }
            current = parent;
        }
        Val::Object(self.realm().global)
    }

    // ============ STATEMENTS ============

    fn exec_block(&self, body: &[Stmt], scope: Scope, last: &mut Val) -> JsResult<Completion> {
        for stmt in body {
            let completion = self.exec_stmt(stmt, scope, last)?;
            if !matches!(completion, Completion::Normal) {
                return Ok(completion);
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: Scope, last: &mut Val) -> JsResult<Completion> {
        match stmt {
            Stmt::Expr(expr) => {
                *last = self.eval_expr(expr, scope)?;
            }
            Stmt::Var { kind, decls } => {
                for (name, init) in decls {
                    match kind {
                        VarKind::Var => {
                            if let Some(init) = init {
                                let value = self.eval_named(init, scope, name)?;
                                self.assign(scope, name, value)?;
                            }
                        }
                        VarKind::Let | VarKind::Const => {
                            let value = match init {
                                Some(init) => self.eval_named(init, scope, name)?,
                                None => Val::Undefined,
                            };
                            let attributes = if *kind == VarKind::Const {
                                PropertyAttributes::ENUMERABLE | PropertyAttributes::CONFIGURABLE
                            } else {
                                PropertyAttributes::ALL
                            };
                            self.declare(scope, name, value, attributes);
                        }
                    }
                }
            }
            Stmt::Function(_) | Stmt::Empty => {}
            Stmt::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Val::Undefined,
                };
                return Ok(Completion::Return(value));
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, scope)?.to_boolean() {
                    return self.exec_stmt(consequent, scope, last);
                }
                if let Some(alternate) = alternate {
                    return self.exec_stmt(alternate, scope, last);
                }
            }
            Stmt::While { test, body } => {
                while self.eval_expr(test, scope)?.to_boolean() {
                    match self.exec_stmt(body, scope, last)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }
            }
            Stmt::Break => return Ok(Completion::Break),
            Stmt::Continue => return Ok(Completion::Continue),
            Stmt::Block(body) => return self.exec_block(body, scope, last),
            Stmt::Throw(expr) => {
                let value = self.eval_expr(expr, scope)?;
                return Err(Thrown(value));
            }
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => {
                let mut result = self.exec_block(block, scope, last);
                if let (Err(Thrown(exception)), Some(handler)) = (&result, handler) {
                    let exception = exception.clone();
                    let catch_scope = self.alloc(HeapObject::new(
                        None,
                        ObjectKind::Env {
                            parent: scope,
                            this: self.resolve_this(scope),
                        },
                    ));
                    if let Some(param) = param {
                        self.with_object_mut(catch_scope, |obj| {
                            obj.props
                                .insert(PropKey::str(param), Property::data(exception));
                        });
                    }
                    result = self.exec_block(handler, Some(catch_scope), last);
                }
                if let Some(finalizer) = finalizer {
                    match self.exec_block(finalizer, scope, last)? {
                        Completion::Normal => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                return result;
            }
        }
        Ok(Completion::Normal)
    }

    // ============ EXPRESSIONS ============

    /// Anonymous function expressions take the name they are bound to.
    fn eval_named(&self, expr: &Expr, scope: Scope, name: &str) -> JsResult<Val> {
        if let Expr::Function(def) = expr {
            if def.name.is_none() {
                let named = Rc::new(FunctionDef {
                    name: Some(name.to_string()),
                    params: def.params.clone(),
                    body: def.body.clone(),
                });
                let closure = self.make_closure(&named, scope);
                return Ok(closure);
            }
        }
        self.eval_expr(expr, scope)
    }

    fn member_key(&self, key: &MemberKey, scope: Scope) -> JsResult<PropKey> {
        match key {
            MemberKey::Named(name) => Ok(PropKey::str(name)),
            MemberKey::Computed(expr) => {
                let value = self.eval_expr(expr, scope)?;
                self.to_property_key(&value)
            }
        }
    }

    pub(crate) fn eval_expr(&self, expr: &Expr, scope: Scope) -> JsResult<Val> {
        match expr {
            Expr::Number(n) => Ok(Val::Number(*n)),
            Expr::Str(s) => Ok(Val::str(s)),
            Expr::Bool(b) => Ok(Val::Bool(*b)),
            Expr::Null => Ok(Val::Null),
            Expr::Ident(name) => self.lookup(scope, name),
            Expr::This => Ok(self.resolve_this(scope)),
            Expr::Array(elements) => {
                let values = elements
                    .iter()
                    .map(|element| self.eval_expr(element, scope))
                    .collect::<JsResult<Vec<_>>>()?;
                Ok(self.create_array(values))
            }
            Expr::Object(members) => {
                let id = self.new_object();
                for (key, value) in members {
                    let key = self.member_key(key, scope)?;
                    let value = match (&key, value) {
                        (PropKey::Str(name), value) => self.eval_named(value, scope, name)?,
                        (PropKey::Symbol(_), value) => self.eval_expr(value, scope)?,
                    };
                    self.define_own_property(id, key, Property::data(value));
                }
                Ok(Val::Object(id))
            }
            Expr::Function(def) => {
                let Some(name) = &def.name else {
                    return Ok(self.make_closure(def, scope));
                };
                // A named function expression sees its own name.
                let this = self.resolve_this(scope);
                let own_scope = self.alloc(HeapObject::new(
                    None,
                    ObjectKind::Env {
                        parent: scope,
                        this,
                    },
                ));
                let closure = self.make_closure(def, Some(own_scope));
                self.with_object_mut(own_scope, |obj| {
                    obj.props.insert(
                        PropKey::str(name),
                        Property {
                            value: closure.clone(),
                            attributes: PropertyAttributes::DEFAULT,
                        },
                    );
                });
                Ok(closure)
            }
            Expr::Unary(op, operand) => self.eval_unary(*op, operand, scope),
            Expr::Binary(op, left, right) => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical(op, left, right) => {
                let left = self.eval_expr(left, scope)?;
                match (op, left.to_boolean()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval_expr(right, scope),
                }
            }
            Expr::Conditional(test, consequent, alternate) => {
                if self.eval_expr(test, scope)?.to_boolean() {
                    self.eval_expr(consequent, scope)
                } else {
                    self.eval_expr(alternate, scope)
                }
            }
            Expr::Assign(op, target, value) => self.eval_assign(*op, target, value, scope),
            Expr::Member(object, key) => {
                let object = self.eval_expr(object, scope)?;
                let key = self.member_key(key, scope)?;
                self.get(&object, &key)
            }
            Expr::Call(callee, args) => {
                let (func, this) = match callee.as_ref() {
                    Expr::Member(object, key) => {
                        let object = self.eval_expr(object, scope)?;
                        let key = self.member_key(key, scope)?;
                        (self.get(&object, &key)?, object)
                    }
                    other => (self.eval_expr(other, scope)?, Val::Undefined),
                };
                let args = self.eval_args(args, scope)?;
                if !self.is_callable(&func) {
                    return Err(self.type_error(&format!(
                        "{} is not a function",
                        callee_text(callee)
                    )));
                }
                self.call(&func, this, &args)
            }
            Expr::New(callee, args) => {
                let func = self.eval_expr(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                if !self.is_callable(&func) {
                    return Err(self.type_error(&format!(
                        "{} is not a constructor",
                        callee_text(callee)
                    )));
                }
                self.construct(&func, &args)
            }
            Expr::Sequence(exprs) => {
                let mut value = Val::Undefined;
                for expr in exprs {
                    value = self.eval_expr(expr, scope)?;
                }
                Ok(value)
            }
        }
    }

    fn eval_args(&self, args: &[Expr], scope: Scope) -> JsResult<Vec<Val>> {
        args.iter().map(|arg| self.eval_expr(arg, scope)).collect()
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr, scope: Scope) -> JsResult<Val> {
        if op == UnaryOp::Typeof {
            if let Expr::Ident(name) = operand {
                if self.find_binding(scope, name)?.is_none() {
                    return Ok(Val::str("undefined"));
                }
            }
        }
        let value = self.eval_expr(operand, scope)?;
        Ok(match op {
            UnaryOp::Not => Val::Bool(!value.to_boolean()),
            UnaryOp::Neg => Val::Number(-self.to_number(&value)?),
            UnaryOp::Plus => Val::Number(self.to_number(&value)?),
            UnaryOp::Typeof => Val::str(self.type_of_name(&value)),
            UnaryOp::Void => Val::Undefined,
        })
    }

    fn eval_assign(&self, op: AssignOp, target: &Expr, value: &Expr, scope: Scope) -> JsResult<Val> {
        match target {
            Expr::Ident(name) => {
                let value = match op {
                    AssignOp::Assign => self.eval_named(value, scope, name)?,
                    AssignOp::AddAssign | AssignOp::SubAssign => {
                        let current = self.lookup(scope, name)?;
                        let operand = self.eval_expr(value, scope)?;
                        self.compound(op, &current, &operand)?
                    }
                };
                self.assign(scope, name, value.clone())?;
                Ok(value)
            }
            Expr::Member(object, key) => {
                let object = self.eval_expr(object, scope)?;
                let key = self.member_key(key, scope)?;
                let value = match op {
                    AssignOp::Assign => self.eval_expr(value, scope)?,
                    AssignOp::AddAssign | AssignOp::SubAssign => {
                        let current = self.get(&object, &key)?;
                        let operand = self.eval_expr(value, scope)?;
                        self.compound(op, &current, &operand)?
                    }
                };
                match &object {
                    Val::Object(id) => self.set_on(*id, key, value.clone(), &object)?,
                    Val::Undefined | Val::Null => {
                        return Err(self.type_error(&format!(
                            "Cannot set properties of {object:?}"
                        )));
                    }
                    // Writes to primitives are dropped.
                    _ => {}
                }
                Ok(value)
            }
            _ => Err(self.throw_kind(
                ErrorKind::SyntaxError,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    fn compound(&self, op: AssignOp, current: &Val, operand: &Val) -> JsResult<Val> {
        match op {
            AssignOp::AddAssign => self.binary(BinaryOp::Add, current, operand),
            AssignOp::SubAssign => self.binary(BinaryOp::Sub, current, operand),
            AssignOp::Assign => Ok(operand.clone()),
        }
    }

    pub(crate) fn binary(&self, op: BinaryOp, left: &Val, right: &Val) -> JsResult<Val> {
        let number = |value: f64| -> JsResult<Val> { Ok(Val::Number(value)) };
        match op {
            BinaryOp::Add => {
                let left = self.to_primitive(left, Hint::Default)?;
                let right = self.to_primitive(right, Hint::Default)?;
                if matches!(left, Val::Str(_)) || matches!(right, Val::Str(_)) {
                    let mut text = self.to_string(&left)?.to_string();
                    text.push_str(&self.to_string(&right)?);
                    return Ok(Val::str(&text));
                }
                number(self.to_number(&left)? + self.to_number(&right)?)
            }
            BinaryOp::Sub => number(self.to_number(left)? - self.to_number(right)?),
            BinaryOp::Mul => number(self.to_number(left)? * self.to_number(right)?),
            BinaryOp::Div => number(self.to_number(left)? / self.to_number(right)?),
            BinaryOp::Mod => number(self.to_number(left)? % self.to_number(right)?),
            BinaryOp::Eq => Ok(Val::Bool(self.loose_equals(left, right)?)),
            BinaryOp::NotEq => Ok(Val::Bool(!self.loose_equals(left, right)?)),
            BinaryOp::StrictEq => Ok(Val::Bool(left.strict_equals(right))),
            BinaryOp::StrictNotEq => Ok(Val::Bool(!left.strict_equals(right))),
            BinaryOp::Lt => self.compare(left, right, |o| o.is_lt()),
            BinaryOp::Gt => self.compare(left, right, |o| o.is_gt()),
            BinaryOp::LtEq => self.compare(left, right, |o| o.is_le()),
            BinaryOp::GtEq => self.compare(left, right, |o| o.is_ge()),
            BinaryOp::Instanceof => Ok(Val::Bool(self.value_instance_of(left, right)?)),
            BinaryOp::In => {
                let Val::Object(id) = right else {
                    return Err(self.type_error(&format!(
                        "Cannot use 'in' operator to search for {} in {right:?}",
                        self.describe(left)
                    )));
                };
                let key = self.to_property_key(left)?;
                Ok(Val::Bool(self.has(*id, &key)?))
            }
        }
    }

    /// Relational comparison; `NaN` compares false.
    fn compare(
        &self,
        left: &Val,
        right: &Val,
        test: impl Fn(std::cmp::Ordering) -> bool,
    ) -> JsResult<Val> {
        let left = self.to_primitive(left, Hint::Number)?;
        let right = self.to_primitive(right, Hint::Number)?;
        let ordering = match (&left, &right) {
            (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
            _ => self.to_number(&left)?.partial_cmp(&self.to_number(&right)?),
        };
        Ok(Val::Bool(ordering.is_some_and(test)))
    }
}

fn callee_text(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member(object, MemberKey::Named(name)) => format!("{}.{name}", callee_text(object)),
        Expr::Member(object, MemberKey::Computed(_)) => format!("{}[...]", callee_text(object)),
        Expr::This => "this".to_string(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(env: &ReferenceEnv, source: &str) -> JsResult<Val> {
        let program = env.compile(source)?;
        env.run_program(&program, "test.js")
    }

    fn eval_number(source: &str) -> f64 {
        let env = ReferenceEnv::new();
        match eval(&env, source) {
            Ok(Val::Number(n)) => n,
            other => panic!("expected number from {source:?}, got {other:?}"),
        }
    }

    fn eval_string(source: &str) -> String {
        let env = ReferenceEnv::new();
        match eval(&env, source) {
            Ok(Val::Str(s)) => s.to_string(),
            other => panic!("expected string from {source:?}, got {other:?}"),
        }
    }

    fn error_message(env: &ReferenceEnv, result: JsResult<Val>) -> String {
        let Err(Thrown(exception)) = result else {
            panic!("expected a throw");
        };
        let message = env
            .get(&exception, &PropKey::str("message"))
            .expect("message readable");
        env.to_string(&message).expect("message string").to_string()
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(eval_number("1 + 2 * 3"), 7.0);
        assert_eq!(eval_number("(1 + 2) * 3"), 9.0);
        assert_eq!(eval_number("10 % 4 - -1"), 3.0);
        assert_eq!(eval_string("'a' + 1 + 2"), "a12");
    }

    #[test]
    fn test_functions_and_closures() {
        let source = "
            function counter() {
                var n = 0;
                return function () { n += 1; return n; };
            }
            var next = counter();
            next();
            next();
        ";
        assert_eq!(eval_number(source), 2.0);
    }

    #[test]
    fn test_named_function_expression_recursion() {
        let source = "var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; fact(5)";
        assert_eq!(eval_number(source), 120.0);
    }

    #[test]
    fn test_while_break_continue() {
        let source = "
            var i = 0, sum = 0;
            while (true) {
                i += 1;
                if (i > 10) break;
                if (i % 2) continue;
                sum += i;
            }
            sum
        ";
        assert_eq!(eval_number(source), 30.0);
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "
            var log = '';
            try { throw new TypeError('boom'); }
            catch (e) { log += e.name + ':' + e.message; }
            finally { log += '!'; }
            log
        ";
        assert_eq!(eval_string(source), "TypeError:boom!");
    }

    #[test]
    fn test_constructors_and_instanceof() {
        let source = "
            function Point(x) { this.x = x; }
            var p = new Point(4);
            (p instanceof Point) && p.x === 4 && !(p instanceof Array)
        ";
        let env = ReferenceEnv::new();
        assert!(matches!(eval(&env, source), Ok(Val::Bool(true))));
    }

    #[test]
    fn test_reference_error() {
        let env = ReferenceEnv::new();
        let result = eval(&env, "missing + 1");
        assert_eq!(error_message(&env, result), "missing is not defined");
        assert_eq!(eval_string("typeof missing"), "undefined");
    }

    #[test]
    fn test_const_is_not_reassignable() {
        let env = ReferenceEnv::new();
        let result = eval(&env, "function f() { const a = 1; a = 2; } f()");
        assert_eq!(error_message(&env, result), "Assignment to constant variable.");
    }

    #[test]
    fn test_deep_recursion_runs_out_of_stack() {
        let env = ReferenceEnv::new();
        let result = eval(&env, "function f() { return f(); } f()");
        assert_eq!(error_message(&env, result), "Out of stack space");
    }

    #[test]
    fn test_proxy_get_trap() {
        let source = "
            var p = new Proxy({}, { get: function (t, k) { return k + '!'; } });
            p.hello
        ";
        assert_eq!(eval_string(source), "hello!");
    }

    #[test]
    fn test_syntax_error_is_thrown() {
        let env = ReferenceEnv::new();
        let Err(Thrown(exception)) = env.compile("var = 1") else {
            panic!("expected syntax error");
        };
        let name = env.get(&exception, &PropKey::str("name")).expect("name");
        assert!(matches!(name, Val::Str(s) if &*s == "SyntaxError"));
    }
}
