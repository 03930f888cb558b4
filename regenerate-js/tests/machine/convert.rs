//! Builds this crate's tree from `parse-js` output, so tests can be written as source text.
//! Syntax the lowering has no node for panics.

use parse_js::ast::ArrayElement;
use parse_js::ast::ClassMember as SrcClassMember;
use parse_js::ast::ClassOrObjectMemberKey;
use parse_js::ast::ClassOrObjectMemberValue;
use parse_js::ast::ForInOfStmtHeaderLhs;
use parse_js::ast::ForStmtHeader;
use parse_js::ast::ForThreeInit;
use parse_js::ast::LiteralTemplatePart as SrcTemplatePart;
use parse_js::ast::NodeData;
use parse_js::ast::ObjectMemberType;
use parse_js::ast::Syntax;
use parse_js::ast::VarDeclMode as SrcVarDeclMode;
use parse_js::operator::OperatorName as Src;
use parse_js::parse::toplevel::TopLevelMode;
use parse_js::session::Session;
use parse_js::source::SourceRange;
use regenerate_js::ast::build;
use regenerate_js::ast::class_or_object::*;
use regenerate_js::ast::expr::*;
use regenerate_js::ast::func::Func;
use regenerate_js::ast::func::FuncBody;
use regenerate_js::ast::func::ParamDecl;
use regenerate_js::ast::node::Node;
use regenerate_js::ast::pat::*;
use regenerate_js::ast::stmt::*;
use regenerate_js::ast::stx::TopLevel;
use regenerate_js::operator::OperatorName;

pub fn parse(src: &str) -> TopLevel {
  let session = Session::new();
  let top = parse_js::parse(&session, src.as_bytes(), TopLevelMode::Global)
    .unwrap_or_else(|err| panic!("{err:?} in:\n{src}"));
  let Syntax::TopLevel { body } = &top.stx else {
    unreachable!();
  };
  TopLevel {
    body: body.iter().map(|s| stmt(s)).collect(),
  }
}

/// Decodes the escapes of a string literal body or a template chunk.
pub fn decode_escapes(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars().peekable();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    let Some(escaped) = chars.next() else {
      break;
    };
    match escaped {
      'n' => out.push('\n'),
      't' => out.push('\t'),
      'r' => out.push('\r'),
      'b' => out.push('\u{8}'),
      'f' => out.push('\u{c}'),
      'v' => out.push('\u{b}'),
      '0' => out.push('\0'),
      'x' => out.push(hex_char(&mut chars, 2)),
      'u' if chars.peek() == Some(&'{') => {
        chars.next();
        let digits: String = chars.by_ref().take_while(|c| *c != '}').collect();
        out.push(code_point(&digits));
      }
      'u' => out.push(hex_char(&mut chars, 4)),
      // Line continuations.
      '\n' => {}
      '\r' => {
        if chars.peek() == Some(&'\n') {
          chars.next();
        }
      }
      other => out.push(other),
    }
  }
  out
}

fn hex_char(chars: &mut impl Iterator<Item = char>, len: usize) -> char {
  let digits: String = chars.take(len).collect();
  code_point(&digits)
}

fn code_point(digits: &str) -> char {
  u32::from_str_radix(digits, 16)
    .ok()
    .and_then(char::from_u32)
    .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn text(range: &SourceRange) -> String {
  range.as_str().to_string()
}

fn number_key(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e21 {
    format!("{}", value as i64)
  } else {
    value.to_string()
  }
}

fn direct_key(raw: &str) -> String {
  match raw.chars().next() {
    Some('"' | '\'') => decode_escapes(&raw[1..raw.len() - 1]),
    Some(c) if c.is_ascii_digit() || c == '.' => {
      number_key(raw.parse().unwrap_or_else(|_| panic!("unsupported numeric key {raw}")))
    }
    _ => raw.to_string(),
  }
}

macro_rules! same_operators {
  ($op:expr, $($name:ident),* $(,)?) => {
    match $op {
      $(Src::$name => OperatorName::$name,)*
      other => panic!("unsupported operator {other:?}"),
    }
  };
}

fn operator(op: Src) -> OperatorName {
  same_operators!(
    op,
    Addition,
    Assignment,
    AssignmentAddition,
    AssignmentBitwiseAnd,
    AssignmentBitwiseLeftShift,
    AssignmentBitwiseOr,
    AssignmentBitwiseRightShift,
    AssignmentBitwiseUnsignedRightShift,
    AssignmentBitwiseXor,
    AssignmentDivision,
    AssignmentExponentiation,
    AssignmentMultiplication,
    AssignmentRemainder,
    AssignmentSubtraction,
    BitwiseAnd,
    BitwiseLeftShift,
    BitwiseNot,
    BitwiseOr,
    BitwiseRightShift,
    BitwiseUnsignedRightShift,
    BitwiseXor,
    Comma,
    Delete,
    Division,
    Equality,
    Exponentiation,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    Inequality,
    Instanceof,
    LessThan,
    LessThanOrEqual,
    LogicalAnd,
    LogicalNot,
    LogicalOr,
    Multiplication,
    PostfixDecrement,
    PostfixIncrement,
    PrefixDecrement,
    PrefixIncrement,
    Remainder,
    StrictEquality,
    StrictInequality,
    Subtraction,
    Typeof,
    UnaryNegation,
    UnaryPlus,
    Void,
  )
}

fn stmts(body: &[&mut NodeData]) -> Vec<Node<Stmt>> {
  body.iter().map(|s| stmt(s)).collect()
}

fn block_body(n: &NodeData) -> Vec<Node<Stmt>> {
  match &n.stx {
    Syntax::BlockStmt { body } => stmts(body),
    other => panic!("expected a block, got {other:?}"),
  }
}

fn name_of(name: &Option<&mut NodeData>) -> Option<String> {
  name.as_ref().map(|n| match &n.stx {
    Syntax::ClassOrFunctionName { name } => text(name),
    other => panic!("expected a name, got {other:?}"),
  })
}

fn stmt(n: &NodeData) -> Node<Stmt> {
  match &n.stx {
    Syntax::BlockStmt { body } => build::block(stmts(body)),
    Syntax::BreakStmt { label } => Node::new(BreakStmt {
      label: label.as_ref().map(text),
    })
    .into_wrapped(),
    Syntax::ContinueStmt { label } => Node::new(ContinueStmt {
      label: label.as_ref().map(text),
    })
    .into_wrapped(),
    Syntax::ClassDecl {
      name,
      extends,
      members,
      ..
    } => Node::new(ClassDecl {
      name: name_of(name).expect("class declaration without a name"),
      extends: extends.as_ref().map(|e| expr(e)),
      members: members.iter().map(class_member).collect(),
    })
    .into_wrapped(),
    Syntax::DebuggerStmt {} => Node::new(DebuggerStmt {}).into_wrapped(),
    Syntax::DoWhileStmt { condition, body } => Node::new(DoWhileStmt {
      condition: expr(condition),
      body: stmt(body),
    })
    .into_wrapped(),
    Syntax::EmptyStmt {} => Node::new(EmptyStmt {}).into_wrapped(),
    Syntax::ExpressionStmt { expression } => build::expr_stmt(expr(expression)),
    Syntax::ForStmt { header, body } => for_stmt(header, body),
    Syntax::FunctionDecl {
      generator,
      is_async,
      name,
      signature,
      body,
      ..
    } => Node::new(FuncDecl {
      name: name_of(name).expect("function declaration without a name"),
      function: func(false, *is_async, *generator, signature, body),
    })
    .into_wrapped(),
    Syntax::IfStmt {
      test,
      consequent,
      alternate,
    } => build::if_(
      expr(test),
      stmt(consequent),
      alternate.as_ref().map(|s| stmt(s)),
    ),
    Syntax::LabelStmt { name, statement } => Node::new(LabelStmt {
      name: text(name),
      statement: stmt(statement),
    })
    .into_wrapped(),
    Syntax::ReturnStmt { value } => build::ret(value.as_ref().map(|e| expr(e))),
    Syntax::SwitchStmt { test, branches } => Node::new(SwitchStmt {
      test: expr(test),
      branches: branches
        .iter()
        .map(|b| match &b.stx {
          Syntax::SwitchBranch { case, body } => Node::new(SwitchBranch {
            case: case.as_ref().map(|e| expr(e)),
            body: stmts(body),
          }),
          other => panic!("expected a switch branch, got {other:?}"),
        })
        .collect(),
    })
    .into_wrapped(),
    Syntax::ThrowStmt { value } => build::throw(expr(value)),
    Syntax::TryStmt {
      wrapped,
      catch,
      finally,
    } => Node::new(TryStmt {
      wrapped: Node::new(BlockStmt {
        body: block_body(wrapped),
      }),
      catch: catch.as_ref().map(|c| match &c.stx {
        Syntax::CatchBlock { parameter, body } => Node::new(CatchBlock {
          parameter: parameter.as_ref().map(|p| pat(p)),
          body: block_body(body),
        }),
        other => panic!("expected a catch block, got {other:?}"),
      }),
      finally: finally.as_ref().map(|f| {
        Node::new(BlockStmt {
          body: block_body(f),
        })
      }),
    })
    .into_wrapped(),
    Syntax::VarStmt { declaration } => var_decl(declaration).into_wrapped(),
    Syntax::WhileStmt { condition, body } => Node::new(WhileStmt {
      condition: expr(condition),
      body: stmt(body),
    })
    .into_wrapped(),
    other => panic!("unsupported statement {other:?}"),
  }
}

fn for_stmt(header: &ForStmtHeader, body: &NodeData) -> Node<Stmt> {
  match header {
    ForStmtHeader::Three {
      init,
      condition,
      post,
    } => Node::new(ForTripleStmt {
      init: match init {
        ForThreeInit::None => ForTripleStmtInit::None,
        ForThreeInit::Expression(e) => ForTripleStmtInit::Expr(expr(e)),
        ForThreeInit::Declaration(d) => ForTripleStmtInit::Decl(var_decl(d)),
      },
      cond: condition.as_ref().map(|e| expr(e)),
      post: post.as_ref().map(|e| expr(e)),
      body: stmt(body),
    })
    .into_wrapped(),
    ForStmtHeader::InOf { of: false, lhs, rhs } => Node::new(ForInStmt {
      lhs: match lhs {
        ForInOfStmtHeaderLhs::Declaration(d) => ForInLhs::Decl(var_decl(d)),
        ForInOfStmtHeaderLhs::Pattern(p) => ForInLhs::Assign(target(p)),
      },
      rhs: expr(rhs),
      body: stmt(body),
    })
    .into_wrapped(),
    ForStmtHeader::InOf { of: true, .. } => panic!("for-of loops are not supported"),
  }
}

fn var_decl(n: &NodeData) -> Node<VarDecl> {
  let Syntax::VarDecl {
    mode, declarators, ..
  } = &n.stx
  else {
    panic!("expected a variable declaration, got {:?}", n.stx);
  };
  Node::new(VarDecl {
    mode: match mode {
      SrcVarDeclMode::Const => VarDeclMode::Const,
      SrcVarDeclMode::Let => VarDeclMode::Let,
      SrcVarDeclMode::Var => VarDeclMode::Var,
    },
    declarators: declarators
      .iter()
      .map(|d| VarDeclarator {
        pattern: pat(&d.pattern),
        initializer: d.initializer.as_ref().map(|e| expr(e)),
      })
      .collect(),
  })
}

fn pat(n: &NodeData) -> Node<Pat> {
  match &n.stx {
    Syntax::IdentifierPattern { name } => build::id_pat(text(name)),
    Syntax::ArrayPattern { elements, rest } => Node::new(ArrPat {
      elements: elements
        .iter()
        .map(|e| {
          e.as_ref().map(|e| ArrPatElem {
            target: pat(&e.target),
            default_value: e.default_value.as_ref().map(|d| expr(d)),
          })
        })
        .collect(),
      rest: rest.as_ref().map(|r| pat(r)),
    })
    .into_wrapped(),
    Syntax::ObjectPattern { properties, rest } => Node::new(ObjPat {
      properties: properties.iter().map(|p| obj_pat_prop(p)).collect(),
      rest: rest.as_ref().map(|r| match &r.stx {
        Syntax::IdentifierPattern { name } => Node::new(IdPat { name: text(name) }),
        other => panic!("object rest must be a name, got {other:?}"),
      }),
    })
    .into_wrapped(),
    other => panic!("unsupported pattern {other:?}"),
  }
}

fn obj_pat_prop(n: &NodeData) -> Node<ObjPatProp> {
  let Syntax::ObjectPatternProperty {
    key,
    target,
    default_value,
  } = &n.stx
  else {
    panic!("expected a pattern property, got {:?}", n.stx);
  };
  let default_value = default_value.as_ref().map(|d| expr(d));
  match (key, target) {
    (key, Some(target)) => Node::new(ObjPatProp {
      key: member_key(key),
      target: pat(target),
      shorthand: false,
      default_value,
    }),
    (ClassOrObjectMemberKey::Direct(name), None) => Node::new(ObjPatProp {
      key: ClassOrObjKey::Direct(text(name)),
      target: build::id_pat(text(name)),
      shorthand: true,
      default_value,
    }),
    (ClassOrObjectMemberKey::Computed(_), None) => unreachable!(),
  }
}

// Left of an assignment or for-in header, where the parser has already turned literals into patterns.
fn target(n: &NodeData) -> Node<Expr> {
  match &n.stx {
    Syntax::IdentifierPattern { .. } | Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
      pat(n).into_assign_target()
    }
    _ => expr(n),
  }
}

fn params(signature: &NodeData) -> Vec<Node<ParamDecl>> {
  let Syntax::FunctionSignature { parameters } = &signature.stx else {
    panic!("expected a signature, got {:?}", signature.stx);
  };
  parameters
    .iter()
    .map(|p| match &p.stx {
      Syntax::ParamDecl {
        rest,
        pattern,
        default_value,
      } => Node::new(ParamDecl {
        rest: *rest,
        pattern: pat(pattern),
        default_value: default_value.as_ref().map(|d| expr(d)),
      }),
      other => panic!("expected a parameter, got {other:?}"),
    })
    .collect()
}

fn func(arrow: bool, async_: bool, generator: bool, signature: &NodeData, body: &NodeData) -> Node<Func> {
  let body = match &body.stx {
    Syntax::BlockStmt { body } => FuncBody::Block(stmts(body)),
    _ if arrow => FuncBody::Expression(expr(body)),
    other => panic!("expected a function body, got {other:?}"),
  };
  Node::new(Func {
    arrow,
    async_,
    generator,
    parameters: params(signature),
    body,
  })
}

fn accessor(parameters: Vec<Node<ParamDecl>>, body: &NodeData) -> Node<Func> {
  Node::new(Func {
    arrow: false,
    async_: false,
    generator: false,
    parameters,
    body: FuncBody::Block(block_body(body)),
  })
}

fn member_key(key: &ClassOrObjectMemberKey) -> ClassOrObjKey {
  match key {
    ClassOrObjectMemberKey::Direct(raw) => ClassOrObjKey::Direct(direct_key(raw.as_str())),
    ClassOrObjectMemberKey::Computed(e) => ClassOrObjKey::Computed(expr(e)),
  }
}

fn member_val(value: &ClassOrObjectMemberValue) -> ClassOrObjVal {
  match value {
    ClassOrObjectMemberValue::Getter { body } => ClassOrObjVal::Getter(accessor(Vec::new(), body)),
    ClassOrObjectMemberValue::Setter { body, parameter } => {
      let param = Node::new(ParamDecl {
        rest: false,
        pattern: pat(parameter),
        default_value: None,
      });
      ClassOrObjVal::Setter(accessor(vec![param], body))
    }
    ClassOrObjectMemberValue::Method {
      is_async,
      generator,
      signature,
      body,
    } => ClassOrObjVal::Method(func(false, *is_async, *generator, signature, body)),
    ClassOrObjectMemberValue::Property { initializer } => {
      ClassOrObjVal::Prop(initializer.as_ref().map(|e| expr(e)))
    }
  }
}

fn class_member(member: &SrcClassMember) -> Node<ClassMember> {
  Node::new(ClassMember {
    key: member_key(&member.key),
    static_: member.statik,
    val: member_val(&member.value),
  })
}

fn obj_member(n: &NodeData) -> Node<ObjMember> {
  let Syntax::ObjectMember { typ } = &n.stx else {
    panic!("expected an object member, got {:?}", n.stx);
  };
  let typ = match typ {
    ObjectMemberType::Valued { key, value } => ObjMemberType::Valued {
      key: member_key(key),
      val: member_val(value),
    },
    ObjectMemberType::Shorthand { name } => ObjMemberType::Valued {
      key: ClassOrObjKey::Direct(text(name)),
      val: ClassOrObjVal::Prop(Some(build::id(text(name)))),
    },
    ObjectMemberType::Rest { value } => ObjMemberType::Rest { val: expr(value) },
  };
  Node::new(ObjMember { typ })
}

fn call_args(arguments: &[&mut NodeData]) -> Vec<Node<CallArg>> {
  arguments
    .iter()
    .map(|a| match &a.stx {
      Syntax::CallArg { spread, value } => Node::new(CallArg {
        spread: *spread,
        value: expr(value),
      }),
      other => panic!("expected a call argument, got {other:?}"),
    })
    .collect()
}

// `new f(a)` arrives as `new` applied to the call `f(a)`.
fn new_expr(argument: &NodeData) -> Node<Expr> {
  let (callee, arguments) = match &argument.stx {
    Syntax::CallExpr {
      callee, arguments, ..
    } => (expr(callee), call_args(arguments)),
    _ => (expr(argument), Vec::new()),
  };
  Node::new(NewExpr { callee, arguments }).into_wrapped()
}

fn expr(n: &NodeData) -> Node<Expr> {
  match &n.stx {
    Syntax::ArrowFunctionExpr {
      is_async,
      signature,
      body,
      ..
    } => Node::new(ArrowFuncExpr {
      func: func(true, *is_async, false, signature, body),
    })
    .into_wrapped(),
    Syntax::BinaryExpr {
      operator: op,
      left,
      right,
      ..
    } => {
      let op = operator(*op);
      let left = if op.is_assignment() { target(left) } else { expr(left) };
      build::binary(op, left, expr(right))
    }
    Syntax::CallExpr {
      optional_chaining: false,
      callee,
      arguments,
      ..
    } => Node::new(CallExpr {
      callee: expr(callee),
      arguments: call_args(arguments),
    })
    .into_wrapped(),
    Syntax::ClassExpr {
      name,
      extends,
      members,
      ..
    } => Node::new(ClassExpr {
      name: name_of(name),
      extends: extends.as_ref().map(|e| expr(e)),
      members: members.iter().map(class_member).collect(),
    })
    .into_wrapped(),
    Syntax::ConditionalExpr {
      test,
      consequent,
      alternate,
      ..
    } => build::cond(expr(test), expr(consequent), expr(alternate)),
    Syntax::ComputedMemberExpr {
      optional_chaining: false,
      object,
      member,
      ..
    } => build::computed_member(expr(object), expr(member)),
    Syntax::FunctionExpr {
      is_async,
      generator,
      name,
      signature,
      body,
      ..
    } => build::func_expr(name_of(name), func(false, *is_async, *generator, signature, body)),
    Syntax::IdentifierExpr { name } => build::id(text(name)),
    Syntax::LiteralArrayExpr { elements } => build::arr(
      elements
        .iter()
        .map(|e| match e {
          ArrayElement::Single(e) => LitArrElem::Single(expr(e)),
          ArrayElement::Rest(e) => LitArrElem::Rest(expr(e)),
          ArrayElement::Empty => LitArrElem::Empty,
        })
        .collect(),
    ),
    Syntax::LiteralBooleanExpr { value } => build::bool(*value),
    Syntax::LiteralNull {} => build::null(),
    Syntax::LiteralNumberExpr { value } => build::num(value.0),
    Syntax::LiteralObjectExpr { members } => Node::new(LitObjExpr {
      members: members.iter().map(|m| obj_member(m)).collect(),
    })
    .into_wrapped(),
    Syntax::LiteralRegexExpr {} => Node::new(LitRegexExpr {
      value: text(&n.loc),
    })
    .into_wrapped(),
    Syntax::LiteralStringExpr { value } => build::str(decode_escapes(value)),
    Syntax::LiteralTemplateExpr { parts } => Node::new(LitTemplateExpr {
      parts: parts
        .iter()
        .map(|p| match p {
          SrcTemplatePart::Substitution(e) => LitTemplatePart::Substitution(expr(e)),
          SrcTemplatePart::String(raw) => LitTemplatePart::String(text(raw)),
        })
        .collect(),
    })
    .into_wrapped(),
    Syntax::MemberExpr {
      optional_chaining: false,
      left,
      right,
      ..
    } => build::member(expr(left), text(right)),
    Syntax::ThisExpr {} => build::this(),
    Syntax::UnaryExpr {
      operator: op,
      argument,
      ..
    } => match op {
      Src::Await => Node::new(AwaitExpr {
        argument: expr(argument),
      })
      .into_wrapped(),
      Src::Yield | Src::YieldDelegated => Node::new(YieldExpr {
        argument: Some(expr(argument)),
        delegate: *op == Src::YieldDelegated,
      })
      .into_wrapped(),
      Src::New => new_expr(argument),
      op => build::unary(operator(*op), expr(argument)),
    },
    Syntax::UnaryPostfixExpr {
      operator: op,
      argument,
      ..
    } => Node::new(UnaryPostfixExpr {
      operator: operator(*op),
      argument: expr(argument),
    })
    .into_wrapped(),
    other => panic!("unsupported expression {other:?}"),
  }
}
