//! Expression tree used by filters, orderings and projections

use super::value::{Value, ValueKind};

/// Declaring type name of textual members
pub const STRING_TYPE: &str = "string";

/// Declaring type name of byte-sequence members
pub const BYTES_TYPE: &str = "bytes";

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    /// Returns the SQL operator token
    pub fn sql(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    /// Returns true if the operator yields a boolean
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }
}

/// Reference to a column of a query source
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Alias of the source the column belongs to
    pub source: String,
    /// Column name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
}

/// Access of a named member on a typed sub-expression.
///
/// Registry lookup identity is `(declaring_type, member)`, never the node.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    /// Sub-expression whose member is accessed
    pub target: Box<Expr>,
    /// Type declaring the member (e.g. "string")
    pub declaring_type: String,
    /// Member name (e.g. "Length")
    pub member: String,
    /// Kind of the member's value
    pub kind: ValueKind,
}

impl MemberAccess {
    pub fn new(
        target: Expr,
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        kind: ValueKind,
    ) -> Self {
        Self {
            target: Box::new(target),
            declaring_type: declaring_type.into(),
            member: member.into(),
            kind,
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column of a source
    Column(ColumnRef),
    /// Literal value
    Constant(Value),
    /// Member access, translated through the member registry
    Member(MemberAccess),
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Logical negation
    Not(Box<Expr>),
    /// Null test
    IsNull(Box<Expr>),
    /// Named fields
    Record(Vec<(String, Expr)>),
    /// Entire row of the source with the given alias
    Source(String),
}

impl Expr {
    pub fn column(source: impl Into<String>, name: impl Into<String>, kind: ValueKind) -> Self {
        Expr::Column(ColumnRef {
            source: source.into(),
            name: name.into(),
            kind,
        })
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Gt, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn is_null(inner: Expr) -> Self {
        Expr::IsNull(Box::new(inner))
    }

    /// Accesses an arbitrary member
    pub fn member(
        target: Expr,
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        kind: ValueKind,
    ) -> Self {
        Expr::Member(MemberAccess::new(target, declaring_type, member, kind))
    }

    /// Accesses the `Length` member of a textual or byte-sequence expression
    pub fn length(target: Expr) -> Self {
        let declaring_type = match target.kind() {
            ValueKind::Bytes => BYTES_TYPE,
            _ => STRING_TYPE,
        };
        Self::member(target, declaring_type, "Length", ValueKind::Int)
    }

    /// Returns the statically known kind of this expression
    pub fn kind(&self) -> ValueKind {
        match self {
            Expr::Column(c) => c.kind,
            Expr::Constant(v) => v.kind().unwrap_or(ValueKind::Any),
            Expr::Member(m) => m.kind,
            Expr::Binary { op, left, .. } => {
                if op.is_predicate() {
                    ValueKind::Bool
                } else {
                    left.kind()
                }
            }
            Expr::Not(_) | Expr::IsNull(_) => ValueKind::Bool,
            Expr::Record(_) | Expr::Source(_) => ValueKind::Record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_picks_declaring_type() {
        let text = Expr::length(Expr::column("it", "name", ValueKind::Text));
        let bytes = Expr::length(Expr::column("it", "payload", ValueKind::Bytes));

        match (text, bytes) {
            (Expr::Member(t), Expr::Member(b)) => {
                assert_eq!(t.declaring_type, STRING_TYPE);
                assert_eq!(b.declaring_type, BYTES_TYPE);
                assert_eq!(t.member, "Length");
                assert_eq!(t.kind, ValueKind::Int);
            }
            _ => panic!("expected member access"),
        }
    }

    #[test]
    fn test_expression_kinds() {
        let price = Expr::column("it", "price", ValueKind::Decimal);
        assert_eq!(price.kind(), ValueKind::Decimal);
        assert_eq!(
            Expr::gt(price.clone(), Expr::constant(10)).kind(),
            ValueKind::Bool
        );
        assert_eq!(
            Expr::binary(BinaryOp::Multiply, price, Expr::constant(2)).kind(),
            ValueKind::Decimal
        );
        assert_eq!(Expr::constant(Value::Null).kind(), ValueKind::Any);
        assert_eq!(Expr::Source("it".into()).kind(), ValueKind::Record);
    }
}
