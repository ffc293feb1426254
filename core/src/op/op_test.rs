use crate::{
    op::{BinOp, UnaryOp},
    token::Token,
    val::Val,
    vm::VmError,
};

macro_rules! test_op {
    ($name:ident, $op:expr, $l:expr, $r:expr, $res:expr) => {
        #[test]
        fn $name() {
            let l: Val = $l.into();
            let r: Val = $r.into();
            let res: Val = $res.into();
            assert_eq!($op.eval(&l, &r).unwrap(), res);
        }
    };
}

test_op!(add, BinOp::Add, 1, 2, 3);
test_op!(sub, BinOp::Sub, 1, 2, -1);
test_op!(mul, BinOp::Mul, 2, 3, 6);
test_op!(div_truncates, BinOp::Div, 7, 2, 3);
test_op!(str_concat, BinOp::Add, "mon", "key", "monkey");
test_op!(eq_int, BinOp::Eq, 1, 1, true);
test_op!(eq_str, BinOp::Eq, "a", "a", true);
test_op!(ne_mixed_kinds, BinOp::Ne, 1, true, true);
test_op!(gt, BinOp::Gt, 3, 2, true);
test_op!(lt, BinOp::Lt, 3, 2, false);

#[test]
fn add_wraps_on_overflow() {
    let out = BinOp::Add.eval(&Val::Int(i64::MAX), &Val::Int(1)).unwrap();
    assert_eq!(out, Val::Int(i64::MIN));
}

#[test]
fn division_by_zero_is_an_error() {
    let err = BinOp::Div.eval(&Val::Int(1), &Val::Int(0)).unwrap_err();
    assert_eq!(err, VmError::DivisionByZero);
}

#[test]
fn mismatched_operands_report_types() {
    let err = BinOp::Add.eval(&Val::Int(1), &Val::Bool(true)).unwrap_err();
    assert_eq!(
        err,
        VmError::UnsupportedOperands {
            op: "+",
            left: "INTEGER",
            right: "BOOLEAN"
        }
    );
    assert!(BinOp::Sub.eval(&"a".into(), &"b".into()).is_err());
    assert!(BinOp::Gt.eval(&"a".into(), &"b".into()).is_err());
}

#[test]
fn unary_ops() {
    assert_eq!(UnaryOp::Not.eval(&Val::Bool(true)).unwrap(), Val::Bool(false));
    assert_eq!(UnaryOp::Not.eval(&Val::Null).unwrap(), Val::Bool(true));
    assert_eq!(UnaryOp::Not.eval(&Val::Int(0)).unwrap(), Val::Bool(false));
    assert_eq!(UnaryOp::Neg.eval(&Val::Int(5)).unwrap(), Val::Int(-5));
    assert_eq!(
        UnaryOp::Neg.eval(&Val::Bool(true)).unwrap_err(),
        VmError::UnsupportedNegation("BOOLEAN")
    );
}

#[test]
fn from_token() {
    assert_eq!(BinOp::from_token(&Token::Lt), Some(BinOp::Lt));
    assert_eq!(BinOp::from_token(&Token::Assign), None);
    assert_eq!(UnaryOp::from_token(&Token::Sub), Some(UnaryOp::Neg));
}
