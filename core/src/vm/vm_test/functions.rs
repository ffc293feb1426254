use super::*;

#[test]
fn test_calls_without_arguments() {
    check_all(&[
        ("let fivePlusTen = fn() { 5 + 10; }; fivePlusTen();", Val::Int(15)),
        ("let one = fn() { 1; }; let two = fn() { 2; }; one() + two()", Val::Int(3)),
        (
            "let a = fn() { 1 }; let b = fn() { a() + 1 }; let c = fn() { b() + 1 }; c();",
            Val::Int(3),
        ),
    ]);
}

#[test]
fn test_return_statements() {
    check_all(&[
        ("let earlyExit = fn() { return 99; 100; }; earlyExit();", Val::Int(99)),
        ("let earlyExit = fn() { return 99; return 100; }; earlyExit();", Val::Int(99)),
        ("let noReturn = fn() { }; noReturn();", Val::Null),
        (
            "let noReturn = fn() { }; let noReturnTwo = fn() { noReturn(); }; noReturn(); noReturnTwo();",
            Val::Null,
        ),
        ("let onlyLet = fn() { let a = 1; }; onlyLet();", Val::Null),
    ]);
}

#[test]
fn test_first_class_functions() {
    check_all(&[
        (
            "let returnsOne = fn() { 1; }; let returnsOneReturner = fn() { returnsOne; }; returnsOneReturner()();",
            Val::Int(1),
        ),
        (
            "let returnsOneReturner = fn() { let returnsOne = fn() { 1; }; returnsOne; }; returnsOneReturner()();",
            Val::Int(1),
        ),
    ]);
}

#[test]
fn test_local_bindings() {
    check_all(&[
        ("let one = fn() { let one = 1; one }; one();", Val::Int(1)),
        (
            "let oneAndTwo = fn() { let one = 1; let two = 2; one + two; }; oneAndTwo();",
            Val::Int(3),
        ),
        (
            "let oneAndTwo = fn() { let one = 1; let two = 2; one + two; };
             let threeAndFour = fn() { let three = 3; let four = 4; three + four; };
             oneAndTwo() + threeAndFour();",
            Val::Int(10),
        ),
        (
            "let firstFoobar = fn() { let foobar = 50; foobar; };
             let secondFoobar = fn() { let foobar = 100; foobar; };
             firstFoobar() + secondFoobar();",
            Val::Int(150),
        ),
        (
            "let globalSeed = 50;
             let minusOne = fn() { let num = 1; globalSeed - num; }
             let minusTwo = fn() { let num = 2; globalSeed - num; }
             minusOne() + minusTwo();",
            Val::Int(97),
        ),
    ]);
}

#[test]
fn test_arguments_and_bindings() {
    check_all(&[
        ("let identity = fn(a) { a; }; identity(4);", Val::Int(4)),
        ("let sum = fn(a, b) { a + b; }; sum(1, 2);", Val::Int(3)),
        ("let sum = fn(a, b) { let c = a + b; c; }; sum(1, 2) + sum(3, 4);", Val::Int(10)),
        (
            "let sum = fn(a, b) { let c = a + b; c; }; let outer = fn() { sum(1, 2) + sum(3, 4); }; outer();",
            Val::Int(10),
        ),
        (
            "let globalNum = 10;
             let sum = fn(a, b) { let c = a + b; c + globalNum; };
             let outer = fn() { sum(1, 2) + sum(3, 4) + globalNum; };
             outer() + globalNum;",
            Val::Int(50),
        ),
    ]);
}

#[test]
fn test_wrong_argument_count() {
    assert_eq!(run_err("fn() { 1; }(1);"), VmError::WrongArgumentCount { want: 0, got: 1 });
    assert_eq!(run_err("fn(a) { a; }();"), VmError::WrongArgumentCount { want: 1, got: 0 });
    assert_eq!(
        run_err("fn(a, b) { a + b; }(1);"),
        VmError::WrongArgumentCount { want: 2, got: 1 }
    );
}

#[test]
fn test_builtins() {
    check_all(&[
        (r#"len("")"#, Val::Int(0)),
        (r#"len("four")"#, Val::Int(4)),
        (r#"len("hello world")"#, Val::Int(11)),
        ("len([1, 2, 3])", Val::Int(3)),
        ("len([])", Val::Int(0)),
        ("len({1: 2})", Val::Int(1)),
        (r#"puts("hello", "world!")"#, Val::Null),
        ("first([1, 2, 3])", Val::Int(1)),
        ("first([])", Val::Null),
        ("last([1, 2, 3])", Val::Int(3)),
        ("last([])", Val::Null),
        ("rest([1, 2, 3])", ints(&[2, 3])),
        ("rest([])", Val::Null),
        ("push([], 1)", ints(&[1])),
        ("let a = [1]; push(a, 2); a", ints(&[1])),
    ]);
}

#[test]
fn test_builtin_errors_name_the_builtin() {
    assert_eq!(
        run_err("len(1)"),
        VmError::Builtin {
            name: "len",
            message: "argument to `len` not supported, got INTEGER".into()
        }
    );
    assert_eq!(
        run_err(r#"len("one", "two")"#),
        VmError::Builtin {
            name: "len",
            message: "wrong number of arguments. got=2, want=1".into()
        }
    );
    assert_eq!(
        run_err("first(1)"),
        VmError::Builtin {
            name: "first",
            message: "argument to `first` must be ARRAY, got INTEGER".into()
        }
    );
    assert_eq!(
        run_err("push(1, 1)"),
        VmError::Builtin {
            name: "push",
            message: "argument to `push` must be ARRAY, got INTEGER".into()
        }
    );
}

#[test]
fn test_closures() {
    check_all(&[
        (
            "let newClosure = fn(a) { fn() { a; }; }; let closure = newClosure(99); closure();",
            Val::Int(99),
        ),
        (
            "let newAdder = fn(a, b) { fn(c) { a + b + c }; }; let adder = newAdder(1, 2); adder(8);",
            Val::Int(11),
        ),
        (
            "let newAdder = fn(a, b) { let c = a + b; fn(d) { c + d }; }; let adder = newAdder(1, 2); adder(8);",
            Val::Int(11),
        ),
        (
            "let newAdderOuter = fn(a, b) { let c = a + b; fn(d) { let e = d + c; fn(f) { e + f; }; }; };
             let newAdderInner = newAdderOuter(1, 2);
             let adder = newAdderInner(3);
             adder(8);",
            Val::Int(14),
        ),
        (
            "let a = 1;
             let newAdderOuter = fn(b) { fn(c) { fn(d) { a + b + c + d }; }; };
             let newAdderInner = newAdderOuter(2);
             let adder = newAdderInner(3);
             adder(8);",
            Val::Int(14),
        ),
        (
            "let newClosure = fn(a, b) { let one = fn() { a; }; let two = fn() { b; }; fn() { one() + two(); }; };
             let closure = newClosure(9, 90);
             closure();",
            Val::Int(99),
        ),
    ]);
}

#[test]
fn test_closures_capture_values_at_creation() {
    let input = "let make = fn() { let x = 1; let get = fn() { x }; let x = 2; get }; make()()";
    assert_eq!(run(input), Val::Int(1));
}

#[test]
fn test_recursive_functions() {
    check_all(&[
        (
            "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } }; countDown(1);",
            Val::Int(0),
        ),
        (
            "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
             let wrapper = fn() { countDown(1); };
             wrapper();",
            Val::Int(0),
        ),
        (
            "let wrapper = fn() {
                 let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
                 countDown(1);
             };
             wrapper();",
            Val::Int(0),
        ),
    ]);
}

#[test]
fn test_recursive_fibonacci() {
    let input = "
        let fibonacci = fn(x) {
            if (x == 0) {
                return 0;
            } else {
                if (x == 1) {
                    return 1;
                } else {
                    fibonacci(x - 1) + fibonacci(x - 2);
                }
            }
        };
        fibonacci(15);";
    assert_eq!(run(input), Val::Int(610));
}

#[test]
fn test_higher_order_map() {
    let input = "
        let map = fn(arr, f) {
            let iter = fn(arr, accumulated) {
                if (len(arr) == 0) {
                    accumulated
                } else {
                    iter(rest(arr), push(accumulated, f(first(arr))));
                }
            };
            iter(arr, []);
        };
        let double = fn(x) { x * 2 };
        map([1, 2, 3, 4], double);";
    assert_eq!(run(input), ints(&[2, 4, 6, 8]));
}
