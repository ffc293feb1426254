use super::*;

#[test]
fn test_integer_arithmetic() {
    check_all(&[
        ("1", Val::Int(1)),
        ("1 + 2", Val::Int(3)),
        ("1 - 2", Val::Int(-1)),
        ("4 / 2", Val::Int(2)),
        ("50 / 2 * 2 + 10 - 5", Val::Int(55)),
        ("5 * (2 + 10)", Val::Int(60)),
        ("-5", Val::Int(-5)),
        ("-50 + 100 + -50", Val::Int(0)),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", Val::Int(50)),
        ("9223372036854775807 + 1", Val::Int(i64::MIN)),
    ]);
}

#[test]
fn test_boolean_expressions() {
    check_all(&[
        ("true", Val::TRUE),
        ("1 < 2", Val::TRUE),
        ("1 > 2", Val::FALSE),
        ("1 == 1", Val::TRUE),
        ("1 != 1", Val::FALSE),
        ("true == false", Val::FALSE),
        ("(1 < 2) == true", Val::TRUE),
        ("(1 > 2) != false", Val::FALSE),
        ("!true", Val::FALSE),
        ("!!5", Val::TRUE),
        ("!(if (false) { 5; })", Val::TRUE),
    ]);
}

#[test]
fn test_conditionals() {
    check_all(&[
        ("if (true) { 10 }", Val::Int(10)),
        ("if (1) { 10 }", Val::Int(10)),
        ("if (1 < 2) { 10 } else { 20 }", Val::Int(10)),
        ("if (1 > 2) { 10 } else { 20 }", Val::Int(20)),
        ("if (1 > 2) { 10 }", Val::Null),
        ("if (false) { 10 }", Val::Null),
        ("if ((if (false) { 10 })) { 10 } else { 20 }", Val::Int(20)),
        ("if (true) { let a = 1; }", Val::Null),
        ("if (true) { } else { 1 }", Val::Null),
    ]);
}

#[test]
fn test_global_let_statements() {
    check_all(&[
        ("let one = 1; one", Val::Int(1)),
        ("let one = 1; let two = 2; one + two", Val::Int(3)),
        ("let one = 1; let two = one + one; one + two", Val::Int(3)),
    ]);
}

#[test]
fn test_strings() {
    check_all(&[
        (r#""monkey""#, Val::from("monkey")),
        (r#""mon" + "key""#, Val::from("monkey")),
        (r#""mon" + "key" + "banana""#, Val::from("monkeybanana")),
        (r#""a" == "a""#, Val::TRUE),
    ]);
}

#[test]
fn test_array_literals() {
    check_all(&[
        ("[]", ints(&[])),
        ("[1, 2, 3]", ints(&[1, 2, 3])),
        ("[1 + 2, 3 * 4, 5 + 6]", ints(&[3, 12, 11])),
    ]);
}

#[test]
fn test_hash_literals() {
    check_all(&[
        ("{}", hash([])),
        (
            "{1: 2, 2: 3}",
            hash([(HashKey::Int(1), Val::Int(2)), (HashKey::Int(2), Val::Int(3))]),
        ),
        (
            "{1 + 1: 2 * 2, 3 + 3: 4 * 4}",
            hash([(HashKey::Int(2), Val::Int(4)), (HashKey::Int(6), Val::Int(16))]),
        ),
        (
            r#"{"a": 1, true: 2, "a": 3}"#,
            hash([(HashKey::from("a"), Val::Int(3)), (HashKey::Bool(true), Val::Int(2))]),
        ),
    ]);
}

#[test]
fn test_index_expressions() {
    check_all(&[
        ("[1, 2, 3][1]", Val::Int(2)),
        ("[1, 2, 3][0 + 2]", Val::Int(3)),
        ("[[1, 1, 1]][0][0]", Val::Int(1)),
        ("[][0]", Val::Null),
        ("[1, 2, 3][99]", Val::Null),
        ("[1][-1]", Val::Null),
        ("{1: 1, 2: 2}[1]", Val::Int(1)),
        ("{1: 1, 2: 2}[2]", Val::Int(2)),
        ("{1: 1}[0]", Val::Null),
        ("{}[0]", Val::Null),
        (r#"{"key": "value"}["key"]"#, Val::from("value")),
    ]);
}

#[test]
fn test_equality_is_structural_for_data() {
    check_all(&[
        ("[1, 2] == [1, 2]", Val::TRUE),
        ("[1] == [2]", Val::FALSE),
        (r#"{"a": 1} == {"a": 1}"#, Val::TRUE),
        ("1 == true", Val::FALSE),
        ("len == len", Val::TRUE),
        ("let f = fn() { 1 }; f == f", Val::TRUE),
        ("fn() { 1 } == fn() { 1 }", Val::FALSE),
    ]);
}

#[test]
fn test_top_level_return_halts() {
    assert_eq!(run("return 10; 99"), Val::Int(10));
    assert_eq!(run("let a = 1; if (a == 1) { return a + 1; } 50"), Val::Int(2));
}

#[test]
fn test_run_starts_fresh_each_time() {
    let program = parse_program("let a = 1; a + 1").unwrap();
    let mut vm = Vm::new(compile_program(&program).unwrap());
    vm.run().unwrap();
    assert_eq!(vm.last_popped(), &Val::Int(2));
    vm.run().unwrap();
    assert_eq!(vm.last_popped(), &Val::Int(2));
    assert_eq!(vm.stack_top(), None);
    assert_eq!(vm.frame_depth(), 1);
}

#[test]
fn test_load_keeps_globals() {
    let mut compiler = Compiler::new();
    compiler.compile(&parse_program("let a = 21;").unwrap()).unwrap();
    let (bytecode, state) = compiler.finish();
    let mut vm = Vm::new(bytecode);
    vm.run().unwrap();

    let mut compiler = Compiler::with_state(state);
    compiler.compile(&parse_program("a * 2").unwrap()).unwrap();
    vm.load(compiler.bytecode());
    vm.run().unwrap();
    assert_eq!(vm.last_popped(), &Val::Int(42));
    assert_eq!(vm.globals(), &[Val::Int(21)]);
}

#[test]
fn test_unset_global_reads_null() {
    let bytecode = Bytecode {
        instructions: Instructions::concat([make(Opcode::GetGlobal, &[7]), make(Opcode::Pop, &[])]),
        constants: Vec::new(),
    };
    let mut vm = Vm::new(bytecode);
    vm.run().unwrap();
    assert_eq!(vm.last_popped(), &Val::Null);
}
