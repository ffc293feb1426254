use super::*;

#[test]
fn test_operand_type_errors() {
    assert_eq!(
        run_err("1 + true"),
        VmError::UnsupportedOperands {
            op: "+",
            left: "INTEGER",
            right: "BOOLEAN"
        }
    );
    assert_eq!(
        run_err(r#""a" - "b""#),
        VmError::UnsupportedOperands {
            op: "-",
            left: "STRING",
            right: "STRING"
        }
    );
    // `<` is compiled with swapped operands
    assert_eq!(
        run_err("1 < true"),
        VmError::UnsupportedOperands {
            op: ">",
            left: "BOOLEAN",
            right: "INTEGER"
        }
    );
    assert_eq!(run_err("-true"), VmError::UnsupportedNegation("BOOLEAN"));
    assert_eq!(run_err("10 / (5 - 5)"), VmError::DivisionByZero);
}

#[test]
fn test_calling_non_functions() {
    assert_eq!(run_err("1()"), VmError::NotCallable("INTEGER"));
    assert_eq!(run_err(r#"let s = "x"; s(1, 2)"#), VmError::NotCallable("STRING"));
}

#[test]
fn test_hash_and_index_errors() {
    assert_eq!(run_err("{[1]: 2}"), VmError::UnhashableKey("ARRAY"));
    assert_eq!(run_err("{1: 2}[fn() { 1 }]"), VmError::UnhashableKey("CLOSURE"));
    assert_eq!(
        run_err("1[0]"),
        VmError::IndexNotSupported {
            container: "INTEGER",
            index: "INTEGER"
        }
    );
    assert_eq!(
        run_err(r#"[1]["a"]"#),
        VmError::IndexNotSupported {
            container: "ARRAY",
            index: "STRING"
        }
    );
}

#[test]
fn test_unbounded_recursion_overflows_frames() {
    assert_eq!(run_err("let f = fn() { f() }; f()"), VmError::FrameOverflow(1024));

    let config = VmConfig {
        max_frames: 8,
        ..VmConfig::default()
    };
    let err = run_with("let f = fn(n) { if (n == 0) { 0 } else { f(n - 1) } }; f(8)", config).unwrap_err();
    assert_eq!(err, VmError::FrameOverflow(8));
    assert_eq!(
        run_with("let f = fn(n) { if (n == 0) { 0 } else { f(n - 1) } }; f(6)", config),
        Ok(Val::Int(0))
    );
}

#[test]
fn test_stack_overflow() {
    let config = VmConfig {
        stack_size: 16,
        ..VmConfig::default()
    };
    let items = vec!["1"; 20].join(", ");
    assert_eq!(run_with(&format!("[{items}]"), config), Err(VmError::StackOverflow));

    // every frame reserves its locals when it is entered
    let config = VmConfig {
        stack_size: 64,
        ..VmConfig::default()
    };
    let err = run_with(
        "let f = fn(n) { let a = 1; let b = 2; let c = 3; f(n + 1) }; f(0)",
        config,
    )
    .unwrap_err();
    assert_eq!(err, VmError::StackOverflow);
}

#[test]
fn test_globals_capacity() {
    let config = VmConfig {
        globals_size: 2,
        ..VmConfig::default()
    };
    assert_eq!(run_with("let a = 1; let b = 2; a + b", config), Ok(Val::Int(3)));
    assert_eq!(
        run_with("let a = 1; let b = 2; let c = 3;", config),
        Err(VmError::GlobalsOverflow(2))
    );
}

#[test]
fn test_malformed_bytecode() {
    let mut vm = Vm::new(Bytecode {
        instructions: Instructions(vec![255]),
        constants: Vec::new(),
    });
    assert_eq!(vm.run(), Err(VmError::UnknownOpcode(255)));

    let mut vm = Vm::new(Bytecode {
        instructions: Instructions::concat([make(Opcode::Constant, &[3])]),
        constants: vec![Val::Int(1)],
    });
    assert!(matches!(vm.run(), Err(VmError::MalformedBytecode { ip: 0, .. })));

    let mut vm = Vm::new(Bytecode {
        instructions: Instructions(vec![Opcode::Jump as u8, 0]),
        constants: Vec::new(),
    });
    assert!(matches!(vm.run(), Err(VmError::MalformedBytecode { ip: 1, .. })));

    let mut vm = Vm::new(Bytecode {
        instructions: Instructions::concat([make(Opcode::Pop, &[])]),
        constants: Vec::new(),
    });
    assert_eq!(vm.run(), Err(VmError::StackUnderflow));
}

#[test]
fn test_independent_vms_share_bytecode_across_threads() {
    let program = parse_program("let f = fn(n) { if (n < 2) { n } else { f(n - 1) + f(n - 2) } }; f(12)").unwrap();
    let bytecode = compile_program(&program).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bytecode = bytecode.clone();
            std::thread::spawn(move || {
                let mut vm = Vm::new(bytecode);
                vm.run().map(|()| vm.last_popped().clone())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(Val::Int(144)));
    }
}
