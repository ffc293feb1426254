pub(super) use std::collections::BTreeMap;

pub(super) use crate::{
    ast::parse_program,
    val::{HashKey, Val},
    vm::{Bytecode, Compiler, Instructions, Opcode, Vm, VmConfig, VmError, compile_program, make},
};

pub(super) fn run_with(input: &str, config: VmConfig) -> Result<Val, VmError> {
    let program = parse_program(input).unwrap_or_else(|errs| panic!("parse {input:?}:\n{errs}"));
    let bytecode = compile_program(&program).unwrap_or_else(|errs| panic!("compile {input:?}:\n{errs}"));
    let mut vm = Vm::with_config(bytecode, config);
    vm.run()?;
    Ok(vm.last_popped().clone())
}

pub(super) fn run(input: &str) -> Val {
    run_with(input, VmConfig::default()).unwrap_or_else(|err| panic!("run {input:?}: {err}"))
}

pub(super) fn run_err(input: &str) -> VmError {
    match run_with(input, VmConfig::default()) {
        Ok(val) => panic!("{input:?} should fail, got {val}"),
        Err(err) => err,
    }
}

pub(super) fn ints(items: &[i64]) -> Val {
    Val::from(items.to_vec())
}

pub(super) fn hash<const N: usize>(pairs: [(HashKey, Val); N]) -> Val {
    Val::from(BTreeMap::from(pairs))
}

pub(super) fn check_all(cases: &[(&str, Val)]) {
    for (input, expected) in cases {
        assert_eq!(&run(input), expected, "{input}");
    }
}

mod errors;
mod functions;
mod semantics;
