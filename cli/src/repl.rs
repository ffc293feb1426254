use rustyline::{DefaultEditor, error::ReadlineError};

use monkey_core::{
    val::Val,
    vm::{Session, VmConfig},
};

fn print_repl_help() {
    eprintln!("Commands: :quit | :exit | :q, :help");
}

/// Keeps reading while brackets are open or the line ends in `\`.
pub(crate) fn should_continue_multiline(buf: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for ch in buf.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth > 0 || buf.trim_end().ends_with('\\')
}

pub fn run(config: VmConfig) -> anyhow::Result<()> {
    let mut session = Session::new(config);
    let mut rl = DefaultEditor::new()?;

    print_repl_help();

    loop {
        let mut acc = String::new();
        loop {
            let prompt = if acc.is_empty() { ">> " } else { "... " };
            match rl.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim_end();

                    if acc.is_empty() && trimmed.starts_with(':') {
                        match trimmed {
                            ":quit" | ":exit" | ":q" => return Ok(()),
                            ":help" => print_repl_help(),
                            _ => eprintln!("Unknown command. Type :help for help."),
                        }
                        break;
                    }

                    if let Some(stripped) = trimmed.strip_suffix('\\') {
                        acc.push_str(stripped);
                        acc.push('\n');
                        continue;
                    }

                    acc.push_str(trimmed);
                    acc.push('\n');
                    if !should_continue_multiline(&acc) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    acc.clear();
                    eprintln!("^C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    if acc.trim().is_empty() {
                        println!();
                        return Ok(());
                    }
                    break;
                }
                Err(e) => {
                    eprintln!("Readline error: {}", e);
                    continue;
                }
            }
        }

        let src = acc.trim_end();
        if src.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(src);

        match session.eval(src) {
            Ok(Val::Null) => {}
            Ok(val) => println!("{val}"),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
}
