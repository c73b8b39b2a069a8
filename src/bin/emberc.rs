//! Thin CLI harness over `emberc`: not a full command-line surface (argument
//! parsing, subcommands, and friends are left to an external collaborator),
//! just enough to drive `CompilerDriver` end to end for manual smoke testing.

use std::env;
use std::fs;
use std::process::ExitCode;

use emberc::bytecode;
use emberc::driver::{CompilerDriver, Target};
use emberc::native;
use emberc::vm;

struct Options {
    path: Option<String>,
    dump_ast: bool,
    dump_bytecode: bool,
    dump_mlir: bool,
    run: bool,
    iterations: u64,
    color: bool,
}

fn parse_args() -> Result<Options, String> {
    let mut opts = Options { path: None, dump_ast: false, dump_bytecode: false, dump_mlir: false, run: false, iterations: 1, color: true };
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-ast" => opts.dump_ast = true,
            "--dump-bytecode" => opts.dump_bytecode = true,
            "--dump-mlir" => opts.dump_mlir = true,
            "--run" => opts.run = true,
            "--no-color" => opts.color = false,
            other if other.starts_with("--iterations=") => {
                opts.iterations = other["--iterations=".len()..].parse().map_err(|e| format!("bad --iterations value: {e}"))?;
            }
            other if other.starts_with("--") => return Err(format!("unknown flag: {other}")),
            other => opts.path = Some(other.to_string()),
        }
    }
    Ok(opts)
}

fn main() -> ExitCode {
    env_logger::init();

    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(message) => {
            eprintln!("emberc: {message}");
            return ExitCode::FAILURE;
        }
    };

    let (file_name, source) = match &opts.path {
        Some(path) => match fs::read_to_string(path) {
            Ok(source) => (path.clone(), source),
            Err(e) => {
                eprintln!("emberc: failed to read {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            use std::io::Read;
            let mut source = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut source) {
                eprintln!("emberc: failed to read stdin: {e}");
                return ExitCode::FAILURE;
            }
            ("<stdin>".to_string(), source)
        }
    };

    let mut driver = CompilerDriver::new();

    if opts.dump_ast {
        println!("{}", driver.print_ast(&source));
    }

    let target = if opts.dump_mlir { Target::Mlir } else { Target::Bytecode };
    let result = driver.compile(&source, target);

    if !result.diagnostics.is_empty() {
        eprint!("{}", result.diagnostics.render_pretty(&file_name, &source, opts.color));
    }

    if opts.dump_bytecode {
        println!("{}", bytecode::disassemble(&result.bytecode));
    }
    if let Some(dump) = &result.mlir_dump {
        println!("{dump}");
    }

    if !result.success {
        return ExitCode::FAILURE;
    }

    if opts.run {
        if opts.iterations <= 1 {
            let exec = vm::execute(&result.bytecode, result.bytecode.main());
            if !exec.success {
                eprintln!("emberc: execution failed: {}", exec.error_message);
                return ExitCode::FAILURE;
            }
            println!("{:?}", exec.return_value);
        } else {
            match native::run_tiered(&result.bytecode, opts.iterations) {
                Ok(tiered) => {
                    println!(
                        "iterations={} checksum={:#018x} native={}",
                        tiered.iterations, tiered.checksum, tiered.used_native
                    );
                }
                Err(message) => {
                    eprintln!("emberc: execution failed: {message}");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
