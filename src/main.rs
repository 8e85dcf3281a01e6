use fearandgreed::cli;

fn main() {
    let args = match cli::Args::parse_lenient(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let code = match cli::dispatch(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fearandgreed: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}
