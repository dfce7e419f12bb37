fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match tasklens_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) if !error.use_stderr() => {
            print!("{error}");
            return;
        }
        Err(error) => {
            eprintln!("[tasklens] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = tasklens_core::runtime::run_with_options(options) {
        eprintln!("[tasklens] runtime failed: {error}");
        std::process::exit(1);
    }
}
