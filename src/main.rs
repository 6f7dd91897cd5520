fn main() {
    if let Err(err) = unipm_cli::run_cli() {
        eprintln!("unipm: {err}");
        std::process::exit(1);
    }
}
