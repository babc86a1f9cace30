fn main() {
    if let Err(err) = focusflow_lib::run() {
        eprintln!("focusflow: {err:#}");
        std::process::exit(1);
    }
}
