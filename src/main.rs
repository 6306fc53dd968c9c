fn main() {
    if let Err(e) = pdfhub_lib::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
