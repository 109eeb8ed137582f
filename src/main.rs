fn main() {
    if let Err(e) = geolife2one::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
