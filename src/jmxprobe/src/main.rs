fn main() {
    // exit only once everything opened by the run has been dropped
    let code = jmxprobe::cli::process_command();
    std::process::exit(code);
}
