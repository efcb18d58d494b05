fn main() {
    #[cfg(feature = "cli")]
    rsdkmerge::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("rsdkmerge: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
