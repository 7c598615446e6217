fn main() -> ontoterm::Result<()> {
    ontoterm::cli::main()
}
