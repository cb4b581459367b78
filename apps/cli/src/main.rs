fn main() -> anyhow::Result<()> {
    cardmark::run()
}
