fn main() -> anyhow::Result<()> {
    umbra::run()
}
