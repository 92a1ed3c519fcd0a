fn main() -> anyhow::Result<()> {
    jogga_lib::run()
}
