mod cli;

fn main() -> anyhow::Result<()> {
    dts_gen::logging::init_tracing();
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
