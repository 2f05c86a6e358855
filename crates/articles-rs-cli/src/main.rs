use articles_rs_cli::CommandRegistry;

fn main() -> anyhow::Result<()> {
    let registry = CommandRegistry::with_builtin_commands();
    let matches = registry.build_cli().get_matches();
    let stdout = std::io::stdout();
    registry.run(&matches, &mut stdout.lock())
}
